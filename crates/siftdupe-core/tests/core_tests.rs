use chrono::{TimeZone, Utc};
use siftdupe_core::{
    ContentHash, Dimensions, FileId, FileKind, FileRecord, Fingerprint, ScanConfig,
};

fn sample_record() -> FileRecord {
    let created = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
    FileRecord::new(FileId::new(7), "/photos/trip/IMG_0042.jpg", 2_048_000, created)
}

#[test]
fn test_file_id_operations() {
    let id1 = FileId::new(42);
    let id2 = FileId::new(42);

    assert_eq!(id1, id2);
    assert_eq!(id1.0, 42);
    assert_eq!(id1.to_string(), "#42");
    assert!(FileId::new(1) < FileId::new(2));
}

#[test]
fn test_content_hash_creation_and_hex() {
    let bytes = [0xab; 32];
    let hash = ContentHash::new(bytes);

    let hex = hash.to_hex();
    assert_eq!(hex.len(), 64);
    assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(hex.starts_with("ab"));

    assert_eq!(hash, ContentHash::new(bytes));
    assert_ne!(hash, ContentHash::new([0xcd; 32]));
}

#[test]
fn test_record_builders() {
    let record = sample_record()
        .with_hash(ContentHash::new([1; 32]))
        .with_fingerprint(Fingerprint::new("ffff0000ffff0000").unwrap())
        .with_dimensions(4032, 3024);

    assert_eq!(record.name.as_str(), "IMG_0042.jpg");
    assert_eq!(record.kind(), FileKind::Image);
    assert_eq!(record.dimensions, Some(Dimensions::new(4032, 3024)));
    assert_eq!(record.pixel_area(), Some(4032 * 3024));
    assert!(record.content_hash.is_some());
    assert!(record.text.is_none());
}

#[test]
fn test_record_serialization_skips_missing_fields() {
    let json = serde_json::to_value(sample_record()).unwrap();
    let obj = json.as_object().unwrap();

    assert!(obj.contains_key("path"));
    assert!(obj.contains_key("created"));
    assert!(!obj.contains_key("fingerprint"));
    assert!(!obj.contains_key("text"));

    let back: FileRecord = serde_json::from_value(json).unwrap();
    assert_eq!(back.id, FileId::new(7));
    assert_eq!(back.size, 2_048_000);
}

#[test]
fn test_file_kind_display() {
    assert_eq!(FileKind::Image.to_string(), "image");
    assert_eq!(FileKind::Document.to_string(), "document");
    assert_eq!(FileKind::Other.to_string(), "other");
}

#[test]
fn test_scan_config_defaults() {
    let config = ScanConfig::default();
    assert_eq!(config.root, std::path::PathBuf::from("."));
    assert!(config.max_depth.is_none());
    assert!(config.ignore_patterns.is_empty());
    assert!(config.ignore_matcher().unwrap().is_empty());
}
