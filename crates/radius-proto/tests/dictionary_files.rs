//! Dictionary file loading
//!
//! Tests cover:
//! - The shipped dictionary tree under `dictionaries/`
//! - `$INCLUDE` resolution relative to the including file
//! - Include cycles and missing files
//! - Error locations (file and line)
//! - Merging a site dictionary into the built-in one

use radius_proto::{
    AttributeCode, AttributeValue, Code, DataType, Dictionary, DictionaryError, Packet,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, text: &str) {
    fs::write(dir.join(name), text).expect("Failed to write dictionary file");
}

#[test]
fn test_shipped_dictionary_matches_builtin() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("dictionaries/dictionary");
    let loaded = Dictionary::from_file(&path).expect("Failed to load shipped dictionary");
    let builtin = Dictionary::standard();

    assert_eq!(loaded.len(), builtin.len());
    for def in builtin.iter() {
        let other = loaded
            .lookup_by_name(def.name())
            .unwrap_or_else(|| panic!("{} missing from file dictionary", def.name()));
        assert_eq!(other.code(), def.code());
        assert_eq!(other.data_type(), def.data_type());
    }
}

#[test]
fn test_include_relative_to_including_file() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("vendor")).unwrap();
    write(
        dir.path(),
        "dictionary",
        "# site dictionary\n\
         $INCLUDE vendor/dictionary.example\n\
         ATTRIBUTE   User-Name   1   string\n",
    );
    write(
        &dir.path().join("vendor"),
        "dictionary.example",
        "VENDOR Example 32473\n\
         $INCLUDE dictionary.example.values\n",
    );
    write(
        &dir.path().join("vendor"),
        "dictionary.example.values",
        "BEGIN-VENDOR Example\n\
         ATTRIBUTE Example-Role 1 integer\n\
         VALUE Example-Role Admin 1\n\
         VALUE Example-Role Guest 2\n\
         END-VENDOR Example\n",
    );

    let dict = Dictionary::from_file(dir.path().join("dictionary")).unwrap();
    let role = dict.lookup_by_name("Example-Role").unwrap();
    assert_eq!(role.code(), AttributeCode::vendor(32473, 1));
    assert_eq!(role.data_type(), DataType::Integer);
    assert_eq!(role.value_of("Guest"), Some(2));
    assert!(dict.lookup_by_code(1, Some(32473)).is_some());
    assert!(dict.lookup_by_code(1, None).is_some());
    assert_eq!(dict.vendor_id("Example"), Some(32473));
}

#[test]
fn test_include_cycle_is_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a", "$INCLUDE b\n");
    write(dir.path(), "b", "ATTRIBUTE User-Name 1 string\n$INCLUDE a\n");

    let err = Dictionary::from_file(dir.path().join("a")).unwrap_err();
    assert!(matches!(err, DictionaryError::IncludeCycle(_)), "{}", err);
}

#[test]
fn test_including_a_file_twice_is_not_a_cycle() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "common", "ATTRIBUTE User-Name 1 string\n");
    write(dir.path(), "dictionary", "$INCLUDE common\n$INCLUDE common\n");

    let dict = Dictionary::from_file(dir.path().join("dictionary")).unwrap();
    assert_eq!(dict.len(), 1);
}

#[test]
fn test_missing_include() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "dictionary", "$INCLUDE does-not-exist\n");

    let err = Dictionary::from_file(dir.path().join("dictionary")).unwrap_err();
    assert!(matches!(err, DictionaryError::Io { .. }), "{}", err);
}

#[test]
fn test_error_reports_file_and_line() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "dictionary.bad",
        "ATTRIBUTE User-Name 1 string\n\
         \n\
         ATTRIBUTE Frobnicator 200 complex\n",
    );

    let err = Dictionary::from_file(dir.path().join("dictionary.bad")).unwrap_err();
    match &err {
        DictionaryError::UnknownType {
            location,
            data_type,
        } => {
            assert!(location.ends_with("dictionary.bad:3"), "{}", location);
            assert_eq!(data_type, "complex");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_site_dictionary_merged_into_builtin() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "dictionary.site",
        "VENDOR Example 32473\n\
         ATTRIBUTE Example-Group 2 string Example\n\
         ATTRIBUTE Service-Type 6 integer\n\
         VALUE Service-Type Site-Special 240\n",
    );

    let extension = Dictionary::from_file(dir.path().join("dictionary.site")).unwrap();
    let site = Dictionary::standard().merge(&extension).unwrap();

    let service_type = site.lookup_by_name("Service-Type").unwrap();
    assert_eq!(service_type.value_of("Site-Special"), Some(240));
    assert_eq!(service_type.value_of("Framed-User"), Some(2));

    let mut packet = Packet::new(Code::AccessAccept, 1, [0u8; 16]);
    packet
        .add_value(&site, "Example-Group", &"ops".into())
        .unwrap();
    packet
        .add_value(&site, "Service-Type", &"Site-Special".into())
        .unwrap();
    let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
    assert_eq!(
        decoded.values(&site, "Example-Group"),
        vec![AttributeValue::String("ops".into())]
    );
    assert_eq!(
        decoded.values(&site, "Service-Type"),
        vec![AttributeValue::Named("Site-Special".into())]
    );

    // A conflicting site file is refused
    let clash = Dictionary::parse("ATTRIBUTE Service-Type 6 string\n").unwrap();
    assert!(matches!(
        Dictionary::standard().merge(&clash),
        Err(DictionaryError::Conflict { .. })
    ));
}
