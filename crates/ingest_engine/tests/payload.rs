use std::collections::BTreeMap;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use ingest_core::{FileHandle, FileUpload, PendingUpload, RemoteUpload};
use ingest_engine::{BodyConfig, BodyField, FieldSource};

fn file_entry() -> PendingUpload {
    let handle = FileHandle {
        name: "roads.csv".to_string(),
        size: 42,
        path: PathBuf::from("/tmp/roads.csv"),
    };
    let mut files = BTreeMap::new();
    files.insert("csv".to_string(), handle);
    PendingUpload::File(FileUpload {
        id: 1,
        base_name: "roads".to_string(),
        extensions: vec!["csv".to_string()],
        files,
        supported: true,
        ready: true,
        missing_extensions: Vec::new(),
    })
}

fn remote_entry(url: &str, service_type: &str) -> PendingUpload {
    PendingUpload::Remote(RemoteUpload::new(2, url, service_type))
}

fn body_config() -> BodyConfig {
    BodyConfig {
        file: vec![
            BodyField::new("action", FieldSource::Literal("upload".to_string())),
            BodyField::new("title", FieldSource::Title),
            BodyField::new("file_name", FieldSource::MainFileName),
        ],
        remote: vec![
            BodyField::new("action", FieldSource::Literal("upload".to_string())),
            BodyField::new("url", FieldSource::Url),
            BodyField::new("title", FieldSource::Title),
            BodyField::new("extension", FieldSource::Extension),
            BodyField::new("service_type", FieldSource::ServiceType),
        ],
    }
}

#[test]
fn file_entries_resolve_the_file_field_table() {
    let fields = body_config().fields_for(&file_entry());
    assert_eq!(
        fields,
        vec![
            ("action".to_string(), "upload".to_string()),
            ("title".to_string(), "roads.csv".to_string()),
            ("file_name".to_string(), "roads.csv".to_string()),
        ]
    );
}

#[test]
fn remote_entries_resolve_the_remote_field_table() {
    let entry = remote_entry("https://example.com/tiles/basemap.pmtiles", "3dtiles");
    let fields = body_config().fields_for(&entry);
    assert_eq!(
        fields,
        vec![
            ("action".to_string(), "upload".to_string()),
            (
                "url".to_string(),
                "https://example.com/tiles/basemap.pmtiles".to_string()
            ),
            ("title".to_string(), "basemap".to_string()),
            ("extension".to_string(), "pmtiles".to_string()),
            ("service_type".to_string(), "3dtiles".to_string()),
        ]
    );
}

#[test]
fn unresolvable_sources_are_skipped() {
    // A URL source makes no sense for a file entry, a title cannot be
    // derived from an unparseable URL, and an extensionless entry has no
    // extension field; all drop out of the body silently.
    let config = BodyConfig {
        file: vec![BodyField::new("url", FieldSource::Url)],
        remote: vec![
            BodyField::new("title", FieldSource::Title),
            BodyField::new("extension", FieldSource::Extension),
            BodyField::new("service_type", FieldSource::ServiceType),
        ],
    };
    assert!(config.fields_for(&file_entry()).is_empty());
    assert_eq!(
        config.fields_for(&remote_entry("not a url", "wms")),
        vec![("service_type".to_string(), "wms".to_string())]
    );
}
