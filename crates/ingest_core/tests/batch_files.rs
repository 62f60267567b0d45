use std::path::PathBuf;

use pretty_assertions::assert_eq;

use ingest_core::{
    exceeds_size_limit, ingest_files, size_label, split_file_name, validate_files, AddedFile,
    FormatDescriptor, PendingUpload, MISSING_ALL,
};

fn formats() -> Vec<FormatDescriptor> {
    vec![
        FormatDescriptor {
            id: "shp".to_string(),
            label: "ESRI Shapefile".to_string(),
            required_ext: vec!["shp".into(), "prj".into(), "dbf".into(), "shx".into()],
            optional_ext: vec!["xml".into(), "sld".into(), "cpg".into(), "cst".into()],
            source: vec!["upload".into()],
        },
        FormatDescriptor {
            id: "csv".to_string(),
            label: "CSV".to_string(),
            required_ext: vec!["csv".into()],
            optional_ext: vec!["sld".into(), "xml".into()],
            source: vec!["upload".into()],
        },
        FormatDescriptor {
            id: "gpkg".to_string(),
            label: "GeoPackage".to_string(),
            required_ext: vec!["gpkg".into()],
            optional_ext: vec![],
            source: vec!["upload".into()],
        },
    ]
}

fn added(name: &str) -> AddedFile {
    AddedFile::from_name(name, 1000, PathBuf::from(name))
}

fn file_entry(batch: &[PendingUpload], index: usize) -> &ingest_core::FileUpload {
    match &batch[index] {
        PendingUpload::File(file) => file,
        PendingUpload::Remote(_) => panic!("expected file entry at {index}"),
    }
}

#[test]
fn unknown_extension_is_unsupported() {
    ingest_logging::initialize_for_tests();
    let batch = ingest_files(Vec::new(), vec![(1, added("data.txt"))], &formats());
    let batch = validate_files(batch, &formats());
    let entry = file_entry(&batch, 0);
    assert!(!entry.supported);
    assert!(!entry.ready);
}

#[test]
fn optional_extension_alone_defers_commitment() {
    // `.sld` is optional in both the Shapefile and the CSV profile; on its
    // own the entry is supported but has made zero progress.
    let batch = ingest_files(Vec::new(), vec![(1, added("style.sld"))], &formats());
    let batch = validate_files(batch, &formats());
    let entry = file_entry(&batch, 0);
    assert!(entry.supported);
    assert!(!entry.ready);
    assert_eq!(entry.missing_extensions, vec![MISSING_ALL.to_string()]);
}

#[test]
fn sibling_file_merges_when_a_single_descriptor_fits() {
    let batch = ingest_files(Vec::new(), vec![(1, added("data.sld"))], &formats());
    let batch = ingest_files(batch, vec![(2, added("data.csv"))], &formats());
    assert_eq!(batch.len(), 1);
    let entry = file_entry(&batch, 0);
    assert_eq!(entry.id, 1);
    assert_eq!(entry.extensions, vec!["sld".to_string(), "csv".to_string()]);

    let batch = validate_files(batch, &formats());
    let entry = file_entry(&batch, 0);
    assert!(entry.supported);
    assert!(entry.ready);
    assert!(entry.missing_extensions.is_empty());
    // Present extensions reordered by the CSV descriptor's declared order.
    assert_eq!(entry.extensions, vec!["csv".to_string(), "sld".to_string()]);
}

#[test]
fn incompatible_extension_starts_a_second_entry() {
    // No single descriptor holds both `.sld` and `.gpkg`, so the same base
    // name splits into two entries.
    let batch = ingest_files(Vec::new(), vec![(1, added("data.sld"))], &formats());
    let batch = ingest_files(batch, vec![(2, added("data.gpkg"))], &formats());
    assert_eq!(batch.len(), 2);
    assert_eq!(file_entry(&batch, 0).extensions, vec!["sld".to_string()]);
    let second = file_entry(&batch, 1);
    assert_eq!(second.id, 2);
    assert_eq!(second.extensions, vec!["gpkg".to_string()]);
    assert!(second.supported);
}

#[test]
fn shapefile_batch_reports_missing_then_completes() {
    let new_files = vec![
        (1, added("roads.shp")),
        (2, added("roads.prj")),
        (3, added("roads.dbf")),
    ];
    let batch = ingest_files(Vec::new(), new_files, &formats());
    assert_eq!(batch.len(), 1);

    let batch = validate_files(batch, &formats());
    let entry = file_entry(&batch, 0);
    assert!(entry.supported);
    assert!(!entry.ready);
    assert_eq!(entry.missing_extensions, vec!["shx".to_string()]);

    let batch = ingest_files(batch, vec![(4, added("roads.shx"))], &formats());
    let batch = validate_files(batch, &formats());
    let entry = file_entry(&batch, 0);
    assert!(entry.ready);
    assert!(entry.missing_extensions.is_empty());
    assert_eq!(
        entry.extensions,
        vec![
            "shp".to_string(),
            "prj".to_string(),
            "dbf".to_string(),
            "shx".to_string()
        ]
    );
}

#[test]
fn re_added_extension_replaces_the_stored_file() {
    let batch = ingest_files(Vec::new(), vec![(1, added("data.csv"))], &formats());
    let replacement = AddedFile::from_name("data.csv", 2000, PathBuf::from("elsewhere/data.csv"));
    let batch = ingest_files(batch, vec![(2, replacement)], &formats());
    assert_eq!(batch.len(), 1);
    let entry = file_entry(&batch, 0);
    assert_eq!(entry.extensions, vec!["csv".to_string()]);
    assert_eq!(entry.files["csv"].size, 2000);
}

#[test]
fn uppercase_extensions_are_normalized() {
    let batch = ingest_files(Vec::new(), vec![(1, added("ROADS.SHP"))], &formats());
    let entry = file_entry(&batch, 0);
    assert_eq!(entry.extensions, vec!["shp".to_string()]);
    assert!(entry.supported);
}

#[test]
fn split_file_name_handles_edge_cases() {
    assert_eq!(
        split_file_name("data.SHP"),
        ("data".to_string(), "shp".to_string())
    );
    assert_eq!(
        split_file_name("noext"),
        ("noext".to_string(), String::new())
    );
    assert_eq!(
        split_file_name("archive.tar.gz"),
        ("archive.tar".to_string(), "gz".to_string())
    );
}

#[test]
fn size_labels_use_binary_units() {
    assert_eq!(size_label(1_000_000), "1 MB");
    assert_eq!(size_label(500_000), "489 KB");
}

#[test]
fn size_limit_applies_per_entry_not_per_batch() {
    let small = AddedFile::from_name("a.csv", 500_000, PathBuf::from("a.csv"));
    let also_small = AddedFile::from_name("b.csv", 700_000, PathBuf::from("b.csv"));
    let batch = ingest_files(Vec::new(), vec![(1, small), (2, also_small)], &formats());
    // 1.2 MB combined, but no single entry above 1 MB.
    assert!(!exceeds_size_limit(&batch, 1));

    let large = AddedFile::from_name("c.csv", 2_000_000, PathBuf::from("c.csv"));
    let batch = ingest_files(batch, vec![(3, large)], &formats());
    assert!(exceeds_size_limit(&batch, 1));
}
