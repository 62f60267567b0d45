use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::formats::FormatDescriptor;
use crate::remote::{url_file_stem, RemoteUpload};

pub type UploadId = u64;

/// Sentinel stored in `missing_extensions` when an entry has made zero
/// progress toward any required extension. Distinguishes "nothing uploaded
/// yet" from "partially uploaded".
pub const MISSING_ALL: &str = "*";

/// A file selected by the user, not yet classified into a batch entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedFile {
    pub base_name: String,
    pub ext: String,
    pub file: FileHandle,
}

impl AddedFile {
    /// Builds an added file from a display name (`"data.shp"`), splitting
    /// off the extension.
    pub fn from_name(name: &str, size: u64, path: PathBuf) -> Self {
        let (base_name, ext) = split_file_name(name);
        Self {
            base_name,
            ext,
            file: FileHandle {
                name: name.to_string(),
                size,
                path,
            },
        }
    }
}

/// Handle to the binary content of one selected file. The transport reads
/// the bytes from `path` only at submit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub name: String,
    pub size: u64,
    pub path: PathBuf,
}

/// A pending file upload accumulating sibling extensions under one base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    pub id: UploadId,
    pub base_name: String,
    /// Extensions in accumulation order until `validate_files` reorders them
    /// by the matched descriptor's declared order.
    pub extensions: Vec<String>,
    pub files: BTreeMap<String, FileHandle>,
    pub supported: bool,
    pub ready: bool,
    pub missing_extensions: Vec<String>,
}

impl FileUpload {
    pub fn total_size_bytes(&self) -> u64 {
        self.files.values().map(|file| file.size).sum()
    }

    /// The file of the first accumulated extension.
    pub fn main_file(&self) -> Option<&FileHandle> {
        self.extensions.first().and_then(|ext| self.files.get(ext))
    }

    pub fn display_name(&self) -> String {
        match self.main_file() {
            Some(file) => file.name.clone(),
            None => self.base_name.clone(),
        }
    }
}

/// One entry of the upload batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingUpload {
    File(FileUpload),
    Remote(RemoteUpload),
}

impl PendingUpload {
    pub fn id(&self) -> UploadId {
        match self {
            PendingUpload::File(file) => file.id,
            PendingUpload::Remote(remote) => remote.id,
        }
    }

    pub fn supported(&self) -> bool {
        match self {
            PendingUpload::File(file) => file.supported,
            PendingUpload::Remote(remote) => remote.supported,
        }
    }

    pub fn ready(&self) -> bool {
        match self {
            PendingUpload::File(file) => file.ready,
            PendingUpload::Remote(remote) => remote.ready,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            PendingUpload::File(file) => file.display_name(),
            PendingUpload::Remote(remote) => url_file_stem(&remote.url)
                .unwrap_or_else(|| remote.url.clone()),
        }
    }
}

/// Splits `"data.SHP"` into `("data", "shp")`. Extensions are normalized to
/// ASCII lowercase; a name without a dot has an empty extension.
pub fn split_file_name(name: &str) -> (String, String) {
    match name.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() => (base.to_string(), ext.to_ascii_lowercase()),
        _ => (name.to_string(), String::new()),
    }
}

/// Folds newly selected files into the batch.
///
/// A new file merges into an existing entry when the base names match and
/// the union of the entry's accumulated extensions with the new one still
/// fits inside some single format descriptor. Otherwise it starts a new
/// entry, supported iff any descriptor knows the extension. Commitment to a
/// specific descriptor is deferred to `validate_files`.
pub fn ingest_files(
    mut batch: Vec<PendingUpload>,
    new_files: Vec<(UploadId, AddedFile)>,
    formats: &[FormatDescriptor],
) -> Vec<PendingUpload> {
    for (id, added) in new_files {
        let ext = added.ext.to_ascii_lowercase();
        let compatible = batch.iter_mut().find_map(|entry| match entry {
            PendingUpload::File(file)
                if file.base_name == added.base_name
                    && fits_single_descriptor(&file.extensions, &ext, formats) =>
            {
                Some(file)
            }
            _ => None,
        });
        match compatible {
            Some(file) => {
                if !file.extensions.contains(&ext) {
                    file.extensions.push(ext.clone());
                }
                file.files.insert(ext, added.file);
                file.supported = true;
            }
            None => {
                let supported = formats.iter().any(|format| format.matches_extension(&ext));
                let mut files = BTreeMap::new();
                files.insert(ext.clone(), added.file);
                batch.push(PendingUpload::File(FileUpload {
                    id,
                    base_name: added.base_name,
                    extensions: vec![ext],
                    files,
                    supported,
                    ready: false,
                    missing_extensions: Vec::new(),
                }));
            }
        }
    }
    batch
}

fn fits_single_descriptor(present: &[String], ext: &str, formats: &[FormatDescriptor]) -> bool {
    formats.iter().any(|format| {
        format.matches_extension(ext) && format.contains_all(present)
    })
}

/// Computes readiness for every still-supported file entry.
///
/// An entry whose accumulated extensions no longer fit any descriptor is
/// permanently rejected; it does not recover when sibling files are removed
/// later. Remote entries pass through untouched.
pub fn validate_files(
    mut batch: Vec<PendingUpload>,
    formats: &[FormatDescriptor],
) -> Vec<PendingUpload> {
    for entry in &mut batch {
        let PendingUpload::File(file) = entry else {
            continue;
        };
        if !file.supported {
            file.ready = false;
            file.missing_extensions.clear();
            continue;
        }
        match formats.iter().find(|format| format.contains_all(&file.extensions)) {
            None => {
                file.supported = false;
                file.ready = false;
                file.missing_extensions.clear();
            }
            Some(format) => {
                // Reorder present extensions by the descriptor's declared
                // order; display only.
                let ordered: Vec<String> = format
                    .all_extensions()
                    .filter(|ext| file.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
                    .map(|ext| ext.to_ascii_lowercase())
                    .collect();
                file.extensions = ordered;
                let missing: Vec<String> = format
                    .required_ext
                    .iter()
                    .filter(|req| !file.extensions.iter().any(|e| e.eq_ignore_ascii_case(req)))
                    .map(|req| req.to_ascii_lowercase())
                    .collect();
                file.ready = missing.is_empty();
                file.missing_extensions =
                    if !missing.is_empty() && missing.len() == format.required_ext.len() {
                        vec![MISSING_ALL.to_string()]
                    } else {
                        missing
                    };
            }
        }
    }
    batch
}

const MEBIBYTE: f64 = 1024.0 * 1024.0;

/// Human readable size: megabytes above 0.9 MB, kilobytes below.
pub fn size_label(bytes: u64) -> String {
    let mb = bytes as f64 / MEBIBYTE;
    if mb > 0.9 {
        format!("{} MB", mb.round() as u64)
    } else {
        format!("{} KB", (bytes as f64 / 1024.0).ceil() as u64)
    }
}

/// True when any single file entry's accumulated files exceed `max_mb`.
pub fn exceeds_size_limit(uploads: &[PendingUpload], max_mb: u64) -> bool {
    uploads.iter().any(|upload| match upload {
        PendingUpload::File(file) => file.total_size_bytes() as f64 / MEBIBYTE > max_mb as f64,
        PendingUpload::Remote(_) => false,
    })
}
