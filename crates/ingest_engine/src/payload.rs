use ingest_core::{url_file_stem, PendingUpload};

/// Where a request-body field takes its value from. Each variant is a pure
/// function of the upload entry; unresolvable sources are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSource {
    /// A fixed value, e.g. `action: "upload"`.
    Literal(String),
    /// Name of the entry's main file (first accumulated extension).
    MainFileName,
    /// The remote entry's URL.
    Url,
    /// Display title inferred from the main file or the URL path.
    Title,
    /// The remote entry's extension (from the URL or a manual pick).
    Extension,
    /// The remote entry's resolved service type.
    ServiceType,
}

impl FieldSource {
    fn resolve(&self, upload: &PendingUpload) -> Option<String> {
        match self {
            FieldSource::Literal(value) => Some(value.clone()),
            FieldSource::MainFileName => match upload {
                PendingUpload::File(file) => file.main_file().map(|f| f.name.clone()),
                PendingUpload::Remote(_) => None,
            },
            FieldSource::Url => match upload {
                PendingUpload::Remote(remote) => Some(remote.url.clone()),
                PendingUpload::File(_) => None,
            },
            FieldSource::Title => match upload {
                PendingUpload::File(file) => Some(file.display_name()),
                PendingUpload::Remote(remote) => url_file_stem(&remote.url),
            },
            FieldSource::Extension => match upload {
                PendingUpload::Remote(remote) if !remote.extension.is_empty() => {
                    Some(remote.extension.clone())
                }
                _ => None,
            },
            FieldSource::ServiceType => match upload {
                PendingUpload::Remote(remote) => Some(remote.service_type.clone()),
                PendingUpload::File(_) => None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyField {
    pub name: String,
    pub source: FieldSource,
}

impl BodyField {
    pub fn new(name: impl Into<String>, source: FieldSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }
}

/// Strategy table mapping the upload variant to its body-field builders.
/// File contents are not listed here; the transport appends one
/// `{ext}_file` part per accumulated extension.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BodyConfig {
    pub file: Vec<BodyField>,
    pub remote: Vec<BodyField>,
}

impl BodyConfig {
    /// Resolves the text fields for one entry.
    pub fn fields_for(&self, upload: &PendingUpload) -> Vec<(String, String)> {
        let table = match upload {
            PendingUpload::File(_) => &self.file,
            PendingUpload::Remote(_) => &self.remote,
        };
        table.iter()
            .filter_map(|field| {
                field
                    .source
                    .resolve(upload)
                    .map(|value| (field.name.clone(), value))
            })
            .collect()
    }
}
