use url::Url;

use crate::batch::{PendingUpload, UploadId};

/// A pending upload pointing at an external resource by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpload {
    pub id: UploadId,
    pub url: String,
    /// File extension of the remote resource, derived from the URL path
    /// when it carries one, otherwise picked manually.
    pub extension: String,
    pub service_type: String,
    /// Set once the user edited the entry; validation issues are only
    /// displayed from that point on.
    pub edited: bool,
    pub supported: bool,
    pub ready: bool,
    pub validation: RemoteValidation,
}

impl RemoteUpload {
    pub fn new(id: UploadId, url: impl Into<String>, service_type: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            extension: url_extension(&url).unwrap_or_default(),
            id,
            url,
            service_type: service_type.into(),
            edited: false,
            supported: false,
            ready: false,
            validation: RemoteValidation::default(),
        }
    }

    /// Applies a URL edit: the extension is re-derived from the new URL
    /// (cleared when the URL carries none, so a stale pick never survives
    /// a URL change).
    pub fn edit_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
        self.extension = url_extension(&self.url).unwrap_or_default();
        self.edited = true;
    }

    /// Manual extension pick, for URLs that carry no extension themselves.
    pub fn edit_extension(&mut self, extension: impl Into<String>) {
        self.extension = extension.into().to_ascii_lowercase();
        self.edited = true;
    }

    pub fn edit_service_type(&mut self, service_type: impl Into<String>) {
        self.service_type = service_type.into();
        self.edited = true;
    }

    /// True when the URL path itself names an extension; the manual pick
    /// is disabled in that case.
    pub fn has_url_extension(&self) -> bool {
        url_extension(&self.url).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RemoteValidation {
    pub duplicate_url: bool,
    pub valid_url: bool,
    pub extension_supported: bool,
    pub service_type_supported: bool,
}

/// Optional whitelists for remote entries. A missing list is an open
/// policy: every value of that dimension is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RemotePolicy {
    pub extensions: Option<Vec<String>>,
    pub service_types: Option<Vec<String>>,
}

/// Reason a remote entry is not eligible for submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteIssue {
    InvalidUrl,
    UnsupportedExtension,
    UnsupportedServiceType,
    DuplicateUrl,
}

/// Remote uploads must point outside the application: non-empty, not a
/// relative path, and a well-formed absolute URL.
pub fn is_valid_remote_url(url: &str) -> bool {
    !url.is_empty() && !url.starts_with('/') && Url::parse(url).is_ok()
}

/// Recomputes validation state for every remote entry in the batch.
///
/// Duplicate detection is first-occurrence-wins: of any group of identical
/// URLs exactly the first keeps `supported` eligibility. Both whitelist
/// checks follow the policy's open-when-missing rule. Pure function of its
/// input; file entries pass through untouched.
pub fn validate_remote_entries(
    mut batch: Vec<PendingUpload>,
    policy: &RemotePolicy,
) -> Vec<PendingUpload> {
    let urls: Vec<String> = batch
        .iter()
        .filter_map(|entry| match entry {
            PendingUpload::Remote(remote) => Some(remote.url.clone()),
            PendingUpload::File(_) => None,
        })
        .collect();

    let mut remote_index = 0;
    for entry in &mut batch {
        let PendingUpload::Remote(remote) = entry else {
            continue;
        };
        let duplicate_url = urls.iter().filter(|url| **url == remote.url).count() > 1
            && urls.iter().position(|url| *url == remote.url) != Some(remote_index);
        let valid_url = is_valid_remote_url(&remote.url);
        let extension_supported = match &policy.extensions {
            None => true,
            Some(extensions) => extensions.iter().any(|value| *value == remote.extension),
        };
        let service_type_supported = match &policy.service_types {
            None => true,
            Some(types) => types.iter().any(|value| *value == remote.service_type),
        };
        remote.validation = RemoteValidation {
            duplicate_url,
            valid_url,
            extension_supported,
            service_type_supported,
        };
        remote.supported =
            !duplicate_url && valid_url && extension_supported && service_type_supported;
        // Remote uploads have no partial-file concept.
        remote.ready = remote.supported;
        remote_index += 1;
    }
    batch
}

/// Maps a rejected remote entry to its display reason. `None` when the
/// entry is supported. Priority mirrors the inline badge order: a broken
/// URL outranks an unknown extension, which outranks an unknown service
/// type, which outranks a duplicate.
pub fn remote_issue(remote: &RemoteUpload) -> Option<RemoteIssue> {
    if remote.supported {
        return None;
    }
    if !remote.validation.valid_url {
        return Some(RemoteIssue::InvalidUrl);
    }
    if !remote.validation.extension_supported {
        return Some(RemoteIssue::UnsupportedExtension);
    }
    if !remote.validation.service_type_supported {
        return Some(RemoteIssue::UnsupportedServiceType);
    }
    if remote.validation.duplicate_url {
        return Some(RemoteIssue::DuplicateUrl);
    }
    Some(RemoteIssue::InvalidUrl)
}

/// Last path segment of the URL minus its extension, used as the display
/// and title name for remote entries.
pub fn url_file_stem(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    let stem = match segment.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => segment,
    };
    Some(stem.to_string())
}

/// Extension named by the URL's last path segment, lowercased; `None` when
/// the URL is unparseable or its path carries no extension.
pub fn url_extension(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.filter(|s| !s.is_empty()).next_back()?;
    match segment.rsplit_once('.') {
        Some((base, ext)) if !base.is_empty() && !ext.is_empty() => {
            Some(ext.to_ascii_lowercase())
        }
        _ => None,
    }
}
