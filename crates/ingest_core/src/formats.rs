use std::collections::BTreeMap;

use serde::Deserialize;

/// Describes which file extensions make up one complete resource format.
///
/// Loaded from configuration once per session and treated as immutable.
/// `required_ext` is non-empty and its order is significant for display.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormatDescriptor {
    pub id: String,
    pub label: String,
    pub required_ext: Vec<String>,
    #[serde(default)]
    pub optional_ext: Vec<String>,
    /// Actions this format participates in (e.g. "upload").
    #[serde(default)]
    pub source: Vec<String>,
}

impl FormatDescriptor {
    /// Required extensions followed by optional ones, order preserved.
    pub fn all_extensions(&self) -> impl Iterator<Item = &str> {
        self.required_ext
            .iter()
            .chain(self.optional_ext.iter())
            .map(String::as_str)
    }

    pub fn matches_extension(&self, ext: &str) -> bool {
        self.all_extensions().any(|e| e.eq_ignore_ascii_case(ext))
    }

    /// True when every extension in `exts` belongs to this format.
    pub fn contains_all(&self, exts: &[String]) -> bool {
        exts.iter().all(|ext| self.matches_extension(ext))
    }
}

/// Static lookup of upload formats per resource kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FormatCatalog {
    #[serde(flatten)]
    by_resource_kind: BTreeMap<String, Vec<FormatDescriptor>>,
}

impl FormatCatalog {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Formats for `resource_kind` whose declared actions intersect
    /// `actions`. An empty `actions` filter matches everything.
    pub fn supported_formats(
        &self,
        resource_kind: &str,
        actions: &[&str],
    ) -> Vec<&FormatDescriptor> {
        self.by_resource_kind
            .get(resource_kind)
            .map(|formats| {
                formats
                    .iter()
                    .filter(|format| {
                        actions.is_empty()
                            || format.source.iter().any(|s| actions.contains(&s.as_str()))
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}
