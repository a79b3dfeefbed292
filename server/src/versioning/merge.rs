use serde_json::Value;
use shared_types::Configuration;
use std::collections::BTreeSet;

/// Top-level fields that are merged key by key instead of replaced.
pub const DEFAULT_DEEP_MERGE_FIELDS: [&str; 3] = ["roleNames", "messageTemplates", "listingTasks"];

/// Rules for combining a partial update with the current configuration.
///
/// Top-level keys from the patch overwrite the current document. Fields named
/// in the allow-list get a one-level-deep merge instead: their sub-keys are
/// combined, with the patch winning on collisions. Nothing below that level is
/// merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePolicy {
    deep_fields: BTreeSet<String>,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DEEP_MERGE_FIELDS)
    }
}

impl MergePolicy {
    pub fn new<I, S>(deep_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            deep_fields: deep_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated field list. Blank entries are ignored.
    pub fn from_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|field| !field.is_empty()),
        )
    }

    pub fn is_deep(&self, field: &str) -> bool {
        self.deep_fields.contains(field)
    }

    pub fn deep_fields(&self) -> impl Iterator<Item = &str> {
        self.deep_fields.iter().map(String::as_str)
    }

    pub fn merge(&self, mut current: Configuration, patch: Configuration) -> Configuration {
        for (field, incoming) in patch {
            let merged = match (current.remove(&field), incoming) {
                (Some(Value::Object(mut existing)), Value::Object(sub_keys))
                    if self.is_deep(&field) =>
                {
                    existing.extend(sub_keys);
                    Value::Object(existing)
                }
                (_, incoming) => incoming,
            };
            current.insert(field, merged);
        }
        current
    }
}
