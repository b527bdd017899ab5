//! Per-namespace metadata field declarations.

use crate::{Error, Result};
use std::collections::BTreeSet;

/// Field names a query hit already uses for its own data.
///
/// Metadata is flattened next to these on output, so a metadata field with
/// one of these names would shadow the hit's identity or score.
pub const RESERVED_FIELDS: [&str; 3] = ["id", "distance", "vector"];

/// The declared set of document fields persisted and returned as metadata.
///
/// Fixed when a vector storage is constructed. Fields outside the set are
/// dropped on upsert and never requested from the backend on query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaFieldSet {
    fields: BTreeSet<String>,
}

impl MetaFieldSet {
    /// Creates a field set, rejecting reserved names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any field is in [`RESERVED_FIELDS`]
    /// or is empty.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for field in fields {
            let field = field.into();
            if field.is_empty() {
                return Err(Error::InvalidInput(
                    "metadata field names must not be empty".to_string(),
                ));
            }
            if RESERVED_FIELDS.contains(&field.as_str()) {
                return Err(Error::InvalidInput(format!(
                    "metadata field '{field}' collides with a reserved hit field"
                )));
            }
            set.insert(field);
        }
        Ok(Self { fields: set })
    }

    /// Returns true if the field is declared.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Returns the declared fields in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    /// Returns the declared fields as owned strings (backend output fields).
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.fields.iter().cloned().collect()
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
