//! The ordered list of indexable fields a worker processes.

use std::sync::Arc;

use trindex_common::{Result, error::Error};

/// Name prefix marking a field that must never be indexed.
pub const NO_INDEX_PREFIX: &str = "NOINDEX";

/// Ordered, immutable list of field names for one processing task.
///
/// The position of a name in the catalog is the field index used in emitted keys.
/// A field whose name starts with [`NO_INDEX_PREFIX`] keeps its index (so the indices
/// of the following fields stay stable) but contributes nothing to the record stream.
///
/// The catalog is built once per worker and shared read-only; cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldCatalog {
    fields: Arc<[String]>,
}

impl FieldCatalog {
    /// Creates a catalog from the ordered field names.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the list is empty, contains an empty name,
    /// contains duplicates, or has more fields than a field slot can address.
    pub fn new<I, S>(names: I) -> Result<FieldCatalog>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields = names.into_iter().map(Into::into).collect::<Vec<String>>();
        if fields.is_empty() {
            return Err(Error::invalid_config(
                "fields",
                "field catalog must name at least one field",
            ));
        }
        if fields.len() > u32::MAX as usize {
            return Err(Error::invalid_config(
                "fields",
                format!("too many fields: {}", fields.len()),
            ));
        }
        for (i, name) in fields.iter().enumerate() {
            if name.is_empty() {
                return Err(Error::invalid_config(
                    "fields",
                    format!("field #{i} has an empty name"),
                ));
            }
            if fields[..i].contains(name) {
                return Err(Error::invalid_config(
                    "fields",
                    format!("duplicate field name '{name}'"),
                ));
            }
        }
        Ok(FieldCatalog {
            fields: fields.into(),
        })
    }

    /// Number of fields, including the ones marked as not indexed.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn name(&self, field: usize) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Returns `true` if the field at `field` exists and is not marked do-not-index.
    pub fn is_indexed(&self, field: usize) -> bool {
        self.name(field).is_some_and(|name| !is_no_index(name))
    }

    /// Iterates `(field index, field name)` over the indexed fields only, in catalog order.
    pub fn indexed_fields(&self) -> impl Iterator<Item = (usize, &str)> {
        self.fields
            .iter()
            .enumerate()
            .filter(|(_, name)| !is_no_index(name))
            .map(|(i, name)| (i, name.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

fn is_no_index(name: &str) -> bool {
    name.starts_with(NO_INDEX_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indexed_fields() {
        let catalog = FieldCatalog::new(["title", "NOINDEX_raw", "body"]).unwrap();
        assert_eq!(catalog.len(), 3);
        assert!(catalog.is_indexed(0));
        assert!(!catalog.is_indexed(1));
        assert!(catalog.is_indexed(2));
        assert!(!catalog.is_indexed(3));

        let indexed: Vec<_> = catalog.indexed_fields().collect();
        assert_eq!(indexed, vec![(0, "title"), (2, "body")]);
        assert_eq!(catalog.position("body"), Some(2));
        assert_eq!(catalog.name(1), Some("NOINDEX_raw"));
    }

    #[test]
    fn test_invalid_catalogs() {
        assert!(FieldCatalog::new(Vec::<String>::new()).is_err());
        assert!(FieldCatalog::new(["title", ""]).is_err());

        let err = FieldCatalog::new(["title", "title"]).unwrap_err();
        assert!(err.is_configuration());
    }
}
