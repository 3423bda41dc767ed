//! Diagnostic catalog: the immutable table of descriptors.
//!
//! The catalog is built once, validated, and shared read-only by every
//! analysis. Ids are unique among primary descriptors; a descriptor may
//! reuse an id only by naming the primary it aliases.

mod builtin;
mod descriptor;

pub use builtin::{descriptors as builtin_descriptors, ids};
pub use descriptor::{help_uri, is_valid_id, DiagnosticDescriptor, Severity, HELP_URI_BASE, ID_PREFIX};

use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Catalog defects. All of them are fatal at start-up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("no descriptor registered for id {0}")]
    Missing(String),
    #[error("invalid descriptor id {0:?} (expected LC followed by four digits)")]
    InvalidId(String),
    #[error("descriptor id {id} is already used by {existing}; declare {name} as an alias to share it")]
    DuplicateId {
        id: String,
        existing: String,
        name: String,
    },
    #[error("descriptor name {0} is registered twice")]
    DuplicateName(String),
    #[error("descriptor {name} aliases unknown primary {target}")]
    UnknownAliasTarget { name: String, target: String },
    #[error("descriptor {name} ({id}) aliases {target} which has id {target_id}")]
    AliasIdMismatch {
        name: String,
        id: String,
        target: String,
        target_id: String,
    },
}

/// A validated set of descriptors.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    descriptors: Vec<DiagnosticDescriptor>,
    /// id -> index of the primary descriptor
    by_id: HashMap<&'static str, usize>,
    by_name: HashMap<&'static str, usize>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full built-in catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_descriptors(builtin::descriptors())
    }

    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = DiagnosticDescriptor>,
    {
        let mut catalog = Self::new();
        for descriptor in descriptors {
            catalog.register(descriptor)?;
        }
        Ok(catalog)
    }

    /// Add a descriptor.
    ///
    /// Aliases must be registered after the primary they name.
    pub fn register(&mut self, descriptor: DiagnosticDescriptor) -> Result<(), CatalogError> {
        if !is_valid_id(descriptor.id) {
            return Err(CatalogError::InvalidId(descriptor.id.to_string()));
        }
        if self.by_name.contains_key(descriptor.name) {
            return Err(CatalogError::DuplicateName(descriptor.name.to_string()));
        }

        match descriptor.alias_of {
            Some(target) => {
                let primary = self
                    .by_name
                    .get(target)
                    .map(|&i| &self.descriptors[i])
                    .filter(|d| !d.is_alias())
                    .ok_or_else(|| CatalogError::UnknownAliasTarget {
                        name: descriptor.name.to_string(),
                        target: target.to_string(),
                    })?;
                if primary.id != descriptor.id {
                    return Err(CatalogError::AliasIdMismatch {
                        name: descriptor.name.to_string(),
                        id: descriptor.id.to_string(),
                        target: target.to_string(),
                        target_id: primary.id.to_string(),
                    });
                }
            }
            None => {
                if let Some(&existing) = self.by_id.get(descriptor.id) {
                    return Err(CatalogError::DuplicateId {
                        id: descriptor.id.to_string(),
                        existing: self.descriptors[existing].name.to_string(),
                        name: descriptor.name.to_string(),
                    });
                }
            }
        }

        let index = self.descriptors.len();
        if !descriptor.is_alias() {
            self.by_id.insert(descriptor.id, index);
        }
        self.by_name.insert(descriptor.name, index);
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// The primary descriptor registered under `id`.
    pub fn lookup(&self, id: &str) -> Result<&DiagnosticDescriptor, CatalogError> {
        self.get(id)
            .ok_or_else(|| CatalogError::Missing(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<&DiagnosticDescriptor> {
        self.by_id.get(id).map(|&i| &self.descriptors[i])
    }

    /// Look a descriptor up by name; this is the only way to reach an alias.
    pub fn lookup_named(&self, name: &str) -> Option<&DiagnosticDescriptor> {
        self.by_name.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// All descriptors, aliases included, in registration order.
    pub fn descriptors(&self) -> &[DiagnosticDescriptor] {
        &self.descriptors
    }

    /// Primary descriptors in registration order.
    pub fn primaries(&self) -> impl Iterator<Item = &DiagnosticDescriptor> {
        self.descriptors.iter().filter(|d| !d.is_alias())
    }

    /// Aliases sharing `id` with its primary.
    pub fn aliases_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a DiagnosticDescriptor> + 'a {
        self.descriptors
            .iter()
            .filter(move |d| d.is_alias() && d.id == id)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

static CATALOG: OnceCell<Arc<Catalog>> = OnceCell::new();

/// The process-wide built-in catalog, created on first use.
///
/// A catalog defect is returned on every call; nothing is cached until the
/// catalog validates.
pub fn init() -> Result<Arc<Catalog>, CatalogError> {
    CATALOG
        .get_or_try_init(|| Catalog::builtin().map(Arc::new))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(id: &'static str, name: &'static str) -> DiagnosticDescriptor {
        DiagnosticDescriptor {
            id,
            name,
            category: "Design",
            severity: Severity::Info,
            enabled_by_default: true,
            title: "t",
            message: "m",
            description: "d",
            alias_of: None,
        }
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.contains(ids::ERROR_IN_RULE));
        assert!(catalog.contains(ids::EXPLICITLY_SET_RUN_TRIGGER));
        assert_eq!(catalog.lookup("LC0040").unwrap().name, "ExplicitlySetRunTrigger");
        assert_eq!(catalog.lookup("LC0006").unwrap().severity, Severity::Error);
        assert!(!catalog.lookup("LC0007").unwrap().enabled_by_default);
        assert!(catalog.descriptors().iter().all(|d| d.category == "Design"));
    }

    #[test]
    fn test_primary_ids_are_unique() {
        let catalog = Catalog::builtin().unwrap();
        let mut ids: Vec<_> = catalog.primaries().map(|d| d.id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        // LC0000 through LC0044.
        assert_eq!(total, 45);
    }

    #[test]
    fn test_aliases_are_reachable_by_name() {
        let catalog = Catalog::builtin().unwrap();
        let alias = catalog.lookup_named("ZeroEnumValueReservedForEmpty").unwrap();
        assert_eq!(alias.id, "LC0040");
        assert_eq!(alias.alias_of, Some("ExplicitlySetRunTrigger"));
        assert_eq!(catalog.aliases_of("LC0041").count(), 2);
        assert_eq!(catalog.aliases_of("LC0044").count(), 1);
    }

    #[test]
    fn test_unaliased_duplicate_id_is_rejected() {
        let err = Catalog::from_descriptors([descriptor("LC0001", "A"), descriptor("LC0001", "B")])
            .unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateId { .. }));
    }

    #[test]
    fn test_alias_rules() {
        let mut catalog = Catalog::new();
        catalog.register(descriptor("LC0001", "A")).unwrap();

        let dangling = DiagnosticDescriptor {
            alias_of: Some("Nope"),
            ..descriptor("LC0001", "B")
        };
        assert!(matches!(
            catalog.register(dangling),
            Err(CatalogError::UnknownAliasTarget { .. })
        ));

        let mismatched = DiagnosticDescriptor {
            alias_of: Some("A"),
            ..descriptor("LC0002", "C")
        };
        assert!(matches!(
            catalog.register(mismatched),
            Err(CatalogError::AliasIdMismatch { .. })
        ));

        let ok = DiagnosticDescriptor {
            alias_of: Some("A"),
            ..descriptor("LC0001", "D")
        };
        catalog.register(ok).unwrap();
        assert_eq!(catalog.lookup("LC0001").unwrap().name, "A");
        assert!(matches!(
            catalog.register(descriptor("LC0003", "A")),
            Err(CatalogError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_missing_and_invalid_ids() {
        let catalog = Catalog::new();
        assert_eq!(
            catalog.lookup("LC9999").unwrap_err(),
            CatalogError::Missing("LC9999".to_string())
        );
        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.register(descriptor("XX1", "A")),
            Err(CatalogError::InvalidId(_))
        ));
    }

    #[test]
    fn test_init_returns_shared_instance() {
        let a = init().unwrap();
        let b = init().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
