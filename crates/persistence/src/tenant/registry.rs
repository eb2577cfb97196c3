//! The set of tenants known at startup.

use std::collections::HashSet;

use tracing::info;

use super::id::TenantId;
use crate::error::ConfigError;

/// Immutable set of known tenant identifiers.
///
/// Built once from configuration; there are no mutation operations. Changing
/// the tenant topology requires a restart, so readers never need to be
/// synchronized against it. Iteration follows configuration order.
///
/// # Examples
///
/// ```
/// use tenantry_persistence::tenant::TenantRegistry;
///
/// let registry = TenantRegistry::new(["company-x", "company-y"]).unwrap();
/// assert!(registry.contains("company-x"));
/// assert!(!registry.contains("unknown"));
///
/// assert!(TenantRegistry::new(Vec::<String>::new()).is_err());
/// assert!(TenantRegistry::new(["a", "a"]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TenantRegistry {
    ordered: Vec<TenantId>,
    members: HashSet<TenantId>,
}

impl TenantRegistry {
    /// Builds the registry, failing on an empty list, a blank identifier or a
    /// duplicate identifier.
    pub fn new<I, T>(names: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<TenantId>,
    {
        let mut ordered = Vec::new();
        let mut members = HashSet::new();

        for name in names {
            let tenant_id = name.into();
            if tenant_id.is_blank() {
                return Err(ConfigError::BlankTenantId);
            }
            if !members.insert(tenant_id.clone()) {
                return Err(ConfigError::DuplicateTenant { tenant_id });
            }
            ordered.push(tenant_id);
        }

        if ordered.is_empty() {
            return Err(ConfigError::EmptyTenantList);
        }

        info!(tenants = ?ordered, "Tenant registry initialized");
        Ok(Self { ordered, members })
    }

    /// Returns `true` if the identifier belongs to a known tenant.
    pub fn contains(&self, tenant_id: &str) -> bool {
        self.members.contains(tenant_id)
    }

    /// Looks up the registered identifier matching `tenant_id`.
    pub fn get(&self, tenant_id: &str) -> Option<&TenantId> {
        self.members.get(tenant_id)
    }

    /// Iterates over the tenants in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &TenantId> {
        self.ordered.iter()
    }

    /// Number of registered tenants.
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    /// Always `false`; a registry cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_exact() {
        let registry = TenantRegistry::new(["company-x", "company-y"]).unwrap();
        assert!(registry.contains("company-x"));
        assert!(registry.contains("company-y"));
        assert!(!registry.contains("Company-X"));
        assert!(!registry.contains("company-x "));
        assert!(!registry.contains(""));
    }

    #[test]
    fn test_preserves_order() {
        let registry = TenantRegistry::new(["b", "a", "c"]).unwrap();
        let names: Vec<_> = registry.iter().map(TenantId::as_str).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn test_empty_list_rejected() {
        let result = TenantRegistry::new(Vec::<&str>::new());
        assert!(matches!(result, Err(ConfigError::EmptyTenantList)));
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = TenantRegistry::new(["company-x", "company-y", "company-x"]);
        match result {
            Err(ConfigError::DuplicateTenant { tenant_id }) => {
                assert_eq!(tenant_id.as_str(), "company-x");
            }
            other => panic!("expected duplicate error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_rejected() {
        let result = TenantRegistry::new(["company-x", " "]);
        assert!(matches!(result, Err(ConfigError::BlankTenantId)));
    }

    #[test]
    fn test_get_returns_registered_id() {
        let registry = TenantRegistry::new([String::from("company-x")]).unwrap();
        assert_eq!(registry.get("company-x"), Some(&TenantId::new("company-x")));
        assert_eq!(registry.get("company-z"), None);
    }
}
