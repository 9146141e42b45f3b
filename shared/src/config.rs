/// Accepted values of the `condition` query parameter.
pub const CONDITIONS: &[&str] = &["AND", "OR"];
/// Accepted values of the `sort_order` query parameter.
pub const SORT_DIRECTIONS: &[&str] = &["ASC", "DESC"];

/// Bounds and defaults applied to paging requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationPolicy {
    pub default_page: i64,
    pub min_page: i64,
    pub default_records_per_page: i64,
    pub min_records_per_page: i64,
    pub max_records_per_page: i64,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            default_page: 1,
            min_page: 1,
            default_records_per_page: 10,
            min_records_per_page: 1,
            max_records_per_page: 50,
        }
    }
}

/// Process-wide settings, loaded once and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix for absolute navigation links, e.g. `https://api.example.com`.
    pub domain: String,
    /// Service name, used by collaborators for cache-key namespacing.
    pub service_name: String,
    pub pagination: PaginationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            domain: "http://localhost:3001".to_string(),
            service_name: "tollgate".to_string(),
            pagination: PaginationPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(domain) = lookup("APP_DOMAIN") {
            let domain = domain.trim().trim_end_matches('/');
            if !domain.is_empty() {
                config.domain = domain.to_string();
            }
        }

        if let Some(name) = lookup("SERVICE_NAME") {
            if !name.trim().is_empty() {
                config.service_name = name.trim().to_string();
            }
        }

        if let Some(size) = lookup("PAGINATION_DEFAULT_RECORDS_PER_PAGE") {
            if let Ok(size) = size.parse::<i64>() {
                if size > 0 {
                    config.pagination.default_records_per_page = size;
                }
            }
        }

        if let Some(size) = lookup("PAGINATION_MAX_RECORDS_PER_PAGE") {
            if let Ok(size) = size.parse::<i64>() {
                if size >= config.pagination.min_records_per_page {
                    config.pagination.max_records_per_page = size;
                }
            }
        }

        tracing::info!(
            "Engine config loaded: domain={}, service={}, records_per_page={}..={} (default {})",
            config.domain,
            config.service_name,
            config.pagination.min_records_per_page,
            config.pagination.max_records_per_page,
            config.pagination.default_records_per_page
        );

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_lookup(|_| None);
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.pagination.default_page, 1);
        assert_eq!(config.pagination.default_records_per_page, 10);
        assert_eq!(config.pagination.max_records_per_page, 50);
    }

    #[test]
    fn test_overrides() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("APP_DOMAIN", "https://api.example.com/"),
            ("SERVICE_NAME", "catalog"),
            ("PAGINATION_MAX_RECORDS_PER_PAGE", "100"),
        ]));
        assert_eq!(config.domain, "https://api.example.com");
        assert_eq!(config.service_name, "catalog");
        assert_eq!(config.pagination.max_records_per_page, 100);
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let config = EngineConfig::from_lookup(lookup_from(&[
            ("PAGINATION_DEFAULT_RECORDS_PER_PAGE", "lots"),
            ("PAGINATION_MAX_RECORDS_PER_PAGE", "0"),
        ]));
        assert_eq!(config.pagination, PaginationPolicy::default());
    }
}
