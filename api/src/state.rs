use std::sync::Arc;

use tollgate_shared::{EngineConfig, PaginationValidator, RuleRegistry, Validator};

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<EngineConfig>,
    pub validator: Validator,
    pub pagination: PaginationValidator,
}

impl AppState {
    /// Freeze `registry` and build both validators on top of it.
    pub fn new(config: EngineConfig, registry: RuleRegistry) -> Self {
        let validator = Validator::new(Arc::new(registry));
        let pagination = PaginationValidator::from_validator(&validator, config.pagination.clone());
        Self {
            config: Arc::new(config),
            validator,
            pagination,
        }
    }

    pub fn from_env() -> Self {
        Self::new(EngineConfig::from_env(), RuleRegistry::default())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(EngineConfig::default(), RuleRegistry::default())
    }
}
