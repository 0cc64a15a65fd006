use crate::config::Config;
use crate::extract::ExtractBudget;

/// Settings fixed for the duration of one batch run.
#[derive(Debug, Clone, Default)]
pub struct ImportConfig {
    pub budget: ExtractBudget,
}

impl From<&Config> for ImportConfig {
    fn from(config: &Config) -> Self {
        Self {
            budget: config.extract.budget(),
        }
    }
}
