use rateio_domain::{RoundingMode, SettlementContext, SettlementError};
use std::env;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const SCALE_VAR: &str = "RATEIO_SCALE";
pub const ROUNDING_VAR: &str = "RATEIO_ROUNDING";

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RATEIO_SCALE must be a non-negative integer, got '{0}'")]
    InvalidScale(String),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
}

/// Settlement settings for one interpreter run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterpreterConfig {
    pub context: SettlementContext,
}

impl InterpreterConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let scale = env::var(SCALE_VAR).ok();
        let rounding = env::var(ROUNDING_VAR).ok();
        Self::from_vars(scale.as_deref(), rounding.as_deref())
    }

    /// Builds the config from raw variable values; unset or blank values keep the defaults.
    pub fn from_vars(scale: Option<&str>, rounding: Option<&str>) -> Result<Self, ConfigError> {
        let mut context = SettlementContext::default();

        if let Some(raw) = scale.map(str::trim).filter(|raw| !raw.is_empty()) {
            context.scale = raw
                .parse()
                .map_err(|_| ConfigError::InvalidScale(raw.to_owned()))?;
        }
        if let Some(raw) = rounding.map(str::trim).filter(|raw| !raw.is_empty()) {
            context.rounding_mode = raw.parse::<RoundingMode>()?;
        }

        Ok(Self {
            context: context.validate()?,
        })
    }
}

/// Installs a stderr subscriber filtered by `RUST_LOG`.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
