//! Configuration validation
//!
//! Validates critical configuration values at startup to catch misconfigurations early.

use anyhow::Result;
use picguard_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    config.validate()?;

    let env_var = std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .ok();

    if config.is_production() && env_var.is_none() {
        tracing::warn!(
            "Production mode detected but ENVIRONMENT/APP_ENV not set - error details may leak"
        );
    }

    if config.upload_dir().starts_with(config.spool_dir())
        || config.spool_dir().starts_with(config.upload_dir())
    {
        return Err(anyhow::anyhow!(
            "UPLOAD_DIR and SPOOL_DIR must not be nested inside each other"
        ));
    }

    Ok(())
}
