//! Configuration module
//!
//! Process-level settings read from the environment: listening port,
//! environment name and the two upload directories. Upload allow-sets and the
//! size ceiling are fixed and live in the processing crate's `UploadPolicy`.

use std::env;
use std::path::PathBuf;

const SERVER_PORT: u16 = 3000;
const REQUEST_TIMEOUT_SECS: u64 = 60;
const UPLOAD_DIR: &str = "uploads";
const SPOOL_DIR: &str = "temp";
const PUBLIC_UPLOAD_PREFIX: &str = "/uploads";

/// Base server configuration
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub environment: String,
    pub request_timeout_secs: u64,
}

/// Filesystem layout for uploads
#[derive(Clone, Debug)]
pub struct UploadDirsConfig {
    /// Final artifacts, served read-only
    pub upload_dir: PathBuf,
    /// Transient request spool, never served
    pub spool_dir: PathBuf,
    /// URL prefix the upload directory is served under
    pub public_prefix: String,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub base: BaseConfig,
    pub uploads: UploadDirsConfig,
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            server_port: env_number("PORT", SERVER_PORT)?,
            environment,
            request_timeout_secs: env_number("REQUEST_TIMEOUT_SECS", REQUEST_TIMEOUT_SECS)?,
        };

        let public_prefix = env::var("PUBLIC_UPLOAD_PREFIX")
            .unwrap_or_else(|_| PUBLIC_UPLOAD_PREFIX.to_string());

        let uploads = UploadDirsConfig {
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(UPLOAD_DIR)),
            spool_dir: env::var("SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(SPOOL_DIR)),
            public_prefix: normalize_prefix(&public_prefix),
        };

        Ok(Config { base, uploads })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.server_port == 0 {
            return Err(anyhow::anyhow!("PORT cannot be 0"));
        }

        if self.base.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECS cannot be 0"));
        }

        if self.uploads.upload_dir == self.uploads.spool_dir {
            return Err(anyhow::anyhow!(
                "UPLOAD_DIR and SPOOL_DIR must be different directories; the spool is never served"
            ));
        }

        if self.uploads.public_prefix == "/" {
            return Err(anyhow::anyhow!(
                "PUBLIC_UPLOAD_PREFIX cannot be the site root"
            ));
        }

        Ok(())
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.base.environment
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.base.request_timeout_secs
    }

    pub fn upload_dir(&self) -> &PathBuf {
        &self.uploads.upload_dir
    }

    pub fn spool_dir(&self) -> &PathBuf {
        &self.uploads.spool_dir
    }

    pub fn public_prefix(&self) -> &str {
        &self.uploads.public_prefix
    }
}

/// Ensure a leading slash and no trailing slash ("uploads/" -> "/uploads").
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    format!("/{}", trimmed)
}

/// Numeric variable with a default when unset; a value that does not parse
/// is an error.
fn env_number<T: std::str::FromStr>(name: &str, default: T) -> Result<T, anyhow::Error> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", name)),
        Err(_) => Ok(default),
    }
}
