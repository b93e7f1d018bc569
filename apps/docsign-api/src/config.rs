//! Runtime configuration loaded from the environment

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_SMTP_FROM: &str = "noreply@quickcash.local";
const DEFAULT_SIGNER_NAME: &str = "QuickCash Document Signing";
const DEVELOPMENT_JWT_SECRET: &str = "development-secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Where the signing keystore comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeystoreSource {
    /// Base64-encoded PKCS#12 bundle held in the environment
    Inline(String),
    File(PathBuf),
    /// No keystore; development falls back to an ephemeral identity
    Missing,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub from: String,
    pub user: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub exports_dir: PathBuf,
    /// Prefix for artifact URLs handed back to clients
    pub public_base_url: String,
    pub jwt_secret: String,
    pub keystore: KeystoreSource,
    pub keystore_password: String,
    /// Common name of the generated development identity
    pub signer_name: String,
    pub certificate_logo_path: Option<PathBuf>,
    pub environment: Environment,
    /// `None` routes mail to the in-memory outbox, development only
    pub smtp: Option<SmtpConfig>,
    /// Take the client address from `X-Forwarded-For` instead of the socket peer
    pub trust_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: "sqlite::memory:".to_string(),
            exports_dir: PathBuf::from("exports"),
            public_base_url: format!("http://localhost:{}", DEFAULT_PORT),
            jwt_secret: DEVELOPMENT_JWT_SECRET.to_string(),
            keystore: KeystoreSource::Missing,
            keystore_password: String::new(),
            signer_name: DEFAULT_SIGNER_NAME.to_string(),
            certificate_logo_path: None,
            environment: Environment::Development,
            smtp: None,
            trust_proxy: false,
        }
    }
}

impl Config {
    /// Read the configuration from process environment variables
    ///
    /// | Variable                | Default                        |
    /// |-------------------------|--------------------------------|
    /// | `PORT`                  | `3001`                         |
    /// | `DATABASE_URL`          | SQLite file in the data dir    |
    /// | `EXPORTS_DIR`           | `exports`                      |
    /// | `PUBLIC_BASE_URL`       | `http://localhost:<PORT>`      |
    /// | `JWT_SECRET`            | required outside development   |
    /// | `PFX_BASE64`/`PFX_PATH` | required outside development   |
    /// | `PFX_PASSWORD`          | empty                          |
    /// | `SIGNER_NAME`           | `QuickCash Document Signing`   |
    /// | `CERTIFICATE_LOGO_PATH` | none                           |
    /// | `APP_ENV`               | `development`                  |
    /// | `SMTP_HOST`             | required outside development   |
    /// | `TRUST_PROXY`           | `false`                        |
    pub fn from_env() -> Result<Self> {
        let environment = Environment::from_env_value(var("APP_ENV").as_deref());

        let port = match var("PORT") {
            Some(value) => value
                .parse()
                .with_context(|| format!("PORT is not a valid port: {}", value))?,
            None => DEFAULT_PORT,
        };

        let jwt_secret = match (var("JWT_SECRET"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Development) => DEVELOPMENT_JWT_SECRET.to_string(),
            (None, Environment::Production) => bail!("JWT_SECRET must be set in production"),
        };

        let keystore = match (var("PFX_BASE64"), var("PFX_PATH")) {
            (Some(encoded), _) => KeystoreSource::Inline(encoded),
            (None, Some(path)) => KeystoreSource::File(PathBuf::from(path)),
            (None, None) => KeystoreSource::Missing,
        };
        let config = Self {
            port,
            database_url: var("DATABASE_URL").unwrap_or_else(default_database_url),
            exports_dir: var("EXPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("exports")),
            public_base_url: var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", port)),
            jwt_secret,
            keystore,
            keystore_password: var("PFX_PASSWORD").unwrap_or_default(),
            signer_name: var("SIGNER_NAME").unwrap_or_else(|| DEFAULT_SIGNER_NAME.to_string()),
            certificate_logo_path: var("CERTIFICATE_LOGO_PATH").map(PathBuf::from),
            environment,
            smtp: smtp_from_env()?,
            trust_proxy: match var("TRUST_PROXY") {
                Some(value) => parse_flag(&value)
                    .with_context(|| format!("TRUST_PROXY is not a boolean: {}", value))?,
                None => false,
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Settings production cannot run without
    ///
    /// The in-memory outbox keeps every message for the life of the process,
    /// so a production server must deliver over SMTP.
    pub fn validate(&self) -> Result<()> {
        if self.is_development() {
            return Ok(());
        }
        if self.keystore == KeystoreSource::Missing {
            bail!("PFX_BASE64 or PFX_PATH must be set in production");
        }
        if self.smtp.is_none() {
            bail!("SMTP_HOST must be set in production");
        }
        Ok(())
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Non-empty environment variable
fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn smtp_from_env() -> Result<Option<SmtpConfig>> {
    let Some(host) = var("SMTP_HOST") else {
        return Ok(None);
    };
    let port = match var("SMTP_PORT") {
        Some(value) => value
            .parse()
            .with_context(|| format!("SMTP_PORT is not a valid port: {}", value))?,
        None => DEFAULT_SMTP_PORT,
    };
    Ok(Some(SmtpConfig {
        host,
        port,
        from: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_SMTP_FROM.to_string()),
        user: var("SMTP_USER"),
        password: var("SMTP_PASSWORD"),
    }))
}

fn default_database_url() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docsign-api");
    std::fs::create_dir_all(&data_dir).ok();
    format!("sqlite:{}/docsign.db?mode=rwc", data_dir.display())
}

/// Get platform-specific data directory
mod dirs {
    use std::path::PathBuf;

    pub fn data_dir() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }
        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            None
        }
    }
}
