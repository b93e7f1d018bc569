//! Application state for DocSign API

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use shared_crypto::KeystoreIdentity;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::{Config, KeystoreSource};
use crate::mailer::Mailer;
use crate::storage::ExportStore;

pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    /// Signing identity, decoded once at startup
    pub identity: Arc<KeystoreIdentity>,
    pub mailer: Mailer,
    pub exports: ExportStore,
    pub certificate_logo: Option<Arc<Vec<u8>>>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        tracing::info!("Connecting to database: {}", config.database_url);
        let db = connect(&config.database_url).await?;
        crate::db::run_migrations(&db).await?;

        let identity = Arc::new(load_identity(&config)?);
        let mailer = match &config.smtp {
            Some(smtp) => {
                tracing::info!(host = %smtp.host, port = smtp.port, "Using SMTP mail transport");
                Mailer::smtp(smtp)?
            }
            None => {
                tracing::warn!("SMTP_HOST not set, development mail is kept in the in-memory outbox");
                Mailer::outbox()
            }
        };
        let exports = ExportStore::new(&config.exports_dir, &config.public_base_url).await?;
        let certificate_logo = load_logo(&config).await.map(Arc::new);

        Ok(Self {
            db,
            config,
            identity,
            mailer,
            exports,
            certificate_logo,
        })
    }
}

async fn connect(database_url: &str) -> Result<SqlitePool> {
    // Each in-memory connection is its own database, so keep exactly one alive
    let pool = if database_url.contains(":memory:") || database_url.contains("mode=memory") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await?
    } else {
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?
    };
    Ok(pool)
}

fn load_identity(config: &Config) -> Result<KeystoreIdentity> {
    let identity = match &config.keystore {
        KeystoreSource::Inline(encoded) => {
            KeystoreIdentity::from_pkcs12_base64(encoded, &config.keystore_password)
                .context("decoding PFX_BASE64")?
        }
        KeystoreSource::File(path) => {
            let der = std::fs::read(path)
                .with_context(|| format!("reading keystore {}", path.display()))?;
            KeystoreIdentity::from_pkcs12(&der, &config.keystore_password)
                .with_context(|| format!("decoding keystore {}", path.display()))?
        }
        KeystoreSource::Missing if config.is_development() => {
            tracing::warn!(
                signer = %config.signer_name,
                "No keystore configured, signing with an ephemeral development identity"
            );
            KeystoreIdentity::ephemeral(&config.signer_name)?
        }
        KeystoreSource::Missing => bail!("a signing keystore is required outside development"),
    };
    tracing::info!(identity = ?identity, "Signing identity loaded");
    Ok(identity)
}

/// Certificate logo bytes; an unreadable logo is skipped
async fn load_logo(config: &Config) -> Option<Vec<u8>> {
    let path = config.certificate_logo_path.as_ref()?;
    match tokio::fs::read(path).await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Certificate logo unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn development_state_uses_ephemeral_identity_and_outbox() {
        let exports = tempfile::tempdir().unwrap();
        let config = Config {
            exports_dir: exports.path().to_path_buf(),
            ..Config::default()
        };
        let state = AppState::new(config).await.unwrap();
        assert!(state.certificate_logo.is_none());
        assert!(state.mailer.sent().await.is_empty());
        assert!(exports.path().exists());
    }

    #[tokio::test]
    async fn production_without_keystore_fails() {
        let exports = tempfile::tempdir().unwrap();
        let config = Config {
            exports_dir: exports.path().to_path_buf(),
            environment: crate::config::Environment::Production,
            ..Config::default()
        };
        assert!(AppState::new(config).await.is_err());
    }

    #[tokio::test]
    async fn production_never_falls_back_to_the_outbox() {
        let exports = tempfile::tempdir().unwrap();
        let config = Config {
            exports_dir: exports.path().to_path_buf(),
            environment: crate::config::Environment::Production,
            keystore: KeystoreSource::File(exports.path().join("signer.p12")),
            ..Config::default()
        };
        let err = AppState::new(config).await.err().unwrap();
        assert!(err.to_string().contains("SMTP_HOST"));
    }
}
