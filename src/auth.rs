//! Admin credential checks and bearer-token issuance.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};

use crate::db::{self, Pool};

/// Verifies admin credentials and the tokens issued for them.
#[async_trait]
pub trait AdminAuthenticator: Send + Sync {
    /// Returns a fresh token on success, `None` when the credentials do not match.
    async fn login(&self, username: &str, password: &str) -> Result<Option<String>>;

    /// Whether `token` belongs to a live admin session.
    async fn verify(&self, token: &str) -> Result<bool>;
}

/// Checks credentials against the `admins` table and keeps sessions in
/// `admin_sessions`.
#[derive(Debug, Clone)]
pub struct StoredAdminAuth {
    pool: Pool,
    ttl: Duration,
}

impl StoredAdminAuth {
    pub fn new(pool: Pool, ttl_minutes: u64) -> Self {
        // Capped at one year.
        let minutes = ttl_minutes.min(60 * 24 * 365) as i64;
        Self {
            pool,
            ttl: Duration::minutes(minutes),
        }
    }
}

#[async_trait]
impl AdminAuthenticator for StoredAdminAuth {
    #[instrument(skip_all, fields(username = %username))]
    async fn login(&self, username: &str, password: &str) -> Result<Option<String>> {
        let Some(admin) = db::find_admin_by_username(&self.pool, username).await? else {
            warn!("login for unknown admin");
            return Ok(None);
        };

        let password = password.to_owned();
        let stored = admin.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &stored))
            .await
            .context("password check task failed")?
            .context("stored admin password hash is malformed")?;
        if !matches {
            warn!("admin password mismatch");
            return Ok(None);
        }

        let token = generate_token("adm");
        let expires_at = Utc::now() + self.ttl;
        db::insert_admin_session(&self.pool, &token, admin.id, expires_at).await?;
        info!(admin_id = admin.id, %expires_at, "admin session issued");
        Ok(Some(token))
    }

    async fn verify(&self, token: &str) -> Result<bool> {
        let admin_id = db::find_live_admin_session(&self.pool, token, Utc::now()).await?;
        Ok(admin_id.is_some())
    }
}

/// Work factor for stored admin passwords.
pub const PASSWORD_COST: u32 = bcrypt::DEFAULT_COST;

/// Salted bcrypt hash of an admin password.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).context("failed to hash password")
}

/// Hex SHA-256 of an opaque secret, used when only a digest may be stored.
pub fn sha256_hex(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}

/// 32 random bytes, URL-safe base64, prefixed with `prefix_`.
pub fn generate_token(prefix: &str) -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{prefix}_{}", URL_SAFE_NO_PAD.encode(bytes))
}
