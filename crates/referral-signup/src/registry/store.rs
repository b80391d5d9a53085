//! User and referral persistence.

use super::{generate_referral_code, ReferralCredit, ReferralEdge, User};
use crate::error::{ConflictKind, RegistryError};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};

const SELECT_USER_BY_PHONE: &str =
    "SELECT id, phone_number, referral_code, entries, created_at FROM users WHERE phone_number = ?";

const SELECT_USER_BY_CODE: &str =
    "SELECT id, phone_number, referral_code, entries, created_at FROM users WHERE referral_code = ?";

const INSERT_USER: &str = r#"
    INSERT INTO users (phone_number, referral_code, entries, created_at)
    VALUES (?, ?, 1, ?)
    RETURNING id, phone_number, referral_code, entries, created_at
"#;

const INCREMENT_ENTRIES: &str = r#"
    UPDATE users SET entries = entries + 1
    WHERE referral_code = ?
    RETURNING phone_number, entries
"#;

const INSERT_REFERRAL: &str = r#"
    INSERT INTO referrals (referrer_code, new_user_id, created_at)
    VALUES (?, ?, ?)
    RETURNING id, referrer_code, new_user_id, created_at
"#;

/// Users and referral edges stored in SQLite.
#[derive(Clone)]
pub struct UserRegistry {
    pool: SqlitePool,
    /// Referral codes tried per registration before giving up
    code_attempts: u32,
}

impl UserRegistry {
    /// Create a registry over an existing pool.
    pub fn new(pool: SqlitePool, code_attempts: u32) -> Self {
        Self {
            pool,
            code_attempts: code_attempts.max(1),
        }
    }

    /// Get a user by normalized phone number.
    pub async fn find_by_phone(&self, phone_number: &str) -> Result<Option<User>, RegistryError> {
        let user = sqlx::query_as::<_, User>(SELECT_USER_BY_PHONE)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Get a user by referral code (case-sensitive).
    pub async fn find_by_referral_code(&self, code: &str) -> Result<Option<User>, RegistryError> {
        let user = sqlx::query_as::<_, User>(SELECT_USER_BY_CODE)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a user with one entry.
    ///
    /// Fails with `Conflict` when the phone number or the code is taken.
    pub async fn create(&self, phone_number: &str, referral_code: &str) -> Result<User, RegistryError> {
        sqlx::query_as::<_, User>(INSERT_USER)
            .bind(phone_number)
            .bind(referral_code)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(RegistryError::classify)
    }

    /// Insert a user under a freshly generated referral code.
    pub async fn register(&self, phone_number: &str) -> Result<User, RegistryError> {
        self.register_with(phone_number, generate_referral_code).await
    }

    /// Insert a user, drawing codes from `next_code` until one is free.
    ///
    /// Code collisions are retried up to the configured attempt count; a
    /// phone number collision is returned immediately. Exhausting the
    /// attempts yields `Conflict(ReferralCode)`, which the API reports as a
    /// server error rather than a client conflict.
    pub async fn register_with<F>(
        &self,
        phone_number: &str,
        mut next_code: F,
    ) -> Result<User, RegistryError>
    where
        F: FnMut() -> String + Send,
    {
        for attempt in 1..=self.code_attempts {
            let code = next_code();
            match self.create(phone_number, &code).await {
                Err(RegistryError::Conflict(ConflictKind::ReferralCode)) => {
                    warn!(attempt, "Referral code collision, generating a new one");
                }
                result => return result,
            }
        }

        Err(RegistryError::Conflict(ConflictKind::ReferralCode))
    }

    /// Add one entry to the owner of `code`.
    ///
    /// Returns the updated count, or `None` when no user owns the code.
    pub async fn increment_entries(&self, code: &str) -> Result<Option<i64>, RegistryError> {
        let row: Option<(String, i64)> = sqlx::query_as(INCREMENT_ENTRIES)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(_, entries)| entries))
    }

    /// Record that `referrer_code` brought in `new_user_id`.
    pub async fn record_referral(
        &self,
        referrer_code: &str,
        new_user_id: i64,
    ) -> Result<ReferralEdge, RegistryError> {
        let edge = sqlx::query_as::<_, ReferralEdge>(INSERT_REFERRAL)
            .bind(referrer_code)
            .bind(new_user_id)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(edge)
    }

    /// Increment the referrer's entries and record the edge in one
    /// transaction.
    ///
    /// Returns `None` (and writes nothing) when no user owns the code.
    pub async fn credit_referral(
        &self,
        code: &str,
        new_user_id: i64,
    ) -> Result<Option<ReferralCredit>, RegistryError> {
        let mut tx = self.pool.begin().await?;

        // Write first so the transaction takes the write lock up front.
        let row: Option<(String, i64)> = sqlx::query_as(INCREMENT_ENTRIES)
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;

        let Some((referrer_phone, entries)) = row else {
            tx.rollback().await?;
            debug!(referral_code = %code, "No referrer owns this code");
            return Ok(None);
        };

        let edge = sqlx::query_as::<_, ReferralEdge>(INSERT_REFERRAL)
            .bind(code)
            .bind(new_user_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(ReferralCredit {
            referrer_phone,
            entries,
            edge,
        }))
    }

    /// List the referral edges credited to `code`, oldest first.
    pub async fn referrals_for(&self, code: &str) -> Result<Vec<ReferralEdge>, RegistryError> {
        let edges = sqlx::query_as::<_, ReferralEdge>(
            "SELECT id, referrer_code, new_user_id, created_at FROM referrals WHERE referrer_code = ? ORDER BY id",
        )
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        Ok(edges)
    }

    /// Get the number of signed-up users.
    pub async fn count(&self) -> Result<i64, RegistryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
