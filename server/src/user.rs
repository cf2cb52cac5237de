use chrono::{DateTime, Utc};
use color_eyre::eyre::eyre;
use sqlx::{postgres::PgPool, FromRow};
use tracing::{error, info};
use uuid::Uuid;

use crate::password;

/// An account allowed into the admin panel
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A login session, referenced by the private session cookie
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    /// Unique session ID (used in cookies)
    pub id: Uuid,
    pub admin_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Whether [Admin::upsert_with_password] created the account or reset its password
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminUpsert {
    Created,
    PasswordReset,
}

impl Admin {
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> color_eyre::Result<Option<Admin>> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Failed to load admin {}: {:?}", id, e);
                eyre!("Database error loading admin: {}", e)
            })
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> color_eyre::Result<Option<Admin>> {
        sqlx::query_as::<_, Admin>("SELECT * FROM admins WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Failed to load admin by email: {:?}", e);
                eyre!("Database error loading admin: {}", e)
            })
    }

    /// Creates the admin, or replaces the password when the email already exists
    pub async fn upsert_with_password(
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> color_eyre::Result<(Admin, AdminUpsert)> {
        let email = normalize_email(email);
        let password_hash = password::new_hash(password.to_string()).await?;

        let existing = Self::get_by_email(pool, &email).await?;

        let admin = sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email)
            DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(&email)
        .bind(&password_hash)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!("Failed to save admin {}: {:?}", email, e);
            eyre!("Database error saving admin: {}", e)
        })?;

        let outcome = if existing.is_some() {
            info!("Reset password for admin {}", admin.id);
            AdminUpsert::PasswordReset
        } else {
            info!("Created admin {}", admin.id);
            AdminUpsert::Created
        };

        Ok((admin, outcome))
    }

    pub async fn verify_password(&self, password: &str) -> color_eyre::Result<bool> {
        password::verify_password(password.to_string(), self.password_hash.clone()).await
    }
}

impl Session {
    /// Create a new session for an admin
    pub async fn create(pool: &PgPool, admin_id: Uuid, duration_days: i64) -> color_eyre::Result<Session> {
        let expires_at = Utc::now() + chrono::Duration::days(duration_days);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (admin_id, expires_at)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(admin_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            error!("Failed to create session for admin {}: {:?}", admin_id, e);
            eyre!("Database error creating session: {}", e)
        })?;

        info!("Created session {} for admin {}", session.id, admin_id);
        Ok(session)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> color_eyre::Result<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Failed to load session {}: {:?}", id, e);
                eyre!("Database error loading session: {}", e)
            })
    }

    /// Active and not yet expired
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at > now
    }

    pub async fn invalidate(&self, pool: &PgPool) -> color_eyre::Result<()> {
        sqlx::query("UPDATE sessions SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(self.id)
            .execute(pool)
            .await
            .map_err(|e| {
                error!("Failed to invalidate session {}: {:?}", self.id, e);
                eyre!("Database error invalidating session: {}", e)
            })?;

        info!("Invalidated session {}", self.id);
        Ok(())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(is_active: bool, expires_in: chrono::Duration) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            admin_id: Uuid::new_v4(),
            expires_at: now + expires_in,
            is_active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_session_validity() {
        let now = Utc::now();

        assert!(session(true, chrono::Duration::days(1)).is_valid_at(now));
        assert!(!session(false, chrono::Duration::days(1)).is_valid_at(now));
        assert!(!session(true, chrono::Duration::minutes(-5)).is_valid_at(now));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Admin@Example.COM "), "admin@example.com");
    }
}
