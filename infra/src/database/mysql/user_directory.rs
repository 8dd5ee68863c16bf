//! MySQL implementation of the UserDirectory trait.
//!
//! Reads the `users` and `user_roles` tables owned by the account subsystem.

use async_trait::async_trait;
use sqlx::MySqlPool;
use uuid::Uuid;

use st_core::errors::DomainError;
use st_core::repositories::UserDirectory;

/// MySQL implementation of UserDirectory
pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn query_err(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("Failed to {}: {}", action, e),
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn resolve_roles(&self, user_id: Uuid) -> Result<Vec<String>, DomainError> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = ?
            ORDER BY granted_at, role
            "#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(query_err("resolve user roles"))
    }

    async fn resolve_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError> {
        sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ? LIMIT 1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err("resolve user email"))
    }

    async fn is_active(&self, user_id: Uuid) -> Result<bool, DomainError> {
        let active = sqlx::query_scalar::<_, bool>("SELECT is_active FROM users WHERE id = ? LIMIT 1")
            .bind(user_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err("check user status"))?;

        Ok(active.unwrap_or(false))
    }
}
