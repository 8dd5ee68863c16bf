//! MySQL implementation of the RefreshTokenStore trait.
//!
//! Rows hold only the SHA-256 hash of a refresh value. `commit_atomic` runs a
//! batch inside one transaction; revocation and successor linking are
//! conditional updates, so a zero row count means another writer got there
//! first and the whole batch is rolled back. A batch picked as a deadlock
//! victim is rolled back by InnoDB and replayed, up to `DEADLOCK_ATTEMPTS`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};
use uuid::Uuid;

use st_core::domain::entities::{RefreshTokenParts, RefreshTokenRecord, Revocation, RevocationReason};
use st_core::domain::value_objects::AuditInfo;
use st_core::errors::DomainError;
use st_core::repositories::{CommitReport, RecordPredicate, RefreshTokenStore, StoreOperation};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_id, token_hash, issued_at, expires_at,
           created_by_ip, created_by_user_id,
           revoked_at, revoked_by_ip, revocation_reason,
           replaced_by_token_hash
    FROM refresh_tokens
"#;

/// SQLSTATE reported for deadlocks
const SERIALIZATION_FAILURE: &str = "40001";

/// Tries per batch when InnoDB keeps choosing it as the deadlock victim
const DEADLOCK_ATTEMPTS: u32 = 3;

/// Why a batch attempt did not commit
#[derive(Debug)]
enum BatchError {
    /// Rolled back by the server as a deadlock victim; safe to replay
    Deadlock(String),
    /// Conditional update lost, uniqueness violated, or storage failure
    Failed(DomainError),
}

impl From<BatchError> for DomainError {
    fn from(e: BatchError) -> Self {
        match e {
            BatchError::Deadlock(message) => DomainError::Conflict {
                message: format!("refresh token batch deadlocked: {}", message),
            },
            BatchError::Failed(e) => e,
        }
    }
}

/// MySQL implementation of RefreshTokenStore
pub struct MySqlRefreshTokenStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlRefreshTokenStore {
    /// Create a new MySQL refresh token store
    ///
    /// # Arguments
    /// * `pool` - MySQL connection pool from SQLx
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshTokenRecord
    fn row_to_record(row: &MySqlRow) -> Result<RefreshTokenRecord, DomainError> {
        let id: String = row.try_get("id").map_err(column_err("id"))?;
        let user_id: String = row.try_get("user_id").map_err(column_err("user_id"))?;
        let created_by_user_id: Option<String> = row
            .try_get("created_by_user_id")
            .map_err(column_err("created_by_user_id"))?;
        let revoked_at: Option<DateTime<Utc>> =
            row.try_get("revoked_at").map_err(column_err("revoked_at"))?;
        let revocation_reason: Option<String> = row
            .try_get("revocation_reason")
            .map_err(column_err("revocation_reason"))?;

        let revocation = match revoked_at {
            Some(revoked_at) => {
                let reason = revocation_reason
                    .as_deref()
                    .ok_or_else(|| DomainError::Internal {
                        message: format!("Revoked refresh token {} has no reason", id),
                    })?
                    .parse::<RevocationReason>()?;
                Some(Revocation::new(
                    reason,
                    revoked_at,
                    row.try_get("revoked_by_ip").map_err(column_err("revoked_by_ip"))?,
                ))
            }
            None => None,
        };

        RefreshTokenRecord::restore(RefreshTokenParts {
            id: parse_uuid(&id)?,
            user_id: parse_uuid(&user_id)?,
            token_hash: row.try_get("token_hash").map_err(column_err("token_hash"))?,
            issued_at: row.try_get("issued_at").map_err(column_err("issued_at"))?,
            expires_at: row.try_get("expires_at").map_err(column_err("expires_at"))?,
            audit: AuditInfo::new(
                row.try_get("created_by_ip").map_err(column_err("created_by_ip"))?,
                created_by_user_id.as_deref().map(parse_uuid).transpose()?,
            ),
            revocation,
            replaced_by_token_hash: row
                .try_get("replaced_by_token_hash")
                .map_err(column_err("replaced_by_token_hash"))?,
        })
    }

    async fn apply(
        tx: &mut Transaction<'_, MySql>,
        operation: StoreOperation,
        report: &mut CommitReport,
    ) -> Result<(), BatchError> {
        match operation {
            StoreOperation::Add(record) => {
                insert_query(&record)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| batch_err(e, insert_err))?;
                report.added += 1;
            }
            StoreOperation::MarkRevoked { id, revocation } => {
                let result = revoke_query(id, &revocation)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| batch_err(e, query_err("revoke refresh token")))?;
                if result.rows_affected() == 0 {
                    return Err(BatchError::Failed(DomainError::Conflict {
                        message: format!("refresh token {} missing or already revoked", id),
                    }));
                }
            }
            StoreOperation::LinkReplacement { id, replaced_by_token_hash } => {
                let result = link_query(id, &replaced_by_token_hash)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| batch_err(e, query_err("link replacement token")))?;
                if result.rows_affected() == 0 {
                    return Err(BatchError::Failed(DomainError::Conflict {
                        message: format!("refresh token {} missing or already replaced", id),
                    }));
                }
            }
            StoreOperation::RemoveWhere { user_id, predicate } => {
                let result = remove_query(user_id, predicate)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| batch_err(e, query_err("remove refresh tokens")))?;
                report.removed += result.rows_affected() as usize;
            }
        }
        Ok(())
    }

    /// One attempt at a batch inside its own transaction
    async fn try_commit(&self, operations: Vec<StoreOperation>) -> Result<CommitReport, BatchError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BatchError::Failed(query_err("begin transaction")(e)))?;
        let mut report = CommitReport::default();

        for operation in operations {
            if let Err(e) = Self::apply(&mut tx, operation, &mut report).await {
                if let Err(rollback) = tx.rollback().await {
                    tracing::error!(error = %rollback, "Failed to roll back refresh token batch");
                }
                return Err(e);
            }
        }

        tx.commit()
            .await
            .map_err(|e| batch_err(e, query_err("commit transaction")))?;
        Ok(report)
    }
}

type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, sqlx::mysql::MySqlArguments>;

fn insert_query(record: &RefreshTokenRecord) -> MySqlQuery<'_> {
    let revocation = record.revocation();
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (
            id, user_id, token_hash, issued_at, expires_at,
            created_by_ip, created_by_user_id,
            revoked_at, revoked_by_ip, revocation_reason,
            replaced_by_token_hash
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id().to_string())
    .bind(record.user_id().to_string())
    .bind(record.token_hash())
    .bind(record.issued_at())
    .bind(record.expires_at())
    .bind(record.audit().created_by_ip.as_deref())
    .bind(record.audit().created_by_user_id.map(|u| u.to_string()))
    .bind(revocation.map(|r| r.revoked_at))
    .bind(revocation.and_then(|r| r.revoked_by_ip.as_deref()))
    .bind(revocation.map(|r| r.reason.as_str()))
    .bind(record.replaced_by_token_hash())
}

fn revoke_query(id: Uuid, revocation: &Revocation) -> MySqlQuery<'_> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked_at = ?, revoked_by_ip = ?, revocation_reason = ?
        WHERE id = ? AND revoked_at IS NULL
        "#,
    )
    .bind(revocation.revoked_at)
    .bind(revocation.revoked_by_ip.as_deref())
    .bind(revocation.reason.as_str())
    .bind(id.to_string())
}

fn link_query(id: Uuid, replaced_by_token_hash: &str) -> MySqlQuery<'_> {
    sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET replaced_by_token_hash = ?
        WHERE id = ? AND replaced_by_token_hash IS NULL
        "#,
    )
    .bind(replaced_by_token_hash)
    .bind(id.to_string())
}

fn remove_query(user_id: Uuid, predicate: RecordPredicate) -> MySqlQuery<'static> {
    match predicate {
        RecordPredicate::Inactive { as_of, issued_before } => sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE user_id = ?
                AND issued_at <= ?
                AND (revoked_at IS NOT NULL OR expires_at <= ?)
            "#,
        )
        .bind(user_id.to_string())
        .bind(issued_before)
        .bind(as_of),
    }
}

fn parse_uuid(value: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|e| DomainError::Internal {
        message: format!("Invalid UUID in refresh_tokens: {}", e),
    })
}

fn column_err(column: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("Failed to get {}: {}", column, e),
    }
}

fn query_err(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::Internal {
        message: format!("Failed to {}: {}", action, e),
    }
}

fn is_deadlock(sqlstate: Option<&str>) -> bool {
    sqlstate == Some(SERIALIZATION_FAILURE)
}

fn batch_err(e: sqlx::Error, otherwise: impl FnOnce(sqlx::Error) -> DomainError) -> BatchError {
    if let sqlx::Error::Database(db) = &e {
        if is_deadlock(db.code().as_deref()) {
            return BatchError::Deadlock(db.to_string());
        }
    }
    BatchError::Failed(otherwise(e))
}

fn insert_err(e: sqlx::Error) -> DomainError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => DomainError::Conflict {
            message: "token hash already exists".to_string(),
        },
        _ => DomainError::Internal {
            message: format!("Failed to save refresh token: {}", e),
        },
    }
}

#[async_trait]
impl RefreshTokenStore for MySqlRefreshTokenStore {
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, DomainError> {
        let query = format!("{} WHERE token_hash = ? LIMIT 1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_err("find refresh token"))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<RefreshTokenRecord>, DomainError> {
        let query = format!("{} WHERE user_id = ? ORDER BY issued_at DESC", SELECT_COLUMNS);

        let rows = sqlx::query(&query)
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(query_err("find user refresh tokens"))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn add(&self, record: RefreshTokenRecord) -> Result<RefreshTokenRecord, DomainError> {
        insert_query(&record)
            .execute(&self.pool)
            .await
            .map_err(insert_err)?;

        Ok(record)
    }

    async fn mark_revoked(&self, id: Uuid, revocation: &Revocation) -> Result<bool, DomainError> {
        let result = revoke_query(id, revocation)
            .execute(&self.pool)
            .await
            .map_err(query_err("revoke refresh token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn link_replacement(&self, id: Uuid, replaced_by_token_hash: &str) -> Result<bool, DomainError> {
        let result = link_query(id, replaced_by_token_hash)
            .execute(&self.pool)
            .await
            .map_err(query_err("link replacement token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_where(&self, user_id: Uuid, predicate: RecordPredicate) -> Result<usize, DomainError> {
        let result = remove_query(user_id, predicate)
            .execute(&self.pool)
            .await
            .map_err(query_err("remove refresh tokens"))?;

        Ok(result.rows_affected() as usize)
    }

    async fn commit_atomic(&self, operations: Vec<StoreOperation>) -> Result<CommitReport, DomainError> {
        let mut attempt = 1;
        loop {
            match self.try_commit(operations.clone()).await {
                Err(BatchError::Deadlock(message)) if attempt < DEADLOCK_ATTEMPTS => {
                    tracing::warn!(attempt, error = %message, "Refresh token batch deadlocked, replaying");
                    attempt += 1;
                }
                result => return result.map_err(DomainError::from),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_serialization_failures_are_replayed() {
        assert!(is_deadlock(Some("40001")));
        assert!(!is_deadlock(Some("23000")));
        assert!(!is_deadlock(None));
    }

    #[test]
    fn test_exhausted_deadlock_surfaces_as_conflict() {
        let e = DomainError::from(BatchError::Deadlock("Deadlock found".to_string()));
        assert!(matches!(e, DomainError::Conflict { .. }));

        let lost = DomainError::from(BatchError::Failed(DomainError::Conflict {
            message: "already revoked".to_string(),
        }));
        assert!(matches!(lost, DomainError::Conflict { message } if message == "already revoked"));
    }
}
