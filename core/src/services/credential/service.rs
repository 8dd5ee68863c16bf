//! Main credential service implementation

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::{AccessTokenClaims, ClaimValue};
use crate::domain::value_objects::CredentialPair;
use crate::errors::{DomainError, TokenError, ValidationError};
use crate::repositories::{RefreshTokenStore, UserDirectory};
use crate::services::clock::Clock;
use crate::services::token::{
    AccessTokenIssuer, ClaimsBuilder, ExtraClaims, RefreshTokenRotator, TokenServiceConfig,
};

/// Issues credential pairs at login and rotates them on refresh.
///
/// Roles are resolved from the user directory on every refresh, so role
/// changes take effect at the next refresh without a new login.
pub struct CredentialService<S: RefreshTokenStore, U: UserDirectory> {
    claims_builder: ClaimsBuilder,
    issuer: AccessTokenIssuer,
    rotator: RefreshTokenRotator<S>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<S: RefreshTokenStore, U: UserDirectory> CredentialService<S, U> {
    /// Creates a new credential service
    ///
    /// # Arguments
    ///
    /// * `store` - Refresh token persistence
    /// * `users` - Source of email, roles and account status
    /// * `clock` - Time source for every issued and validated token
    /// * `config` - Signing key, lifetimes and retention
    pub fn new(
        store: Arc<S>,
        users: Arc<U>,
        clock: Arc<dyn Clock>,
        config: &TokenServiceConfig,
    ) -> Result<Self, DomainError> {
        let issuer = AccessTokenIssuer::new(config, Arc::clone(&clock))?;
        let rotator = RefreshTokenRotator::new(store, config)?;

        Ok(Self {
            claims_builder: ClaimsBuilder::new(),
            issuer,
            rotator,
            users,
            clock,
        })
    }

    pub fn issuer(&self) -> &AccessTokenIssuer {
        &self.issuer
    }

    pub fn rotator(&self) -> &RefreshTokenRotator<S> {
        &self.rotator
    }

    /// Issue a credential pair for a user who just authenticated
    ///
    /// # Returns
    ///
    /// * `Ok(CredentialPair)` - Signed access token, raw refresh value and claim metadata
    /// * `Err(DomainError::Cancelled)` - Cancelled before the refresh token was committed
    pub async fn issue_for_login<R: AsRef<str>>(
        &self,
        user_id: Uuid,
        email: &str,
        roles: &[R],
        extra: Option<&ExtraClaims>,
        ip: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, DomainError> {
        if email.trim().is_empty() {
            return Err(ValidationError::RequiredField {
                field: "email".to_string(),
            }
            .into());
        }

        let now = self.clock.now();
        let built = self.claims_builder.build(user_id, email, roles, extra);
        let access = self.issuer.issue(&built.claims, now)?;
        let refresh = self.rotator.issue_initial(user_id, ip, now, cancel).await?;

        info!(
            user_id = %user_id,
            jti = %access.jti,
            roles = built.claims.roles().len(),
            "Credentials issued"
        );

        Ok(CredentialPair::new(
            access.token,
            refresh.raw_value,
            access.expires_at,
            built.metadata,
        ))
    }

    /// Exchange an Active refresh value for a new pair.
    ///
    /// The presented value is revoked in the same atomic batch that stores
    /// its successor. Extra attributes from the login are not carried over;
    /// use `refresh_with_access_token` for that.
    pub async fn refresh(
        &self,
        presented: &str,
        ip: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, DomainError> {
        self.refresh_inner(presented, None, ip, cancel)
            .await
            .map_err(log_refresh_failure)
    }

    /// Refresh and keep the extra attributes of the caller's last access token.
    ///
    /// The access token may be expired but must otherwise validate, and its
    /// subject must own the presented refresh value.
    pub async fn refresh_with_access_token(
        &self,
        presented: &str,
        access_token: &str,
        ip: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, DomainError> {
        let result = async {
            let previous = self.issuer.validate(access_token, true)?;
            self.refresh_inner(presented, Some(&previous), ip, cancel).await
        }
        .await;

        result.map_err(log_refresh_failure)
    }

    /// Revoke a refresh value without issuing a new pair (logout)
    pub async fn revoke(
        &self,
        presented: &str,
        ip: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<(), DomainError> {
        let now = self.clock.now();
        self.rotator.revoke(presented, ip, now, cancel).await?;
        Ok(())
    }

    /// Validate an access token, including its expiry
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims, DomainError> {
        self.issuer.validate(token, false)
    }

    async fn refresh_inner(
        &self,
        presented: &str,
        previous: Option<&AccessTokenClaims>,
        ip: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<CredentialPair, DomainError> {
        let now = self.clock.now();
        let current = self.rotator.validate_presented(presented, now).await?;
        let user_id = current.user_id();

        if let Some(previous) = previous {
            if previous.user_id()? != user_id {
                warn!(
                    user_id = %user_id,
                    token_id = %current.id(),
                    "Access token subject does not own the presented refresh token"
                );
                return Err(TokenError::InvalidClaims.into());
            }
        }

        let email = match self.resolve_active_email(user_id).await? {
            Some(email) => email,
            None => {
                warn!(
                    user_id = %user_id,
                    token_id = %current.id(),
                    "Refresh token owner no longer exists or is disabled"
                );
                return Err(DomainError::NotFound {
                    resource: format!("user {}", user_id),
                });
            }
        };
        let roles = self.users.resolve_roles(user_id).await?;

        let carried: Option<ExtraClaims> = previous.map(|claims| {
            claims
                .extra
                .iter()
                .map(|(k, v)| (k.clone(), Some(ClaimValue::String(v.clone()))))
                .collect()
        });

        let built = self
            .claims_builder
            .build(user_id, &email, roles.as_slice(), carried.as_ref());
        let access = self.issuer.issue(&built.claims, now)?;
        let outcome = self.rotator.rotate_record(current, ip, now, cancel).await?;

        info!(
            user_id = %user_id,
            jti = %access.jti,
            token_id = %outcome.record.id(),
            "Credentials refreshed"
        );

        Ok(CredentialPair::new(
            access.token,
            outcome.raw_value,
            access.expires_at,
            built.metadata,
        ))
    }

    async fn resolve_active_email(&self, user_id: Uuid) -> Result<Option<String>, DomainError> {
        if !self.users.is_active(user_id).await? {
            return Ok(None);
        }
        self.users.resolve_email(user_id).await
    }
}

fn log_refresh_failure(e: DomainError) -> DomainError {
    match &e {
        DomainError::Cancelled => info!("Refresh cancelled"),
        e if e.is_credential_failure() => warn!(kind = e.kind(), error = %e, "Refresh rejected"),
        DomainError::Validation { .. } | DomainError::ValidationErr(_) => {
            warn!(error = %e, "Refresh request invalid")
        }
        _ => error!(error = %e, "Refresh failed"),
    }
    e
}
