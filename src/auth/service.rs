//! Auth orchestrator: composes the identity verifier, account resolver,
//! credential minter and session store into the user-facing flows.
//!
//! Every collaborator arrives through the constructor; there is no ambient
//! registry. All session and upstream failures collapse to a single
//! generic unauthorized value before leaving this module.

use std::sync::Arc;

use crate::db::{Database, NewAccount, Origin, ResolveError, Role, Session};
use crate::jwt::JwtConfig;
use crate::kakao::{ExternalIdentity, KakaoClient};

use super::errors::AuthError;

/// Tokens returned from a successful login.
#[derive(Debug, Clone)]
pub struct LoginTokens {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct AuthService {
    db: Database,
    jwt: Arc<JwtConfig>,
    kakao: Arc<KakaoClient>,
    refresh_ttl_secs: u64,
}

impl AuthService {
    pub fn new(
        db: Database,
        jwt: Arc<JwtConfig>,
        kakao: Arc<KakaoClient>,
        refresh_ttl_secs: u64,
    ) -> Self {
        Self {
            db,
            jwt,
            kakao,
            refresh_ttl_secs,
        }
    }

    /// Login with an authorization code from the provider redirect.
    pub async fn login_with_code(
        &self,
        code: &str,
        device: &str,
    ) -> Result<LoginTokens, AuthError> {
        let provider_token = self.kakao.exchange_code(code).await?;
        let identity = self.kakao.fetch_identity(&provider_token).await?;
        self.login(identity, device).await
    }

    /// Login with a provider access token the client already holds.
    pub async fn login_with_token(
        &self,
        provider_token: &str,
        device: &str,
    ) -> Result<LoginTokens, AuthError> {
        let identity = self.kakao.fetch_identity(provider_token).await?;
        self.login(identity, device).await
    }

    async fn login(
        &self,
        identity: ExternalIdentity,
        device: &str,
    ) -> Result<LoginTokens, AuthError> {
        let account = self
            .db
            .accounts()
            .resolve_or_create(&NewAccount {
                email: &identity.email,
                origin: Origin::Kakao,
                role: Role::User,
                nickname: &identity.nickname,
                gender: identity.gender.as_deref(),
                age_range: identity.age_range.as_deref(),
                birthday: identity.birthday.as_deref(),
            })
            .await
            .map_err(|e| match e {
                ResolveError::Provisioning => AuthError::Provisioning,
                ResolveError::Database(e) => AuthError::Database(e),
            })?;

        let access = self.jwt.mint_access(account.id, account.role)?;
        let session = self
            .db
            .sessions()
            .create(account.id, device, self.refresh_ttl_secs)
            .await?;

        Ok(LoginTokens {
            access_token: access.token,
            refresh_token: session.token,
        })
    }

    /// Mint a fresh access credential against a live refresh session.
    /// The refresh token itself is left unchanged.
    pub async fn new_access_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let session = self.require_live(refresh_token).await?;
        let account = self
            .db
            .accounts()
            .get_by_id(session.account_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        let access = self.jwt.mint_access(account.id, account.role)?;
        Ok(access.token)
    }

    /// Rotate a live refresh session: the old token dies, a new one for the
    /// same account and device is returned. A stale or reused token never
    /// produces a new session.
    pub async fn rotate_refresh_token(&self, refresh_token: &str) -> Result<String, AuthError> {
        let session = self
            .db
            .sessions()
            .rotate(refresh_token, self.refresh_ttl_secs)
            .await?
            .ok_or(AuthError::Unauthorized)?;
        Ok(session.token)
    }

    /// Revoke one session. Idempotent: revoking an absent token succeeds.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.db.sessions().revoke(refresh_token).await?;
        Ok(())
    }

    /// Revoke every session of the presenting session's own account. The
    /// target account is never taken from the request.
    pub async fn logout_all(&self, refresh_token: &str) -> Result<u64, AuthError> {
        let session = self.require_live(refresh_token).await?;
        Ok(self.db.sessions().revoke_all(session.account_id).await?)
    }

    /// Device descriptors of the caller's live sessions.
    pub async fn active_devices(&self, refresh_token: &str) -> Result<Vec<String>, AuthError> {
        let session = self.require_live(refresh_token).await?;
        Ok(self
            .db
            .sessions()
            .list_live_devices(session.account_id)
            .await?)
    }

    async fn require_live(&self, refresh_token: &str) -> Result<Session, AuthError> {
        self.db
            .sessions()
            .find_live(refresh_token)
            .await?
            .ok_or(AuthError::Unauthorized)
    }
}
