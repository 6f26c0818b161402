use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{
    domain::{AuthUser, Identity},
    protocol::{LoginRequest, SignupRequest},
};
use storage::{keys, Storage};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::{backend::AuthBackend, error::AuthError};

pub const SIGNUP_COMPLETE_NOTICE: &str = "회원가입이 완료되었습니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutPolicy {
    #[default]
    KeepIdentity,
    ResetIdentity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

pub struct Session {
    storage: Storage,
    policy: LogoutPolicy,
    identity: RwLock<Identity>,
    user: RwLock<Option<AuthUser>>,
}

impl Session {
    pub async fn open(storage: Storage, policy: LogoutPolicy) -> Result<Self> {
        let identity = load_or_create_identity(&storage).await?;

        let user = match (
            storage.get(keys::TOKEN).await?,
            storage.get(keys::USER_NAME).await?,
        ) {
            (Some(token), Some(name)) => Some(AuthUser { name, token }),
            _ => None,
        };

        info!(
            identity = %identity,
            signed_in = user.is_some(),
            "session restored"
        );
        Ok(Self {
            storage,
            policy,
            identity: RwLock::new(identity),
            user: RwLock::new(user),
        })
    }

    pub async fn identity(&self) -> Identity {
        self.identity.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<AuthUser> {
        self.user.read().await.clone()
    }

    pub fn logout_policy(&self) -> LogoutPolicy {
        self.policy
    }

    /// Signs in. A `userId` returned by the service replaces the local
    /// identity so history follows the account. On failure nothing persisted
    /// changes.
    pub async fn login(
        &self,
        backend: &dyn AuthBackend,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<AuthUser, AuthError> {
        let response = backend
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
                remember_me,
            })
            .await
            .map_err(|err| {
                warn!(error = %err, "login rejected");
                AuthError::LoginRejected(err)
            })?;

        let mut entries = vec![
            (keys::TOKEN, response.token.as_str()),
            (keys::USER_NAME, response.name.as_str()),
        ];
        if let Some(user_id) = &response.user_id {
            entries.push((keys::USER_ID, user_id.as_str()));
        }
        self.storage.set_many(&entries).await?;
        if let Some(user_id) = &response.user_id {
            *self.identity.write().await = user_id.clone();
        }

        let user = AuthUser {
            name: response.name,
            token: response.token,
        };
        *self.user.write().await = Some(user.clone());
        info!(name = %user.name, identity = %self.identity().await, "signed in");
        Ok(user)
    }

    pub async fn signup(&self, backend: &dyn AuthBackend, form: SignupForm) -> Result<(), AuthError> {
        if form.password != form.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }

        backend
            .signup(&SignupRequest {
                name: form.name,
                email: form.email,
                password: form.password,
            })
            .await
            .map_err(|err| {
                warn!(error = %err, "signup rejected");
                AuthError::SignupRejected(err)
            })?;
        Ok(())
    }

    pub async fn logout(&self) -> Result<()> {
        self.storage.remove(keys::TOKEN).await?;
        self.storage.remove(keys::USER_NAME).await?;
        *self.user.write().await = None;

        if self.policy == LogoutPolicy::ResetIdentity {
            self.storage.remove(keys::USER_ID).await?;
            let fresh = load_or_create_identity(&self.storage).await?;
            *self.identity.write().await = fresh;
        }

        info!(identity = %self.identity().await, "signed out");
        Ok(())
    }
}

async fn load_or_create_identity(storage: &Storage) -> Result<Identity> {
    if let Some(stored) = storage.get(keys::USER_ID).await? {
        if !stored.trim().is_empty() {
            return Ok(Identity(stored));
        }
    }

    let identity = Identity::generate_at(Utc::now());
    storage.set(keys::USER_ID, identity.as_str()).await?;
    info!(identity = %identity, "generated new identity");
    Ok(identity)
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
