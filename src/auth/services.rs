use std::sync::Arc;

use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::{
    claims::Claims,
    error::AuthError,
    jwt::JwtKeys,
    password::{self, PasswordError},
};
use crate::{
    state::AppState,
    users::{
        repo::{StoreError, UserStore},
        repo_types::{NewUser, User},
    },
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

lazy_static! {
    static ref DUMMY_HASH: Option<String> = password::hash_password("dummy-password").ok();
}

/// One verify against [`DUMMY_HASH`] on the blocking pool, for login failures
/// that never reach a usable stored hash. First use also builds the hash there.
async fn dummy_verify(password: &str) {
    let plain = password.to_owned();
    let _ = tokio::task::spawn_blocking(move || {
        if let Some(dummy) = DUMMY_HASH.as_deref() {
            let _ = password::verify_password(&plain, dummy);
        }
    })
    .await;
}

/// Register, password login and OAuth account linking on top of a [`UserStore`].
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    keys: JwtKeys,
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.users.clone(), state.jwt.clone())
    }
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, keys: JwtKeys) -> Self {
        Self { users, keys }
    }

    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let hash = password::hash_password_blocking(password).await?;

        let user = self
            .users
            .create(NewUser::local(name, email, hash))
            .await
            .map_err(|e| {
                match &e {
                    StoreError::DuplicateEmail => warn!(%email, "email already registered"),
                    _ => error!(error = %e, "create user failed"),
                }
                AuthError::from(e)
            })?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(user)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            dummy_verify(password).await;
            warn!(%email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if user.password_hash.is_empty() {
            dummy_verify(password).await;
            warn!(user_id = %user.id, provider = %user.provider, "password login on account without password");
            return Err(AuthError::InvalidCredentials);
        }

        match password::verify_password_blocking(password, &user.password_hash).await {
            Ok(true) => {}
            Ok(false) => {
                warn!(user_id = %user.id, "login invalid password");
                return Err(AuthError::InvalidCredentials);
            }
            Err(PasswordError::MalformedHash) => {
                dummy_verify(password).await;
                error!(user_id = %user.id, "stored password hash is malformed");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        }

        let token = self.generate_token(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((token, user))
    }

    /// Links `provider` onto an existing account with an empty provider, returns
    /// an already-linked account untouched, or creates a password-less account.
    #[instrument(skip(self))]
    pub async fn find_or_create_oauth_user(
        &self,
        name: &str,
        email: &str,
        provider: &str,
        provider_id: &str,
    ) -> Result<User, AuthError> {
        if let Some(existing) = self.users.find_by_email(email).await? {
            if !existing.provider.is_empty() {
                return Ok(existing);
            }
            let linked = self
                .users
                .link_provider(existing.id, provider, provider_id)
                .await
                .map_err(AuthError::Store)?;
            info!(user_id = %linked.id, %provider, "oauth identity linked");
            return Ok(linked);
        }

        match self
            .users
            .create(NewUser::oauth(name, email, provider, provider_id))
            .await
        {
            Ok(user) => {
                info!(user_id = %user.id, %provider, "oauth user created");
                Ok(user)
            }
            // Lost a race with a concurrent create for the same email.
            Err(StoreError::DuplicateEmail) => self
                .users
                .find_by_email(email)
                .await?
                .ok_or(AuthError::Store(StoreError::NotFound)),
            Err(e) => Err(AuthError::Store(e)),
        }
    }

    pub fn generate_token(&self, user: &User) -> Result<String, AuthError> {
        Ok(self.keys.issue(user)?)
    }

    pub fn parse_token(&self, token: &str) -> Result<Claims, AuthError> {
        Ok(self.keys.parse(token)?)
    }
}
