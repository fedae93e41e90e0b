use std::sync::Arc;

use argon2::{Argon2, password_hash::{PasswordHasher, PasswordVerifier, SaltString}, PasswordHash};
use models::{auth_token, user::{self, Role}};
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use tracing::{info, debug, warn, instrument};

use super::domain::{RegisterInput, LoginInput, AuthUser, AuthSession, NewUser};
use super::repository::AuthRepository;
use crate::access::{ensure, Action};
use crate::errors::ServiceError;
use crate::validation;

pub const EMAIL_TAKEN: &str = "user with this email already exists.";

/// Auth service configuration
#[derive(Clone)]
pub struct AuthConfig {
    pub password_algorithm: String,
}

impl Default for AuthConfig {
    fn default() -> Self { Self { password_algorithm: "argon2".into() } }
}

/// Auth business service independent of web framework
pub struct AuthService {
    repo: Arc<dyn AuthRepository>,
    cfg: AuthConfig,
}

impl AuthService {
    pub fn new(repo: Arc<dyn AuthRepository>, cfg: AuthConfig) -> Self { Self { repo, cfg } }

    /// Register a new user with a hashed password.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{service::{AuthService, AuthConfig}, domain::RegisterInput};
    /// use service::store::memory::MemoryStore;
    /// use std::sync::Arc;
    /// let svc = AuthService::new(Arc::new(MemoryStore::default()), AuthConfig::default());
    /// let input = RegisterInput {
    ///     email: "user@example.com".into(),
    ///     username: "user".into(),
    ///     password: "secret1".into(),
    ///     role: None,
    ///     bio: None,
    /// };
    /// let user = tokio_test::block_on(svc.register(input)).unwrap();
    /// assert_eq!(user.email, "user@example.com");
    /// assert_eq!(user.role.as_str(), "student");
    /// ```
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, mut input: RegisterInput) -> Result<AuthUser, ServiceError> {
        input.email = input.email.trim().to_string();
        let mut errors = validation::field_errors(&input);
        if errors.get("email").is_none() {
            if let Some(existing) = self.repo.find_user_by_email(&input.email).await? {
                debug!(user_id = %existing.id, "email already registered");
                errors.add("email", EMAIL_TAKEN);
            }
        }
        errors.into_result()?;
        let role = input.role.as_deref().map(str::trim).filter(|r| !r.is_empty())
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::Student);

        let hash = hash_password(input.password).await?;
        let new_user = NewUser {
            email: user::normalize_email(&input.email),
            username: input.username.trim().to_string(),
            role,
            bio: input.bio.filter(|b| !b.trim().is_empty()),
        };
        let user = match self.repo.create_user(new_user, hash, self.cfg.password_algorithm.clone()).await {
            Ok(user) => user,
            Err(ServiceError::Conflict(_)) => return Err(ServiceError::invalid("email", EMAIL_TAKEN)),
            Err(e) => return Err(e),
        };
        info!(user_id = %user.id, role = %user.role, event = "user_registered");
        Ok(user)
    }

    /// Verify the password and hand back the user's bearer token, creating one on first login.
    ///
    /// Unknown email, wrong password and a deactivated account all fail the same way.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, ServiceError> {
        let user = self.repo.find_user_by_email(&input.email).await?.filter(|u| u.is_active);
        let cred = match &user {
            Some(u) => self.repo.get_credentials(u.id).await?,
            None => None,
        };
        let (Some(user), Some(cred)) = (user, cred) else {
            // same argon2 cost as a real mismatch
            if let Some(dummy) = DUMMY_HASH.as_ref() {
                verify_password(input.password, dummy.clone()).await?;
            }
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_password(input.password, cred.password_hash).await? {
            warn!(user_id = %user.id, event = "login_failed");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.repo.issue_token(user.id, generate_token_key()).await?;
        info!(user_id = %user.id, event = "user_login");
        Ok(AuthSession { user, token })
    }

    /// Resolve a bearer token to an active user.
    pub async fn authenticate(&self, token: &str) -> Result<AuthUser, ServiceError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ServiceError::Unauthenticated);
        }
        self.repo
            .find_user_by_token(token)
            .await?
            .filter(|u| u.is_active)
            .ok_or(ServiceError::Unauthenticated)
    }

    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn logout(&self, user: &AuthUser) -> Result<(), ServiceError> {
        ensure(user.role, Action::Logout)?;
        let revoked = self.repo.revoke_token(user.id).await?;
        debug!(revoked, "token revoked");
        Ok(())
    }

    pub async fn me(&self, user: &AuthUser) -> Result<AuthUser, ServiceError> {
        ensure(user.role, Action::ViewProfile)?;
        self.repo
            .find_user(user.id)
            .await?
            .ok_or_else(|| ServiceError::not_found("User"))
    }
}

/// Verified against when the email is unknown, inactive or has no credentials.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let salt = SaltString::encode_b64(b"no-such-account").ok()?;
    Argon2::default().hash_password(b"no-such-password", &salt).ok().map(|h| h.to_string())
});

/// 40 lowercase hex characters from the OS RNG.
pub fn generate_token_key() -> String {
    let bytes: [u8; auth_token::KEY_LEN / 2] = rand::random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

async fn hash_password(password: String) -> Result<String, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| ServiceError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| ServiceError::Internal(e.to_string()))?
}

async fn verify_password(password: String, stored_hash: String) -> Result<bool, ServiceError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash)
            .map_err(|e| ServiceError::Internal(format!("stored hash unreadable: {e}")))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    })
    .await
    .map_err(|e| ServiceError::Internal(e.to_string()))?
}
