/// Account service - registration, login, password reset and user administration
use crate::{
    error::{Result, ServerError},
    services::mailer::Mailer,
};
use cadence_core::{
    storage::AccountStore,
    types::{normalize_email, Caller, ResetChallenge, User, UserId},
};
use chrono::{Duration, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

pub const MIN_PASSWORD_LEN: usize = 6;

/// Public view of a user; never carries a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            is_admin: user.is_admin,
        }
    }
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

pub struct AccountService {
    store: Arc<dyn AccountStore>,
    mailer: Arc<dyn Mailer>,
    code_ttl: Duration,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(store: Arc<dyn AccountStore>, mailer: Arc<dyn Mailer>, code_ttl_minutes: i64) -> Self {
        Self {
            store,
            mailer,
            code_ttl: Duration::minutes(code_ttl_minutes),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Override the bcrypt work factor (tests use the minimum)
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Hash a password using bcrypt
    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost).map_err(ServerError::from)
    }

    /// Verify a password against a hash
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(password, hash).map_err(ServerError::from)
    }

    // ===== Accounts =====

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(ServerError::BadRequest(
                "Name, email and password are required".to_string(),
            ));
        }
        check_password(password)?;

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ServerError::BadRequest("User already exists".to_string()));
        }

        let user = User::new(name, &email);
        let hash = self.hash_password(password)?;
        self.store.create_user(&user, &hash).await?;

        tracing::info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    /// Create an account directly, optionally as admin (CLI bootstrap)
    pub async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<User> {
        let mut user = self.register(name, email, password).await?;
        if is_admin {
            self.store.set_admin(&user.id, true).await?;
            user.is_admin = true;
        }
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let invalid = || ServerError::BadRequest("Invalid credentials".to_string());

        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(invalid)?;
        let hash = self.store.password_hash(&user.id).await?.ok_or_else(invalid)?;

        if !self.verify_password(password, &hash)? {
            tracing::warn!(user_id = %user.id, "Failed login attempt");
            return Err(invalid());
        }
        Ok(user)
    }

    pub async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.store.get_user(id).await?)
    }

    // ===== Password reset =====

    /// Issue a fresh 6-digit code and mail it
    pub async fn request_reset_code(&self, email: &str) -> Result<()> {
        if email.trim().is_empty() {
            return Err(ServerError::BadRequest("Email is required".to_string()));
        }
        let user = self.store.find_user_by_email(email).await?.ok_or_else(|| {
            ServerError::NotFound("User not found with this email address".to_string())
        })?;

        let challenge = ResetChallenge {
            code: generate_code(),
            expires_at: Utc::now() + self.code_ttl,
        };
        self.store
            .set_reset_challenge(&user.id, Some(&challenge))
            .await?;

        self.mailer
            .send_reset_code(&user.email, &challenge.code, self.code_ttl.num_minutes())
            .await
    }

    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<()> {
        self.check_code(email, code).await.map(|_| ())
    }

    /// Replace the password and clear the challenge
    pub async fn reset_password(&self, email: &str, code: &str, new_password: &str) -> Result<()> {
        if new_password.is_empty() {
            return Err(ServerError::BadRequest(
                "Email, OTP, and new password are required".to_string(),
            ));
        }
        check_password(new_password)?;

        let user = self.check_code(email, code).await?;
        let hash = self.hash_password(new_password)?;
        self.store.set_password_hash(&user.id, &hash).await?;
        self.store.set_reset_challenge(&user.id, None).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    async fn check_code(&self, email: &str, code: &str) -> Result<User> {
        if email.trim().is_empty() || code.trim().is_empty() {
            return Err(ServerError::BadRequest(
                "Email and OTP are required".to_string(),
            ));
        }
        let invalid = || ServerError::BadRequest("Invalid or expired OTP".to_string());

        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or_else(invalid)?;
        let challenge = self.store.reset_challenge(&user.id).await?.ok_or_else(invalid)?;

        if challenge.accepts(code, Utc::now()) {
            Ok(user)
        } else {
            Err(invalid())
        }
    }

    // ===== Administration =====

    pub async fn list_users(&self, caller: &Caller) -> Result<Vec<User>> {
        require_admin(caller)?;
        Ok(self.store.list_users().await?)
    }

    pub async fn list_admins(&self, caller: &Caller) -> Result<Vec<User>> {
        require_admin(caller)?;
        Ok(self.store.list_admins().await?)
    }

    /// Grant or revoke admin; `None` toggles
    pub async fn set_admin(
        &self,
        caller: &Caller,
        id: &UserId,
        is_admin: Option<bool>,
    ) -> Result<User> {
        require_admin(caller)?;
        let mut user = self.load_user(id).await?;
        let target = is_admin.unwrap_or(!user.is_admin);

        if user.is_admin && !target {
            self.ensure_not_last_admin().await?;
        }
        if user.is_admin != target {
            self.store.set_admin(id, target).await?;
            user.is_admin = target;
        }
        Ok(user)
    }

    /// Delete an account with its liked songs and owned playlists
    pub async fn delete_user(&self, caller: &Caller, id: &UserId) -> Result<()> {
        require_admin(caller)?;
        let user = self.load_user(id).await?;
        if user.is_admin {
            self.ensure_not_last_admin().await?;
        }
        self.store.delete_user(id).await?;
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    async fn load_user(&self, id: &UserId) -> Result<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| ServerError::NotFound("User not found".to_string()))
    }

    async fn ensure_not_last_admin(&self) -> Result<()> {
        if self.store.count_admins().await? <= 1 {
            return Err(ServerError::BadRequest(
                "Cannot remove the last admin".to_string(),
            ));
        }
        Ok(())
    }
}

fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin {
        Ok(())
    } else {
        Err(ServerError::Unauthorized(
            "Access denied. Admin privileges required".to_string(),
        ))
    }
}

fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServerError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}

/// Six decimal digits, leading zeros allowed
fn generate_code() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}
