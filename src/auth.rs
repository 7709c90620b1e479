//! Authentication state for CareDesk.
//!
//! [`AuthState`] holds the logged-in user and owns the `users` and `user`
//! storage keys. Passwords are checked with `bcrypt` against the hash kept in
//! the user list; the hash never leaves this module.

use crate::db::{Storage, StoreError, KEY_SESSION, KEY_USERS};
use crate::models::{
    generate_id, now, Credentials, RegisterData, StaffAccountData, StoredUser, User, UserRole,
};
use bcrypt::{hash, verify};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Accounts created on first start when the user list is empty.
const DEMO_ACCOUNTS: [(&str, &str, &str, UserRole); 2] = [
    ("admin@hospital.com", "Admin User", "admin123", UserRole::Admin),
    ("doctor@hospital.com", "Dr. Smith", "doctor123", UserRole::Doctor),
];

/// Failures of the authentication operations.
///
/// The `Display` text is what the user sees.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailInUse,

    #[error("Passwords don't match")]
    PasswordMismatch,

    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    #[error("An error occurred during login")]
    LoginFailed(#[source] anyhow::Error),

    #[error("An error occurred during registration")]
    RegistrationFailed(#[source] anyhow::Error),

    #[error("An error occurred while creating account")]
    AccountCreationFailed(#[source] anyhow::Error),
}

/// Checks the registration form before it is submitted.
pub fn validate_registration(password: &str, confirm_password: &str) -> Result<(), AuthError> {
    if password != confirm_password {
        return Err(AuthError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// The authentication state holder.
#[derive(Debug)]
pub struct AuthState {
    user: Option<User>,
    error: Option<String>,
    bcrypt_cost: u32,
}

impl AuthState {
    /// Restores the session and seeds the demo accounts if no user exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the demo accounts cannot be hashed or written.
    pub fn load(storage: &Storage, bcrypt_cost: u32) -> anyhow::Result<Self> {
        let mut state = Self {
            user: None,
            error: None,
            bcrypt_cost,
        };

        state.user = storage.get::<Option<User>>(KEY_SESSION, None);
        if let Some(user) = &state.user {
            debug!(user_id = %user.id, "restored session");
        }

        state.seed_demo_users(storage)?;
        Ok(state)
    }

    fn seed_demo_users(&self, storage: &Storage) -> anyhow::Result<()> {
        let users: Vec<StoredUser> = storage.get(KEY_USERS, Vec::new());
        if !users.is_empty() {
            return Ok(());
        }

        let mut demo = Vec::with_capacity(DEMO_ACCOUNTS.len());
        for (email, name, password, role) in DEMO_ACCOUNTS {
            demo.push(self.new_stored_user(name, email, password, role)?);
        }
        storage.set(KEY_USERS, &demo)?;
        info!(count = demo.len(), "seeded demo accounts");
        Ok(())
    }

    /// The logged-in user, if any.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Message of the last failed operation.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Logs in with `credentials`. Returns `false` and sets the error on failure.
    pub fn login(&mut self, storage: &Storage, credentials: &Credentials) -> bool {
        self.error = None;
        match self.try_login(storage, credentials) {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "login succeeded");
                self.user = Some(user);
                true
            }
            Err(e) => self.fail(e),
        }
    }

    fn try_login(&self, storage: &Storage, credentials: &Credentials) -> Result<User, AuthError> {
        let users: Vec<StoredUser> = storage.get(KEY_USERS, Vec::new());

        let matched = users
            .into_iter()
            .find(|u| {
                u.user.email == credentials.email
                    && password_matches(&credentials.password, &u.password)
            })
            .ok_or(AuthError::InvalidCredentials)?;

        let user = matched.into_user();
        storage
            .set(KEY_SESSION, &user)
            .map_err(|e| AuthError::LoginFailed(e.into()))?;
        Ok(user)
    }

    /// Registers a new account and logs it in.
    pub fn register(&mut self, storage: &Storage, data: &RegisterData) -> bool {
        self.error = None;
        let result = self
            .append_account(storage, &data.name, &data.email, &data.password, data.role)
            .map_err(|e| e.into_auth_error(AuthError::RegistrationFailed))
            .and_then(|user| {
                storage
                    .set(KEY_SESSION, &user)
                    .map_err(|e| AuthError::RegistrationFailed(e.into()))?;
                Ok(user)
            });

        match result {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "registered and logged in");
                self.user = Some(user);
                true
            }
            Err(e) => self.fail(e),
        }
    }

    /// Creates a doctor or staff login without touching the current session.
    pub fn create_staff_account(&mut self, storage: &Storage, data: &StaffAccountData) -> bool {
        self.error = None;
        let result = self
            .append_account(
                storage,
                &data.name,
                &data.email,
                &data.password,
                data.role.into(),
            )
            .map_err(|e| e.into_auth_error(AuthError::AccountCreationFailed));

        match result {
            Ok(user) => {
                info!(user_id = %user.id, role = %user.role, "created staff account");
                true
            }
            Err(e) => self.fail(e),
        }
    }

    /// Clears the session. The caller returns the UI to the entry screen.
    pub fn logout(&mut self, storage: &Storage) {
        if let Some(user) = self.user.take() {
            info!(user_id = %user.id, "logged out");
        }
        self.error = None;
        if let Err(e) = storage.remove(KEY_SESSION) {
            warn!(error = %e, "failed to clear stored session");
        }
    }

    fn fail(&mut self, err: AuthError) -> bool {
        match &err {
            AuthError::LoginFailed(source)
            | AuthError::RegistrationFailed(source)
            | AuthError::AccountCreationFailed(source) => {
                warn!(error = %source, "{err}");
            }
            _ => debug!("{err}"),
        }
        self.error = Some(err.to_string());
        false
    }

    /// Appends a new account to the user list after the uniqueness check.
    fn append_account(
        &self,
        storage: &Storage,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AppendError> {
        let mut users: Vec<StoredUser> = storage.get(KEY_USERS, Vec::new());
        if users.iter().any(|u| u.user.email == email) {
            return Err(AppendError::Duplicate);
        }

        let stored = self
            .new_stored_user(name, email, password, role)
            .map_err(AppendError::Other)?;
        let user = stored.user.clone();
        users.push(stored);
        storage
            .set(KEY_USERS, &users)
            .map_err(|e: StoreError| AppendError::Other(e.into()))?;
        Ok(user)
    }

    fn new_stored_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> anyhow::Result<StoredUser> {
        Ok(StoredUser {
            user: User {
                id: generate_id(),
                email: email.to_string(),
                name: name.to_string(),
                role,
                created_at: now(),
            },
            password: hash(password, self.bcrypt_cost)?,
        })
    }
}

/// Outcome of [`AuthState::append_account`] before it is given a user-facing message.
enum AppendError {
    Duplicate,
    Other(anyhow::Error),
}

impl AppendError {
    fn into_auth_error(self, unexpected: fn(anyhow::Error) -> AuthError) -> AuthError {
        match self {
            AppendError::Duplicate => AuthError::EmailInUse,
            AppendError::Other(e) => unexpected(e),
        }
    }
}

/// A malformed stored hash counts as a mismatch.
fn password_matches(password: &str, stored_hash: &str) -> bool {
    verify(password, stored_hash).unwrap_or(false)
}
