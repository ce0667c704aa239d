//! Identity provider contract and an in-process implementation.
//!
//! # Responsibility
//! - Describe the sign-in/sign-up/sign-out surface the workspace needs.
//! - Surface auth failures as user-displayable messages.
//!
//! # Invariants
//! - Stores are only built once `current_user()` is `Some`.
//! - Auth logs never contain passwords; emails are not logged either.

use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MIN_PASSWORD_CHARS: usize = 6;

/// Signed-in identity. `id` scopes every stored row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
}

/// Sign-in/sign-up failure. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    InvalidEmail,
    WeakPassword { min_chars: usize },
    InvalidCredentials,
    AlreadyRegistered,
    /// Provider-specific failure text, shown verbatim.
    Provider(String),
}

impl Display for AuthError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEmail => write!(f, "Please enter a valid email address"),
            Self::WeakPassword { min_chars } => {
                write!(f, "Password should be at least {min_chars} characters")
            }
            Self::InvalidCredentials => write!(f, "Invalid login credentials"),
            Self::AlreadyRegistered => write!(f, "User already registered"),
            Self::Provider(message) => write!(f, "{message}"),
        }
    }
}

impl Error for AuthError {}

impl AuthError {
    /// Stable machine code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::WeakPassword { .. } => "weak_password",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AlreadyRegistered => "already_registered",
            Self::Provider(_) => "provider_error",
        }
    }
}

/// External identity provider.
pub trait IdentityProvider {
    fn current_user(&self) -> Option<User>;
    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError>;
    fn sign_up(&mut self, email: &str, password: &str) -> Result<User, AuthError>;
    fn sign_out(&mut self);
}

#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

/// Process-local identity provider for development and tests.
///
/// Accounts live only as long as the provider value.
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    accounts: BTreeMap<String, Account>,
    current: Option<User>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider with `user` already signed in.
    pub fn signed_in(user: User) -> Self {
        Self {
            accounts: BTreeMap::new(),
            current: Some(user),
        }
    }
}

impl IdentityProvider for InMemoryIdentityProvider {
    fn current_user(&self) -> Option<User> {
        self.current.clone()
    }

    fn sign_in(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let result = match self.accounts.get(&email) {
            Some(account) if account.password == password => Ok(account.user.clone()),
            _ => Err(AuthError::InvalidCredentials),
        };
        log_outcome("auth_sign_in", &result);
        let user = result?;
        self.current = Some(user.clone());
        Ok(user)
    }

    fn sign_up(&mut self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email)?;
        let result = if password.chars().count() < MIN_PASSWORD_CHARS {
            Err(AuthError::WeakPassword {
                min_chars: MIN_PASSWORD_CHARS,
            })
        } else if self.accounts.contains_key(&email) {
            Err(AuthError::AlreadyRegistered)
        } else {
            Ok(User {
                id: Uuid::new_v4().to_string(),
                email: email.clone(),
            })
        };
        log_outcome("auth_sign_up", &result);
        let user = result?;
        self.accounts.insert(
            email,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        self.current = Some(user.clone());
        Ok(user)
    }

    fn sign_out(&mut self) {
        if self.current.take().is_some() {
            info!("event=auth_sign_out module=auth status=ok");
        }
    }
}

fn normalize_email(email: &str) -> Result<String, AuthError> {
    let trimmed = email.trim().to_ascii_lowercase();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(trimmed),
        _ => Err(AuthError::InvalidEmail),
    }
}

fn log_outcome(event: &str, result: &Result<User, AuthError>) {
    match result {
        Ok(_) => info!("event={event} module=auth status=ok"),
        Err(err) => warn!(
            "event={event} module=auth status=error error_code={}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{AuthError, IdentityProvider, InMemoryIdentityProvider};

    #[test]
    fn sign_up_then_sign_in_round_trip() {
        let mut provider = InMemoryIdentityProvider::new();
        let created = provider.sign_up(" Ada@Example.com ", "hunter22").unwrap();
        assert_eq!(created.email, "ada@example.com");
        provider.sign_out();
        assert!(provider.current_user().is_none());

        let signed_in = provider.sign_in("ada@example.com", "hunter22").unwrap();
        assert_eq!(signed_in, created);
        assert_eq!(provider.current_user(), Some(created));
    }

    #[test]
    fn failures_render_user_messages() {
        let mut provider = InMemoryIdentityProvider::new();
        assert_eq!(
            provider.sign_up("nope", "hunter22").unwrap_err().to_string(),
            "Please enter a valid email address"
        );
        assert_eq!(
            provider.sign_up("a@b.io", "123").unwrap_err(),
            AuthError::WeakPassword { min_chars: 6 }
        );
        provider.sign_up("a@b.io", "123456").unwrap();
        assert_eq!(
            provider.sign_up("a@b.io", "123456").unwrap_err().to_string(),
            "User already registered"
        );
        assert_eq!(
            provider.sign_in("a@b.io", "wrong!").unwrap_err().to_string(),
            "Invalid login credentials"
        );
    }

    #[test]
    fn failed_sign_in_keeps_previous_session() {
        let mut provider = InMemoryIdentityProvider::new();
        let user = provider.sign_up("a@b.io", "123456").unwrap();
        assert!(provider.sign_in("a@b.io", "bad-password").is_err());
        assert_eq!(provider.current_user(), Some(user));
    }
}
