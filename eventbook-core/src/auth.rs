use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use argon2::{
    password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::info;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AccountData, Database, DatabaseError, Mailer, NewAccount};

/// How long a session token stays valid
const TOKEN_DURATION_IN_HOURS: i64 = 1;

/// How many failed attempts an address gets before it is locked out
const MAX_FAILED_ATTEMPTS: u32 = 5;
/// How long a lockout window lasts
const FAILED_ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Handles registration, credentials, session tokens, and the capability gate
pub struct Auth<Db> {
    db: Arc<Db>,
    argon: Argon2<'static>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    attempts: AttemptTracker,
    mailer: Arc<dyn Mailer>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Email or password is incorrect
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Email already exists")]
    EmailTaken,
    #[error("No Authorization header provided")]
    MissingHeader,
    #[error("No token provided")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Account not found")]
    AccountNotFound,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("Too many failed attempts, please try again later")]
    LockedOut,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

/// What a route requires of the caller.
///
/// Evaluated by a single policy check instead of separate gate
/// implementations per privilege level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Any authenticated account
    User,
    Admin,
    Organizer,
}

/// The claims embedded in every session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The id of the account this token belongs to
    pub sub: String,
    pub email: String,
    pub is_admin: bool,
    pub is_organizer: bool,
    /// Expiry, as a unix timestamp in seconds
    pub exp: i64,
    /// Issued at, as a unix timestamp in seconds
    pub iat: i64,
}

/// A successfully authorized request. Carries the account and the raw token
/// so handlers can act on behalf of the caller.
#[derive(Debug, Clone)]
pub struct Authorized {
    pub account: AccountData,
    pub token: String,
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>, token_secret: &str, mailer: Arc<dyn Mailer>) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
            encoding_key: EncodingKey::from_secret(token_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(token_secret.as_bytes()),
            attempts: AttemptTracker::default(),
            mailer,
        }
    }

    /// Registers a new account with the given credentials
    pub async fn register(&self, email: &str, password: &str) -> Result<AccountData, AuthError> {
        self.db
            .account_by_email(email)
            .await
            .map(|_| Err(AuthError::EmailTaken))
            .unwrap_or_else(|e| match e {
                DatabaseError::NotFound { .. } => Ok(()),
                e => Err(AuthError::Db(e)),
            })?;

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        self.db
            .create_account(NewAccount {
                email: email.to_string(),
                password: hashed_password,
                is_admin: false,
                is_organizer: false,
            })
            .await
            .map_err(AuthError::Db)
    }

    /// Logs in an account, returning it together with a fresh session token
    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(AccountData, String), AuthError> {
        let account = self.db.account_by_email(email).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::InvalidCredentials,
            err => AuthError::Db(err),
        })?;

        let stored_password = PasswordHash::new(&account.password)
            .map_err(|e| AuthError::HashError(e.to_string()))?;

        self.argon
            .verify_password(password.as_bytes(), &stored_password)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let token = self.issue_token(&account)?;

        info!("Login successful for {}", account.email);
        Ok((account, token))
    }

    /// Signs a session token for the given account
    pub fn issue_token(&self, account: &AccountData) -> Result<String, AuthError> {
        let now = Utc::now();

        let claims = Claims {
            sub: account.id.clone(),
            email: account.email.clone(),
            is_admin: account.is_admin,
            is_organizer: account.is_organizer,
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(TOKEN_DURATION_IN_HOURS)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::HashError(e.to_string()))
    }

    /// Authorizes a request end to end: lockout check, token extraction and
    /// verification, account lookup, then the capability policy.
    ///
    /// Every rejection except the lockout itself counts against the caller's
    /// address. A successful pass does not reset the counter, only window
    /// expiry does.
    pub async fn authorize(
        &self,
        ip: IpAddr,
        auth_header: Option<&str>,
        capability: Capability,
    ) -> Result<Authorized, AuthError> {
        if self.attempts.is_locked_out(ip) {
            return Err(AuthError::LockedOut);
        }

        match self.try_authorize(auth_header, capability).await {
            Ok(authorized) => Ok(authorized),
            Err(e) => {
                self.attempts.record_failure(ip);
                Err(e)
            }
        }
    }

    async fn try_authorize(
        &self,
        auth_header: Option<&str>,
        capability: Capability,
    ) -> Result<Authorized, AuthError> {
        let header = auth_header.ok_or(AuthError::MissingHeader)?;
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = self.verify_token(token)?;

        let account = self
            .db
            .account_by_id(&claims.sub)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound { .. } => AuthError::AccountNotFound,
                err => AuthError::Db(err),
            })?;

        check_capability(&account, capability)?;

        Ok(Authorized {
            account,
            token: token.to_string(),
        })
    }

    /// Verifies a token's signature and expiry, returning its claims
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }

    /// Changes an account's password and notifies the owner by email
    pub async fn change_password(
        &self,
        account_id: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let account = self
            .db
            .account_by_id(account_id)
            .await
            .map_err(AuthError::Db)?;

        let salt = SaltString::generate(&mut OsRng);
        let hashed_password = self
            .argon
            .hash_password(new_password.as_bytes(), &salt)
            .map_err(|e| AuthError::HashError(e.to_string()))?
            .to_string();

        self.db
            .set_password(account_id, &hashed_password)
            .await
            .map_err(AuthError::Db)?;

        self.mailer.send(
            &account.email,
            "Password was changed",
            "Your password has been successfully changed.",
        );

        Ok(())
    }

    /// Starts a password reset by mailing the account a reset link
    pub async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let account = self.db.account_by_email(email).await.map_err(|e| match e {
            DatabaseError::NotFound { .. } => AuthError::AccountNotFound,
            err => AuthError::Db(err),
        })?;

        let body = format!(
            "We received a request to reset the password for your account.\n\
             If you requested this, follow the link below to choose a new password:\n\
             {}/change-password/{}\n\
             If you did not request a password reset, you can ignore this email.",
            "http://localhost:8081", account.id
        );

        self.mailer.send(&account.email, "Reset Your Password", &body);

        info!("Password reset requested for {}", account.email);
        Ok(())
    }
}

/// The single policy function deciding whether an account may use a
/// capability
fn check_capability(account: &AccountData, capability: Capability) -> Result<(), AuthError> {
    match capability {
        Capability::User => Ok(()),
        Capability::Admin if account.is_admin => Ok(()),
        Capability::Admin => Err(AuthError::Forbidden("User is not an admin")),
        Capability::Organizer if account.is_organizer => Ok(()),
        Capability::Organizer => Err(AuthError::Forbidden("User is not an organizer")),
    }
}

/// Tracks failed authentication attempts per client address.
///
/// Process-wide state reached only through this service object. Counts are
/// not shared across instances and reset on restart, which is acceptable
/// for a single-instance deployment.
#[derive(Default)]
struct AttemptTracker {
    windows: Mutex<HashMap<IpAddr, AttemptWindow>>,
}

struct AttemptWindow {
    count: u32,
    started_at: Instant,
}

impl AttemptTracker {
    fn record_failure(&self, ip: IpAddr) {
        let mut windows = self.windows.lock();

        let window = windows.entry(ip).or_insert(AttemptWindow {
            count: 0,
            started_at: Instant::now(),
        });

        if window.started_at.elapsed() > FAILED_ATTEMPT_WINDOW {
            window.count = 0;
            window.started_at = Instant::now();
        }

        window.count += 1;
    }

    fn is_locked_out(&self, ip: IpAddr) -> bool {
        let mut windows = self.windows.lock();

        match windows.get(&ip) {
            Some(window) if window.started_at.elapsed() > FAILED_ATTEMPT_WINDOW => {
                windows.remove(&ip);
                false
            }
            Some(window) => window.count >= MAX_FAILED_ATTEMPTS,
            None => false,
        }
    }
}
