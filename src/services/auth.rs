//! Auth session bridge
//!
//! The identity provider owns accounts, tokens, retries and rate limits. This
//! module only routes form input to it, publishes the signed-in user, and keeps
//! the provider's error text for display as-is.
//!
//! - `IdentityProvider` - async operations a provider must offer
//! - `AuthBridge` - process-wide session holder with a watch channel for observers
//! - `AuthModal` - sign-in / sign-up / phone / reset form state

use crate::infra::metrics::Metrics;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

/// A signed-in account as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
    /// "password", "phone", or a federated id such as "google.com"
    pub provider_id: String,
    pub signed_in_at: DateTime<Utc>,
}

impl User {
    /// Name to show in the header
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.phone_number.as_deref())
            .unwrap_or(&self.uid)
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    EmailPassword { email: String, password: String },
    /// Token minted by a federated identity provider (e.g. Google)
    Federated { provider_id: String, id_token: String },
}

impl Credentials {
    pub fn email_password(email: &str, password: &str) -> Self {
        Credentials::EmailPassword { email: email.trim().to_string(), password: password.to_string() }
    }

    pub fn google(id_token: &str) -> Self {
        Credentials::Federated { provider_id: "google.com".to_string(), id_token: id_token.to_string() }
    }

    fn kind(&self) -> &str {
        match self {
            Credentials::EmailPassword { .. } => "password",
            Credentials::Federated { provider_id, .. } => provider_id,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::EmailPassword { email, .. } => {
                f.debug_struct("EmailPassword").field("email", email).finish_non_exhaustive()
            }
            Credentials::Federated { provider_id, .. } => {
                f.debug_struct("Federated").field("provider_id", provider_id).finish_non_exhaustive()
            }
        }
    }
}

/// Pending phone verification, returned by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneChallenge {
    pub phone_number: String,
    pub session_info: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Message from the provider, shown verbatim
    #[error("{0}")]
    Provider(String),
    #[error("{0}")]
    Transport(String),
    #[error("auth session closed")]
    Closed,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError>;
    async fn sign_up(&self, credentials: &Credentials) -> Result<User, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
    async fn start_phone_verification(&self, phone_number: &str) -> Result<PhoneChallenge, AuthError>;
    async fn confirm_phone_verification(
        &self,
        challenge: &PhoneChallenge,
        code: &str,
    ) -> Result<User, AuthError>;
}

/// Process-wide session state. Observers get a read-only snapshot and a
/// change channel; only the bridge writes.
pub struct AuthBridge {
    provider: Arc<dyn IdentityProvider>,
    session_tx: watch::Sender<Option<User>>,
    closed: AtomicBool,
    metrics: Arc<Metrics>,
}

impl AuthBridge {
    /// Create the session holder at startup
    pub fn init(provider: Arc<dyn IdentityProvider>, metrics: Arc<Metrics>) -> Arc<Self> {
        let (session_tx, _) = watch::channel(None);
        info!("auth_bridge_started");
        Arc::new(Self { provider, session_tx, closed: AtomicBool::new(false), metrics })
    }

    pub fn current_user(&self) -> Option<User> {
        self.session_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.session_tx.subscribe()
    }

    fn ensure_open(&self) -> Result<(), AuthError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AuthError::Closed);
        }
        Ok(())
    }

    fn record<T>(&self, op: &'static str, result: &Result<T, AuthError>) {
        self.metrics.record_auth_result(result.is_ok());
        if let Err(e) = result {
            warn!(op = op, error = %e, "auth_operation_failed");
        }
    }

    /// Store the user unless `shutdown` got there first; both run under the channel lock
    fn publish(&self, user: &User) -> Result<(), AuthError> {
        let published = self.session_tx.send_if_modified(|session| {
            if self.closed.load(Ordering::SeqCst) {
                return false;
            }
            *session = Some(user.clone());
            true
        });
        if !published {
            warn!(uid = %user.uid, "auth_result_after_shutdown");
            return Err(AuthError::Closed);
        }
        info!(uid = %user.uid, provider = %user.provider_id, "auth_signed_in");
        Ok(())
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.ensure_open()?;
        let result = self.provider.sign_in(credentials).await;
        self.record("sign_in", &result);
        let user = result?;
        self.publish(&user)?;
        Ok(user)
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<User, AuthError> {
        self.ensure_open()?;
        let result = self.provider.sign_up(credentials).await;
        self.record("sign_up", &result);
        let user = result?;
        self.publish(&user)?;
        Ok(user)
    }

    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.ensure_open()?;
        let result = self.provider.sign_out().await;
        self.record("sign_out", &result);
        result?;
        self.session_tx.send_replace(None);
        info!("auth_signed_out");
        Ok(())
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.ensure_open()?;
        let result = self.provider.send_password_reset(email.trim()).await;
        self.record("password_reset", &result);
        result
    }

    pub async fn start_phone_verification(&self, phone_number: &str) -> Result<PhoneChallenge, AuthError> {
        self.ensure_open()?;
        let result = self.provider.start_phone_verification(phone_number.trim()).await;
        self.record("phone_start", &result);
        result
    }

    pub async fn confirm_phone_verification(
        &self,
        challenge: &PhoneChallenge,
        code: &str,
    ) -> Result<User, AuthError> {
        self.ensure_open()?;
        let result = self.provider.confirm_phone_verification(challenge, code.trim()).await;
        self.record("phone_confirm", &result);
        let user = result?;
        self.publish(&user)?;
        Ok(user)
    }

    /// Drop the local session and refuse further operations
    pub fn shutdown(&self) {
        let mut first = false;
        self.session_tx.send_modify(|session| {
            first = !self.closed.swap(true, Ordering::SeqCst);
            *session = None;
        });
        if first {
            info!("auth_bridge_stopped");
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
    Phone,
    ResetPassword,
}

/// Auth modal form state
#[derive(Debug, Default)]
pub struct AuthModal {
    open: bool,
    mode: AuthMode,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub code: String,
    challenge: Option<PhoneChallenge>,
    pending: bool,
    error: Option<String>,
    notice: Option<String>,
}

impl AuthModal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, mode: AuthMode) {
        self.open = true;
        self.switch_mode(mode);
    }

    pub fn close(&mut self) {
        self.open = false;
        self.password.clear();
        self.code.clear();
        self.challenge = None;
        self.error = None;
        self.notice = None;
    }

    pub fn switch_mode(&mut self, mode: AuthMode) {
        self.mode = mode;
        self.error = None;
        self.notice = None;
        if mode != AuthMode::Phone {
            self.challenge = None;
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Whether the phone flow is waiting for the code
    pub fn awaiting_code(&self) -> bool {
        self.challenge.is_some()
    }

    /// Submit the current mode's form. Returns the user when it signed someone in.
    pub async fn submit(&mut self, bridge: &AuthBridge) -> Option<User> {
        self.error = None;
        self.notice = None;
        self.pending = true;

        let outcome = match self.mode {
            AuthMode::SignIn => bridge
                .sign_in(&Credentials::email_password(&self.email, &self.password))
                .await
                .map(Some),
            AuthMode::SignUp => bridge
                .sign_up(&Credentials::email_password(&self.email, &self.password))
                .await
                .map(Some),
            AuthMode::ResetPassword => bridge.send_password_reset(&self.email).await.map(|_| {
                self.notice = Some("Password reset email sent".to_string());
                None
            }),
            AuthMode::Phone => match self.challenge.clone() {
                None => bridge.start_phone_verification(&self.phone).await.map(|challenge| {
                    self.challenge = Some(challenge);
                    self.notice = Some("Verification code sent".to_string());
                    None
                }),
                Some(challenge) => bridge.confirm_phone_verification(&challenge, &self.code).await.map(Some),
            },
        };

        self.pending = false;
        self.finish(outcome)
    }

    /// Federated sign-in from the modal's "Continue with ..." button
    pub async fn sign_in_federated(&mut self, bridge: &AuthBridge, credentials: &Credentials) -> Option<User> {
        self.error = None;
        self.notice = None;
        self.pending = true;
        let outcome = bridge.sign_in(credentials).await.map(Some);
        self.pending = false;
        if outcome.is_err() {
            warn!(kind = %credentials.kind(), "auth_federated_failed");
        }
        self.finish(outcome)
    }

    fn finish(&mut self, outcome: Result<Option<User>, AuthError>) -> Option<User> {
        match outcome {
            Ok(Some(user)) => {
                self.close();
                Some(user)
            }
            Ok(None) => None,
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}
