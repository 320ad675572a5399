//! Identity provider backends
//!
//! - `RestIdentityProvider` talks to the hosted identity toolkit REST API
//! - `LocalIdentityProvider` keeps accounts in memory for offline runs and tests
//!
//! Both report failures with the provider's own message text.

use crate::infra::config::IdentityConfig;
use crate::services::auth::{AuthError, Credentials, IdentityProvider, PhoneChallenge, User};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Account payload shared by the sign-in style endpoints
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    provider_id: Option<String>,
    #[serde(default)]
    id_token: Option<String>,
}

impl AccountResponse {
    fn into_user(self, default_provider: &str) -> User {
        User {
            uid: self.local_id,
            email: self.email.filter(|e| !e.is_empty()),
            phone_number: self.phone_number,
            display_name: self.display_name.filter(|n| !n.is_empty()),
            provider_id: self.provider_id.unwrap_or_else(|| default_provider.to_string()),
            signed_in_at: Utc::now(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationResponse {
    session_info: String,
}

/// Form-encoded `postBody` for signInWithIdp
pub(crate) fn idp_post_body(provider_id: &str, id_token: &str) -> String {
    format!("id_token={}&providerId={}", urlencoding::encode(id_token), urlencoding::encode(provider_id))
}

/// Pull the provider's message out of `{"error":{"message":...}}`, falling
/// back to the raw body.
pub(crate) fn provider_error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.to_string()
            }
        })
}

pub struct RestIdentityProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    request_uri: String,
    recaptcha_token: Option<String>,
    id_token: Mutex<Option<String>>,
}

impl RestIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let request_uri = if config.auth_domain.is_empty() {
            "http://localhost".to_string()
        } else {
            format!("https://{}", config.auth_domain)
        };

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            request_uri,
            recaptcha_token: Some(config.recaptcha_token.clone()).filter(|t| !t.is_empty()),
            id_token: Mutex::new(None),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/accounts:{}?key={}", self.endpoint, method, self.api_key)
    }

    async fn post<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T, AuthError> {
        debug!(method = method, "identity_request");
        let response = self
            .http
            .post(self.url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(provider_error_message(status.as_u16(), &text)));
        }

        response.json::<T>().await.map_err(|e| AuthError::Transport(e.to_string()))
    }

    async fn account_request(&self, method: &str, body: Value, provider: &str) -> Result<User, AuthError> {
        let account: AccountResponse = self.post(method, body).await?;
        *self.id_token.lock() = account.id_token.clone();
        Ok(account.into_user(provider))
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        match credentials {
            Credentials::EmailPassword { email, password } => {
                let body = json!({ "email": email, "password": password, "returnSecureToken": true });
                self.account_request("signInWithPassword", body, "password").await
            }
            Credentials::Federated { provider_id, id_token } => {
                let body = json!({
                    "postBody": idp_post_body(provider_id, id_token),
                    "requestUri": self.request_uri,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                });
                self.account_request("signInWithIdp", body, provider_id).await
            }
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<User, AuthError> {
        match credentials {
            Credentials::EmailPassword { email, password } => {
                let body = json!({ "email": email, "password": password, "returnSecureToken": true });
                self.account_request("signUp", body, "password").await
            }
            // Federated sign-in creates the account on first use
            Credentials::Federated { .. } => self.sign_in(credentials).await,
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.id_token.lock().take();
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let body = json!({ "requestType": "PASSWORD_RESET", "email": email });
        let _: Value = self.post("sendOobCode", body).await?;
        info!("identity_password_reset_sent");
        Ok(())
    }

    async fn start_phone_verification(&self, phone_number: &str) -> Result<PhoneChallenge, AuthError> {
        let mut body = json!({ "phoneNumber": phone_number });
        if let Some(token) = &self.recaptcha_token {
            body["recaptchaToken"] = json!(token);
        }
        let response: VerificationResponse = self.post("sendVerificationCode", body).await?;
        Ok(PhoneChallenge { phone_number: phone_number.to_string(), session_info: response.session_info })
    }

    async fn confirm_phone_verification(
        &self,
        challenge: &PhoneChallenge,
        code: &str,
    ) -> Result<User, AuthError> {
        let body = json!({ "sessionInfo": challenge.session_info, "code": code });
        let mut user = self.account_request("signInWithPhoneNumber", body, "phone").await?;
        if user.phone_number.is_none() {
            user.phone_number = Some(challenge.phone_number.clone());
        }
        Ok(user)
    }
}

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct LocalAccount {
    uid: String,
    email: Option<String>,
    phone_number: Option<String>,
    password: Option<String>,
}

/// In-memory provider. Verification codes are logged instead of sent.
#[derive(Default)]
pub struct LocalIdentityProvider {
    accounts: Mutex<HashMap<String, LocalAccount>>,
    challenges: Mutex<HashMap<String, (String, String)>>,
    latest_codes: Mutex<HashMap<String, String>>,
}

impl LocalIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code issued for a phone number
    pub fn last_code_for(&self, phone_number: &str) -> Option<String> {
        self.latest_codes.lock().get(phone_number).cloned()
    }

    fn new_uid() -> String {
        uuid::Uuid::now_v7().simple().to_string()
    }

    fn user(account: &LocalAccount, provider: &str) -> User {
        User {
            uid: account.uid.clone(),
            email: account.email.clone(),
            phone_number: account.phone_number.clone(),
            display_name: None,
            provider_id: provider.to_string(),
            signed_in_at: Utc::now(),
        }
    }

    fn check_email(email: &str) -> Result<String, AuthError> {
        let email = email.trim().to_lowercase();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
            _ => Err(AuthError::Provider("INVALID_EMAIL".to_string())),
        }
    }

    fn federated(&self, provider_id: &str, id_token: &str) -> Result<User, AuthError> {
        if id_token.is_empty() {
            return Err(AuthError::Provider("INVALID_IDP_RESPONSE".to_string()));
        }
        let key = format!("{}:{}", provider_id, id_token);
        let mut accounts = self.accounts.lock();
        let account = accounts.entry(key).or_insert_with(|| LocalAccount {
            uid: Self::new_uid(),
            email: None,
            phone_number: None,
            password: None,
        });
        Ok(Self::user(account, provider_id))
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<User, AuthError> {
        match credentials {
            Credentials::EmailPassword { email, password } => {
                let email = Self::check_email(email)?;
                let accounts = self.accounts.lock();
                let account = accounts
                    .get(&email)
                    .ok_or_else(|| AuthError::Provider("EMAIL_NOT_FOUND".to_string()))?;
                if account.password.as_deref() != Some(password.as_str()) {
                    return Err(AuthError::Provider("INVALID_PASSWORD".to_string()));
                }
                Ok(Self::user(account, "password"))
            }
            Credentials::Federated { provider_id, id_token } => self.federated(provider_id, id_token),
        }
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<User, AuthError> {
        match credentials {
            Credentials::EmailPassword { email, password } => {
                let email = Self::check_email(email)?;
                if password.len() < MIN_PASSWORD_LEN {
                    return Err(AuthError::Provider(
                        "WEAK_PASSWORD : Password should be at least 6 characters".to_string(),
                    ));
                }
                let mut accounts = self.accounts.lock();
                if accounts.contains_key(&email) {
                    return Err(AuthError::Provider("EMAIL_EXISTS".to_string()));
                }
                let account = LocalAccount {
                    uid: Self::new_uid(),
                    email: Some(email.clone()),
                    phone_number: None,
                    password: Some(password.clone()),
                };
                let user = Self::user(&account, "password");
                accounts.insert(email, account);
                Ok(user)
            }
            Credentials::Federated { provider_id, id_token } => self.federated(provider_id, id_token),
        }
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = Self::check_email(email)?;
        if !self.accounts.lock().contains_key(&email) {
            return Err(AuthError::Provider("EMAIL_NOT_FOUND".to_string()));
        }
        info!(email = %email, "local_password_reset_requested");
        Ok(())
    }

    async fn start_phone_verification(&self, phone_number: &str) -> Result<PhoneChallenge, AuthError> {
        let digits = phone_number.chars().filter(|c| c.is_ascii_digit()).count();
        if !phone_number.starts_with('+') || digits < 10 {
            return Err(AuthError::Provider("INVALID_PHONE_NUMBER".to_string()));
        }
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32));
        let session_info = Self::new_uid();
        info!(phone = %phone_number, code = %code, "local_verification_code");
        self.latest_codes.lock().insert(phone_number.to_string(), code.clone());
        self.challenges
            .lock()
            .insert(session_info.clone(), (phone_number.to_string(), code));
        Ok(PhoneChallenge { phone_number: phone_number.to_string(), session_info })
    }

    async fn confirm_phone_verification(
        &self,
        challenge: &PhoneChallenge,
        code: &str,
    ) -> Result<User, AuthError> {
        let mut challenges = self.challenges.lock();
        let (phone, expected) = challenges
            .get(&challenge.session_info)
            .cloned()
            .ok_or_else(|| AuthError::Provider("INVALID_SESSION_INFO".to_string()))?;
        if expected != code {
            return Err(AuthError::Provider("INVALID_CODE".to_string()));
        }
        challenges.remove(&challenge.session_info);
        drop(challenges);

        let mut accounts = self.accounts.lock();
        let account = accounts.entry(phone.clone()).or_insert_with(|| LocalAccount {
            uid: Self::new_uid(),
            email: None,
            phone_number: Some(phone),
            password: None,
        });
        Ok(Self::user(account, "phone"))
    }
}
