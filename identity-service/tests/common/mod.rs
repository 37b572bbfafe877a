use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::TokenEngine;
use chrono::Duration;
use identity_service::domain::identity::models::Credential;
use identity_service::domain::identity::models::EmailAddress;
use identity_service::domain::identity::models::LoginCredential;
use identity_service::domain::identity::models::Registration;
use identity_service::domain::identity::models::TokenId;
use identity_service::domain::identity::models::UserId;
use identity_service::domain::identity::models::VerificationToken;
use identity_service::domain::identity::ports::IdentityRepository;
use identity_service::domain::identity::ports::MailDispatcher;
use identity_service::domain::identity::service::AuthService;
use identity_service::identity::errors::RepositoryError;
use identity_service::inbound::http::router::create_router;
use serde_json::json;

pub const TEST_SECRET: &[u8] = b"test-secret-key-for-jwt-signing-at-least-32-bytes";
pub const PASSWORD: &str = "Abcdef1!";

/// Test application that spawns a real server over in-memory collaborators
pub struct TestApp {
    pub address: String,
    pub api_client: reqwest::Client,
    pub repository: Arc<InMemoryIdentityRepository>,
    pub mail: Arc<RecordingMailDispatcher>,
    pub token_engine: TokenEngine,
}

impl TestApp {
    /// Spawn the application in a background task and return TestApp
    pub async fn spawn() -> Self {
        // Use random port (0 = OS assigns)
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryIdentityRepository::default());
        let mail = Arc::new(RecordingMailDispatcher::default());

        let auth_service = Arc::new(AuthService::new(
            Arc::clone(&repository),
            Arc::clone(&mail),
            Arc::new(token_engine()),
            Duration::minutes(30),
        ));

        let router = create_router(auth_service);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        Self {
            address,
            api_client: reqwest::Client::new(),
            repository,
            mail,
            token_engine: token_engine(),
        }
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.get(format!("{}{}", self.address, path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.api_client.post(format!("{}{}", self.address, path))
    }

    /// Helper to make GET request with Bearer token
    pub fn get_authenticated(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path).bearer_auth(token)
    }

    pub async fn sign_up(&self, fullname: &str, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth")
            .json(&json!({
                "fullname": fullname,
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth/signin")
            .json(&json!({
                "email": email,
                "password": password
            }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn sign_out(&self, refresh_token: &str) -> reqwest::Response {
        self.post("/auth/signout")
            .json(&json!({ "token": refresh_token }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Follow the activation link of the most recent activation mail
    pub async fn follow_last_activation_link(&self) -> reqwest::Response {
        let (user_id, token) = self.mail.last().expect("No activation mail sent");
        self.get(&format!("/auth/verify?id={}&token={}", user_id, token))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Register and activate an account, returning its id
    pub async fn register_verified(&self, email: &str) -> i64 {
        let response = self.sign_up("Ada Lovelace", email, PASSWORD).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let response = self.follow_last_activation_link().await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        self.mail.last().expect("No activation mail sent").0
    }

    /// Sign in and return `(access_token, refresh_token)`
    pub async fn tokens_for(&self, email: &str) -> (String, String) {
        let response = self.sign_in(email, PASSWORD).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let body: serde_json::Value = response.json().await.expect("Failed to parse response");
        (
            body["token"][0]["token"].as_str().unwrap().to_string(),
            body["token"][1]["token"].as_str().unwrap().to_string(),
        )
    }
}

pub fn token_engine() -> TokenEngine {
    TokenEngine::new(TEST_SECRET, Duration::minutes(15), Duration::minutes(60))
}

#[derive(Debug, Clone)]
struct StoredUser {
    credential: Credential,
    password_hash: String,
}

/// Identity store kept in a vector behind a mutex
#[derive(Debug, Default)]
pub struct InMemoryIdentityRepository {
    users: Mutex<Vec<StoredUser>>,
}

impl InMemoryIdentityRepository {
    pub fn password_hash(&self, email: &str) -> Option<String> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.credential.email == email)
            .map(|user| user.password_hash.clone())
    }

    pub fn credential(&self, id: i64) -> Option<Credential> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.credential.id == UserId(id))
            .map(|user| user.credential.clone())
    }

    fn update(
        &self,
        id: &UserId,
        apply: impl FnOnce(&mut Credential),
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.credential.id == *id)
            .ok_or(RepositoryError::NotFound(id.0))?;
        apply(&mut user.credential);
        Ok(())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn insert(&self, registration: Registration) -> Result<UserId, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|user| user.credential.email == registration.email.as_str())
        {
            return Err(RepositoryError::EmailAlreadyExists(
                registration.email.as_str().to_string(),
            ));
        }

        let id = UserId(users.len() as i64 + 1);
        users.push(StoredUser {
            credential: Credential {
                id,
                email: registration.email.as_str().to_string(),
                fullname: registration.fullname.as_str().to_string(),
                is_verified: registration.is_verified,
                token_id: None,
                verification_token: Some(registration.verification_token.as_str().to_string()),
                verification_expires_at: Some(registration.verification_expires_at),
            },
            password_hash: registration.password_hash,
        });
        Ok(id)
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Credential>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.credential.email == email.as_str())
            .map(|user| user.credential.clone()))
    }

    async fn find_credential_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<LoginCredential>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.credential.email == email.as_str())
            .map(|user| LoginCredential {
                id: user.credential.id,
                email: user.credential.email.clone(),
                password_hash: user.password_hash.clone(),
                is_verified: user.credential.is_verified,
            }))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<Credential>, RepositoryError> {
        Ok(self.credential(id.0))
    }

    async fn set_token_id(&self, id: &UserId, token_id: &TokenId) -> Result<(), RepositoryError> {
        let token_id = token_id.as_str().to_string();
        self.update(id, |credential| credential.token_id = Some(token_id))
    }

    async fn clear_token_id(
        &self,
        id: &UserId,
        expected: &TokenId,
    ) -> Result<bool, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|user| user.credential.id == *id) else {
            return Ok(false);
        };
        if user.credential.token_id.as_deref() != Some(expected.as_str()) {
            return Ok(false);
        }
        user.credential.token_id = None;
        Ok(true)
    }

    async fn mark_verified(&self, id: &UserId) -> Result<(), RepositoryError> {
        self.update(id, |credential| {
            credential.is_verified = true;
            credential.verification_token = None;
            credential.verification_expires_at = None;
        })
    }
}

/// Mail dispatcher that records every activation request
#[derive(Debug, Default)]
pub struct RecordingMailDispatcher {
    sent: Mutex<Vec<(i64, String, String)>>,
}

impl RecordingMailDispatcher {
    pub fn last(&self) -> Option<(i64, String)> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(id, _, token)| (*id, token.clone()))
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn last_recipient(&self) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .last()
            .map(|(_, recipient, _)| recipient.clone())
    }
}

impl MailDispatcher for RecordingMailDispatcher {
    fn send_activation_link(
        &self,
        user_id: &UserId,
        recipient: &EmailAddress,
        token: &VerificationToken,
    ) {
        self.sent.lock().unwrap().push((
            user_id.0,
            recipient.as_str().to_string(),
            token.as_str().to_string(),
        ));
    }
}
