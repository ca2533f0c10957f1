#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use jsonwebtoken::Algorithm;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Barrier;

use gallery_auth::config::{Config, JwtConfig};
use gallery_auth::db::MemoryUserStore;
use gallery_auth::email::EmailSender;
use gallery_auth::providers::{ChallengeHandle, CheckStatus, ProviderError, SmsVerifier};
use gallery_auth::state::{AppState, SharedState};

pub const JWT_SECRET: &str = "test-jwt-secret-that-is-long-enough";

/// SMS provider double. Approves exactly the (phone, code) pairs it was told to.
#[derive(Default)]
pub struct FakeSms {
    approved: Mutex<HashSet<(String, String)>>,
    started: Mutex<Vec<String>>,
    down: AtomicBool,
    gate: Mutex<Option<Arc<Barrier>>>,
}

impl FakeSms {
    pub fn approve(&self, phone: &str, code: &str) {
        self.approved
            .lock()
            .unwrap()
            .insert((phone.to_string(), code.to_string()));
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    /// Make every check wait until `parties` checks are in flight together.
    pub fn hold_checks(&self, parties: usize) {
        *self.gate.lock().unwrap() = Some(Arc::new(Barrier::new(parties)));
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsVerifier for FakeSms {
    async fn create_challenge(&self, phone_number: &str) -> Result<ChallengeHandle, ProviderError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport("sms provider down".to_string()));
        }
        self.started.lock().unwrap().push(phone_number.to_string());
        Ok(ChallengeHandle {
            id: format!("VE{}", self.started.lock().unwrap().len()),
            status: "pending".to_string(),
        })
    }

    async fn check_challenge(
        &self,
        phone_number: &str,
        code: &str,
    ) -> Result<CheckStatus, ProviderError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ProviderError::Transport("sms provider down".to_string()));
        }

        let gate = self.gate.lock().unwrap().clone();
        if let Some(barrier) = gate {
            barrier.wait().await;
        }

        let key = (phone_number.to_string(), code.to_string());
        if self.approved.lock().unwrap().contains(&key) {
            Ok(CheckStatus::Approved)
        } else {
            Ok(CheckStatus::Denied)
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Email provider double that keeps every message it was asked to send.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<SentMail>>,
    down: AtomicBool,
}

impl CapturingMailer {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    /// The code in the most recent message to `to`.
    pub fn last_code_for(&self, to: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let mail = sent.iter().rev().find(|m| m.to == to)?;
        let (_, rest) = mail.text.split_once("code is: ")?;
        Some(rest.chars().take(6).collect())
    }
}

#[async_trait]
impl EmailSender for CapturingMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        _html_body: &str,
    ) -> Result<(), ProviderError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ProviderError::Rejected {
                status: 503,
                body: "mail provider down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            text: text_body.to_string(),
        });
        Ok(())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "memory://".to_string(),
        database_max_connections: 1,
        jwt: JwtConfig {
            secret: JWT_SECRET.to_string(),
            algorithm: Algorithm::HS256,
            ttl_minutes: 30,
        },
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        log_level: "warn".to_string(),
        twilio: None,
        mail: None,
    }
}

/// Application state wired to in-memory doubles, for calling flows directly.
pub struct TestDeps {
    pub state: SharedState,
    pub store: Arc<MemoryUserStore>,
    pub sms: Arc<FakeSms>,
    pub mailer: Arc<CapturingMailer>,
}

pub fn test_deps() -> TestDeps {
    let store = Arc::new(MemoryUserStore::new());
    let sms = Arc::new(FakeSms::default());
    let mailer = Arc::new(CapturingMailer::default());

    let state = Arc::new(AppState::new(
        test_config(),
        store.clone(),
        sms.clone(),
        mailer.clone(),
    ));

    TestDeps {
        state,
        store,
        sms,
        mailer,
    }
}

/// A running test server backed by in-memory doubles.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub deps: TestDeps,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn store(&self) -> &MemoryUserStore {
        &self.deps.store
    }

    pub fn sms(&self) -> &FakeSms {
        &self.deps.sms
    }

    pub fn mailer(&self) -> &CapturingMailer {
        &self.deps.mailer
    }

    /// POST a JSON body, optionally with a bearer token.
    pub async fn post(&self, path: &str, token: Option<&str>, body: &Value) -> (Value, StatusCode) {
        let mut req = self.client.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.expect("post request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    pub async fn get_auth(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Log in by phone, approving `code` first. Returns the access token.
    pub async fn phone_login(&self, phone: &str) -> String {
        self.sms().approve(phone, "123456");
        let (body, status) = self
            .post(
                "/api/v1/auth/phone/verify-otp",
                None,
                &json!({ "phone_number": phone, "code": "123456" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "phone login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Register and verify an email account. Returns the access token.
    pub async fn email_signup(&self, email: &str, password: &str) -> String {
        let (body, status) = self
            .post(
                "/api/v1/auth/email/register",
                None,
                &json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "register failed: {body}");

        let code = self.mailer().last_code_for(email).expect("no code mailed");
        let (body, status) = self
            .post(
                "/api/v1/auth/email/verify-otp",
                None,
                &json!({ "email": email, "code": code }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "verify failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }
}

/// Spawn the router on a random local port.
pub async fn spawn_app() -> TestApp {
    let deps = test_deps();
    let app = gallery_auth::build_app(deps.state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        client: Client::new(),
        deps,
    }
}
