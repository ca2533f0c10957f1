use std::sync::Arc;

use crate::auth::jwt::TokenService;
use crate::config::Config;
use crate::db::UserStore;
use crate::email::EmailSender;
use crate::providers::SmsVerifier;

pub type SharedState = Arc<AppState>;

/// Everything a request handler needs. Built once at startup and never mutated.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn UserStore>,
    pub tokens: TokenService,
    pub sms: Arc<dyn SmsVerifier>,
    pub mailer: Arc<dyn EmailSender>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn UserStore>,
        sms: Arc<dyn SmsVerifier>,
        mailer: Arc<dyn EmailSender>,
    ) -> Self {
        let tokens = TokenService::new(&config.jwt);
        Self {
            config,
            store,
            tokens,
            sms,
            mailer,
        }
    }
}
