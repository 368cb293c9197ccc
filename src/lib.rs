pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod import;
pub mod mail;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod routes;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::{auth::TokenIssuer, config::Config, mail::Mailer, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub tokens: TokenIssuer,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: Arc<Config>, store: Store, mailer: Arc<dyn Mailer>) -> Self {
        let tokens = TokenIssuer::new(&config.secret_key, config.access_token_ttl_hours);
        Self { config, store, tokens, mailer }
    }
}

pub use routes::app;
