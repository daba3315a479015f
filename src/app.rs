//! Wires the client together: one gateway, one credential store, one session,
//! and a navigator listening for forced logouts.

use crate::{
    app_lib::{AppError, ClientConfig, HttpGateway},
    features::{
        admin::AdminClient,
        auth::{
            decision::LoginDecisionHandler,
            state::SessionManager,
            store::{CredentialStore, FileCredentialStore},
        },
    },
    routes::{LoginPage, Navigator},
};
use std::sync::Arc;

#[derive(Debug)]
pub struct App {
    pub config: ClientConfig,
    pub session: Arc<SessionManager>,
    pub navigator: Arc<Navigator>,
}

impl App {
    /// Builds the client with the file-backed store under `config.store_dir`.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the gateway or store cannot be set up.
    pub fn new(config: ClientConfig) -> Result<Self, AppError> {
        let store = FileCredentialStore::for_origin(&config.store_dir, &config.api_base_url)?;
        Self::with_store(config, Arc::new(store))
    }

    /// Builds the client around an explicit store.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the gateway cannot be built.
    pub fn with_store(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, AppError> {
        let gateway = Arc::new(HttpGateway::new(&config)?);
        // Session subscribes first so navigation sees the cleared state.
        let session = Arc::new(SessionManager::new(gateway, store));
        let navigator = Arc::new(Navigator::new(Arc::clone(&session)));
        Ok(Self {
            config,
            session,
            navigator,
        })
    }

    #[must_use]
    pub fn login_page(&self) -> LoginPage {
        LoginPage::new(
            LoginDecisionHandler::new(
                Arc::clone(self.session.gateway()),
                self.config.second_factor_ttl,
            ),
            Arc::clone(&self.navigator),
        )
    }

    #[must_use]
    pub fn admin(&self) -> AdminClient {
        AdminClient::new(Arc::clone(self.session.gateway()))
    }
}
