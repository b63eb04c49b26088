use std::sync::Arc;

use keepmark_db::Repositories;

use crate::config::AuthConfig;
use crate::services::{AuthService, TitleResolver};

/// Shared, cheaply cloneable handler state.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub auth: AuthService,
    pub title_resolver: Arc<dyn TitleResolver>,
}

impl AppState {
    pub fn new(
        repos: impl Into<Repositories>,
        auth: AuthConfig,
        title_resolver: Arc<dyn TitleResolver>,
    ) -> Self {
        let repos = repos.into();
        Self {
            auth: AuthService::new(repos.users.clone(), auth),
            repos,
            title_resolver,
        }
    }
}
