//! Shared application state for all routes.

use crate::config::Settings;
use crate::model::Example;
use crate::repository::Repository;
use crate::session::SessionFactory;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// One session is opened per request and dropped when the handler returns.
    pub sessions: Arc<dyn SessionFactory>,
    pub examples: Repository<Example>,
}

impl AppState {
    pub fn new(settings: Settings, sessions: Arc<dyn SessionFactory>) -> Self {
        AppState {
            settings: Arc::new(settings),
            sessions,
            examples: Repository::new(),
        }
    }
}
