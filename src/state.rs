use crate::backend::SharedBackend;
use crate::config::Config;
use crate::session::Sessions;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backend: SharedBackend,
    pub sessions: Arc<Sessions>,
}

impl AppState {
    pub fn new(config: Config, backend: SharedBackend) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            sessions: Arc::new(Sessions::default()),
        }
    }
}
