use crate::config::AppConfig;
use crate::session::SessionService;

#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionService,
    pub config: AppConfig,
}
