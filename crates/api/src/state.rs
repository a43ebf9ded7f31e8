use dockhand_control::{HostRegistry, UserStore};
use dockhand_engine::Engine;
use dockhand_models::Config;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub registry: HostRegistry,
    pub users: UserStore,
    pub engine: Arc<Engine>,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: HostRegistry,
        users: UserStore,
        engine: Arc<Engine>,
    ) -> Self {
        Self {
            config,
            registry,
            users,
            engine,
        }
    }
}
