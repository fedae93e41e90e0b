use service::Services;

/// Shared by every handler; cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
}

impl AppState {
    pub fn new(services: Services) -> Self { Self { services } }
}
