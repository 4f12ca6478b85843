use crate::pipeline::Scraper;

/// Shared application state passed to all handlers. Holds no per-request
/// data; the scraper only shares its HTTP connection pool.
#[derive(Clone)]
pub struct AppState {
    pub scraper: Scraper,
}
