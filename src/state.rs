use std::sync::Arc;

use crate::analysis::Analyzer;
use crate::config::Config;
use crate::delivery::Deliverer;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    pub deliverer: Deliverer,
    /// `None` when no result spreadsheet is configured.
    pub analyzer: Option<Analyzer>,
}
