pub mod config;
pub mod logging;

pub use config::{DEFAULT_MARKET_API_URL, DashboardConfig};
