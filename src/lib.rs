pub mod aggregate;
pub mod charts;
pub mod config;
pub mod error;
pub mod findings;
pub mod loader;
pub mod output;
pub mod reports;
pub mod table;
pub mod transform;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::{ReportError, Result};
pub use reports::Report;
pub use types::Row;
