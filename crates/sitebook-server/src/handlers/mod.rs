//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod audit;
pub mod dashboard;
pub mod expenses;
pub mod imports;
pub mod invoices;
pub mod loans;
pub mod projects;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod workers;

// Re-export all handlers for use in router
pub use audit::*;
pub use dashboard::*;
pub use expenses::*;
pub use imports::*;
pub use invoices::*;
pub use loans::*;
pub use projects::*;
pub use purchases::*;
pub use reports::*;
pub use sales::*;
pub use workers::*;

use serde::Deserialize;
use sitebook_core::tax::DateWindow;

use crate::AppError;

/// Common date-window query parameters (YYYY-MM-DD, both optional)
#[derive(Debug, Deserialize, Default)]
pub struct WindowQuery {
    #[serde(rename = "startDate")]
    pub start_date: Option<String>,
    #[serde(rename = "endDate")]
    pub end_date: Option<String>,
}

impl WindowQuery {
    pub fn window(&self) -> Result<DateWindow, AppError> {
        DateWindow::parse(self.start_date.as_deref(), self.end_date.as_deref())
            .map_err(|e| AppError::bad_request(&e.to_string()))
    }
}
