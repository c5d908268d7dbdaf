//! Production report generation and dashboard aggregation for manufacturing records.
//!
//! [`composer::ReportComposer`] turns production, logistics, and tracking records into a
//! multi-page PDF; [`dashboard`] and [`aggregate`] reduce the same records to the series and
//! KPI figures shown on the operations dashboard.

pub mod aggregate;
pub mod chart;
pub mod composer;
pub mod config;
pub mod dashboard;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod records;
pub mod summary;

#[cfg(feature = "bookmarks")]
pub mod bookmarks;

pub use composer::{RenderedReport, ReportComposer};
pub use config::ReportConfig;
pub use error::ReportError;
pub use records::ReportInput;
