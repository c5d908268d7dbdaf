//! The headline figures printed above the report charts.

use serde::{Deserialize, Serialize};

use crate::records::ReportInput;

/// Summary scalars of a report request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    /// Sum of produced quantity over all production records.
    pub total_produced: f64,
    /// Number of logistics requests.
    pub total_logistics: usize,
    /// Number of tracking logs whose status is exactly `"Completed"`.
    pub completed_deliveries: usize,
}

impl ReportSummary {
    pub fn from_input(input: &ReportInput) -> Self {
        Self {
            total_produced: input
                .production
                .iter()
                .fold(0.0, |sum, r| sum + r.produced_qty),
            total_logistics: input.logistics.len(),
            completed_deliveries: input.tracking.iter().filter(|l| l.is_completed()).count(),
        }
    }

    /// The text lines printed in the report, in order.
    pub fn lines(&self) -> [String; 3] {
        [
            format!("Total Production Quantity: {}", self.total_produced),
            format!("Total Logistics Requests: {}", self.total_logistics),
            format!("Total Completed Deliveries: {}", self.completed_deliveries),
        ]
    }
}
