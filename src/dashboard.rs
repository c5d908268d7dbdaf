//! Dashboard figures recomputed from raw record collections.

use serde::{Deserialize, Serialize};

use crate::aggregate::{average_delivery_days, count_by, count_where_by, sum_by, Series};
use crate::error::ReportError;
use crate::records::{
    ModuleRequest, Notification, ProductionRecord, TrackingLog, WorkOrder, STATUS_COMPLETED,
};

const STATUS_PENDING: &str = "Pending";
const STATUS_IN_TRANSIT: &str = "In Transit";
const STATUS_FULFILLED: &str = "fulfilled";
/// Key for production records whose work order is unknown or names no product.
pub const UNKNOWN_MODEL: &str = "Unknown Model";

/// Every collection a dashboard view reads.
///
/// Missing collections deserialize as empty; views render whatever subset has arrived.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    #[serde(default)]
    pub work_orders: Vec<WorkOrder>,
    #[serde(default, rename = "logisticsData", alias = "requests")]
    pub requests: Vec<ModuleRequest>,
    #[serde(default, rename = "trackingData", alias = "trackingLogs")]
    pub tracking: Vec<TrackingLog>,
    #[serde(default, rename = "productionData")]
    pub production: Vec<ProductionRecord>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl DashboardData {
    /// Parses a JSON document holding any subset of the collections.
    pub fn from_json(body: &[u8]) -> Result<Self, ReportError> {
        Ok(serde_json::from_slice(body)?)
    }
}

/// Headline figures shown across the dashboard views.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_work_orders: usize,
    pub completed_work_orders: usize,
    pub total_module_requests: usize,
    pub pending_module_requests: usize,
    pub fulfilled_module_requests: usize,
    pub shipments_in_transit: usize,
    pub shipments_completed: usize,
    pub pending_shipments: usize,
    pub average_delivery_days: f64,
    pub production_rate: f64,
    pub late_fulfillments: usize,
    pub total_units_produced: f64,
    pub fulfillment_efficiency: f64,
    pub unread_notifications: usize,
}

impl DashboardMetrics {
    /// Computes every figure from scratch.
    ///
    /// Ratios over an empty collection are reported as `0`.
    pub fn compute(data: &DashboardData) -> Self {
        let production_len = data.production.len();
        let total_units_produced = data
            .production
            .iter()
            .fold(0.0, |sum, r| sum + r.produced_qty);
        let fulfilled_orders = data.production.iter().filter(|r| r.order_fulfilled).count();

        Self {
            total_work_orders: data.work_orders.len(),
            completed_work_orders: data
                .work_orders
                .iter()
                .filter(|order| order.status.as_str() == STATUS_COMPLETED)
                .count(),
            total_module_requests: data.requests.len(),
            pending_module_requests: data
                .requests
                .iter()
                .filter(|request| request.status.as_str() == STATUS_PENDING)
                .count(),
            fulfilled_module_requests: data
                .requests
                .iter()
                .filter(|request| request.status.eq_ignore_ascii_case(STATUS_FULFILLED))
                .count(),
            shipments_in_transit: data
                .tracking
                .iter()
                .filter(|log| log.status.as_str() == STATUS_IN_TRANSIT)
                .count(),
            shipments_completed: data.tracking.iter().filter(|log| log.is_completed()).count(),
            pending_shipments: data
                .tracking
                .iter()
                .filter(|log| log.status.eq_ignore_ascii_case(STATUS_PENDING))
                .count(),
            average_delivery_days: average_delivery_days(&data.tracking, &data.requests),
            production_rate: ratio(total_units_produced, production_len),
            late_fulfillments: data.production.iter().filter(|r| !r.order_on_time).count(),
            total_units_produced,
            fulfillment_efficiency: ratio(fulfilled_orders as f64, production_len) * 100.0,
            unread_notifications: data.notifications.len(),
        }
    }
}

fn ratio(numerator: f64, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

/// Breakdown of delivered shipments for the tracking view.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentBreakdown {
    /// Count per status.
    pub by_status: Series,
    /// Delivered quantity per module.
    pub quantity_by_module: Series,
    /// Count per recipient.
    pub by_recipient: Series,
    /// Count per request date.
    pub request_trend: Series,
}

impl ShipmentBreakdown {
    /// Builds the breakdown over logs whose status is exactly `"Completed"`.
    pub fn completed(tracking: &[TrackingLog]) -> Self {
        let completed: Vec<&TrackingLog> =
            tracking.iter().filter(|log| log.is_completed()).collect();

        Self {
            by_status: count_by(completed.iter().copied(), |log| log.status.as_str())
                .into_series(),
            quantity_by_module: sum_by(
                completed.iter().copied(),
                |log| log.module.as_str(),
                |log| log.quantity,
            )
            .into_series(),
            by_recipient: count_by(completed.iter().copied(), |log| log.recipient.as_str())
                .into_series(),
            request_trend: count_by(completed.iter().copied(), |log| log.request_date.as_str())
                .into_series(),
        }
    }
}

/// Status histogram of module requests, used by the logistics view.
pub fn request_status_distribution(requests: &[ModuleRequest]) -> Series {
    count_by(requests, |request| request.status.as_str()).into_series()
}

/// Produced quantity per product, resolved through each record's work order.
///
/// Records are joined to work orders by [`WorkOrder::is_fulfilled_by`]; the key is the order's
/// [`WorkOrder::model`], or [`UNKNOWN_MODEL`] when no order matches or it names no product.
pub fn produced_by_work_order_model(
    production: &[ProductionRecord],
    orders: &[WorkOrder],
) -> Series {
    sum_by(
        production,
        |record| {
            orders
                .iter()
                .find(|order| order.is_fulfilled_by(record))
                .and_then(WorkOrder::model)
                .unwrap_or(UNKNOWN_MODEL)
        },
        |record| record.produced_qty,
    )
    .into_series()
}

/// The series behind the dashboard's chart widgets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSeries {
    pub request_status: Series,
    pub open_work_orders_by_assignee: Series,
    pub produced_by_model: Series,
    pub completed_shipments: ShipmentBreakdown,
}

impl DashboardSeries {
    pub fn compute(data: &DashboardData) -> Self {
        Self {
            request_status: request_status_distribution(&data.requests),
            open_work_orders_by_assignee: open_work_orders_by_assignee(&data.work_orders),
            produced_by_model: produced_by_work_order_model(&data.production, &data.work_orders),
            completed_shipments: ShipmentBreakdown::completed(&data.tracking),
        }
    }
}

/// Work orders per assignee that are not completed yet.
pub fn open_work_orders_by_assignee(orders: &[WorkOrder]) -> Series {
    count_where_by(
        orders,
        |order| order.status.as_str() != STATUS_COMPLETED,
        |order| order.assigned_to.as_str(),
    )
    .into_series()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DataPoint;
    use crate::records::Label;

    fn tracking(status: &str, module: &str, recipient: &str, quantity: f64) -> TrackingLog {
        TrackingLog {
            status: Label::from(status),
            module: Label::from(module),
            recipient: Label::from(recipient),
            request_date: Label::from("2023-10-10"),
            quantity,
            ..TrackingLog::default()
        }
    }

    #[test]
    fn metrics_over_empty_data_are_zero() {
        let metrics = DashboardMetrics::compute(&DashboardData::default());
        assert_eq!(metrics, DashboardMetrics::default());
        assert!(!metrics.production_rate.is_nan());
        assert!(!metrics.fulfillment_efficiency.is_nan());
    }

    #[test]
    fn metrics_follow_status_rules() {
        let data = DashboardData {
            requests: vec![
                ModuleRequest {
                    status: Label::from("Pending"),
                    ..ModuleRequest::default()
                },
                ModuleRequest {
                    status: Label::from("Fulfilled"),
                    ..ModuleRequest::default()
                },
            ],
            tracking: vec![
                tracking("In Transit", "SPK-001", "Factory A", 10.0),
                tracking("Completed", "SPK-001", "Factory A", 10.0),
                tracking("pending", "HOS-001", "Factory B", 5.0),
            ],
            production: vec![
                ProductionRecord {
                    produced_qty: 30.0,
                    order_fulfilled: true,
                    order_on_time: true,
                    ..ProductionRecord::default()
                },
                ProductionRecord {
                    produced_qty: 10.0,
                    ..ProductionRecord::default()
                },
            ],
            ..DashboardData::default()
        };

        let metrics = DashboardMetrics::compute(&data);
        assert_eq!(metrics.pending_module_requests, 1);
        assert_eq!(metrics.fulfilled_module_requests, 1);
        assert_eq!(metrics.shipments_in_transit, 1);
        assert_eq!(metrics.shipments_completed, 1);
        assert_eq!(metrics.pending_shipments, 1);
        assert_eq!(metrics.total_units_produced, 40.0);
        assert_eq!(metrics.production_rate, 20.0);
        assert_eq!(metrics.late_fulfillments, 1);
        assert_eq!(metrics.fulfillment_efficiency, 50.0);
    }

    #[test]
    fn breakdown_only_counts_completed_shipments() {
        let logs = vec![
            tracking("Completed", "SPK-001", "Factory A", 60.0),
            tracking("Pending", "SPK-001", "Factory A", 999.0),
            tracking("Completed", "HOS-001", "Factory C", 210.0),
            tracking("Completed", "SPK-001", "Factory C", 40.0),
        ];
        let breakdown = ShipmentBreakdown::completed(&logs);

        assert_eq!(
            breakdown.by_status.points(),
            &[DataPoint::new("Completed", 3.0)]
        );
        assert_eq!(
            breakdown.quantity_by_module.points(),
            &[
                DataPoint::new("SPK-001", 100.0),
                DataPoint::new("HOS-001", 210.0)
            ]
        );
        assert_eq!(breakdown.by_recipient.total(), 3.0);
        assert_eq!(breakdown.request_trend.points(), &[DataPoint::new("2023-10-10", 3.0)]);
    }

    #[test]
    fn open_orders_skip_completed_ones() {
        let orders = vec![
            WorkOrder {
                status: Label::from("Completed"),
                assigned_to: Label::from("Ava"),
                ..WorkOrder::default()
            },
            WorkOrder {
                status: Label::from("Pending"),
                assigned_to: Label::from("Ava"),
                ..WorkOrder::default()
            },
            WorkOrder::default(),
        ];
        let series = open_work_orders_by_assignee(&orders);
        assert_eq!(
            series.points(),
            &[DataPoint::new("Ava", 1.0), DataPoint::new("N/A", 1.0)]
        );
    }

    #[test]
    fn production_joins_work_orders_for_its_model() {
        let data = DashboardData::from_json(
            br#"{
                "workOrders": [
                    {"_id": "w1", "phoneModel": "A14", "module": "SPK-001"},
                    {"_id": "w2", "module": "HOS-001"}
                ],
                "productionData": [
                    {"workOrderID": "w1", "producedQty": 30},
                    {"workOrderID": "w9", "producedQty": 5},
                    {"workOrderID": "w2", "producedQty": 7},
                    {"producedQty": 1},
                    {"workOrderID": "w1", "producedQty": 10}
                ]
            }"#,
        )
        .unwrap();

        let series = produced_by_work_order_model(&data.production, &data.work_orders);
        assert_eq!(
            series.points(),
            &[
                DataPoint::new("A14", 40.0),
                DataPoint::new(UNKNOWN_MODEL, 6.0),
                DataPoint::new("HOS-001", 7.0)
            ]
        );
    }

    #[test]
    fn request_status_keeps_first_seen_order() {
        let requests: Vec<ModuleRequest> = ["Pending", "Fulfilled", "Pending"]
            .into_iter()
            .map(|status| ModuleRequest {
                status: Label::from(status),
                ..ModuleRequest::default()
            })
            .chain(std::iter::once(ModuleRequest::default()))
            .collect();
        assert_eq!(
            request_status_distribution(&requests).points(),
            &[
                DataPoint::new("Pending", 2.0),
                DataPoint::new("Fulfilled", 1.0),
                DataPoint::new("N/A", 1.0)
            ]
        );
    }

    #[test]
    fn dashboard_series_cover_every_widget() {
        let data = DashboardData::from_json(
            br#"{
                "workOrders": [{"_id": "w1", "module": "SPK-001", "assignedTo": "Ava"}],
                "logisticsData": [{"status": "Pending"}],
                "trackingData": [{"status": "Completed", "module": "SPK-001", "quantity": 4}],
                "productionData": [{"workOrderID": "w1", "producedQty": 3}]
            }"#,
        )
        .unwrap();
        let series = DashboardSeries::compute(&data);
        assert_eq!(series.request_status.points(), &[DataPoint::new("Pending", 1.0)]);
        assert_eq!(
            series.open_work_orders_by_assignee.points(),
            &[DataPoint::new("Ava", 1.0)]
        );
        assert_eq!(series.produced_by_model.points(), &[DataPoint::new("SPK-001", 3.0)]);
        assert_eq!(series.completed_shipments.quantity_by_module.total(), 4.0);
    }

    #[test]
    fn dashboard_json_tolerates_missing_collections() {
        let data = DashboardData::from_json(
            br#"{"trackingData": [{"status": "Completed"}], "workOrders": [{}]}"#,
        )
        .unwrap();
        assert_eq!(data.tracking.len(), 1);
        assert_eq!(data.work_orders.len(), 1);
        assert!(data.production.is_empty());
    }
}
