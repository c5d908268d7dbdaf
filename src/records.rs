//! Typed record kinds read from the document store.
//!
//! Documents arrive loosely typed: fields may be missing, `null`, numbers encoded as strings, or
//! identifiers wrapped in extended-JSON objects.  All of that is normalised once, while
//! deserializing, so aggregation code can read fields directly without fallbacks:
//!
//! - label fields use [`Label`], which defaults to [`PLACEHOLDER`];
//! - numeric fields default to `0`;
//! - identifiers and arithmetic dates stay optional so "missing" is still observable.
//!
//! Cross-record references use one convention: [`TrackingLog::request_id`] refers to
//! [`ModuleRequest::id`] and [`ProductionRecord::work_order_id`] refers to [`WorkOrder::id`].

use std::fmt;
use std::ops::Deref;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ReportError;

/// Display value used when a label field is absent.
pub const PLACEHOLDER: &str = "N/A";

/// Status value that marks a delivered shipment.
pub const STATUS_COMPLETED: &str = "Completed";

/// A display string that is never empty.
///
/// Missing, `null`, and blank values all become [`PLACEHOLDER`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Label(String);

impl Label {
    /// Creates a label, substituting the placeholder for blank input.
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::default()
        } else {
            Self(value)
        }
    }

    /// Returns the label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` when the source document did not carry a value.
    pub fn is_placeholder(&self) -> bool {
        self.0 == PLACEHOLDER
    }
}

impl Default for Label {
    fn default() -> Self {
        Self(PLACEHOLDER.to_owned())
    }
}

impl Deref for Label {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Label {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(scalar_text)
            .map(Label::new)
            .unwrap_or_default())
    }
}

/// Extracts text from strings, numbers, booleans, and extended-JSON wrappers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(map) => map
            .get("$oid")
            .or_else(|| map.get("$date"))
            .and_then(scalar_text),
        Value::Null | Value::Array(_) => None,
    }
}

mod de {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::scalar_text;

    pub fn quantity<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
            Some(Value::String(text)) => text.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        })
    }

    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Bool(flag)) => flag,
            Some(Value::String(text)) => {
                matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1")
            }
            Some(Value::Number(number)) => number.as_f64().map_or(false, |n| n != 0.0),
            _ => false,
        })
    }

    pub fn identifier<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(scalar_text)
            .filter(|text| !text.trim().is_empty()))
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            // Epoch milliseconds.
            Some(Value::Number(number)) => number
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|instant| instant.to_rfc3339()),
            Some(other) => scalar_text(&other).filter(|text| !text.trim().is_empty()),
            None => None,
        })
    }
}

/// Parses the date formats found in stored documents.
///
/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.fff]` (and the space-separated
/// variant), and bare `YYYY-MM-DD` dates.  Naive values are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// A production report filed against a work order.
///
/// `order_fulfilled` and `order_on_time` are stored when the record is written and are read
/// back as-is.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionRecord {
    #[serde(default, alias = "_id", deserialize_with = "de::identifier")]
    pub id: Option<String>,
    #[serde(
        default,
        rename = "workOrderID",
        alias = "workOrderId",
        alias = "productId",
        deserialize_with = "de::identifier"
    )]
    pub work_order_id: Option<String>,
    #[serde(default)]
    pub date_requested: Label,
    #[serde(default)]
    pub fulfilled_by: Label,
    #[serde(default)]
    pub date_fulfilled: Label,
    #[serde(default, alias = "quantityProduced", deserialize_with = "de::quantity")]
    pub produced_qty: f64,
    #[serde(default, deserialize_with = "de::quantity")]
    pub requested_quantity: f64,
    #[serde(default, deserialize_with = "de::flag")]
    pub order_fulfilled: bool,
    #[serde(default, deserialize_with = "de::flag")]
    pub order_on_time: bool,
    #[serde(default)]
    pub phone_model: Label,
}

/// A request for component modules, stored in the `logistics` collection.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRequest {
    #[serde(
        default,
        alias = "_id",
        alias = "requestId",
        alias = "requestID",
        deserialize_with = "de::identifier"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub module: Label,
    #[serde(default)]
    pub requested_by: Label,
    #[serde(default)]
    pub recipient: Label,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub request_date: Option<String>,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub completion_date: Option<String>,
    #[serde(default, deserialize_with = "de::quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub status: Label,
    #[serde(default)]
    pub description: Label,
}

impl ModuleRequest {
    /// Returns `true` when `log` refers to this request by identifier.
    pub fn is_tracked_by(&self, log: &TrackingLog) -> bool {
        matches!((&self.id, &log.request_id), (Some(id), Some(reference)) if id == reference)
    }
}

/// The shipment state of a module request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLog {
    #[serde(default, alias = "_id", deserialize_with = "de::identifier")]
    pub log_id: Option<String>,
    #[serde(
        default,
        rename = "requestID",
        alias = "requestId",
        deserialize_with = "de::identifier"
    )]
    pub request_id: Option<String>,
    #[serde(default)]
    pub module: Label,
    #[serde(default)]
    pub status: Label,
    #[serde(default)]
    pub updated_by: Label,
    #[serde(default)]
    pub updated_at: Label,
    #[serde(default)]
    pub recipient: Label,
    #[serde(default)]
    pub request_date: Label,
    #[serde(default)]
    pub phone_model: Label,
    #[serde(default, deserialize_with = "de::quantity")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub delivered_date: Option<String>,
}

impl TrackingLog {
    /// Returns `true` when the status is exactly [`STATUS_COMPLETED`].
    pub fn is_completed(&self) -> bool {
        self.status.as_str() == STATUS_COMPLETED
    }
}

/// A work order assigned to factory staff.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    #[serde(default, alias = "_id", deserialize_with = "de::identifier")]
    pub id: Option<String>,
    #[serde(default)]
    pub module: Label,
    #[serde(default)]
    pub phone_model: Label,
    #[serde(default)]
    pub created_by: Label,
    #[serde(default)]
    pub assigned_to: Label,
    #[serde(default)]
    pub created_date: Label,
    #[serde(default)]
    pub due_date: Label,
    #[serde(default, deserialize_with = "de::quantity")]
    pub quantity: f64,
    #[serde(default)]
    pub status: Label,
}

impl WorkOrder {
    /// Returns `true` when `record` was filed against this work order.
    pub fn is_fulfilled_by(&self, record: &ProductionRecord) -> bool {
        matches!((&self.id, &record.work_order_id), (Some(id), Some(reference)) if id == reference)
    }

    /// The product this order builds: the phone model, else the module, if either is set.
    pub fn model(&self) -> Option<&str> {
        [&self.phone_model, &self.module]
            .into_iter()
            .find(|label| !label.is_placeholder())
            .map(Label::as_str)
    }
}

/// A notification created as a side effect of a mutating operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub message: Label,
    #[serde(default, deserialize_with = "de::timestamp")]
    pub created_at: Option<String>,
}

/// The body of a report request: the three record collections the report is built from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    #[serde(rename = "productionData")]
    pub production: Vec<ProductionRecord>,
    #[serde(rename = "logisticsData")]
    pub logistics: Vec<ModuleRequest>,
    #[serde(rename = "trackingData")]
    pub tracking: Vec<TrackingLog>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReportRequest {
    #[serde(default)]
    production_data: Option<Vec<ProductionRecord>>,
    #[serde(default)]
    logistics_data: Option<Vec<ModuleRequest>>,
    #[serde(default)]
    tracking_data: Option<Vec<TrackingLog>>,
}

impl ReportInput {
    /// Creates a request from already-typed collections.
    pub fn new(
        production: Vec<ProductionRecord>,
        logistics: Vec<ModuleRequest>,
        tracking: Vec<TrackingLog>,
    ) -> Self {
        Self {
            production,
            logistics,
            tracking,
        }
    }

    /// Parses a JSON request body.
    ///
    /// Each of `productionData`, `logisticsData` and `trackingData` must be present and not
    /// `null`; empty arrays are accepted.
    pub fn from_json(body: &[u8]) -> Result<Self, ReportError> {
        let raw: RawReportRequest = serde_json::from_slice(body)?;
        Ok(Self {
            production: raw
                .production_data
                .ok_or(ReportError::MissingDataset("productionData"))?,
            logistics: raw
                .logistics_data
                .ok_or(ReportError::MissingDataset("logisticsData"))?,
            tracking: raw
                .tracking_data
                .ok_or(ReportError::MissingDataset("trackingData"))?,
        })
    }
}
