//! Group-and-reduce helpers that turn record collections into chart series.
//!
//! Every grouped statistic in the crate goes through [`group_reduce`]: one pass over the input,
//! one accumulator per distinct key, keys kept in first-seen order.  The remaining functions are
//! thin call sites that only supply the key extractor and the combine step.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{parse_timestamp, ModuleRequest, TrackingLog, PLACEHOLDER};

const MILLIS_PER_DAY: f64 = 1000.0 * 60.0 * 60.0 * 24.0;

/// Accumulator values that can be plotted.
pub trait Measure: Copy {
    /// Converts the accumulated value into a chart value.
    fn to_f64(self) -> f64;
}

impl Measure for usize {
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Measure for f64 {
    fn to_f64(self) -> f64 {
        self
    }
}

/// Key to accumulator mapping that remembers the order in which keys were first seen.
#[derive(Clone, Debug, PartialEq)]
pub struct Grouped<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

impl<V> Default for Grouped<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> Grouped<V> {
    /// Creates an empty grouping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accumulator for `key`, inserting `init` if the key is new.
    pub fn entry(
        &mut self,
        key: impl AsRef<str> + Into<String>,
        init: impl FnOnce() -> V,
    ) -> &mut V {
        let position = match self.index.get(key.as_ref()) {
            Some(&position) => position,
            None => {
                let key = key.into();
                let position = self.entries.len();
                self.index.insert(key.clone(), position);
                self.entries.push((key, init()));
                position
            }
        };
        &mut self.entries[position].1
    }

    /// Returns the accumulator for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&position| &self.entries[position].1)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no key has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Key/accumulator pairs in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<V: Measure> Grouped<V> {
    /// Converts the grouping into an ordered `{name, value}` series.
    pub fn into_series(self) -> Series {
        Series::from_points(
            self.entries
                .into_iter()
                .map(|(name, value)| DataPoint::new(name, value.to_f64())),
        )
    }

    /// Sum of all accumulators.
    pub fn total(&self) -> f64 {
        self.entries
            .iter()
            .fold(0.0, |sum, (_, value)| sum + value.to_f64())
    }
}

/// Folds `items` into one accumulator per key.
///
/// `key` picks the group for each item, `init` seeds a new group and `combine` folds the item
/// into its group's accumulator.  Groups appear in the order their first item was seen.
pub fn group_reduce<T, I, K, S, V, F>(items: I, key: K, init: V, mut combine: F) -> Grouped<V>
where
    I: IntoIterator<Item = T>,
    K: Fn(&T) -> S,
    S: AsRef<str> + Into<String>,
    V: Clone,
    F: FnMut(&mut V, &T),
{
    let mut grouped = Grouped::new();
    for item in items {
        let accumulator = grouped.entry(key(&item), || init.clone());
        combine(accumulator, &item);
    }
    grouped
}

/// Counts items per key.
pub fn count_by<T, I, K, S>(items: I, key: K) -> Grouped<usize>
where
    I: IntoIterator<Item = T>,
    K: Fn(&T) -> S,
    S: AsRef<str> + Into<String>,
{
    group_reduce(items, key, 0, |count, _| *count += 1)
}

/// Sums a numeric field per key.
pub fn sum_by<T, I, K, S, F>(items: I, key: K, value: F) -> Grouped<f64>
where
    I: IntoIterator<Item = T>,
    K: Fn(&T) -> S,
    S: AsRef<str> + Into<String>,
    F: Fn(&T) -> f64,
{
    group_reduce(items, key, 0.0, |sum, item| *sum += value(item))
}

/// Counts items per key, considering only items accepted by `filter`.
pub fn count_where_by<T, I, K, S, P>(items: I, filter: P, key: K) -> Grouped<usize>
where
    I: IntoIterator<Item = T>,
    P: Fn(&T) -> bool,
    K: Fn(&T) -> S,
    S: AsRef<str> + Into<String>,
{
    count_by(items.into_iter().filter(|item| filter(item)), key)
}

/// Calendar buckets for time-series counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// `YYYY-MM-DD`
    Day,
    /// ISO week, `YYYY-Www`
    Week,
    /// `YYYY-MM`
    Month,
}

impl Period {
    /// Formats the bucket key for `instant`.
    pub fn bucket(self, instant: DateTime<Utc>) -> String {
        match self {
            Period::Day => instant.format("%Y-%m-%d").to_string(),
            Period::Week => {
                let week = instant.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Period::Month => instant.format("%Y-%m").to_string(),
        }
    }
}

/// Counts items per calendar bucket of the date returned by `date`.
///
/// Items without a parseable date are counted under the placeholder key.
pub fn count_by_period<T, I, D>(items: I, period: Period, date: D) -> Grouped<usize>
where
    I: IntoIterator<Item = T>,
    D: Fn(&T) -> Option<&str>,
{
    count_by(items, |item| {
        date(item)
            .and_then(parse_timestamp)
            .map(|instant| period.bucket(instant))
            .unwrap_or_else(|| PLACEHOLDER.to_owned())
    })
}

/// One named value of a chart series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub name: String,
    pub value: f64,
}

impl DataPoint {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Ordered `{name, value}` pairs ready for a chart.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series {
    points: Vec<DataPoint>,
}

impl Series {
    /// Creates a series from points, keeping their order.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = DataPoint>,
    {
        Self {
            points: points.into_iter().collect(),
        }
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of all values.
    pub fn total(&self) -> f64 {
        self.points.iter().fold(0.0, |sum, point| sum + point.value)
    }

    /// Largest value, or `0` for an empty series.
    pub fn max_value(&self) -> f64 {
        self.points
            .iter()
            .map(|point| point.value)
            .fold(0.0, f64::max)
    }
}

/// Highest, lowest, average and total of a series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub highest: Option<DataPoint>,
    pub lowest: Option<DataPoint>,
    pub average: f64,
    pub total: f64,
}

impl SeriesSummary {
    /// Summarises `series`.  Ties keep the later point, and an empty series summarises to zero.
    pub fn of(series: &Series) -> Self {
        let points = series.points();
        if points.is_empty() {
            return Self::default();
        }

        let highest = points
            .iter()
            .reduce(|best, point| if best.value > point.value { best } else { point });
        let lowest = points
            .iter()
            .reduce(|best, point| if best.value < point.value { best } else { point });
        let total = series.total();

        Self {
            highest: highest.cloned(),
            lowest: lowest.cloned(),
            average: total / points.len() as f64,
            total,
        }
    }
}

/// Mean time between a request being filed and its shipment being delivered, in days.
///
/// Each tracking log is joined to the module request it refers to by linear search.  Only pairs
/// where both the delivery date and the request date parse take part, in the sum and in the
/// count alike.  Returns `0.0` when no pair qualifies.
pub fn average_delivery_days(tracking: &[TrackingLog], requests: &[ModuleRequest]) -> f64 {
    let (total_millis, matched) = tracking
        .iter()
        .filter_map(|log| {
            let request = requests.iter().find(|request| request.is_tracked_by(log))?;
            let delivered = log.delivered_date.as_deref().and_then(parse_timestamp)?;
            let requested = request.request_date.as_deref().and_then(parse_timestamp)?;
            Some((delivered - requested).num_milliseconds() as f64)
        })
        .fold((0.0, 0usize), |(sum, count), millis| (sum + millis, count + 1));

    if matched == 0 {
        return 0.0;
    }
    total_millis / matched as f64 / MILLIS_PER_DAY
}
