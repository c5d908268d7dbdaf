//! Declarative descriptions of the report charts.
//!
//! A chart is a [`ChartKind`], a title, a colour palette, and a function that reduces a
//! [`ReportInput`] to a [`Series`].  The composer walks [`REPORT_CHARTS`] in order and hands
//! each spec to a [`ChartRasterizer`].

mod raster;

pub use raster::{BitmapRasterizer, DEFAULT_CHART_HEIGHT_PX, DEFAULT_CHART_WIDTH_PX};

use image::{DynamicImage, Rgb};

use crate::aggregate::{count_by, sum_by, Series};
use crate::error::ReportError;
use crate::records::ReportInput;

const MAX_CAPTION_ENTRIES: usize = 6;

/// Visual form of a chart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Doughnut,
}

impl ChartKind {
    /// Returns `true` for the kinds drawn on x/y axes.
    pub fn has_axes(self) -> bool {
        matches!(self, ChartKind::Bar | ChartKind::Line)
    }
}

/// A chart of the report: what to plot and how to colour it.
#[derive(Clone, Copy, Debug)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: &'static str,
    /// Series colours; slices and points cycle through it.
    pub palette: &'static [[u8; 3]],
    pub series: fn(&ReportInput) -> Series,
}

impl ChartSpec {
    /// Reduces the request to the series this chart plots.
    pub fn series_for(&self, input: &ReportInput) -> Series {
        (self.series)(input)
    }

    /// Colour of the `index`-th data point.
    pub fn color(&self, index: usize) -> Rgb<u8> {
        match self.palette.len() {
            0 => Rgb([128, 128, 128]),
            len => Rgb(self.palette[index % len]),
        }
    }

    /// One-line legend printed below the chart image.
    pub fn caption(&self, series: &Series) -> String {
        if series.is_empty() {
            return format!("{}: no data", self.title);
        }

        let mut entries: Vec<String> = series
            .points()
            .iter()
            .take(MAX_CAPTION_ENTRIES)
            .map(|point| format!("{} ({})", point.name, point.value))
            .collect();
        if series.len() > MAX_CAPTION_ENTRIES {
            entries.push(format!("+{} more", series.len() - MAX_CAPTION_ENTRIES));
        }
        format!("{}: {}", self.title, entries.join(", "))
    }
}

/// Turns a chart description and its data into a bitmap.
pub trait ChartRasterizer {
    fn rasterize(&self, spec: &ChartSpec, series: &Series) -> Result<DynamicImage, ReportError>;
}

impl<R: ChartRasterizer + ?Sized> ChartRasterizer for &R {
    fn rasterize(&self, spec: &ChartSpec, series: &Series) -> Result<DynamicImage, ReportError> {
        (**self).rasterize(spec, series)
    }
}

// Translucent fills composited onto the white chart background.
const TEAL: [u8; 3] = [147, 217, 217];
const ORANGE: [u8; 3] = [255, 197, 140];
const RED: [u8; 3] = [255, 99, 132];
const BLUE: [u8; 3] = [54, 162, 235];
const YELLOW: [u8; 3] = [255, 206, 86];

fn produced_by_fulfilment_date(input: &ReportInput) -> Series {
    sum_by(
        &input.production,
        |record| record.date_fulfilled.as_str(),
        |record| record.produced_qty,
    )
    .into_series()
}

fn logistics_by_status(input: &ReportInput) -> Series {
    count_by(&input.logistics, |request| request.status.as_str()).into_series()
}

fn delivered_by_phone_model(input: &ReportInput) -> Series {
    sum_by(
        &input.tracking,
        |log| log.phone_model.as_str(),
        |log| log.quantity,
    )
    .into_series()
}

fn produced_by_request_date(input: &ReportInput) -> Series {
    sum_by(
        &input.production,
        |record| record.date_requested.as_str(),
        |record| record.produced_qty,
    )
    .into_series()
}

fn tracking_by_status(input: &ReportInput) -> Series {
    count_by(&input.tracking, |log| log.status.as_str()).into_series()
}

/// The charts of the production report, in page order.
pub const REPORT_CHARTS: [ChartSpec; 5] = [
    ChartSpec {
        kind: ChartKind::Bar,
        title: "Produced Quantity",
        palette: &[TEAL],
        series: produced_by_fulfilment_date,
    },
    ChartSpec {
        kind: ChartKind::Pie,
        title: "Logistics Status",
        palette: &[RED, BLUE, YELLOW],
        series: logistics_by_status,
    },
    ChartSpec {
        kind: ChartKind::Bar,
        title: "Delivered Quantity",
        palette: &[ORANGE],
        series: delivered_by_phone_model,
    },
    ChartSpec {
        kind: ChartKind::Line,
        title: "Production Requests Over Time",
        palette: &[RED],
        series: produced_by_request_date,
    },
    ChartSpec {
        kind: ChartKind::Doughnut,
        title: "Tracking Status",
        palette: &[BLUE, YELLOW, RED],
        series: tracking_by_status,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DataPoint;

    fn sample_input() -> ReportInput {
        ReportInput::from_json(
            br#"{
                "productionData": [
                    {"dateFulfilled": "2023-10-02", "dateRequested": "2023-10-01", "producedQty": 10},
                    {"dateRequested": "2023-10-01", "producedQty": 5}
                ],
                "logisticsData": [{"status": "Pending"}, {"status": "Completed"}, {"status": "Pending"}],
                "trackingData": [
                    {"status": "Completed", "phoneModel": "X1", "quantity": 4},
                    {"status": "Pending", "quantity": 2}
                ]
            }"#,
        )
        .expect("valid request body")
    }

    #[test]
    fn report_chart_order_is_fixed() {
        let kinds: Vec<_> = REPORT_CHARTS.iter().map(|spec| spec.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ChartKind::Bar,
                ChartKind::Pie,
                ChartKind::Bar,
                ChartKind::Line,
                ChartKind::Doughnut
            ]
        );
    }

    #[test]
    fn chart_series_use_placeholders_for_missing_keys() {
        let input = sample_input();
        let produced = REPORT_CHARTS[0].series_for(&input);
        assert_eq!(
            produced.points(),
            &[DataPoint::new("2023-10-02", 10.0), DataPoint::new("N/A", 5.0)]
        );

        let delivered = REPORT_CHARTS[2].series_for(&input);
        assert_eq!(
            delivered.points(),
            &[DataPoint::new("X1", 4.0), DataPoint::new("N/A", 2.0)]
        );
    }

    #[test]
    fn status_charts_count_per_status() {
        let input = sample_input();
        let logistics = REPORT_CHARTS[1].series_for(&input);
        assert_eq!(
            logistics.points(),
            &[DataPoint::new("Pending", 2.0), DataPoint::new("Completed", 1.0)]
        );
        assert_eq!(logistics.total(), input.logistics.len() as f64);
    }

    #[test]
    fn empty_input_yields_empty_series() {
        let input = ReportInput::default();
        for spec in REPORT_CHARTS.iter() {
            assert!(spec.series_for(&input).is_empty(), "{}", spec.title);
        }
    }

    #[test]
    fn palette_cycles() {
        let spec = REPORT_CHARTS[1];
        assert_eq!(spec.color(0), spec.color(3));
        assert_ne!(spec.color(0), spec.color(1));
    }

    #[test]
    fn caption_truncates_long_legends() {
        let series = Series::from_points((0..8).map(|i| DataPoint::new(format!("k{i}"), 1.0)));
        let caption = REPORT_CHARTS[4].caption(&series);
        assert!(caption.starts_with("Tracking Status: k0 (1), "));
        assert!(caption.ends_with("+2 more"));
        assert_eq!(
            REPORT_CHARTS[4].caption(&Series::default()),
            "Tracking Status: no data"
        );
    }
}
