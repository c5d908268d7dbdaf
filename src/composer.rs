//! Turns a [`ReportInput`] into a finished PDF.
//!
//! Composition runs in four steps: reduce the records to the summary and chart series,
//! rasterize every chart, plan the pages with [`ReportLayout`], and paint the plan onto a
//! `genpdf` renderer.  Nothing is written unless every step succeeds.

use chrono::NaiveDate;
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::FontCache;
use genpdf::render::Renderer;
use genpdf::style::Color;
use genpdf::Size;
use image::DynamicImage;
use log::{debug, error, info};

use crate::chart::{BitmapRasterizer, ChartRasterizer, ChartSpec, REPORT_CHARTS};
use crate::config::{format_report_date, ReportConfig};
use crate::elements::{
    decode_image_from_path, draw_image, draw_text_line, flatten_onto_white, image_extent,
    pt_to_mm, TextStyle,
};
use crate::error::ReportError;
use crate::fonts;
use crate::layout::{LayoutItem, ReportLayout, CHART_CANVAS, PAGE_HEIGHT, PAGE_WIDTH};
use crate::records::ReportInput;
use crate::summary::ReportSummary;

const TITLE_FONT_SIZE: u8 = 18;
const BODY_FONT_SIZE: u8 = 12;
const CAPTION_FONT_SIZE: u8 = 8;
const FOOTER_FONT_SIZE: u8 = 10;
const FOOTER_GREY: u8 = 128;

/// A rendered report.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedReport {
    /// The serialized PDF document.
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Zero-based page of every chart, in chart order.
    pub chart_pages: Vec<usize>,
}

struct RasterizedChart {
    image: DynamicImage,
    caption: String,
}

/// Builder-style report composer.
///
/// ```no_run
/// use production_report::composer::ReportComposer;
/// use production_report::records::ReportInput;
///
/// let report = ReportComposer::new().compose(&ReportInput::default())?;
/// std::fs::write("report.pdf", &report.bytes)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone, Debug)]
pub struct ReportComposer<R = BitmapRasterizer> {
    config: ReportConfig,
    rasterizer: R,
    charts: Vec<ChartSpec>,
}

impl Default for ReportComposer {
    fn default() -> Self {
        Self {
            config: ReportConfig::default(),
            rasterizer: BitmapRasterizer::default(),
            charts: REPORT_CHARTS.to_vec(),
        }
    }
}

impl ReportComposer {
    /// Creates a composer with the default configuration and the standard chart list.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: ChartRasterizer> ReportComposer<R> {
    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the chart rasterizer.
    pub fn with_rasterizer<S: ChartRasterizer>(self, rasterizer: S) -> ReportComposer<S> {
        ReportComposer {
            config: self.config,
            rasterizer,
            charts: self.charts,
        }
    }

    /// Prints `date` in the header instead of today's date.
    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.config = self.config.with_report_date(date);
        self
    }

    /// Replaces the list of charts drawn below the summary.
    pub fn with_charts(mut self, charts: impl IntoIterator<Item = ChartSpec>) -> Self {
        self.charts = charts.into_iter().collect();
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    /// Composes the report for `input`.
    ///
    /// Failures are logged once and returned; no partial document is produced.
    pub fn compose(&self, input: &ReportInput) -> Result<RenderedReport, ReportError> {
        self.try_compose(input).map_err(|err| {
            error!("Error generating production report: {}", err);
            err
        })
    }

    /// Composes the report and adds one outline entry per chart.
    #[cfg(feature = "bookmarks")]
    pub fn compose_with_bookmarks(
        &self,
        input: &ReportInput,
    ) -> Result<RenderedReport, ReportError> {
        let mut report = self.compose(input)?;
        let bookmarks: Vec<crate::bookmarks::Bookmark> = self
            .charts
            .iter()
            .zip(report.chart_pages.iter())
            .map(|(spec, &page)| crate::bookmarks::Bookmark::new(spec.title, page))
            .collect();

        report.bytes = crate::bookmarks::apply_chart_bookmarks(&report.bytes, &bookmarks)
            .map_err(|err| {
                error!("Error adding report bookmarks: {}", err);
                ReportError::from(err)
            })?;
        Ok(report)
    }

    fn try_compose(&self, input: &ReportInput) -> Result<RenderedReport, ReportError> {
        let summary = ReportSummary::from_input(input).lines();
        let logo = self.load_logo()?;
        let charts = self.rasterize_charts(input)?;

        let layout = ReportLayout::plan(
            logo.as_ref().map(image_extent),
            &vec![CHART_CANVAS; charts.len()],
        );
        debug!(
            "planned {} placements on {} page(s)",
            layout.placements().len(),
            layout.page_count()
        );

        let mut renderer =
            Renderer::new(page_size(), self.config.title()).map_err(ReportError::Render)?;
        for _ in 1..layout.page_count() {
            renderer.add_page(page_size());
        }

        let family = fonts::load_font_family(&self.config).map_err(ReportError::FontLoad)?;
        let mut font_cache = FontCache::new(family);
        font_cache
            .load_pdf_fonts(&renderer)
            .map_err(ReportError::FontLoad)?;

        let date = self.header_date();
        let painter = Painter {
            renderer: &renderer,
            font_cache: &font_cache,
            title: self.config.title(),
            date: &date,
            footer: self.config.footer(),
            summary: &summary,
            logo: logo.as_ref(),
            charts: &charts,
        };
        painter.paint(&layout).map_err(ReportError::Render)?;

        let mut bytes = Vec::new();
        renderer.write(&mut bytes).map_err(ReportError::Render)?;

        info!(
            "Composed production report: {} page(s), {} bytes",
            layout.page_count(),
            bytes.len()
        );
        Ok(RenderedReport {
            bytes,
            page_count: layout.page_count(),
            chart_pages: layout.chart_pages(),
        })
    }

    fn header_date(&self) -> String {
        format!("Date: {}", format_report_date(self.config.resolved_report_date()))
    }

    fn load_logo(&self) -> Result<Option<DynamicImage>, ReportError> {
        let Some(path) = self.config.logo_path() else {
            return Ok(None);
        };
        if !path.is_file() {
            debug!("logo not found at {}; rendering without it", path.display());
            return Ok(None);
        }

        let image = decode_image_from_path(path).map_err(ReportError::Render)?;
        Ok(Some(flatten_onto_white(image)))
    }

    fn rasterize_charts(&self, input: &ReportInput) -> Result<Vec<RasterizedChart>, ReportError> {
        self.charts
            .iter()
            .map(|spec| {
                let series = spec.series_for(input);
                debug!("rasterizing '{}' with {} point(s)", spec.title, series.len());
                let image = self.rasterizer.rasterize(spec, &series)?;
                Ok(RasterizedChart {
                    image,
                    caption: spec.caption(&series),
                })
            })
            .collect()
    }
}

fn page_size() -> Size {
    Size::new(pt_to_mm(PAGE_WIDTH), pt_to_mm(PAGE_HEIGHT))
}

struct Painter<'a> {
    renderer: &'a Renderer,
    font_cache: &'a FontCache,
    title: &'a str,
    date: &'a str,
    footer: &'a str,
    summary: &'a [String],
    logo: Option<&'a DynamicImage>,
    charts: &'a [RasterizedChart],
}

impl Painter<'_> {
    fn paint(&self, layout: &ReportLayout) -> Result<(), Error> {
        for placed in layout.placements() {
            let page = self.renderer.get_page(placed.page).ok_or_else(|| {
                Error::new(
                    format!("Layout refers to missing page {}", placed.page + 1),
                    ErrorKind::Internal,
                )
            })?;
            let layer = page.first_layer();
            let area = layer.area();
            let text = |x: f64, baseline: f64, line: &str, style: TextStyle| {
                draw_text_line(&area, self.font_cache, x, baseline, line, style)
            };

            match placed.item {
                LayoutItem::Logo(rect) => {
                    if let Some(logo) = self.logo {
                        draw_image(&area, logo, rect);
                    }
                }
                LayoutItem::Title { x, baseline } => {
                    text(x, baseline, self.title, TextStyle::new(TITLE_FONT_SIZE))?;
                }
                LayoutItem::Date { x, baseline } => {
                    text(x, baseline, self.date, TextStyle::new(BODY_FONT_SIZE))?;
                }
                LayoutItem::SummaryLine { index, x, baseline } => {
                    if let Some(line) = self.summary.get(index) {
                        text(x, baseline, line, TextStyle::new(BODY_FONT_SIZE))?;
                    }
                }
                LayoutItem::Chart { index, rect } => {
                    if let Some(chart) = self.charts.get(index) {
                        draw_image(&area, &chart.image, rect);
                    }
                }
                LayoutItem::ChartCaption { index, x, baseline } => {
                    if let Some(chart) = self.charts.get(index) {
                        text(x, baseline, &chart.caption, TextStyle::new(CAPTION_FONT_SIZE))?;
                    }
                }
                LayoutItem::Footer { x, baseline } => {
                    let style = TextStyle::new(FOOTER_FONT_SIZE)
                        .with_color(Color::Greyscale(FOOTER_GREY));
                    text(x, baseline, self.footer, style)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Series;
    use image::RgbImage;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRasterizer {
        seen: RefCell<Vec<(&'static str, usize)>>,
    }

    impl ChartRasterizer for RecordingRasterizer {
        fn rasterize(
            &self,
            spec: &ChartSpec,
            series: &Series,
        ) -> Result<DynamicImage, ReportError> {
            self.seen.borrow_mut().push((spec.title, series.len()));
            Ok(DynamicImage::ImageRgb8(RgbImage::new(8, 6)))
        }
    }

    struct FailingRasterizer;

    impl ChartRasterizer for FailingRasterizer {
        fn rasterize(&self, _: &ChartSpec, _: &Series) -> Result<DynamicImage, ReportError> {
            Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "raster backend unavailable",
            )))
        }
    }

    #[test]
    fn charts_are_rasterized_in_order() {
        let rasterizer = RecordingRasterizer::default();
        let composer = ReportComposer::new().with_rasterizer(&rasterizer);
        let charts = composer
            .rasterize_charts(&ReportInput::default())
            .expect("rasterize");

        assert_eq!(charts.len(), REPORT_CHARTS.len());
        assert_eq!(charts[1].caption, "Logistics Status: no data");
        let titles: Vec<_> = rasterizer.seen.borrow().iter().map(|(t, _)| *t).collect();
        let expected: Vec<_> = REPORT_CHARTS.iter().map(|spec| spec.title).collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn rasterizer_failure_aborts_composition() {
        let composer = ReportComposer::new()
            .with_config(ReportConfig::new().without_logo())
            .with_rasterizer(FailingRasterizer);
        let err = composer.compose(&ReportInput::default()).unwrap_err();
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn missing_logo_is_tolerated() {
        let composer = ReportComposer::new()
            .with_config(ReportConfig::new().with_logo_path("/nonexistent/logo.png"));
        assert!(composer.load_logo().expect("missing logo is not an error").is_none());
    }

    #[test]
    fn builder_overrides_apply() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let composer = ReportComposer::new()
            .with_charts(REPORT_CHARTS[..2].iter().copied())
            .with_report_date(date);
        assert_eq!(composer.charts().len(), 2);
        assert_eq!(composer.config().report_date(), Some(date));
    }

    #[test]
    fn header_date_is_labelled() {
        let composer =
            ReportComposer::new().with_report_date(NaiveDate::from_ymd_opt(2023, 10, 9).unwrap());
        assert_eq!(composer.header_date(), "Date: 10/9/2023");
    }

    #[test]
    fn chart_bitmaps_are_rasterized_at_printed_size() {
        let charts = ReportComposer::new()
            .rasterize_charts(&ReportInput::default())
            .expect("rasterize");
        let printed = CHART_CANVAS.scaled(crate::layout::CHART_SCALE);
        for chart in &charts {
            assert_eq!(image_extent(&chart.image), printed, "{}", chart.caption);
        }
    }
}
