//! Page layout of the production report.
//!
//! Coordinates are PDF points measured from the bottom-left corner of the page, the way the
//! report is specified: a vertical cursor starts near the top and moves down as blocks are
//! placed.  The plan is computed up front and painted afterwards, so the page-break rule can be
//! exercised without rendering anything.

use log::debug;

/// Page width in points.
pub const PAGE_WIDTH: f64 = 600.0;
/// Page height in points.
pub const PAGE_HEIGHT: f64 = 850.0;
/// Cursor position at the top of every page.
pub const CONTENT_TOP: f64 = 800.0;
/// A chart is moved to a new page when the cursor is below this height.
pub const PAGE_BREAK_THRESHOLD: f64 = 250.0;

pub const LOGO_SCALE: f64 = 0.15;
const LOGO_GAP: f64 = 10.0;

pub const TITLE_X: f64 = 50.0;
pub const DATE_X: f64 = 400.0;
const TITLE_ADVANCE: f64 = 30.0;
const SUMMARY_LINE_ADVANCE: f64 = 15.0;
const SUMMARY_BLOCK_GAP: f64 = 15.0;
/// Number of summary lines under the title.
pub const SUMMARY_LINES: usize = 3;

pub const CHART_SCALE: f64 = 0.5;
/// Size every chart is planned at before [`CHART_SCALE`] applies, whatever its bitmap size.
pub const CHART_CANVAS: Extent = Extent {
    width: 800.0,
    height: 600.0,
};
const CHART_GAP: f64 = 30.0;
const CAPTION_DROP: f64 = 14.0;

const FOOTER_OFFSET_X: f64 = 80.0;
const FOOTER_Y: f64 = 20.0;

/// Returns `true` when a chart may not start at height `y`.
pub fn needs_page_break(y: f64) -> bool {
    y < PAGE_BREAK_THRESHOLD
}

/// Current page and vertical position of the layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageCursor {
    page: usize,
    y: f64,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::starting_at(CONTENT_TOP)
    }
}

impl PageCursor {
    /// A cursor at the top of the first page.
    pub fn new() -> Self {
        Self::default()
    }

    /// A cursor on the first page at height `y`.
    pub fn starting_at(y: f64) -> Self {
        Self { page: 0, y }
    }

    /// Zero-based page index.
    pub fn page(&self) -> usize {
        self.page
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    /// Moves the cursor down by `distance` points.
    pub fn advance(&mut self, distance: f64) {
        self.y -= distance;
    }

    /// Starts a new page if the cursor is below the break threshold.
    ///
    /// Returns `true` when a page was started.
    pub fn break_if_needed(&mut self) -> bool {
        if needs_page_break(self.y) {
            self.page += 1;
            self.y = CONTENT_TOP;
            true
        } else {
            false
        }
    }
}

/// Width and height in points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
    pub width: f64,
    pub height: f64,
}

impl Extent {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.width * factor, self.height * factor)
    }
}

/// A rectangle given by its bottom-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// A rectangle of `extent` horizontally centred on the page with its bottom edge at `y`.
    fn centered(extent: Extent, y: f64) -> Self {
        Self {
            x: PAGE_WIDTH / 2.0 - extent.width / 2.0,
            y,
            width: extent.width,
            height: extent.height,
        }
    }

    /// Height of the top edge.
    pub fn top(&self) -> f64 {
        self.y + self.height
    }
}

/// Something the painter draws, positioned in page coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LayoutItem {
    Logo(Rect),
    Title { x: f64, baseline: f64 },
    Date { x: f64, baseline: f64 },
    SummaryLine { index: usize, x: f64, baseline: f64 },
    Chart { index: usize, rect: Rect },
    ChartCaption { index: usize, x: f64, baseline: f64 },
    Footer { x: f64, baseline: f64 },
}

/// A layout item together with the page it belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placed {
    pub page: usize,
    pub item: LayoutItem,
}

/// The full placement plan of a report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportLayout {
    placements: Vec<Placed>,
    page_count: usize,
}

impl ReportLayout {
    /// Plans the report for an optional logo and the given charts.
    ///
    /// The logo extent is its natural image size (one pixel per point) and is scaled by
    /// [`LOGO_SCALE`]; chart extents are scaled by [`CHART_SCALE`].
    pub fn plan(logo: Option<Extent>, charts: &[Extent]) -> Self {
        let mut cursor = PageCursor::new();
        let mut placements = Vec::new();
        let mut place = |page: usize, item: LayoutItem| placements.push(Placed { page, item });

        if let Some(logo) = logo {
            let extent = logo.scaled(LOGO_SCALE);
            let rect = Rect::centered(extent, cursor.y() - extent.height);
            place(cursor.page(), LayoutItem::Logo(rect));
            cursor.advance(extent.height + LOGO_GAP);
        }

        let baseline = cursor.y();
        place(cursor.page(), LayoutItem::Title { x: TITLE_X, baseline });
        place(cursor.page(), LayoutItem::Date { x: DATE_X, baseline });
        cursor.advance(TITLE_ADVANCE);

        for index in 0..SUMMARY_LINES {
            place(
                cursor.page(),
                LayoutItem::SummaryLine {
                    index,
                    x: TITLE_X,
                    baseline: cursor.y(),
                },
            );
            cursor.advance(SUMMARY_LINE_ADVANCE);
        }
        cursor.advance(SUMMARY_BLOCK_GAP);

        for (index, chart) in charts.iter().enumerate() {
            if cursor.break_if_needed() {
                debug!("chart {} starts page {}", index, cursor.page() + 1);
            }
            let extent = chart.scaled(CHART_SCALE);
            cursor.advance(extent.height);
            let rect = Rect::centered(extent, cursor.y());
            place(cursor.page(), LayoutItem::Chart { index, rect });
            place(
                cursor.page(),
                LayoutItem::ChartCaption {
                    index,
                    x: rect.x,
                    baseline: rect.y - CAPTION_DROP,
                },
            );
            cursor.advance(CHART_GAP);
        }

        place(
            cursor.page(),
            LayoutItem::Footer {
                x: PAGE_WIDTH / 2.0 - FOOTER_OFFSET_X,
                baseline: FOOTER_Y,
            },
        );

        Self {
            placements,
            page_count: cursor.page() + 1,
        }
    }

    /// Number of pages; always at least one.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Placements in drawing order.
    pub fn placements(&self) -> &[Placed] {
        &self.placements
    }

    /// Page index of every chart, in chart order.
    pub fn chart_pages(&self) -> Vec<usize> {
        self.placements
            .iter()
            .filter(|placed| matches!(placed.item, LayoutItem::Chart { .. }))
            .map(|placed| placed.page)
            .collect()
    }
}

/// How many charts of natural height `chart_height` fit on a page that starts empty.
pub fn charts_per_fresh_page(chart_height: f64) -> usize {
    let advance = chart_height * CHART_SCALE + CHART_GAP;
    if advance <= 0.0 {
        return 1;
    }
    let mut cursor = PageCursor::new();
    let mut fitted = 0;
    while !needs_page_break(cursor.y()) {
        cursor.advance(advance);
        fitted += 1;
    }
    fitted
}
