//! Drawing helpers that place report content on `genpdf` render areas.
//!
//! The layout works in PDF points from the bottom-left corner of the page while `genpdf` areas
//! use millimetres from the top-left corner.  The helpers here do that conversion and wrap the
//! image decoding needed for the logo.

use std::path::Path;

use image::{DynamicImage, GenericImageView, Rgb, RgbImage};

use genpdf::error::{Context as _, Error, ErrorKind};
use genpdf::fonts::FontCache;
use genpdf::render::Area;
use genpdf::style::{Color, Style};
use genpdf::{Mm, Position, Rotation, Scale};

use crate::layout::{Extent, Rect, PAGE_HEIGHT};

const MM_PER_INCH: f64 = 25.4;
const POINTS_PER_INCH: f64 = 72.0;

/// One image pixel maps to one point before scaling.
const IMAGE_DPI: f64 = POINTS_PER_INCH;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Converts PDF points to millimetres.
pub fn pt_to_mm(points: f64) -> Mm {
    mm_from_f64(points * MM_PER_INCH / POINTS_PER_INCH)
}

/// Converts a point in page coordinates (points, bottom-left origin) to an area position.
pub fn page_position(x: f64, y: f64) -> Position {
    Position::new(pt_to_mm(x), pt_to_mm(PAGE_HEIGHT - y))
}

/// Natural size of an image in points.
pub fn image_extent(image: &DynamicImage) -> Extent {
    let (width, height) = image.dimensions();
    Extent::new(width as f64, height as f64)
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Composites an image with transparency onto a white background.
///
/// The PDF writer does not embed alpha channels, so transparent logo pixels would otherwise
/// come out black.
pub fn flatten_onto_white(image: DynamicImage) -> DynamicImage {
    if !image.color().has_alpha() {
        return image;
    }

    let rgba = image.to_rgba8();
    let flattened = RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = pixel[3] as f32 / 255.0;
        let blend = |channel: u8| (channel as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    });
    DynamicImage::ImageRgb8(flattened)
}

/// Text styling for a single line of report text.
#[derive(Clone, Copy, Debug)]
pub struct TextStyle {
    pub size: u8,
    pub color: Option<Color>,
}

impl TextStyle {
    pub fn new(size: u8) -> Self {
        Self { size, color: None }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn to_style(self) -> Style {
        let mut style = Style::new().with_font_size(self.size);
        if let Some(color) = self.color {
            style.set_color(color);
        }
        style
    }
}

/// Prints one line of text with its baseline at (`x`, `baseline`) in page coordinates.
pub fn draw_text_line(
    area: &Area<'_>,
    font_cache: &FontCache,
    x: f64,
    baseline: f64,
    text: &str,
    text_style: TextStyle,
) -> Result<(), Error> {
    let style = text_style.to_style();
    let ascent = style.font(font_cache).glyph_height(style.font_size());
    let position = Position::new(pt_to_mm(x), pt_to_mm(PAGE_HEIGHT - baseline) - ascent);

    match area.text_section(font_cache, position, style) {
        Some(mut section) => section.print_str(text, style),
        None => Err(Error::new(
            format!("Text line does not fit on the page: {}", text),
            ErrorKind::PageSizeExceeded,
        )),
    }
}

/// Draws `image` stretched to `rect`.
///
/// `genpdf` anchors images at their bottom-left corner, which is exactly the corner `Rect`
/// stores.
pub fn draw_image(area: &Area<'_>, image: &DynamicImage, rect: Rect) {
    let natural = image_extent(image);
    if natural.width <= f64::EPSILON || natural.height <= f64::EPSILON {
        return;
    }

    let scale = Scale::new(rect.width / natural.width, rect.height / natural.height);
    area.add_image(
        image,
        page_position(rect.x, rect.y),
        scale,
        Rotation::default(),
        Some(IMAGE_DPI),
    );
}
