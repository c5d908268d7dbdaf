//! Report configuration: header title, footer caption, logo location, and date stamp.

use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

pub const DEFAULT_TITLE: &str = "Manufacturing Production Report";
pub const DEFAULT_FOOTER: &str = "Generated by Analog";

pub const LOGO_ENV: &str = "PRODUCTION_REPORT_LOGO";
pub const TITLE_ENV: &str = "PRODUCTION_REPORT_TITLE";
pub const FOOTER_ENV: &str = "PRODUCTION_REPORT_FOOTER";
pub const FONTS_DIR_ENV: &str = "PRODUCTION_REPORT_FONTS_DIR";
pub const WINDOWS_FONTS_DIR_ENV: &str = "PRODUCTION_REPORT_WINDOWS_FONTS_DIR";

/// Location of the bundled company logo.
pub fn default_logo_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/company_logo.png")
}

/// Settings that shape a rendered report but not its data.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    title: String,
    footer: String,
    logo_path: Option<PathBuf>,
    report_date: Option<NaiveDate>,
    fonts_dir: Option<PathBuf>,
    system_fonts_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_owned(),
            footer: DEFAULT_FOOTER.to_owned(),
            logo_path: Some(default_logo_path()),
            report_date: None,
            fonts_dir: None,
            system_fonts_dir: None,
        }
    }
}

impl ReportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by the `PRODUCTION_REPORT_*` environment variables.
    ///
    /// Blank variables are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(path) = non_blank(LOGO_ENV) {
            config.logo_path = Some(PathBuf::from(path));
        }
        if let Some(title) = non_blank(TITLE_ENV) {
            config.title = title;
        }
        if let Some(footer) = non_blank(FOOTER_ENV) {
            config.footer = footer;
        }
        config.fonts_dir = non_blank(FONTS_DIR_ENV).map(PathBuf::from);
        config.system_fonts_dir = non_blank(WINDOWS_FONTS_DIR_ENV).map(PathBuf::from);
        config
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = footer.into();
        self
    }

    pub fn with_logo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.logo_path = Some(path.into());
        self
    }

    /// Renders the report without a logo.
    pub fn without_logo(mut self) -> Self {
        self.logo_path = None;
        self
    }

    /// Fixes the date stamp instead of using today's local date.
    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    /// Searches `dir` for the bundled font before the default locations.
    pub fn with_fonts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fonts_dir = Some(dir.into());
        self
    }

    /// System font directory used when the bundled font is missing.
    pub fn with_system_fonts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.system_fonts_dir = Some(dir.into());
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    pub fn logo_path(&self) -> Option<&Path> {
        self.logo_path.as_deref()
    }

    pub fn report_date(&self) -> Option<NaiveDate> {
        self.report_date
    }

    pub fn fonts_dir(&self) -> Option<&Path> {
        self.fonts_dir.as_deref()
    }

    pub fn system_fonts_dir(&self) -> Option<&Path> {
        self.system_fonts_dir.as_deref()
    }

    /// The date printed in the header.
    pub fn resolved_report_date(&self) -> NaiveDate {
        self.report_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Formats a date the way the report header prints it, e.g. `10/9/2023`.
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%-m/%-d/%Y").to_string()
}
