//! Font lookup for the report renderer.
//!
//! Every line of the report is set in one regular face. The bundled Roboto face is looked for in
//! the directory configured on [`ReportConfig`], next to the executable, and in the crate's
//! `assets/fonts`, in that order. Arial from the system font directory is the fallback.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use log::{debug, warn};

use crate::config::{ReportConfig, FONTS_DIR_ENV};

/// A regular-weight font file and the family it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontFace {
    pub family: &'static str,
    pub file: &'static str,
}

pub const BUNDLED_FACE: FontFace = FontFace {
    family: "Roboto",
    file: "Roboto-Regular.ttf",
};

pub const SYSTEM_FACE: FontFace = FontFace {
    family: "Arial",
    file: "arial.ttf",
};

/// The crate's bundled font directory, whether or not it is populated.
pub fn bundled_fonts_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts")
}

/// A font file found on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedFont {
    pub face: FontFace,
    pub path: PathBuf,
}

/// Ordered list of places a report font may live.
#[derive(Clone, Debug)]
pub struct FontSearch {
    bundled_dirs: Vec<PathBuf>,
    system_dir: Option<PathBuf>,
}

impl FontSearch {
    pub fn for_config(config: &ReportConfig) -> Self {
        let mut bundled_dirs = Vec::new();
        let mut push = |dir: PathBuf| {
            if !bundled_dirs.contains(&dir) {
                bundled_dirs.push(dir);
            }
        };
        if let Some(dir) = config.fonts_dir() {
            push(dir.to_path_buf());
        }
        let exe = env::current_exe().ok();
        if let Some(bin_dir) = exe.as_deref().and_then(Path::parent) {
            push(bin_dir.join("assets/fonts"));
        }
        push(bundled_fonts_dir());

        let system_dir = config
            .system_fonts_dir()
            .map(Path::to_path_buf)
            .or_else(platform_fonts_dir);

        Self {
            bundled_dirs,
            system_dir,
        }
    }

    /// Every file the search looks at, most preferred first.
    pub fn candidates(&self) -> Vec<LocatedFont> {
        let bundled = self.bundled_dirs.iter().map(|dir| LocatedFont {
            face: BUNDLED_FACE,
            path: dir.join(BUNDLED_FACE.file),
        });
        let system = self.system_dir.iter().map(|dir| LocatedFont {
            face: SYSTEM_FACE,
            path: dir.join(SYSTEM_FACE.file),
        });
        bundled.chain(system).collect()
    }

    /// The first candidate that exists.
    pub fn locate(&self) -> Result<LocatedFont, Error> {
        let candidates = self.candidates();
        if let Some(found) = candidates.iter().find(|c| c.path.is_file()) {
            debug!("using {} font from {}", found.face.family, found.path.display());
            return Ok(found.clone());
        }

        let checked = candidates
            .iter()
            .map(|c| c.path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Err(Error::new(
            format!(
                "No report font found. Checked: {}. Set {} to a directory containing {}.",
                if checked.is_empty() { "nothing" } else { &checked },
                FONTS_DIR_ENV,
                BUNDLED_FACE.file
            ),
            io::Error::new(io::ErrorKind::NotFound, "report font not found"),
        ))
    }

    /// Loads the located face into every style slot of a family.
    pub fn load_family(&self) -> Result<FontFamily<FontData>, Error> {
        let found = self.locate()?;
        if found.face != BUNDLED_FACE {
            warn!(
                "Bundled {} font unavailable; using {} from {}",
                BUNDLED_FACE.family,
                found.face.family,
                found.path.display()
            );
        }

        let regular = FontData::load(&found.path, None).map_err(|err| {
            Error::new(
                format!("Failed to load font {}: {}", found.path.display(), err),
                io::Error::new(io::ErrorKind::InvalidData, err.to_string()),
            )
        })?;
        Ok(FontFamily {
            bold: regular.clone(),
            italic: regular.clone(),
            bold_italic: regular.clone(),
            regular,
        })
    }
}

fn platform_fonts_dir() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        for var in ["WINDIR", "SystemRoot"] {
            if let Some(root) = env::var_os(var).filter(|value| !value.is_empty()) {
                let candidate = PathBuf::from(root).join("Fonts");
                if candidate.is_dir() {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

/// Font family for a report rendered with `config`.
pub fn load_font_family(config: &ReportConfig) -> Result<FontFamily<FontData>, Error> {
    FontSearch::for_config(config).load_family()
}

/// Whether a report font can be found for `config`.
pub fn fonts_available(config: &ReportConfig) -> bool {
    FontSearch::for_config(config).locate().is_ok()
}
