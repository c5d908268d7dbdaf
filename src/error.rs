//! Error type shared by the report composer and the request parsing helpers.

use thiserror::Error;

/// Errors produced while validating report requests or composing a report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// One of the three record collections was absent or `null` in the request body.
    #[error("missing required dataset `{0}`")]
    MissingDataset(&'static str),

    /// The request body was not valid JSON or did not match the record shapes.
    #[error("invalid report request: {0}")]
    InvalidRequest(#[source] serde_json::Error),

    /// No usable font family could be located.
    #[error("failed to load fonts: {0}")]
    FontLoad(#[source] genpdf::error::Error),

    /// The PDF renderer rejected an operation.
    #[error("failed to render report: {0}")]
    Render(#[source] genpdf::error::Error),

    /// A chart bitmap or the logo could not be produced or decoded.
    #[error("image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// Reading an asset or writing the output failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Outline entries could not be added to the rendered document.
    #[cfg(feature = "bookmarks")]
    #[error("failed to add bookmarks: {0}")]
    Bookmarks(#[from] crate::bookmarks::BookmarkError),
}

impl ReportError {
    /// Returns the HTTP status an outer request handler should answer with.
    ///
    /// Request-shape problems are the caller's fault (400); anything that goes wrong while
    /// composing the document is reported as a server failure (500).
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingDataset(_) | Self::InvalidRequest(_) => 400,
            _ => 500,
        }
    }

    /// Indicates whether the error was caused by the request rather than by rendering.
    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequest(err)
    }
}
