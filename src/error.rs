//! Errors surfaced by the invoice composer.
//!
//! Missing optional invoice data is never an error; these variants only cover
//! failures that abort a build: fonts, the PDF backend, and the file system.

use std::fmt;
use std::io;
use std::path::PathBuf;

#[cfg(feature = "outline")]
use crate::outline::OutlineError;

/// Fatal failures while producing an invoice document.
#[derive(Debug)]
pub enum ComposeError {
    /// No usable font family could be located or parsed.
    FontLoad(genpdf::error::Error),
    /// `genpdf` failed to lay out or serialize the document.
    Render(genpdf::error::Error),
    /// Reading input or writing the rendered document failed.
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
    /// An invoice bundle could not be parsed.
    Input(serde_json::Error),
    /// Section outlines could not be embedded into the rendered bytes.
    #[cfg(feature = "outline")]
    Outline(OutlineError),
}

impl ComposeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FontLoad(_) => write!(f, "Failed to load fonts for the invoice document"),
            Self::Render(_) => write!(f, "Failed to render the invoice document"),
            Self::Io { path, .. } => write!(f, "I/O error on {}", path.display()),
            Self::Input(_) => write!(f, "Invoice data is not valid JSON"),
            #[cfg(feature = "outline")]
            Self::Outline(_) => write!(f, "Failed to add section outlines"),
        }
    }
}

impl std::error::Error for ComposeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::Input(err) => Some(err),
            #[cfg(feature = "outline")]
            Self::Outline(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ComposeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Input(err)
    }
}

#[cfg(feature = "outline")]
impl From<OutlineError> for ComposeError {
    fn from(err: OutlineError) -> Self {
        Self::Outline(err)
    }
}
