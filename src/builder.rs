//! Document construction helpers for invoice rendering.

use std::path::PathBuf;

use genpdf::error::Error;
use genpdf::{self, PaperSize};

use crate::fonts;

/// Builder for `genpdf::Document` instances pre-configured for invoices.
///
/// Documents are always A4 and have no page decorator: the composer positions
/// every mark in absolute coordinates on the page geometry defined in
/// [`crate::layout`], so the element area must span the whole A4 page.
#[derive(Clone, Debug, Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    fonts_dir: Option<PathBuf>,
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets a directory searched for the bundled fonts before the default locations.
    pub fn with_fonts_dir(mut self, fonts_dir: impl Into<Option<PathBuf>>) -> Self {
        self.fonts_dir = fonts_dir.into();
        self
    }

    /// Returns the configured fonts directory, if any.
    pub fn fonts_dir(&self) -> Option<&std::path::Path> {
        self.fonts_dir.as_deref()
    }

    /// Builds a configured `genpdf::Document` instance.
    pub fn build(self) -> Result<genpdf::Document, Error> {
        let font_family = fonts::font_family(self.fonts_dir.as_deref())?;
        let mut document = genpdf::Document::new(font_family);

        document.set_paper_size(PaperSize::A4);
        if let Some(title) = self.title {
            document.set_title(title);
        }

        Ok(document)
    }
}
