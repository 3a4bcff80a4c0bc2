//! Core entry point for the invoice_composer crate.
//!
//! An [`InvoiceRecord`](model::InvoiceRecord) together with optional business
//! and client profiles is laid out by a [`DocumentComposer`] into a paginated
//! invoice and rendered to PDF with `genpdf`.
//!
//! ```no_run
//! use invoice_composer::model::{InvoiceRecord, LineItem};
//! use invoice_composer::DocumentComposer;
//!
//! let record = InvoiceRecord::new()
//!     .with_invoice_number("INV-1001".to_owned())
//!     .with_line_item(LineItem::new("2 hours labor", 2.0, 50.0));
//!
//! let composer = DocumentComposer::new();
//! let path = composer.render_to_file(&record, None, None, "target/invoices")?;
//! let encoded = composer.render_to_encoded_string(&record, None, None)?;
//! # let _ = (path, encoded);
//! # Ok::<(), invoice_composer::ComposeError>(())
//! ```

pub mod builder;
pub mod composer;
pub mod error;
pub mod fonts;
pub mod format;
pub mod layout;
pub mod model;
pub mod pricing;
pub mod render;
pub mod table;

#[cfg(feature = "outline")]
pub mod outline;

pub use composer::DocumentComposer;
pub use error::ComposeError;
