//! The invoice document composer.
//!
//! [`DocumentComposer::compose`] lays a record out into a [`Sheet`] one block
//! at a time: header, metadata column, bill-to, job, item tables, totals and
//! footer.  Each step receives the cursor left behind by the previous step and
//! returns the advanced one.  The two rendering entry points share
//! [`DocumentComposer::render_bytes`], so the file on disk and the encoded
//! string always describe the same document, up to the ID and timestamps
//! printpdf writes on every render.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::{debug, info};

use crate::builder::DocumentBuilder;
use crate::error::ComposeError;
use crate::format;
use crate::layout::{
    wrap_text, Anchor, Cursor, Measure, Sheet, TextStyle, Tone, LINE_HEIGHT, MARGIN_LEFT,
    MARGIN_RIGHT, PAGE_HEIGHT, PAGE_WIDTH, TOP, WRAP_WIDTH,
};
use crate::model::{BusinessProfile, ClientProfile, InvoiceRecord};
use crate::pricing::{Bucket, Pricing, Totals};
use crate::render::SheetElement;
use crate::table::{GridTable, TableRenderer};

const HEADER_DETAILS_TOP: f64 = 28.0;
const BILL_TO_GAP: f64 = 10.0;
const BILL_TO_MIN_Y: f64 = 55.0;
const LABEL_ADVANCE: f64 = 7.0;
const NAME_ADVANCE: f64 = 6.0;
const JOB_GAP: f64 = 5.0;
const TITLE_ADVANCE: f64 = 6.0;
const ITEMS_GAP: f64 = 10.0;
const HEADING_ADVANCE: f64 = 8.0;
const SUBTOTAL_GAP: f64 = 3.0;
const SECTION_GAP: f64 = 10.0;
const TOTALS_LABEL_X: f64 = 150.0;
const TOTALS_RULE_LEFT: f64 = 110.0;
const TOTALS_LINE_ADVANCE: f64 = 6.0;
const TOTAL_ADVANCE: f64 = 8.0;
const FOOTER_THANKS_Y: f64 = PAGE_HEIGHT - 20.0;
const FOOTER_CREDIT_Y: f64 = PAGE_HEIGHT - 15.0;

/// Metadata lines and their fixed positions in the right-hand column.
const META_TITLE_Y: f64 = 20.0;
const META_NUMBER_Y: f64 = 30.0;
const META_ISSUE_Y: f64 = 36.0;
const META_DUE_Y: f64 = 42.0;
const META_STATUS_Y: f64 = 48.0;

const FALLBACK_TITLE: &str = "Invoice";
const OVERDUE: &str = "OVERDUE";

fn label_style() -> TextStyle {
    TextStyle::body().sized(9).toned(Tone::Muted)
}

/// Lays out invoices and renders them to PDF.
///
/// The table renderer is pluggable; the composer trusts the cursor it returns
/// and never estimates a table's height itself.
#[derive(Clone, Debug, Default)]
pub struct DocumentComposer<T = GridTable> {
    tables: T,
    builder: DocumentBuilder,
    #[cfg(feature = "outline")]
    outline: bool,
}

impl DocumentComposer<GridTable> {
    /// Creates a composer that draws tables with [`GridTable`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: TableRenderer> DocumentComposer<T> {
    /// Replaces the table renderer.
    pub fn with_table_renderer<U: TableRenderer>(self, tables: U) -> DocumentComposer<U> {
        DocumentComposer {
            tables,
            builder: self.builder,
            #[cfg(feature = "outline")]
            outline: self.outline,
        }
    }

    /// Searches `fonts_dir` for the bundled fonts before the default locations.
    pub fn with_fonts_dir(mut self, fonts_dir: impl Into<Option<PathBuf>>) -> Self {
        self.builder = self.builder.with_fonts_dir(fonts_dir);
        self
    }

    /// Embeds a PDF outline entry for every invoice section.
    #[cfg(feature = "outline")]
    pub fn with_outline(mut self, outline: bool) -> Self {
        self.outline = outline;
        self
    }

    /// Lays out the invoice without rendering it.
    ///
    /// `measure` supplies text widths for wrapping and right alignment.  The
    /// result is deterministic for a given record and measure.
    pub fn compose(
        &self,
        record: &InvoiceRecord,
        business: Option<&BusinessProfile>,
        client: Option<&ClientProfile>,
        measure: &dyn Measure,
    ) -> Sheet {
        compose_sheet(&self.tables, record, business, client, measure)
    }
}

impl<T> DocumentComposer<T>
where
    T: TableRenderer + Clone + 'static,
{
    /// Builds the invoice and writes it to `dir` as `Invoice-<number>.pdf`.
    ///
    /// The number falls back to `Draft`.  `dir` is created when missing.
    /// Returns the path of the written file.
    pub fn render_to_file(
        &self,
        record: &InvoiceRecord,
        business: Option<&BusinessProfile>,
        client: Option<&ClientProfile>,
        dir: impl AsRef<Path>,
    ) -> Result<PathBuf, ComposeError> {
        let dir = dir.as_ref();
        let bytes = self.render_bytes(record, business, client)?;

        fs::create_dir_all(dir).map_err(|err| ComposeError::io(dir, err))?;
        let path = dir.join(format::file_name(record.invoice_number()));
        fs::write(&path, &bytes).map_err(|err| ComposeError::io(&path, err))?;

        info!("wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    /// Builds the invoice and returns it as standard base64 without any
    /// data-URI prefix.
    pub fn render_to_encoded_string(
        &self,
        record: &InvoiceRecord,
        business: Option<&BusinessProfile>,
        client: Option<&ClientProfile>,
    ) -> Result<String, ComposeError> {
        let bytes = self.render_bytes(record, business, client)?;
        info!("encoded invoice document ({} bytes)", bytes.len());
        Ok(STANDARD.encode(bytes))
    }

    /// Builds the invoice and returns the raw PDF bytes.
    ///
    /// Any backend failure aborts the build; no partial document is returned.
    ///
    /// The layout is deterministic, but the bytes are not: printpdf stamps a
    /// random document ID and the creation and modification dates into every
    /// file, so two calls with the same input differ in those fields.  Compare
    /// rendered invoices after blanking them, or compare [`compose`] output.
    ///
    /// [`compose`]: DocumentComposer::compose
    pub fn render_bytes(
        &self,
        record: &InvoiceRecord,
        business: Option<&BusinessProfile>,
        client: Option<&ClientProfile>,
    ) -> Result<Vec<u8>, ComposeError> {
        let title = format!("Invoice {}", record.invoice_number().unwrap_or("Draft"));
        let mut document = self
            .builder
            .clone()
            .with_title(title)
            .build()
            .map_err(ComposeError::FontLoad)?;

        let tables = self.tables.clone();
        let owned_record = record.clone();
        let owned_business = business.cloned();
        let owned_client = client.cloned();
        let element = SheetElement::new(move |measure| {
            compose_sheet(
                &tables,
                &owned_record,
                owned_business.as_ref(),
                owned_client.as_ref(),
                measure,
            )
        });
        #[cfg(feature = "outline")]
        let sheet = element.sheet();
        document.push(element);

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ComposeError::Render)?;

        #[cfg(feature = "outline")]
        let bytes = match sheet.get() {
            Some(sheet) if self.outline => {
                crate::outline::apply_section_outline(&bytes, sheet.anchors())?
            }
            _ => bytes,
        };

        Ok(bytes)
    }
}

fn compose_sheet(
    tables: &dyn TableRenderer,
    record: &InvoiceRecord,
    business: Option<&BusinessProfile>,
    client: Option<&ClientProfile>,
    measure: &dyn Measure,
) -> Sheet {
    let pricing = Pricing::from_record(record);
    let mut sheet = Sheet::new();

    let cursor = header(&mut sheet, business);
    metadata(&mut sheet, record, measure);
    let cursor = bill_to(&mut sheet, cursor, client);
    let cursor = job(&mut sheet, cursor, record, measure);
    let cursor = items(&mut sheet, cursor, &pricing, tables, measure);
    totals(&mut sheet, cursor, pricing.totals());
    footer(&mut sheet, business);

    debug!(
        "laid out invoice {} on {} page(s)",
        record.invoice_number().unwrap_or("Draft"),
        sheet.page_count()
    );
    sheet
}

/// Returns a cursor with room for one line of `height`, starting a new page
/// when needed.
fn line(sheet: &mut Sheet, cursor: Cursor, height: f64) -> Cursor {
    sheet.fit(cursor, height)
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn header(sheet: &mut Sheet, business: Option<&BusinessProfile>) -> Cursor {
    let name = business
        .and_then(BusinessProfile::business_name)
        .unwrap_or(FALLBACK_TITLE);
    sheet.text(
        Cursor::new(0, TOP),
        MARGIN_LEFT,
        Anchor::Left,
        name,
        TextStyle::body().sized(20).bold(),
    );

    let mut cursor = Cursor::new(0, HEADER_DETAILS_TOP);
    let Some(business) = business else {
        return cursor;
    };

    let address = business.business_address().into_iter().flat_map(non_blank_lines);
    let details = address
        .chain(business.business_phone())
        .chain(business.business_email());
    for detail in details {
        cursor = line(sheet, cursor, LINE_HEIGHT);
        sheet.text(cursor, MARGIN_LEFT, Anchor::Left, detail, TextStyle::body());
        cursor = cursor.advance(LINE_HEIGHT);
    }
    cursor
}

fn metadata(sheet: &mut Sheet, record: &InvoiceRecord, measure: &dyn Measure) {
    let at = |y| Cursor::new(0, y);
    let meta = TextStyle::body();

    sheet.text(
        at(META_TITLE_Y),
        MARGIN_RIGHT,
        Anchor::Right,
        "INVOICE",
        TextStyle::body().sized(16).bold().toned(Tone::Accent),
    );
    sheet.text(
        at(META_NUMBER_Y),
        MARGIN_RIGHT,
        Anchor::Right,
        format!("Invoice #: {}", record.invoice_number().unwrap_or("N/A")),
        meta,
    );
    if let Some(issued) = record.issue_date() {
        sheet.text(
            at(META_ISSUE_Y),
            MARGIN_RIGHT,
            Anchor::Right,
            format!("Issue Date: {}", format::date(issued)),
            meta,
        );
    }
    if let Some(due) = record.due_date() {
        sheet.text(
            at(META_DUE_Y),
            MARGIN_RIGHT,
            Anchor::Right,
            format!("Due Date: {}", format::date(due)),
            meta,
        );
    }

    let status = format::status(record.status());
    let tone = if status == OVERDUE {
        Tone::Alert
    } else {
        Tone::Accent
    };
    let status_style = TextStyle::body().bold().toned(tone);
    let status_width = measure.text_width(&status, status_style);
    sheet.text(
        at(META_STATUS_Y),
        MARGIN_RIGHT - status_width,
        Anchor::Right,
        "Status: ",
        meta,
    );
    sheet.text(
        at(META_STATUS_Y),
        MARGIN_RIGHT,
        Anchor::Right,
        status,
        status_style,
    );
}

fn bill_to(sheet: &mut Sheet, header_end: Cursor, client: Option<&ClientProfile>) -> Cursor {
    let mut cursor = header_end.advance(BILL_TO_GAP).at_least(BILL_TO_MIN_Y);

    cursor = line(sheet, cursor, LABEL_ADVANCE);
    sheet.text(cursor, MARGIN_LEFT, Anchor::Left, "BILL TO:", label_style());
    cursor = cursor.advance(LABEL_ADVANCE);

    let Some(client) = client else {
        return cursor;
    };

    if let Some(name) = client.name() {
        cursor = line(sheet, cursor, NAME_ADVANCE);
        sheet.text(cursor, MARGIN_LEFT, Anchor::Left, name, TextStyle::body().bold());
        cursor = cursor.advance(NAME_ADVANCE);
    }
    let address = client.address().into_iter().flat_map(non_blank_lines);
    for detail in client.email().into_iter().chain(address) {
        cursor = line(sheet, cursor, LINE_HEIGHT);
        sheet.text(cursor, MARGIN_LEFT, Anchor::Left, detail, TextStyle::body());
        cursor = cursor.advance(LINE_HEIGHT);
    }
    cursor
}

fn job(
    sheet: &mut Sheet,
    cursor: Cursor,
    record: &InvoiceRecord,
    measure: &dyn Measure,
) -> Cursor {
    let title = record.invoice_title();
    let description = record.invoice_description();
    if title.is_none() && description.is_none() {
        return cursor;
    }

    let mut cursor = line(sheet, cursor.advance(JOB_GAP), LABEL_ADVANCE);
    sheet.text(cursor, MARGIN_LEFT, Anchor::Left, "Job/Project:", label_style());
    cursor = cursor.advance(LABEL_ADVANCE);

    if let Some(title) = title {
        cursor = line(sheet, cursor, TITLE_ADVANCE);
        sheet.text(cursor, MARGIN_LEFT, Anchor::Left, title, TextStyle::body().bold());
        cursor = cursor.advance(TITLE_ADVANCE);
    }
    if let Some(description) = description {
        let lines = wrap_text(description, WRAP_WIDTH, measure, TextStyle::body());
        debug!("job description wrapped into {} line(s)", lines.len());
        for text in lines {
            cursor = line(sheet, cursor, LINE_HEIGHT);
            sheet.text(cursor, MARGIN_LEFT, Anchor::Left, text, TextStyle::body());
            cursor = cursor.advance(LINE_HEIGHT);
        }
    }
    cursor
}

fn items(
    sheet: &mut Sheet,
    cursor: Cursor,
    pricing: &Pricing,
    tables: &dyn TableRenderer,
    measure: &dyn Measure,
) -> Cursor {
    let mut cursor = cursor.advance(ITEMS_GAP);
    for bucket in pricing.buckets() {
        if bucket.is_empty() {
            continue;
        }
        cursor = section(sheet, cursor, bucket, tables, measure);
    }
    cursor
}

fn section(
    sheet: &mut Sheet,
    cursor: Cursor,
    bucket: &Bucket,
    tables: &dyn TableRenderer,
    measure: &dyn Measure,
) -> Cursor {
    let kind = bucket.kind();
    let heading = line(sheet, cursor, HEADING_ADVANCE);
    sheet.anchor(heading, section_title(kind.heading()));
    sheet.text(
        heading,
        MARGIN_LEFT,
        Anchor::Left,
        kind.heading(),
        TextStyle::body().sized(11).bold().toned(Tone::Accent),
    );

    let table_top = heading.advance(HEADING_ADVANCE);
    let table_end = tables.render_table(sheet, table_top, bucket, measure);
    debug!(
        "{} table ends on page {} at y = {:.1}",
        kind.heading(),
        table_end.page() + 1,
        table_end.y()
    );

    let subtotal = line(sheet, table_end.advance(SUBTOTAL_GAP), TOTALS_LINE_ADVANCE);
    sheet.text(
        subtotal,
        MARGIN_RIGHT,
        Anchor::Right,
        format!(
            "{} {}",
            kind.subtotal_label(),
            format::currency(bucket.subtotal())
        ),
        TextStyle::body().bold(),
    );
    subtotal.advance(SECTION_GAP)
}

/// "SERVICES" becomes "Services".
fn section_title(heading: &str) -> String {
    let mut chars = heading.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn totals(sheet: &mut Sheet, cursor: Cursor, totals: Totals) -> Cursor {
    let tax_lines = if totals.shows_tax() { 2.0 } else { 1.0 };
    let block_height = tax_lines * TOTALS_LINE_ADVANCE + SUBTOTAL_GAP + TOTAL_ADVANCE;
    let mut cursor = line(sheet, cursor, block_height);
    sheet.anchor(cursor, "Totals");

    let pair_style = TextStyle::body().bold();
    pair(sheet, cursor, "Subtotal:", totals.subtotal, pair_style);
    cursor = cursor.advance(TOTALS_LINE_ADVANCE);
    if totals.shows_tax() {
        pair(sheet, cursor, "Tax:", totals.tax, pair_style);
        cursor = cursor.advance(TOTALS_LINE_ADVANCE);
    }

    sheet.rule(cursor, TOTALS_RULE_LEFT, MARGIN_RIGHT, Tone::Accent);
    cursor = cursor.advance(SUBTOTAL_GAP);
    pair(
        sheet,
        cursor,
        "TOTAL:",
        totals.total,
        TextStyle::body().sized(14).bold().toned(Tone::Accent),
    );
    cursor.advance(TOTAL_ADVANCE)
}

/// A right-aligned label and amount on one line of the totals block.
fn pair(sheet: &mut Sheet, cursor: Cursor, label: &str, value: f64, style: TextStyle) {
    sheet.text(cursor, TOTALS_LABEL_X, Anchor::Right, label, style);
    sheet.text(
        cursor,
        MARGIN_RIGHT,
        Anchor::Right,
        format::currency(value),
        style,
    );
}

fn footer(sheet: &mut Sheet, business: Option<&BusinessProfile>) {
    let last = sheet.last_page();
    let footer_style = TextStyle::body().toned(Tone::Muted);

    sheet.text(
        Cursor::new(last, FOOTER_THANKS_Y),
        PAGE_WIDTH / 2.0,
        Anchor::Center,
        "Thank you for your business!",
        footer_style.italic(),
    );
    if let Some(name) = business.and_then(BusinessProfile::business_name) {
        sheet.text(
            Cursor::new(last, FOOTER_CREDIT_Y),
            PAGE_WIDTH / 2.0,
            Anchor::Center,
            format!("Generated by {name}"),
            footer_style.sized(9),
        );
    }
}
