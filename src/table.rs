//! Line-item tables.
//!
//! The composer hands each non-empty bucket to a [`TableRenderer`] and
//! continues from whatever cursor the renderer returns.  Row heights depend on
//! how descriptions wrap and on page breaks, so only the renderer knows where
//! the table ends.

use crate::format;
use crate::layout::{
    wrap_text, Anchor, Cursor, Measure, Sheet, TextStyle, Tone, CONTENT_BOTTOM, LINE_HEIGHT,
    MARGIN_LEFT, TOP,
};
use crate::pricing::{Bucket, PricedItem};

/// Lays out one bucket as a table starting at `at`.
pub trait TableRenderer {
    /// Draws the table and returns the cursor just below the space it
    /// occupies, which may be on a later page than `at`.
    fn render_table(
        &self,
        sheet: &mut Sheet,
        at: Cursor,
        bucket: &Bucket,
        measure: &dyn Measure,
    ) -> Cursor;
}

/// A column of the line-item table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Column {
    pub width: f64,
    pub anchor: Anchor,
}

/// Description, Quantity, Rate/Price, Amount.
pub const COLUMNS: [Column; 4] = [
    Column {
        width: 85.0,
        anchor: Anchor::Left,
    },
    Column {
        width: 25.0,
        anchor: Anchor::Center,
    },
    Column {
        width: 30.0,
        anchor: Anchor::Right,
    },
    Column {
        width: 30.0,
        anchor: Anchor::Right,
    },
];

const HEADER_HEIGHT: f64 = 8.0;
const CELL_PADDING: f64 = 2.0;
const ROW_PADDING: f64 = 1.5;

fn header_style() -> TextStyle {
    TextStyle::body().bold().toned(Tone::Accent)
}

fn cell_style() -> TextStyle {
    TextStyle::body().sized(9)
}

/// Default table renderer: an accent header rule, a muted rule under each row,
/// descriptions wrapped inside their column.
///
/// A row moves to a new page when it does not fit below the previous one.  A
/// row taller than the room left on the page is split between lines; the
/// quantity and money cells stay on its first fragment.  Every continuation
/// page repeats the header row.
#[derive(Clone, Copy, Debug, Default)]
pub struct GridTable;

impl GridTable {
    fn header(&self, sheet: &mut Sheet, at: Cursor, rate_header: &str) -> Cursor {
        let labels = ["Description", "Quantity", rate_header, "Amount"];
        let text_line = at.advance(ROW_PADDING + 0.5);
        for (column, (x, label)) in column_anchors().into_iter().zip(labels).enumerate() {
            sheet.text(text_line, x, COLUMNS[column].anchor, label, header_style());
        }

        let bottom = at.advance(HEADER_HEIGHT);
        sheet.rule(bottom, MARGIN_LEFT, table_right(), Tone::Accent);
        bottom
    }

    /// Draws `lines` of one row, plus the item's values when given.
    fn row(
        &self,
        sheet: &mut Sheet,
        at: Cursor,
        item: Option<&PricedItem>,
        lines: &[String],
    ) -> Cursor {
        let first_line = at.advance(ROW_PADDING);
        for (index, line) in lines.iter().enumerate() {
            sheet.text(
                first_line.advance(index as f64 * LINE_HEIGHT),
                column_anchors()[0],
                Anchor::Left,
                line.as_str(),
                cell_style(),
            );
        }

        if let Some(item) = item {
            let values = [
                format::quantity(item.quantity),
                format::currency(item.rate),
                format::currency(item.amount),
            ];
            for (offset, value) in values.into_iter().enumerate() {
                let column = offset + 1;
                sheet.text(
                    first_line,
                    column_anchors()[column],
                    COLUMNS[column].anchor,
                    value,
                    cell_style(),
                );
            }
        }

        let bottom = at.advance(row_height(lines.len()));
        sheet.rule(bottom, MARGIN_LEFT, table_right(), Tone::Muted);
        bottom
    }

    fn continue_on_next_page(&self, sheet: &mut Sheet, at: Cursor, bucket: &Bucket) -> Cursor {
        let next = sheet.next_page(at);
        log::debug!(
            "{} table continues on page {}",
            bucket.kind().heading(),
            next.page() + 1
        );
        self.header(sheet, next, bucket.kind().rate_header())
    }
}

impl TableRenderer for GridTable {
    fn render_table(
        &self,
        sheet: &mut Sheet,
        at: Cursor,
        bucket: &Bucket,
        measure: &dyn Measure,
    ) -> Cursor {
        let description_width = COLUMNS[0].width - 2.0 * CELL_PADDING;
        let rows: Vec<Vec<String>> = bucket
            .items()
            .iter()
            .map(|item| wrap_text(&item.description, description_width, measure, cell_style()))
            .collect();

        // The header stays with the first row unless that row is split anyway.
        let first_row = match rows.first() {
            Some(lines) if lines.len() > lines_per_page() => row_height(1),
            Some(lines) => row_height(lines.len()),
            None => 0.0,
        };
        let start = sheet.fit(at, HEADER_HEIGHT + first_row);
        let mut cursor = self.header(sheet, start, bucket.kind().rate_header());
        let mut page_top = cursor;

        for (item, lines) in bucket.items().iter().zip(&rows) {
            let mut remaining = lines.as_slice();
            let mut values = Some(item);
            loop {
                let room = lines_that_fit(cursor);
                if remaining.len().max(1) <= room {
                    cursor = self.row(sheet, cursor, values, remaining);
                    break;
                }

                let fits_on_fresh_page = remaining.len() <= lines_per_page();
                if cursor != page_top && (fits_on_fresh_page || room == 0) {
                    cursor = self.continue_on_next_page(sheet, cursor, bucket);
                    page_top = cursor;
                    continue;
                }

                let (head, tail) = remaining.split_at(room.max(1).min(remaining.len()));
                log::debug!(
                    "splitting a {} row after {} of {} line(s)",
                    bucket.kind().heading(),
                    head.len(),
                    remaining.len()
                );
                self.row(sheet, cursor, values.take(), head);
                remaining = tail;
                cursor = self.continue_on_next_page(sheet, cursor, bucket);
                page_top = cursor;
            }
        }

        cursor
    }
}

/// Description lines a row starting at `cursor` can hold above the footer band.
fn lines_that_fit(cursor: Cursor) -> usize {
    let room = CONTENT_BOTTOM - cursor.y() - 2.0 * ROW_PADDING;
    if room < LINE_HEIGHT {
        return 0;
    }
    (room / LINE_HEIGHT + 1e-9).floor() as usize
}

/// Description lines a row can hold directly below a continuation header.
fn lines_per_page() -> usize {
    lines_that_fit(Cursor::new(0, TOP + HEADER_HEIGHT))
}

fn row_height(lines: usize) -> f64 {
    lines.max(1) as f64 * LINE_HEIGHT + 2.0 * ROW_PADDING
}

fn table_right() -> f64 {
    MARGIN_LEFT + COLUMNS.iter().map(|column| column.width).sum::<f64>()
}

/// The `x` coordinate each column's text is anchored at.
fn column_anchors() -> [f64; 4] {
    let mut anchors = [0.0; 4];
    let mut left = MARGIN_LEFT;
    for (index, column) in COLUMNS.iter().enumerate() {
        anchors[index] = match column.anchor {
            Anchor::Left => left + CELL_PADDING,
            Anchor::Center => left + column.width / 2.0,
            Anchor::Right => left + column.width - CELL_PADDING,
        };
        left += column.width;
    }
    anchors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{FixedPitch, Mark, MARGIN_RIGHT};
    use crate::model::{InvoiceRecord, LineItem};
    use crate::pricing::Pricing;

    fn services(count: usize) -> Pricing {
        let items = (0..count).map(|index| LineItem::new(format!("Labor {index}"), 1.0, 10.0));
        Pricing::from_record(&InvoiceRecord::new().with_line_items(items))
    }

    #[test]
    fn columns_span_the_content_width() {
        assert_eq!(table_right(), MARGIN_RIGHT);
    }

    #[test]
    fn returns_the_extent_of_header_and_rows() {
        let pricing = services(3);
        let mut sheet = Sheet::new();
        let end = GridTable.render_table(
            &mut sheet,
            Cursor::new(0, 80.0),
            pricing.services(),
            &FixedPitch::default(),
        );

        assert_eq!(end.page(), 0);
        assert_eq!(end.y(), 80.0 + HEADER_HEIGHT + 3.0 * row_height(1));
        let page = &sheet.pages()[0];
        assert!(page.find_text("Rate").is_some());
        assert!(page.find_text("Labor 2").is_some());
        assert!(page.find_text("$10.00").is_some());
    }

    #[test]
    fn wrapped_descriptions_grow_the_row() {
        let record = InvoiceRecord::new().with_line_item(LineItem::new(
            "Hours spent removing the old vanity and capping the supply lines",
            2.0,
            40.0,
        ));
        let pricing = Pricing::from_record(&record);
        let mut sheet = Sheet::new();
        let end = GridTable.render_table(
            &mut sheet,
            Cursor::new(0, 80.0),
            pricing.services(),
            &FixedPitch::default(),
        );

        let description_lines = sheet.pages()[0]
            .marks()
            .iter()
            .filter(|mark| matches!(mark, Mark::Text { x, .. } if *x == MARGIN_LEFT + CELL_PADDING))
            .count();
        // header label plus at least two wrapped lines
        assert!(description_lines >= 3);
        assert!(end.y() > 80.0 + HEADER_HEIGHT + row_height(1));
    }

    #[test]
    fn long_tables_continue_on_a_new_page_with_a_header() {
        let pricing = services(60);
        let mut sheet = Sheet::new();
        let end = GridTable.render_table(
            &mut sheet,
            Cursor::new(0, 80.0),
            pricing.services(),
            &FixedPitch::default(),
        );

        assert!(end.page() >= 1);
        assert_eq!(sheet.page_count(), end.page() + 1);
        for page in sheet.pages() {
            assert!(page.find_text("Description").is_some());
            for mark in page.marks() {
                if let Mark::Rule { y, .. } = mark {
                    assert!(*y <= CONTENT_BOTTOM);
                }
            }
        }
        let rows: usize = sheet
            .pages()
            .iter()
            .map(|page| page.texts().filter(|text| text.starts_with("Labor ")).count())
            .sum();
        assert_eq!(rows, 60);
    }

    #[test]
    fn rows_taller_than_a_page_are_split_across_pages() {
        let description = "Drywall patching and sanding ".repeat(120);
        let record =
            InvoiceRecord::new().with_line_item(LineItem::new(description.clone(), 1.0, 10.0));
        let pricing = Pricing::from_record(&record);
        let measure = FixedPitch::default();
        let expected = wrap_text(
            &description,
            COLUMNS[0].width - 2.0 * CELL_PADDING,
            &measure,
            cell_style(),
        );
        assert!(expected.len() > 60);

        let mut sheet = Sheet::new();
        let end = GridTable.render_table(
            &mut sheet,
            Cursor::new(0, 80.0),
            pricing.materials(),
            &measure,
        );

        assert!(end.page() >= 2);
        assert_eq!(sheet.page_count(), end.page() + 1);
        assert!(sheet.pages()[0]
            .texts()
            .any(|text| text.starts_with("Drywall")));

        let mut printed = Vec::new();
        for page in sheet.pages() {
            assert!(page.find_text("Description").is_some());
            for mark in page.marks() {
                match mark {
                    Mark::Text { y, .. } => assert!(*y + LINE_HEIGHT <= CONTENT_BOTTOM),
                    Mark::Rule { y, .. } => assert!(*y <= CONTENT_BOTTOM),
                }
                if let Mark::Text { x, text, .. } = mark {
                    if *x == MARGIN_LEFT + CELL_PADDING && text != "Description" {
                        printed.push(text.clone());
                    }
                }
            }
        }
        assert_eq!(printed, expected);

        let money: Vec<usize> = sheet
            .pages()
            .iter()
            .map(|page| page.texts().filter(|text| *text == "$10.00").count())
            .collect();
        assert_eq!(money[0], 2);
        assert!(money[1..].iter().all(|count| *count == 0));
    }

    #[test]
    fn rows_that_fit_a_fresh_page_are_not_split() {
        let record = InvoiceRecord::new().with_line_items([
            LineItem::new("Grout", 1.0, 7.0),
            LineItem::new("Tile ".repeat(60), 1.0, 4.0),
        ]);
        let pricing = Pricing::from_record(&record);
        let mut sheet = Sheet::new();
        let end = GridTable.render_table(
            &mut sheet,
            Cursor::new(0, 230.0),
            pricing.materials(),
            &FixedPitch::default(),
        );

        assert_eq!(end.page(), 1);
        assert!(sheet.pages()[0].find_text("Grout").is_some());
        assert!(sheet.pages()[0].texts().all(|text| !text.starts_with("Tile")));
        assert!(sheet.pages()[1].find_text("Description").is_some());
        assert_eq!(
            sheet.pages()[1]
                .texts()
                .filter(|text| *text == "$4.00")
                .count(),
            2
        );
    }

    #[test]
    fn materials_use_a_price_column() {
        let record = InvoiceRecord::new().with_line_item(LineItem::new("Grout", 2.0, 7.5));
        let pricing = Pricing::from_record(&record);
        let mut sheet = Sheet::new();
        GridTable.render_table(
            &mut sheet,
            Cursor::new(0, 60.0),
            pricing.materials(),
            &FixedPitch::default(),
        );
        assert!(sheet.pages()[0].find_text("Price").is_some());
        assert!(sheet.pages()[0].find_text("$15.00").is_some());
    }
}
