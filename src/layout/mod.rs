//! Page geometry and the display list produced by the composer.
//!
//! Layout is expressed in millimetres on an A4 page with the origin in the top
//! left corner and `y` growing downwards.  A text mark's `y` names the top of
//! its line.  The types here avoid referencing `genpdf` directly, the same way
//! the input model does, so a [`Sheet`] can be produced and inspected without
//! fonts or a PDF backend; [`crate::render`] replays it onto real pages.

mod wrap;

pub use wrap::wrap_text;

/// Width of an A4 page.
pub const PAGE_WIDTH: f64 = 210.0;
/// Height of an A4 page.
pub const PAGE_HEIGHT: f64 = 297.0;
/// Left edge of all left-aligned content.
pub const MARGIN_LEFT: f64 = 20.0;
/// Right edge of all right-aligned content.
pub const MARGIN_RIGHT: f64 = PAGE_WIDTH - 20.0;
/// Where content starts on every page.
pub const TOP: f64 = 20.0;
/// Height of the band kept free at the bottom of each page for the footer.
pub const FOOTER_RESERVE: f64 = 25.0;
/// Lowest point content may reach before a new page is started.
pub const CONTENT_BOTTOM: f64 = PAGE_HEIGHT - FOOTER_RESERVE;
/// Standard line advance.
pub const LINE_HEIGHT: f64 = 5.0;
/// Width long-form text is wrapped to.
pub const WRAP_WIDTH: f64 = 150.0;

/// Vertical layout position: a page index and a `y` offset on that page.
///
/// Layout steps take a cursor by value and hand back the advanced one, so
/// every step can be exercised on its own.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cursor {
    page: usize,
    y: f64,
}

impl Cursor {
    pub fn new(page: usize, y: f64) -> Self {
        Self { page, y }
    }

    pub fn page(self) -> usize {
        self.page
    }

    pub fn y(self) -> f64 {
        self.y
    }

    /// Moves the cursor down by `dy`.
    pub fn advance(self, dy: f64) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }

    /// Moves the cursor down to `y` unless it is already further down.
    pub fn at_least(self, y: f64) -> Self {
        Self {
            y: self.y.max(y),
            ..self
        }
    }
}

/// Weight and slant of a text mark.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Weight {
    #[default]
    Regular,
    Bold,
    Italic,
}

/// Semantic colours used on the invoice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tone {
    /// Body text.
    #[default]
    Text,
    /// Labels and footer text.
    Muted,
    /// Headings, table headers and the final total.
    Accent,
    /// Attention-grabbing status text.
    Alert,
}

/// Font size, weight and colour of a text mark.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextStyle {
    pub size: u8,
    pub weight: Weight,
    pub tone: Tone,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self::body()
    }
}

impl TextStyle {
    /// Regular 10pt body text.
    pub const fn body() -> Self {
        Self {
            size: 10,
            weight: Weight::Regular,
            tone: Tone::Text,
        }
    }

    pub const fn sized(mut self, size: u8) -> Self {
        self.size = size;
        self
    }

    pub const fn bold(mut self) -> Self {
        self.weight = Weight::Bold;
        self
    }

    pub const fn italic(mut self) -> Self {
        self.weight = Weight::Italic;
        self
    }

    pub const fn toned(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}

/// What the `x` coordinate of a text mark refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Anchor {
    /// `x` is the left edge of the text.
    #[default]
    Left,
    /// `x` is the horizontal centre of the text.
    Center,
    /// `x` is the right edge of the text.
    Right,
}

/// A single drawing instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Mark {
    Text {
        x: f64,
        y: f64,
        anchor: Anchor,
        text: String,
        style: TextStyle,
    },
    Rule {
        x1: f64,
        x2: f64,
        y: f64,
        tone: Tone,
    },
}

impl Mark {
    /// Returns the text of a text mark.
    pub fn text(&self) -> Option<&str> {
        match self {
            Mark::Text { text, .. } => Some(text),
            Mark::Rule { .. } => None,
        }
    }
}

/// Marks placed on one page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    marks: Vec<Mark>,
}

impl Page {
    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    /// Iterates over the texts printed on this page, in placement order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.marks.iter().filter_map(Mark::text)
    }

    /// Returns the first text mark whose text equals `text`.
    pub fn find_text(&self, text: &str) -> Option<&Mark> {
        self.marks.iter().find(|mark| mark.text() == Some(text))
    }
}

/// Start of a named invoice section: the page and the `y` of its first line.
#[derive(Clone, Debug, PartialEq)]
pub struct SectionAnchor {
    pub title: String,
    pub page: usize,
    pub y: f64,
}

/// A laid-out document: one display list per page.
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pages: Vec<Page>,
    anchors: Vec<SectionAnchor>,
}

impl Default for Sheet {
    fn default() -> Self {
        Self::new()
    }
}

impl Sheet {
    /// Creates a sheet with a single empty page.
    pub fn new() -> Self {
        Self {
            pages: vec![Page::default()],
            anchors: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn last_page(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn anchors(&self) -> &[SectionAnchor] {
        &self.anchors
    }

    /// Iterates over every text on every page, in page order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }

    /// Returns a cursor that leaves room for `height` below it.
    ///
    /// When the content would cross [`CONTENT_BOTTOM`] a new page is appended
    /// and the returned cursor points at its top.
    pub fn fit(&mut self, cursor: Cursor, height: f64) -> Cursor {
        if cursor.y + height <= CONTENT_BOTTOM {
            return cursor;
        }
        self.next_page(cursor)
    }

    /// Appends a page after the cursor's page and returns a cursor at its top.
    pub fn next_page(&mut self, cursor: Cursor) -> Cursor {
        let page = cursor.page + 1;
        while self.pages.len() <= page {
            self.pages.push(Page::default());
        }
        log::debug!("starting page {}", page + 1);
        Cursor::new(page, TOP)
    }

    /// Places a text mark at the cursor's position.
    pub fn text(
        &mut self,
        cursor: Cursor,
        x: f64,
        anchor: Anchor,
        text: impl Into<String>,
        style: TextStyle,
    ) {
        self.push(
            cursor.page,
            Mark::Text {
                x,
                y: cursor.y,
                anchor,
                text: text.into(),
                style,
            },
        );
    }

    /// Places a horizontal rule at the cursor's position.
    pub fn rule(&mut self, cursor: Cursor, x1: f64, x2: f64, tone: Tone) {
        self.push(
            cursor.page,
            Mark::Rule {
                x1,
                x2,
                y: cursor.y,
                tone,
            },
        );
    }

    /// Records that a section starts at the cursor.
    pub fn anchor(&mut self, cursor: Cursor, title: impl Into<String>) {
        self.anchors.push(SectionAnchor {
            title: title.into(),
            page: cursor.page,
            y: cursor.y,
        });
    }

    fn push(&mut self, page: usize, mark: Mark) {
        while self.pages.len() <= page {
            self.pages.push(Page::default());
        }
        self.pages[page].marks.push(mark);
    }
}

/// Text measurement used for wrapping.
pub trait Measure {
    /// Width of `text` in millimetres when set in `style`.
    fn text_width(&self, text: &str, style: TextStyle) -> f64;
}

impl<M: Measure + ?Sized> Measure for &M {
    fn text_width(&self, text: &str, style: TextStyle) -> f64 {
        (**self).text_width(text, style)
    }
}

/// Measures every character with the same advance.
///
/// Lays out documents without loading fonts, e.g. for previews and tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedPitch {
    advance: f64,
}

impl FixedPitch {
    /// Creates a measure that gives every character `advance` millimetres.
    pub fn new(advance: f64) -> Self {
        Self { advance }
    }
}

impl Default for FixedPitch {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl Measure for FixedPitch {
    fn text_width(&self, text: &str, _style: TextStyle) -> f64 {
        text.chars().count() as f64 * self.advance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_keeps_cursor_when_room_remains() {
        let mut sheet = Sheet::new();
        let cursor = Cursor::new(0, 100.0);
        assert_eq!(sheet.fit(cursor, LINE_HEIGHT), cursor);
        assert_eq!(sheet.page_count(), 1);
    }

    #[test]
    fn fit_starts_a_new_page_at_the_footer_band() {
        let mut sheet = Sheet::new();
        let cursor = sheet.fit(Cursor::new(0, CONTENT_BOTTOM - 2.0), LINE_HEIGHT);
        assert_eq!(cursor, Cursor::new(1, TOP));
        assert_eq!(sheet.page_count(), 2);
    }

    #[test]
    fn at_least_never_moves_up() {
        let cursor = Cursor::new(0, 70.0);
        assert_eq!(cursor.at_least(55.0).y(), 70.0);
        assert_eq!(Cursor::new(0, 30.0).at_least(55.0).y(), 55.0);
    }

    #[test]
    fn marks_land_on_the_cursor_page() {
        let mut sheet = Sheet::new();
        let second = sheet.next_page(Cursor::new(0, 200.0));
        sheet.text(second, MARGIN_LEFT, Anchor::Left, "continued", TextStyle::body());
        assert_eq!(sheet.pages()[0].marks().len(), 0);
        assert!(sheet.pages()[1].find_text("continued").is_some());
    }
}
