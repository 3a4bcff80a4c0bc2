//! Replays a composed [`Sheet`] onto `genpdf` pages.
//!
//! `genpdf` lays elements out top to bottom and asks an element to continue on
//! a fresh page whenever it reports `has_more`.  [`SheetElement`] uses that
//! protocol to emit one sheet page per call.  The sheet itself is composed on
//! the first call, because that is where the document's font cache becomes
//! available for measuring text.

use std::cell::OnceCell;
use std::rc::Rc;

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::FontCache;
use genpdf::style::{Color, Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult};

use crate::layout::{Anchor, Mark, Measure, Page, Sheet, TextStyle, Tone, Weight};

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Text => Color::Rgb(0x33, 0x33, 0x33),
        Tone::Muted => Color::Rgb(0x66, 0x66, 0x66),
        Tone::Accent => Color::Rgb(0x66, 0x7e, 0xea),
        Tone::Alert => Color::Rgb(0xff, 0x00, 0x00),
    }
}

/// Converts a layout text style into a `genpdf` style using the default font family.
pub fn genpdf_style(style: TextStyle) -> Style {
    let mut converted = Style::new()
        .with_font_size(style.size)
        .with_color(tone_color(style.tone));
    match style.weight {
        Weight::Regular => {}
        Weight::Bold => converted.set_bold(),
        Weight::Italic => converted.set_italic(),
    }
    converted
}

/// Measures text with the metrics of a loaded font cache.
pub struct FontMetrics<'a> {
    font_cache: &'a FontCache,
}

impl<'a> FontMetrics<'a> {
    pub fn new(font_cache: &'a FontCache) -> Self {
        Self { font_cache }
    }
}

impl Measure for FontMetrics<'_> {
    fn text_width(&self, text: &str, style: TextStyle) -> f64 {
        let string = StyledString::new(text.to_owned(), genpdf_style(style));
        mm_to_f64(string.width(self.font_cache))
    }
}

type Compose = dyn Fn(&dyn Measure) -> Sheet;

/// A `genpdf` element that draws a composed sheet, one page per render call.
pub struct SheetElement {
    compose: Box<Compose>,
    sheet: Rc<OnceCell<Sheet>>,
    next_page: usize,
}

impl SheetElement {
    /// Creates an element that composes its sheet with `compose` on first render.
    pub fn new<F>(compose: F) -> Self
    where
        F: Fn(&dyn Measure) -> Sheet + 'static,
    {
        Self {
            compose: Box::new(compose),
            sheet: Rc::new(OnceCell::new()),
            next_page: 0,
        }
    }

    /// Shared handle to the sheet, filled once the element has been rendered.
    pub fn sheet(&self) -> Rc<OnceCell<Sheet>> {
        Rc::clone(&self.sheet)
    }
}

impl Element for SheetElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let shared = Rc::clone(&self.sheet);
        let sheet = shared.get_or_init(|| {
            let sheet = (self.compose)(&FontMetrics::new(&context.font_cache));
            log::debug!("composed invoice sheet with {} page(s)", sheet.page_count());
            sheet
        });

        let page = sheet.pages().get(self.next_page).ok_or_else(|| {
            Error::new(
                format!("Sheet has no page {}", self.next_page + 1),
                ErrorKind::InvalidData,
            )
        })?;
        draw_page(context, &area, page)?;
        self.next_page += 1;

        let mut result = RenderResult::default();
        result.size = area.size();
        result.has_more = self.next_page < sheet.page_count();
        Ok(result)
    }
}

fn draw_page(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    page: &Page,
) -> Result<(), Error> {
    for mark in page.marks() {
        match mark {
            Mark::Text {
                x,
                y,
                anchor,
                text,
                style,
            } => draw_text(context, area, *x, *y, *anchor, text, *style)?,
            Mark::Rule { x1, x2, y, tone } => {
                let line_style = Style::new().with_color(tone_color(*tone));
                area.draw_line(
                    vec![
                        Position::new(mm_from_f64(*x1), mm_from_f64(*y)),
                        Position::new(mm_from_f64(*x2), mm_from_f64(*y)),
                    ],
                    line_style,
                );
            }
        }
    }
    Ok(())
}

fn draw_text(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    x: f64,
    y: f64,
    anchor: Anchor,
    text: &str,
    style: TextStyle,
) -> Result<(), Error> {
    if text.is_empty() {
        return Ok(());
    }

    let string = StyledString::new(text.to_owned(), genpdf_style(style));
    let width = mm_to_f64(string.width(&context.font_cache));
    let left = match anchor {
        Anchor::Left => x,
        Anchor::Center => x - width / 2.0,
        Anchor::Right => x - width,
    };

    let position = Position::new(mm_from_f64(left.max(0.0)), mm_from_f64(y));
    match area.text_section(&context.font_cache, position, string.style) {
        Some(mut section) => section.print_str(&string.s, string.style),
        None => Err(Error::new(
            format!("Text does not fit on the page at y = {y} mm: {text}"),
            ErrorKind::PageSizeExceeded,
        )),
    }
}
