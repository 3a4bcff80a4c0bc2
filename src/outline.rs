//! Section bookmarks for rendered invoices.
//!
//! Every [`SectionAnchor`] recorded during layout becomes a top-level outline
//! item.  Its destination is an `/XYZ` view that scrolls to the section
//! heading itself, so a bookmark for a materials table that starts halfway
//! down page two lands on the heading rather than the top of the page.

use std::fmt;

use lopdf::{dictionary, Document, Object, ObjectId};

use crate::layout::{SectionAnchor, PAGE_HEIGHT};

const POINTS_PER_MM: f64 = 72.0 / 25.4;

/// Failures while adding section bookmarks to a rendered invoice.
#[derive(Debug)]
pub enum OutlineError {
    /// The rendered bytes could not be read back or written out.
    Pdf(lopdf::Error),
    /// The document has no catalog to hang the outline from.
    NoCatalog,
    /// A section starts on a page the rendered document does not have.
    PageOutOfRange {
        section: String,
        page: usize,
        pages: usize,
    },
}

impl From<lopdf::Error> for OutlineError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err)
    }
}

impl fmt::Display for OutlineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf(err) => write!(f, "Rendered invoice is not a readable PDF: {err}"),
            Self::NoCatalog => write!(f, "Rendered invoice has no document catalog"),
            Self::PageOutOfRange {
                section,
                page,
                pages,
            } => write!(
                f,
                "Section '{section}' starts on page {} but the invoice has {pages} page(s)",
                page + 1
            ),
        }
    }
}

impl std::error::Error for OutlineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pdf(err) => Some(err),
            _ => None,
        }
    }
}

/// Adds one bookmark per section anchor to `pdf` and returns the new bytes.
///
/// Anchors keep their order.  Without anchors the input is returned as is.
pub fn apply_section_outline(
    pdf: &[u8],
    anchors: &[SectionAnchor],
) -> Result<Vec<u8>, OutlineError> {
    if anchors.is_empty() {
        return Ok(pdf.to_vec());
    }

    let mut document = Document::load_mem(pdf)?;
    let pages: Vec<ObjectId> = document.get_pages().into_values().collect();
    let root = document.new_object_id();
    let items: Vec<ObjectId> = anchors.iter().map(|_| document.new_object_id()).collect();

    for (index, anchor) in anchors.iter().enumerate() {
        let page = *pages
            .get(anchor.page)
            .ok_or_else(|| OutlineError::PageOutOfRange {
                section: anchor.title.clone(),
                page: anchor.page,
                pages: pages.len(),
            })?;

        let mut item = dictionary! {
            "Title" => Object::string_literal(anchor.title.as_str()),
            "Parent" => root,
            "Dest" => destination(page, anchor.y),
        };
        if let Some(previous) = index.checked_sub(1).map(|prev| items[prev]) {
            item.set("Prev", previous);
        }
        if let Some(next) = items.get(index + 1) {
            item.set("Next", *next);
        }
        document.objects.insert(items[index], Object::Dictionary(item));
    }

    let (first, last) = (items[0], items[items.len() - 1]);
    document.objects.insert(
        root,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => first,
            "Last" => last,
            "Count" => items.len() as i64,
        }),
    );

    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| OutlineError::NoCatalog)?;
    let catalog = document
        .get_object_mut(catalog_id)
        .and_then(Object::as_dict_mut)
        .map_err(|_| OutlineError::NoCatalog)?;
    catalog.set("Outlines", root);
    catalog.set("PageMode", "UseOutlines");
    log::debug!("added {} section bookmark(s)", items.len());

    let mut bytes = Vec::with_capacity(pdf.len());
    document
        .save_to(&mut bytes)
        .map_err(|err| OutlineError::Pdf(err.into()))?;
    Ok(bytes)
}

/// `[page /XYZ left top zoom]` with `top` converted from layout millimetres
/// (measured down from the top edge) to PDF points (measured up from the
/// bottom edge).  A null left and zoom keep the viewer's current values.
fn destination(page: ObjectId, y: f64) -> Object {
    let top = (PAGE_HEIGHT - y) * POINTS_PER_MM;
    Object::Array(vec![
        Object::Reference(page),
        Object::Name(b"XYZ".to_vec()),
        Object::Null,
        Object::Real((top as f32).into()),
        Object::Null,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_invoice(pages: usize) -> Vec<u8> {
        let mut document = Document::with_version("1.5");
        let tree = document.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                document
                    .add_object(dictionary! { "Type" => "Page", "Parent" => tree })
                    .into()
            })
            .collect();
        document.objects.insert(
            tree,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => pages as i64,
                "Kids" => kids,
            }),
        );
        let catalog = document.add_object(dictionary! { "Type" => "Catalog", "Pages" => tree });
        document.trailer.set("Root", catalog);

        let mut bytes = Vec::new();
        document.save_to(&mut bytes).expect("save blank invoice");
        bytes
    }

    fn section(title: &str, page: usize, y: f64) -> SectionAnchor {
        SectionAnchor {
            title: title.to_owned(),
            page,
            y,
        }
    }

    fn outline_items(bytes: &[u8]) -> Vec<(String, Vec<Object>)> {
        let document = Document::load_mem(bytes).expect("reload");
        let root = document
            .catalog()
            .and_then(|catalog| catalog.get(b"Outlines"))
            .and_then(Object::as_reference)
            .expect("outline root");
        let mut next = document
            .get_dictionary(root)
            .and_then(|outlines| outlines.get(b"First"))
            .and_then(Object::as_reference)
            .ok();

        let mut items = Vec::new();
        while let Some(id) = next {
            let item = document.get_dictionary(id).expect("outline item");
            let title = item
                .get(b"Title")
                .and_then(Object::as_str)
                .map(|raw| String::from_utf8_lossy(raw).into_owned())
                .expect("title");
            let dest = item
                .get(b"Dest")
                .and_then(Object::as_array)
                .cloned()
                .expect("destination");
            items.push((title, dest));
            next = item.get(b"Next").and_then(Object::as_reference).ok();
        }
        items
    }

    #[test]
    fn bookmarks_follow_section_order() {
        let bytes = apply_section_outline(
            &blank_invoice(2),
            &[
                section("Services", 0, 80.0),
                section("Materials", 1, 20.0),
                section("Totals", 1, 150.0),
            ],
        )
        .expect("outline applied");

        let titles: Vec<String> = outline_items(&bytes)
            .into_iter()
            .map(|(title, _)| title)
            .collect();
        assert_eq!(titles, ["Services", "Materials", "Totals"]);
    }

    #[test]
    fn destinations_scroll_to_the_section_heading() {
        let bytes =
            apply_section_outline(&blank_invoice(1), &[section("Totals", 0, 100.0)]).unwrap();
        let (_, dest) = outline_items(&bytes).remove(0);

        assert_eq!(dest[1].as_name().ok(), Some(&b"XYZ"[..]));
        let top = dest[3].as_float().expect("top coordinate") as f64;
        assert!((top - 197.0 * POINTS_PER_MM).abs() < 0.01, "top = {top}");
    }

    #[test]
    fn sections_past_the_last_page_are_rejected() {
        let err =
            apply_section_outline(&blank_invoice(2), &[section("Totals", 3, 40.0)]).unwrap_err();
        assert!(matches!(
            err,
            OutlineError::PageOutOfRange {
                page: 3,
                pages: 2,
                ..
            }
        ));
        assert!(err.to_string().contains("page 4"));
    }

    #[test]
    fn invoices_without_sections_are_untouched() {
        let bytes = blank_invoice(1);
        assert_eq!(apply_section_outline(&bytes, &[]).unwrap(), bytes);
    }
}
