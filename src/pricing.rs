//! Classification of line items and resolution of invoice totals.
//!
//! Everything in this module is plain arithmetic over an [`InvoiceRecord`]; it
//! does not know about pages or fonts.  The composer and the command line
//! summary both go through [`Pricing::from_record`], so the numbers printed on
//! the document are always the ones computed here.

use crate::model::{InvoiceRecord, LineItem};

/// Keywords that mark a line item as a service.  Matching is a case-insensitive
/// substring test on the description.
pub const SERVICE_KEYWORDS: &[&str] = &["labor", "hour", "service", "time"];

/// Tax rate applied when the record does not carry an authoritative total.
pub const FALLBACK_TAX_RATE: f64 = 0.10;

const TOTAL_EPSILON: f64 = 1e-6;

/// The two buckets every line item falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Service,
    Material,
}

impl ItemKind {
    /// Heading used for the bucket's table.
    pub fn heading(self) -> &'static str {
        match self {
            ItemKind::Service => "SERVICES",
            ItemKind::Material => "MATERIALS",
        }
    }

    /// Label used for the bucket's subtotal line.
    pub fn subtotal_label(self) -> &'static str {
        match self {
            ItemKind::Service => "Services Subtotal:",
            ItemKind::Material => "Materials Subtotal:",
        }
    }

    /// Header of the unit price column.
    pub fn rate_header(self) -> &'static str {
        match self {
            ItemKind::Service => "Rate",
            ItemKind::Material => "Price",
        }
    }
}

/// Classifies a description into a bucket.
pub fn classify(description: &str) -> ItemKind {
    let lowered = description.to_lowercase();
    if SERVICE_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        ItemKind::Service
    } else {
        ItemKind::Material
    }
}

/// A line item with its derived amount.
#[derive(Clone, Debug, PartialEq)]
pub struct PricedItem {
    pub description: String,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
}

impl From<&LineItem> for PricedItem {
    fn from(item: &LineItem) -> Self {
        Self {
            description: item.description().to_owned(),
            quantity: item.quantity(),
            rate: item.rate(),
            amount: item.amount(),
        }
    }
}

/// Items of one bucket, in record order.
#[derive(Clone, Debug, PartialEq)]
pub struct Bucket {
    kind: ItemKind,
    items: Vec<PricedItem>,
}

impl Bucket {
    fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn items(&self) -> &[PricedItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the bucket's item amounts.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(|item| item.amount).sum()
    }
}

/// Subtotal, tax and final total of an invoice.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
}

impl Totals {
    /// Resolves tax and total from the computed subtotal and the record's
    /// authoritative total, if any.
    ///
    /// A non-zero authoritative total that differs from the subtotal implies
    /// the tax; otherwise tax falls back to [`FALLBACK_TAX_RATE`].  The final
    /// total is the authoritative one whenever it is present.
    pub fn resolve(subtotal: f64, authoritative: Option<f64>) -> Self {
        let authoritative = authoritative.filter(|total| *total != 0.0);
        let tax = match authoritative {
            Some(total) if (total - subtotal).abs() > TOTAL_EPSILON => total - subtotal,
            _ => subtotal * FALLBACK_TAX_RATE,
        };
        let total = authoritative.unwrap_or(subtotal + tax);

        Self {
            subtotal,
            tax,
            total,
        }
    }

    /// Whether the tax line belongs on the document.  Zero and negative tax
    /// amounts are not printed.
    pub fn shows_tax(&self) -> bool {
        self.tax > 0.0
    }
}

/// Classified items and resolved totals of one record.
#[derive(Clone, Debug, PartialEq)]
pub struct Pricing {
    services: Bucket,
    materials: Bucket,
    totals: Totals,
}

impl Pricing {
    /// Partitions the record's items and resolves its totals.
    pub fn from_record(record: &InvoiceRecord) -> Self {
        let mut services = Bucket::new(ItemKind::Service);
        let mut materials = Bucket::new(ItemKind::Material);

        for item in record.line_items() {
            let bucket = match classify(item.description()) {
                ItemKind::Service => &mut services,
                ItemKind::Material => &mut materials,
            };
            bucket.items.push(PricedItem::from(item));
        }

        let subtotal = services.subtotal() + materials.subtotal();
        let totals = Totals::resolve(subtotal, record.authoritative_total());

        Self {
            services,
            materials,
            totals,
        }
    }

    pub fn services(&self) -> &Bucket {
        &self.services
    }

    pub fn materials(&self) -> &Bucket {
        &self.materials
    }

    /// Both buckets in layout order.
    pub fn buckets(&self) -> [&Bucket; 2] {
        [&self.services, &self.materials]
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn keywords_match_case_insensitively() {
        assert_eq!(classify("2 HOURS Labor"), ItemKind::Service);
        assert_eq!(classify("Overtime"), ItemKind::Service);
        assert_eq!(classify("Customer Service call"), ItemKind::Service);
        assert_eq!(classify("2x4 lumber"), ItemKind::Material);
        assert_eq!(classify(""), ItemKind::Material);
    }

    #[test]
    fn partition_preserves_record_order() {
        let record = InvoiceRecord::new().with_line_items([
            LineItem::new("Paint", 2.0, 30.0),
            LineItem::new("Labor day one", 8.0, 45.0),
            LineItem::new("Brushes", 3.0, 5.0),
            LineItem::new("Cleanup time", 1.0, 45.0),
        ]);
        let pricing = Pricing::from_record(&record);

        let services: Vec<_> = pricing
            .services()
            .items()
            .iter()
            .map(|item| item.description.as_str())
            .collect();
        let materials: Vec<_> = pricing
            .materials()
            .items()
            .iter()
            .map(|item| item.description.as_str())
            .collect();
        assert_eq!(services, ["Labor day one", "Cleanup time"]);
        assert_eq!(materials, ["Paint", "Brushes"]);
    }

    #[test]
    fn empty_record_prices_to_zero() {
        let pricing = Pricing::from_record(&InvoiceRecord::new());
        assert!(pricing.services().is_empty());
        assert!(pricing.materials().is_empty());
        assert_eq!(
            pricing.totals(),
            Totals {
                subtotal: 0.0,
                tax: 0.0,
                total: 0.0
            }
        );
        assert!(!pricing.totals().shows_tax());
    }

    #[test]
    fn single_labor_item_gets_fallback_tax() {
        let record =
            InvoiceRecord::new().with_line_item(LineItem::new("2 hours labor", 2.0, 50.0));
        let pricing = Pricing::from_record(&record);

        assert_eq!(pricing.services().items().len(), 1);
        assert_close(pricing.services().items()[0].amount, 100.0);
        assert_close(pricing.services().subtotal(), 100.0);
        let totals = pricing.totals();
        assert_close(totals.tax, 10.0);
        assert_close(totals.total, 110.0);
        assert!(totals.shows_tax());
    }

    #[test]
    fn authoritative_total_below_subtotal_hides_tax() {
        let record = InvoiceRecord::new()
            .with_total(95.0)
            .with_line_item(LineItem::new("Service call", 1.0, 100.0));
        let totals = Pricing::from_record(&record).totals();

        assert_close(totals.subtotal, 100.0);
        assert_close(totals.tax, -5.0);
        assert!(!totals.shows_tax());
        assert_close(totals.total, 95.0);
    }

    #[test]
    fn authoritative_total_equal_to_subtotal_keeps_fallback_tax() {
        let totals = Totals::resolve(100.0, Some(100.0));
        assert_close(totals.tax, 10.0);
        assert_close(totals.total, 100.0);
    }

    fn line_item() -> impl Strategy<Value = LineItem> {
        let description = prop::sample::select(vec![
            "Labor", "hourly work", "SERVICE fee", "Travel time", "Lumber", "Paint", "Tiles",
            "Screws",
        ]);
        (description, 0.0f64..1_000.0, 0.0f64..1_000.0)
            .prop_map(|(description, quantity, rate)| LineItem::new(description, quantity, rate))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Every item lands in exactly one bucket and keeps its recomputed amount.
        #[test]
        fn classification_is_exhaustive(items in prop::collection::vec(line_item(), 0..20)) {
            let record = InvoiceRecord::new().with_line_items(items.clone());
            let pricing = Pricing::from_record(&record);

            prop_assert_eq!(
                pricing.services().items().len() + pricing.materials().items().len(),
                items.len()
            );
            for item in pricing.services().items() {
                prop_assert_eq!(classify(&item.description), ItemKind::Service);
                prop_assert_eq!(item.amount, item.quantity * item.rate);
            }
            for item in pricing.materials().items() {
                prop_assert_eq!(classify(&item.description), ItemKind::Material);
                prop_assert_eq!(item.amount, item.quantity * item.rate);
            }
        }

        /// The grand subtotal is the sum of both bucket subtotals.
        #[test]
        fn subtotal_sums_both_buckets(items in prop::collection::vec(line_item(), 0..20)) {
            let record = InvoiceRecord::new().with_line_items(items);
            let pricing = Pricing::from_record(&record);
            let expected = pricing.services().subtotal() + pricing.materials().subtotal();
            prop_assert_eq!(pricing.totals().subtotal, expected);
        }

        /// Tax and total follow the authoritative-total rule.
        #[test]
        fn tax_and_total_follow_authoritative_total(
            subtotal in 0.0f64..10_000.0,
            authoritative in prop::option::of(-100.0f64..10_000.0),
        ) {
            let totals = Totals::resolve(subtotal, authoritative);
            match authoritative.filter(|total| *total != 0.0) {
                Some(total) => {
                    prop_assert_eq!(totals.total, total);
                    if (total - subtotal).abs() > TOTAL_EPSILON {
                        prop_assert_eq!(totals.tax, total - subtotal);
                    } else {
                        prop_assert_eq!(totals.tax, subtotal * FALLBACK_TAX_RATE);
                    }
                }
                None => {
                    prop_assert_eq!(totals.tax, subtotal * FALLBACK_TAX_RATE);
                    prop_assert_eq!(totals.total, subtotal + totals.tax);
                }
            }
        }
    }
}
