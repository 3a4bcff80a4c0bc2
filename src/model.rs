//! Input records consumed by the invoice composer.
//!
//! The types in this module describe what a caller hands over: the invoice
//! itself, the issuing business, and the billed client.  They deliberately avoid
//! referencing the rendering crate so the values can be deserialized from the
//! JSON payloads produced by the surrounding application, or built by hand.
//!
//! Deserialization is lenient.  Numeric fields accept numbers, numeric strings
//! or `null`, and anything that does not parse to a finite number becomes `0`.
//! Text fields that are empty or only contain whitespace count as absent.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One billable entry of an invoice.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(default, deserialize_with = "lenient_text")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    quantity: f64,
    #[serde(default, deserialize_with = "lenient_decimal")]
    rate: f64,
}

impl LineItem {
    /// Creates a line item from its description, quantity and unit rate.
    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            description: Some(description.into()),
            quantity: finite_or_zero(quantity),
            rate: finite_or_zero(rate),
        }
    }

    /// Returns the description, or an empty string when none was supplied.
    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    /// Returns the billed quantity.
    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    /// Returns the unit rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Returns `quantity x rate`.
    ///
    /// The amount is always derived; line items never carry their own amount.
    pub fn amount(&self) -> f64 {
        self.quantity * self.rate
    }
}

/// The invoice being laid out.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    issue_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    invoice_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    invoice_description: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_decimal")]
    total: Option<f64>,
    #[serde(default, deserialize_with = "lenient_items")]
    line_items: Vec<LineItem>,
}

/// Status assumed when a record does not carry one.
pub const DEFAULT_STATUS: &str = "draft";

impl InvoiceRecord {
    /// Creates an empty draft record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the invoice number, if present.
    pub fn invoice_number(&self) -> Option<&str> {
        non_blank(&self.invoice_number)
    }

    /// Returns the raw issue date, if present.
    pub fn issue_date(&self) -> Option<&str> {
        non_blank(&self.issue_date)
    }

    /// Returns the raw due date, if present.
    pub fn due_date(&self) -> Option<&str> {
        non_blank(&self.due_date)
    }

    /// Returns the status, falling back to [`DEFAULT_STATUS`].
    pub fn status(&self) -> &str {
        non_blank(&self.status).unwrap_or(DEFAULT_STATUS)
    }

    /// Returns the job title, if present.
    pub fn invoice_title(&self) -> Option<&str> {
        non_blank(&self.invoice_title)
    }

    /// Returns the long-form job description, if present.
    pub fn invoice_description(&self) -> Option<&str> {
        non_blank(&self.invoice_description)
    }

    /// Returns the total carried on the record when it is present and non-zero.
    ///
    /// A zero total is indistinguishable from a missing one.
    pub fn authoritative_total(&self) -> Option<f64> {
        self.total.filter(|total| *total != 0.0)
    }

    /// Returns the line items in their original order.
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Sets the invoice number and returns the updated record.
    pub fn with_invoice_number(mut self, number: impl Into<Option<String>>) -> Self {
        self.invoice_number = number.into();
        self
    }

    /// Sets the issue date and returns the updated record.
    pub fn with_issue_date(mut self, date: impl Into<Option<String>>) -> Self {
        self.issue_date = date.into();
        self
    }

    /// Sets the due date and returns the updated record.
    pub fn with_due_date(mut self, date: impl Into<Option<String>>) -> Self {
        self.due_date = date.into();
        self
    }

    /// Sets the status and returns the updated record.
    pub fn with_status(mut self, status: impl Into<Option<String>>) -> Self {
        self.status = status.into();
        self
    }

    /// Sets the job title and returns the updated record.
    pub fn with_invoice_title(mut self, title: impl Into<Option<String>>) -> Self {
        self.invoice_title = title.into();
        self
    }

    /// Sets the job description and returns the updated record.
    pub fn with_invoice_description(mut self, description: impl Into<Option<String>>) -> Self {
        self.invoice_description = description.into();
        self
    }

    /// Sets the record total and returns the updated record.
    pub fn with_total(mut self, total: impl Into<Option<f64>>) -> Self {
        self.total = total.into().map(finite_or_zero);
        self
    }

    /// Appends a line item and returns the updated record.
    pub fn with_line_item(mut self, item: LineItem) -> Self {
        self.line_items.push(item);
        self
    }

    /// Extends the record with multiple line items and returns the updated record.
    pub fn with_line_items<I>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = LineItem>,
    {
        self.line_items.extend(items);
        self
    }
}

/// The business issuing the invoice.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessProfile {
    #[serde(default, deserialize_with = "lenient_text")]
    business_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    business_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    business_phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    business_email: Option<String>,
}

impl BusinessProfile {
    /// Creates a profile with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn business_name(&self) -> Option<&str> {
        non_blank(&self.business_name)
    }

    pub fn business_address(&self) -> Option<&str> {
        non_blank(&self.business_address)
    }

    pub fn business_phone(&self) -> Option<&str> {
        non_blank(&self.business_phone)
    }

    pub fn business_email(&self) -> Option<&str> {
        non_blank(&self.business_email)
    }

    pub fn with_business_name(mut self, name: impl Into<Option<String>>) -> Self {
        self.business_name = name.into();
        self
    }

    pub fn with_business_address(mut self, address: impl Into<Option<String>>) -> Self {
        self.business_address = address.into();
        self
    }

    pub fn with_business_phone(mut self, phone: impl Into<Option<String>>) -> Self {
        self.business_phone = phone.into();
        self
    }

    pub fn with_business_email(mut self, email: impl Into<Option<String>>) -> Self {
        self.business_email = email.into();
        self
    }
}

/// The client being billed.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ClientProfile {
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    address: Option<String>,
}

impl ClientProfile {
    /// Creates a profile with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    pub fn email(&self) -> Option<&str> {
        non_blank(&self.email)
    }

    pub fn address(&self) -> Option<&str> {
        non_blank(&self.address)
    }

    pub fn with_name(mut self, name: impl Into<Option<String>>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<Option<String>>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<Option<String>>) -> Self {
        self.address = address.into();
        self
    }
}

/// An invoice together with the profiles it is rendered against.
///
/// This is the shape the backend hands to the document generator:
/// `{"invoice": {...}, "user": {...}, "client": {...}}`.  The invoice may also
/// be supplied as the top-level object, in which case the profiles are read
/// from the same object when present.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceBundle {
    pub record: InvoiceRecord,
    pub business: Option<BusinessProfile>,
    pub client: Option<ClientProfile>,
}

impl InvoiceBundle {
    /// Creates a bundle from its parts.
    pub fn new(
        record: InvoiceRecord,
        business: Option<BusinessProfile>,
        client: Option<ClientProfile>,
    ) -> Self {
        Self {
            record,
            business,
            client,
        }
    }

    /// Parses a bundle from JSON text.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(value)
    }

    /// Builds a bundle from an already parsed JSON value.
    pub fn from_value(mut value: Value) -> Result<Self, serde_json::Error> {
        let business = take_object(&mut value, &["user", "business"])
            .map(serde_json::from_value)
            .transpose()?;
        let client = take_object(&mut value, &["client"])
            .map(serde_json::from_value)
            .transpose()?;
        let record = match take_object(&mut value, &["invoice"]) {
            Some(nested) => serde_json::from_value(nested)?,
            None => serde_json::from_value(value)?,
        };

        Ok(Self {
            record,
            business,
            client,
        })
    }
}

fn take_object(value: &mut Value, keys: &[&str]) -> Option<Value> {
    let object = value.as_object_mut()?;
    keys.iter()
        .filter_map(|key| object.remove(*key))
        .find(Value::is_object)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.trim().is_empty())
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn decimal_from_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.map(finite_or_zero).unwrap_or(0.0)
}

fn lenient_decimal<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(decimal_from_value).unwrap_or(0.0))
}

fn lenient_optional_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(|value| !value.is_null())
        .map(|value| decimal_from_value(&value)))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Vec<LineItem>>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}
