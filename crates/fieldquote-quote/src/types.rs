//! Order and quotation types.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Longest accepted customer name, in characters.
pub const MAX_CUSTOMER_NAME_LEN: usize = 150;

/// An order line as submitted; any field may be missing or mistyped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DraftItem {
    pub name: Option<String>,
    /// Number or numeric string.
    pub qty: Option<Value>,
    pub unit: Option<String>,
}

/// An order line that passed sanitization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub qty: f64,
    pub unit: String,
}

/// A site order to be priced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Order {
    #[serde(alias = "customerName")]
    pub customer_name: String,
    pub zone: String,
    /// Free text such as `"340 m"`.
    #[serde(deserialize_with = "string_or_number")]
    pub distance: String,
    #[serde(alias = "pipeSize", deserialize_with = "string_or_number")]
    pub pipe_size: String,
    pub items: Vec<DraftItem>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(D::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// One priced line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotationLine {
    pub name: String,
    /// Catalog unit when the item resolved with one, else the submitted unit.
    pub unit: String,
    pub qty: f64,
    pub rate: f64,
    pub amount: f64,
    /// Canonical catalog name, when the item resolved.
    #[serde(rename = "matchedName", skip_serializing_if = "Option::is_none")]
    pub matched_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotationTotals {
    pub material_cost: f64,
    pub distance_qty: f64,
    pub excavation_rate: f64,
    pub excavation_amount: f64,
    pub labour_amount: f64,
    pub supervision_amount: f64,
    /// Excavation, labour and supervision together.
    pub other_charges_cost: f64,
    pub grand_total: f64,
}

/// A fully priced order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quotation {
    pub id: String,
    pub customer_name: String,
    pub zone: String,
    pub distance: String,
    pub pipe_size: String,
    pub items: Vec<QuotationLine>,
    pub item_count: usize,
    /// Lines whose name matched nothing in the catalog.
    pub unresolved_count: usize,
    pub totals: QuotationTotals,
    pub priced_at: DateTime<Utc>,
}
