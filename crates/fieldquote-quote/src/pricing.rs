//! Order validation and quotation pricing.

use serde_json::Value;
use tracing::{debug, info};

use fieldquote_core::{Error, QuoteRates, Result};
use fieldquote_resolve::Resolver;

use crate::types::*;

/// Keep lines with a non-blank name, a positive quantity and a unit.
/// Names and units are trimmed.
pub fn sanitize_items(items: &[DraftItem]) -> Vec<OrderItem> {
    items
        .iter()
        .filter_map(|item| {
            let name = item.name.as_deref().unwrap_or("").trim();
            let unit = item.unit.as_deref().unwrap_or("").trim();
            let qty = item.qty.as_ref().map(to_number).unwrap_or(0.0);
            (!name.is_empty() && !unit.is_empty() && qty > 0.0).then(|| OrderItem {
                name: name.to_string(),
                qty,
                unit: unit.to_string(),
            })
        })
        .collect()
}

/// Number or numeric string; anything else is 0.
fn to_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// `"340 m"` → 340. Keeps digits and dots only; unparseable text is 0.
pub fn parse_distance(value: &str) -> f64 {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() => n,
        _ => 0.0,
    }
}

impl Order {
    /// Check required fields and return the sanitized items.
    pub fn validate(&self) -> Result<Vec<OrderItem>> {
        let customer = self.customer_name.trim();
        if customer.is_empty() || self.zone.trim().is_empty() {
            return Err(Error::InvalidInput("customer name and zone are required".into()));
        }
        if customer.chars().count() > MAX_CUSTOMER_NAME_LEN {
            return Err(Error::InvalidInput("customer name is too long".into()));
        }
        if parse_distance(&self.distance) <= 0.0 || parse_distance(&self.pipe_size) <= 0.0 {
            return Err(Error::InvalidInput(
                "distance and pipe size must include a number".into(),
            ));
        }
        let items = sanitize_items(&self.items);
        if items.is_empty() {
            return Err(Error::InvalidInput("at least one valid item is required".into()));
        }
        Ok(items)
    }
}

/// Price every valid line of `order`, one resolution per line in order.
///
/// Unresolved lines stay on the quotation with rate 0 and the submitted
/// unit. Storage errors abort pricing.
pub fn price_order(resolver: &Resolver, order: &Order, rates: &QuoteRates) -> Result<Quotation> {
    let items = order.validate()?;

    let mut lines = Vec::with_capacity(items.len());
    let mut unresolved_count = 0;
    for item in items {
        let resolved = resolver.resolve_item(&item.name)?;
        let line = match resolved {
            Some(found) => {
                let amount = found.rate * item.qty;
                QuotationLine {
                    unit: found.unit.filter(|u| !u.trim().is_empty()).unwrap_or(item.unit),
                    qty: item.qty,
                    rate: found.rate,
                    amount,
                    matched_name: Some(found.name),
                    name: item.name,
                }
            }
            None => {
                debug!("Unpriced item: {:?}", item.name);
                unresolved_count += 1;
                QuotationLine {
                    name: item.name,
                    unit: item.unit,
                    qty: item.qty,
                    rate: 0.0,
                    amount: 0.0,
                    matched_name: None,
                }
            }
        };
        lines.push(line);
    }

    let material_cost: f64 = lines.iter().map(|l| l.amount).sum();
    let totals = compute_totals(material_cost, parse_distance(&order.distance), rates);
    info!(
        "Priced order for {}: {} items ({} unresolved), grand total {:.2}",
        order.customer_name.trim(),
        lines.len(),
        unresolved_count,
        totals.grand_total
    );

    Ok(Quotation {
        id: uuid::Uuid::new_v4().to_string(),
        customer_name: order.customer_name.trim().to_string(),
        zone: order.zone.trim().to_string(),
        distance: order.distance.clone(),
        pipe_size: order.pipe_size.clone(),
        item_count: lines.len(),
        unresolved_count,
        items: lines,
        totals,
        priced_at: chrono::Utc::now(),
    })
}

/// Excavation is charged per unit of distance; labour and supervision are
/// fractions of material cost.
pub fn compute_totals(
    material_cost: f64,
    distance_qty: f64,
    rates: &QuoteRates,
) -> QuotationTotals {
    let excavation_amount = distance_qty * rates.excavation_rate;
    let labour_amount = material_cost * rates.labour_ratio;
    let supervision_amount = material_cost * rates.supervision_ratio;
    let other_charges_cost = excavation_amount + labour_amount + supervision_amount;
    QuotationTotals {
        material_cost,
        distance_qty,
        excavation_rate: rates.excavation_rate,
        excavation_amount,
        labour_amount,
        supervision_amount,
        other_charges_cost,
        grand_total: material_cost + other_charges_cost,
    }
}
