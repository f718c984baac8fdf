use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ProductSnapshot;

/// Shipping rules applied on top of line totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_shipping_threshold: i64,
    pub shipping_charge: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            free_shipping_threshold: 500,
            shipping_charge: 40,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceSummary {
    pub total_items: i64,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_charges: i64,
    pub total: i64,
}

impl PriceSummary {
    pub fn empty() -> Self {
        Self::default()
    }
}

impl PricingPolicy {
    /// An empty cart never carries a shipping charge.
    pub fn shipping_for(&self, subtotal: i64, total_items: i64) -> i64 {
        if total_items == 0 || subtotal >= self.free_shipping_threshold {
            0
        } else {
            self.shipping_charge
        }
    }

    pub fn summarize<'a, I>(&self, lines: I) -> PriceSummary
    where
        I: IntoIterator<Item = (&'a ProductSnapshot, i32)>,
    {
        let mut summary = PriceSummary::empty();
        for (product, quantity) in lines {
            let quantity = i64::from(quantity);
            summary.total_items += quantity;
            summary.subtotal += product.price * quantity;
            summary.discount += (product.price - product.selling_price).max(0) * quantity;
        }
        summary.shipping_charges = self.shipping_for(summary.subtotal, summary.total_items);
        summary.total = summary.subtotal - summary.discount + summary.shipping_charges;
        summary
    }
}

/// Whole-number discount percentage of `selling_price` against `price`, rounded half up.
pub fn discount_percent(price: i64, selling_price: i64) -> i32 {
    if price <= 0 || price <= selling_price {
        return 0;
    }
    let off = price - selling_price;
    let rounded = (off * 200 + price) / (price * 2);
    i32::try_from(rounded).unwrap_or(100)
}
