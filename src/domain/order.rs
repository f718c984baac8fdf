use std::{fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    ProductSnapshot,
    pricing::{PriceSummary, PricingPolicy},
};
use crate::error::{AppError, AppResult};

pub const ORDER_NUMBER_PREFIX: &str = "OD";
pub const DELIVERY_DAYS_MIN: i64 = 5;
pub const DELIVERY_DAYS_MAX: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    /// One step forward along the fulfilment chain, or cancellation from any non-terminal state.
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == OrderStatus::Cancelled || self.next() == Some(target)
    }

    pub fn transition_to(self, target: OrderStatus) -> AppResult<OrderStatus> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(AppError::InvalidState(format!(
                "Order cannot move from {self} to {target}"
            )))
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid order status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[serde(alias = "COD")]
    Cod,
    #[serde(alias = "Online")]
    Online,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Online => "online",
        }
    }

    pub fn ensure_supported(&self) -> AppResult<()> {
        match self {
            PaymentMethod::Cod => Ok(()),
            PaymentMethod::Online => Err(AppError::InvalidArgument(
                "Online payment is not supported, use cash on delivery".to_string(),
            )),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(PaymentMethod::Cod),
            "online" => Ok(PaymentMethod::Online),
            other => Err(AppError::InvalidArgument(format!(
                "Invalid payment method: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ShippingAddress {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    pub fn validate(&self) -> AppResult<()> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::InvalidArgument(format!(
                "Shipping address is missing: {}",
                missing.join(", ")
            )))
        }
    }
}

/// `OD` + YYMMDD + four random digits.
pub fn generate_order_number<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    let suffix: u16 = rng.gen_range(0..10_000);
    format!("{ORDER_NUMBER_PREFIX}{}{suffix:04}", now.format("%y%m%d"))
}

pub fn estimate_delivery<R: Rng + ?Sized>(ordered_at: DateTime<Utc>, rng: &mut R) -> DateTime<Utc> {
    ordered_at + Duration::days(rng.gen_range(DELIVERY_DAYS_MIN..=DELIVERY_DAYS_MAX))
}

/// A priced line copied by value from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineSnapshot {
    pub product_id: Uuid,
    pub name: String,
    pub thumbnail: String,
    pub unit_price: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub lines: Vec<OrderLineSnapshot>,
    pub summary: PriceSummary,
}

impl OrderDraft {
    /// Validates every cart line against live product data and prices the result.
    /// Fails on the first line that cannot be supplied; nothing partial is produced.
    pub fn prepare(policy: &PricingPolicy, cart: &[(ProductSnapshot, i32)]) -> AppResult<Self> {
        if cart.is_empty() {
            return Err(AppError::InvalidState("Cart is empty".to_string()));
        }

        if let Some((product, _)) = cart
            .iter()
            .find(|(product, quantity)| !product.can_supply(*quantity))
        {
            return Err(AppError::Unavailable(format!(
                "{} is not available or has insufficient stock",
                product.name
            )));
        }

        let summary = policy.summarize(cart.iter().map(|(product, quantity)| (product, *quantity)));
        let lines = cart
            .iter()
            .map(|(product, quantity)| OrderLineSnapshot {
                product_id: product.id,
                name: product.name.clone(),
                thumbnail: product.thumbnail.clone(),
                unit_price: product.selling_price,
                quantity: *quantity,
            })
            .collect();

        Ok(Self { lines, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot;
    use rand::{SeedableRng, rngs::StdRng};

    fn full_address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".into(),
            phone: "9876543210".into(),
            address_line1: "12 MG Road".into(),
            address_line2: None,
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
        }
    }

    #[test]
    fn forward_transitions_move_one_step() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn cancellation_only_from_non_terminal_states() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(status.can_transition_to(OrderStatus::Cancelled), "{status}");
        }
        assert!(matches!(
            OrderStatus::Delivered.transition_to(OrderStatus::Cancelled),
            Err(AppError::InvalidState(_))
        ));
        assert!(matches!(
            OrderStatus::Cancelled.transition_to(OrderStatus::Cancelled),
            Err(AppError::InvalidState(_))
        ));
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("paid".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn order_number_has_date_prefix_and_four_digits() {
        let now = DateTime::parse_from_rfc3339("2024-03-07T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let number = generate_order_number(now, &mut rng);
            assert_eq!(number.len(), 12);
            assert!(number.starts_with("OD240307"), "{number}");
            assert!(number[2..].chars().all(|c| c.is_ascii_digit()), "{number}");
        }
    }

    #[test]
    fn delivery_estimate_is_five_to_seven_days_out() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..300 {
            let days = (estimate_delivery(now, &mut rng) - now).num_days();
            assert!((DELIVERY_DAYS_MIN..=DELIVERY_DAYS_MAX).contains(&days));
            seen.insert(days);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn address_validation_lists_every_missing_field() {
        assert!(full_address().validate().is_ok());

        let partial = ShippingAddress {
            phone: " ".into(),
            city: String::new(),
            ..full_address()
        };
        assert_eq!(partial.missing_fields(), vec!["phone", "city"]);
        match partial.validate() {
            Err(AppError::InvalidArgument(msg)) => {
                assert!(msg.contains("phone") && msg.contains("city"), "{msg}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn payment_method_accepts_legacy_spelling_but_only_cod_is_supported() {
        let cod: PaymentMethod = serde_json::from_str("\"COD\"").unwrap();
        assert_eq!(cod, PaymentMethod::Cod);
        assert!(cod.ensure_supported().is_ok());
        assert!(PaymentMethod::Online.ensure_supported().is_err());
    }

    #[test]
    fn draft_snapshots_selling_price_and_totals() {
        let a = snapshot(1000, 800, 10);
        let draft = OrderDraft::prepare(&PricingPolicy::default(), &[(a.clone(), 2)]).unwrap();

        assert_eq!(draft.summary.total, 1600);
        assert_eq!(
            draft.lines,
            vec![OrderLineSnapshot {
                product_id: a.id,
                name: a.name.clone(),
                thumbnail: a.thumbnail.clone(),
                unit_price: 800,
                quantity: 2,
            }]
        );
    }

    #[test]
    fn draft_rejects_empty_cart_and_short_stock() {
        let policy = PricingPolicy::default();
        assert!(matches!(
            OrderDraft::prepare(&policy, &[]),
            Err(AppError::InvalidState(_))
        ));

        let fine = snapshot(100, 100, 5);
        let mut short = snapshot(100, 100, 1);
        short.name = "Scarce Lamp".into();
        match OrderDraft::prepare(&policy, &[(fine, 1), (short, 2)]) {
            Err(AppError::Unavailable(msg)) => assert!(msg.contains("Scarce Lamp")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
