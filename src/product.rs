use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Products keyed by display name, in the order they were seen.
pub type Snapshot = IndexMap<String, PriceRecord>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub regular_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub sale_price: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub effective_price: Option<Decimal>,
}

impl PriceRecord {
    pub fn new(name: impl Into<String>, regular_price: Option<Decimal>, sale_price: Option<Decimal>) -> Self {
        Self {
            name: name.into(),
            regular_price,
            sale_price,
            effective_price: sale_price.or(regular_price),
        }
    }

    pub fn is_on_sale(&self) -> bool {
        self.sale_price.is_some()
    }
}

#[cfg(test)]
pub(crate) fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}
