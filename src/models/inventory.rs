use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use super::Unit;

/// Reason recorded on credits of finished goods
pub const REASON_PRODUCTION: &str = "production";
/// Reason recorded on debits of consumed materials
pub const REASON_PRODUCTION_CONSUMPTION: &str = "production consumption";

/// Effect of a transaction on stock
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::In => 1.0,
            Direction::Out => -1.0,
        }
    }
}

/// Request to append one inventory transaction and move the product's stock with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryTransaction {
    pub tenant_id: Uuid,
    pub product_id: Uuid,
    pub direction: Direction,
    /// Magnitude; the sign comes from `direction`
    pub quantity: f64,
    pub unit: Unit,
    pub date: NaiveDate,
    pub reason: String,
    pub unit_cost: Option<Decimal>,
    pub order_id: Option<Uuid>,
}

impl NewInventoryTransaction {
    pub fn signed_quantity(&self) -> f64 {
        self.direction.sign() * self.quantity.abs()
    }
}

/// Stock counter of a product after a posting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub previous: f64,
    pub current: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn signed_quantity_follows_direction() {
        let mut tx = NewInventoryTransaction {
            tenant_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            direction: Direction::Out,
            quantity: 2.5,
            unit: Unit::Mass,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            reason: REASON_PRODUCTION_CONSUMPTION.into(),
            unit_cost: None,
            order_id: None,
        };
        assert_eq!(tx.signed_quantity(), -2.5);

        tx.direction = Direction::In;
        assert_eq!(tx.signed_quantity(), 2.5);
    }

    #[test]
    fn direction_round_trips_as_lowercase() {
        assert_eq!(Direction::Out.to_string(), "out");
        assert_eq!(Direction::from_str("in").unwrap(), Direction::In);
    }
}
