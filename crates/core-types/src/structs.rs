use crate::enums::{OrderSide, OrderType, TimeInForce};
use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of fractional digits each TWAP slice quantity is rounded to.
pub const TWAP_QUANTITY_SCALE: u32 = 8;

/// Upper bound on the number of TWAP slices in one run.
pub const MAX_TWAP_PARTS: u32 = 10_000;

/// An instruction to place a single order on the exchange.
///
/// Built once from validated input and never mutated afterwards. The exchange
/// client only sends the optional fields that are `Some`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Normalized to uppercase by the constructors, e.g. "BTCUSDT".
    pub symbol: String,
    pub side: OrderSide,
    pub order_type: OrderType,
    pub quantity: Option<Decimal>,
    /// Only meaningful for LIMIT orders.
    pub price: Option<Decimal>,
    /// Only meaningful for LIMIT orders.
    pub time_in_force: Option<TimeInForce>,
    pub stop_price: Option<Decimal>,
}

impl OrderRequest {
    pub fn market(symbol: &str, side: OrderSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            side,
            order_type: OrderType::Market,
            quantity: Some(quantity),
            price: None,
            time_in_force: None,
            stop_price: None,
        }
    }

    pub fn limit(
        symbol: &str,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            symbol: symbol.trim().to_uppercase(),
            side,
            order_type: OrderType::Limit,
            quantity: Some(quantity),
            price: Some(price),
            time_in_force: Some(time_in_force),
            stop_price: None,
        }
    }

    pub fn with_stop_price(mut self, stop_price: Decimal) -> Self {
        self.stop_price = Some(stop_price);
        self
    }

    /// Checks the structural rules for the order type.
    ///
    /// MARKET needs a quantity; LIMIT additionally needs a price and a
    /// time-in-force. Every decimal that is present must be positive.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.symbol.is_empty() {
            return Err(CoreError::InvalidInput(
                "symbol".to_string(),
                "symbol is required, e.g. BTCUSDT".to_string(),
            ));
        }

        let order_type = self.order_type.as_str();
        let quantity = self.quantity.ok_or(CoreError::MissingField {
            order_type,
            field: "quantity",
        })?;
        ensure_positive("quantity", quantity)?;

        if self.order_type == OrderType::Limit {
            let price = self.price.ok_or(CoreError::MissingField {
                order_type,
                field: "price",
            })?;
            ensure_positive("price", price)?;
            if self.time_in_force.is_none() {
                return Err(CoreError::MissingField {
                    order_type,
                    field: "timeInForce",
                });
            }
        } else if let Some(price) = self.price {
            ensure_positive("price", price)?;
        }

        if let Some(stop_price) = self.stop_price {
            ensure_positive("stopPrice", stop_price)?;
        }

        Ok(())
    }
}

fn ensure_positive(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value <= Decimal::ZERO {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("value must be positive, got {}", value),
        ));
    }
    Ok(())
}

/// The shape of a TWAP run: how much to trade, in how many slices, over how long.
///
/// `parts` and `duration_secs` are clamped to at least 1 on construction so
/// the derived per-slice quantity and interval are always well defined.
/// `parts` above `MAX_TWAP_PARTS` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TwapPlan {
    total_quantity: Decimal,
    parts: u32,
    duration_secs: u64,
}

impl TwapPlan {
    pub fn new(total_quantity: Decimal, parts: i64, duration_secs: i64) -> Result<Self, CoreError> {
        let parts = match u32::try_from(parts.max(1)) {
            Ok(parts) if parts <= MAX_TWAP_PARTS => parts,
            _ => {
                return Err(CoreError::InvalidInput(
                    "parts".to_string(),
                    format!("at most {} slices are allowed, got {}", MAX_TWAP_PARTS, parts),
                ));
            }
        };
        let duration_secs = u64::try_from(duration_secs.max(1)).unwrap_or(1);
        Ok(Self {
            total_quantity,
            parts,
            duration_secs,
        })
    }

    pub fn total_quantity(&self) -> Decimal {
        self.total_quantity
    }

    pub fn parts(&self) -> u32 {
        self.parts
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// `total / parts`, rounded to `TWAP_QUANTITY_SCALE` fractional digits.
    pub fn slice_quantity(&self) -> Decimal {
        (self.total_quantity / Decimal::from(self.parts)).round_dp(TWAP_QUANTITY_SCALE)
    }

    /// Spacing between consecutive slices; may be fractional.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.duration_secs) / self.parts
    }
}
