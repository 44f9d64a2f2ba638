use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{OrderType, Side};

/// Market (venue group) an order is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Market {
    /// US equities
    #[default]
    Us,
    /// Korean equities
    Kr,
    /// Crypto spot
    Crypto,
}

/// Reasons an order request is refused before it reaches any broker state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("Order symbol is empty")]
    EmptySymbol,

    #[error("Order quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    #[error("Limit order requires a limit price")]
    MissingLimitPrice,

    #[error("Stop order requires a stop price")]
    MissingStopPrice,

    #[error("Order notional overflows: {quantity} x {price}")]
    NotionalOverflow { quantity: Decimal, price: Decimal },
}

/// Request to place an order with a broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    #[serde(default)]
    pub market: Market,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    /// Required for Limit orders
    pub price: Option<Decimal>,
    /// Required for Stop orders
    pub stop_price: Option<Decimal>,
}

impl OrderRequest {
    /// Create a market order request
    pub fn market(symbol: impl Into<String>, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            market: Market::default(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            stop_price: None,
        }
    }

    /// Create a limit order request
    pub fn limit(symbol: impl Into<String>, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            price: Some(price),
            order_type: OrderType::Limit,
            ..Self::market(symbol, side, quantity)
        }
    }

    /// Create a stop order request
    pub fn stop(
        symbol: impl Into<String>,
        side: Side,
        quantity: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            stop_price: Some(stop_price),
            order_type: OrderType::Stop,
            ..Self::market(symbol, side, quantity)
        }
    }

    /// Validate the request based on order type requirements
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        if self.symbol.trim().is_empty() {
            return Err(OrderValidationError::EmptySymbol);
        }
        if self.quantity <= Decimal::ZERO {
            return Err(OrderValidationError::NonPositiveQuantity(self.quantity));
        }
        match self.order_type {
            OrderType::Market => Ok(()),
            OrderType::Limit if self.price.is_none() => Err(OrderValidationError::MissingLimitPrice),
            OrderType::Stop if self.stop_price.is_none() => {
                Err(OrderValidationError::MissingStopPrice)
            }
            OrderType::Limit | OrderType::Stop => Ok(()),
        }
    }

    /// Notional value of the request at the given price
    pub fn notional(&self, price: Decimal) -> Result<Decimal, OrderValidationError> {
        self.quantity
            .checked_mul(price)
            .ok_or(OrderValidationError::NotionalOverflow {
                quantity: self.quantity,
                price,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_valid_requests() {
        assert!(OrderRequest::market("AAPL", Side::Buy, dec!(10)).validate().is_ok());
        assert!(
            OrderRequest::limit("AAPL", Side::Sell, dec!(1), dec!(150))
                .validate()
                .is_ok()
        );
        assert!(
            OrderRequest::stop("AAPL", Side::Sell, dec!(1), dec!(140))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_validation_errors_are_distinct() {
        let empty = OrderRequest::market("  ", Side::Buy, dec!(1));
        assert_eq!(empty.validate(), Err(OrderValidationError::EmptySymbol));

        let zero = OrderRequest::market("AAPL", Side::Buy, dec!(0));
        assert_eq!(
            zero.validate(),
            Err(OrderValidationError::NonPositiveQuantity(dec!(0)))
        );

        let mut limit = OrderRequest::limit("AAPL", Side::Buy, dec!(1), dec!(10));
        limit.price = None;
        assert_eq!(limit.validate(), Err(OrderValidationError::MissingLimitPrice));

        let mut stop = OrderRequest::stop("AAPL", Side::Buy, dec!(1), dec!(10));
        stop.stop_price = None;
        assert_eq!(stop.validate(), Err(OrderValidationError::MissingStopPrice));
    }

    #[test]
    fn test_notional_overflow_is_an_error() {
        let request = OrderRequest::market("AAPL", Side::Buy, dec!(10));
        assert_eq!(request.notional(dec!(150)), Ok(dec!(1500)));

        let huge = OrderRequest::market("AAPL", Side::Buy, Decimal::MAX);
        assert_eq!(
            huge.notional(dec!(2)),
            Err(OrderValidationError::NotionalOverflow {
                quantity: Decimal::MAX,
                price: dec!(2),
            })
        );
    }

    #[test]
    fn test_symbol_checked_before_quantity() {
        let request = OrderRequest::market("", Side::Buy, dec!(-1));
        assert_eq!(request.validate(), Err(OrderValidationError::EmptySymbol));
    }
}
