use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::Signed;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::Side;

/// Holding in a single symbol
///
/// `quantity` is signed: positive = long, negative = short. A position whose
/// quantity returns to zero is dropped from the active set by its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: Decimal,
    /// Weighted-average entry price
    pub average_cost: Decimal,
    /// Last mark price
    pub current_price: Decimal,
    /// quantity × current_price
    pub market_value: Decimal,
    /// market_value − cost basis
    pub unrealized_pl: Decimal,
    pub unrealized_pl_percent: Decimal,
    /// Cumulative P&L locked in by reducing fills
    pub realized_pl: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl Position {
    /// Zero-quantity position for a symbol
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            quantity: Decimal::ZERO,
            average_cost: Decimal::ZERO,
            current_price: Decimal::ZERO,
            market_value: Decimal::ZERO,
            unrealized_pl: Decimal::ZERO,
            unrealized_pl_percent: Decimal::ZERO,
            realized_pl: Decimal::ZERO,
            updated_at: Utc::now(),
        }
    }

    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    /// quantity × average_cost
    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_cost
    }

    /// Apply a fill to this position, returning realized P&L from this fill
    ///
    /// Adding to a position re-averages the cost; reducing it realizes
    /// P&L against the average cost; crossing through zero re-bases the
    /// average at the fill price. The position is marked at the fill price.
    pub fn apply_fill(&mut self, side: Side, quantity: Decimal, price: Decimal) -> Decimal {
        let signed_qty = match side {
            Side::Buy => quantity,
            Side::Sell => -quantity,
        };

        let mut realized = Decimal::ZERO;

        // Closing (partially or fully)
        if (self.quantity > Decimal::ZERO && signed_qty < Decimal::ZERO)
            || (self.quantity < Decimal::ZERO && signed_qty > Decimal::ZERO)
        {
            let close_qty = quantity.min(self.quantity.abs());
            realized = if self.quantity > Decimal::ZERO {
                // Was long, selling
                (price - self.average_cost) * close_qty
            } else {
                // Was short, buying back
                (self.average_cost - price) * close_qty
            };
        }

        let new_quantity = self.quantity + signed_qty;

        if new_quantity.is_zero() {
            self.average_cost = Decimal::ZERO;
        } else if (self.quantity >= Decimal::ZERO && signed_qty > Decimal::ZERO)
            || (self.quantity <= Decimal::ZERO && signed_qty < Decimal::ZERO)
        {
            // Adding to position - weighted average
            let total_cost = self.quantity.abs() * self.average_cost + quantity * price;
            self.average_cost = total_cost / new_quantity.abs();
        } else if new_quantity.signum() != self.quantity.signum() {
            // Flipped sides
            self.average_cost = price;
        }
        // Reducing without flipping keeps the average

        self.quantity = new_quantity;
        self.realized_pl += realized;
        self.mark(price);

        realized
    }

    /// Re-mark the position and recompute derived values
    pub fn mark(&mut self, price: Decimal) {
        self.current_price = price;
        self.market_value = self.quantity * price;
        let cost_basis = self.cost_basis();
        self.unrealized_pl = self.market_value - cost_basis;
        self.unrealized_pl_percent = if cost_basis.is_zero() {
            Decimal::ZERO
        } else {
            self.unrealized_pl / cost_basis.abs() * dec!(100)
        };
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_average_cost_on_buys() {
        let mut pos = Position::flat("AAPL");

        // Buy 100 @ 150
        let pnl = pos.apply_fill(Side::Buy, dec!(100), dec!(150));
        assert_eq!(pnl, Decimal::ZERO);
        assert_eq!(pos.quantity, dec!(100));
        assert_eq!(pos.average_cost, dec!(150));

        // Buy 50 @ 180 -> (100*150 + 50*180) / 150 = 160
        pos.apply_fill(Side::Buy, dec!(50), dec!(180));
        assert_eq!(pos.quantity, dec!(150));
        assert_eq!(pos.average_cost, dec!(160));
        assert_eq!(pos.market_value, dec!(27000));
        assert_eq!(pos.unrealized_pl, dec!(3000)); // 27000 - 24000
    }

    #[test]
    fn test_sell_realizes_against_average() {
        let mut pos = Position::flat("AAPL");
        pos.apply_fill(Side::Buy, dec!(100), dec!(150));

        // Sell 40 @ 170 -> (170 - 150) * 40 = 800
        let pnl = pos.apply_fill(Side::Sell, dec!(40), dec!(170));
        assert_eq!(pnl, dec!(800));
        assert_eq!(pos.quantity, dec!(60));
        assert_eq!(pos.average_cost, dec!(150)); // Avg stays same
        assert_eq!(pos.realized_pl, dec!(800));

        // Sell the rest @ 140 -> (140 - 150) * 60 = -600
        let pnl = pos.apply_fill(Side::Sell, dec!(60), dec!(140));
        assert_eq!(pnl, dec!(-600));
        assert!(pos.is_flat());
        assert_eq!(pos.realized_pl, dec!(200));
        assert_eq!(pos.market_value, Decimal::ZERO);
    }

    #[test]
    fn test_short_round_trip() {
        let mut pos = Position::flat("TSLA");

        // Sell 10 @ 200 (go short)
        pos.apply_fill(Side::Sell, dec!(10), dec!(200));
        assert_eq!(pos.quantity, dec!(-10));
        assert_eq!(pos.average_cost, dec!(200));

        // Buy back @ 180 (profit = (200 - 180) * 10)
        let pnl = pos.apply_fill(Side::Buy, dec!(10), dec!(180));
        assert_eq!(pnl, dec!(200));
        assert!(pos.is_flat());
    }

    #[test]
    fn test_flip_rebases_average() {
        let mut pos = Position::flat("TSLA");
        pos.apply_fill(Side::Buy, dec!(5), dec!(100));

        let pnl = pos.apply_fill(Side::Sell, dec!(8), dec!(110));
        assert_eq!(pnl, dec!(50)); // only 5 closed
        assert_eq!(pos.quantity, dec!(-3));
        assert_eq!(pos.average_cost, dec!(110));
    }

    #[test]
    fn test_mark_derives_unrealized() {
        let mut pos = Position::flat("NVDA");
        pos.apply_fill(Side::Buy, dec!(10), dec!(100));

        pos.mark(dec!(120));
        assert_eq!(pos.market_value, dec!(1200));
        assert_eq!(pos.unrealized_pl, dec!(200));
        assert_eq!(pos.unrealized_pl_percent, dec!(20));
        assert_eq!(pos.market_value - pos.cost_basis(), pos.unrealized_pl);
    }
}
