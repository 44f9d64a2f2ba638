use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Account balance snapshot reported by a broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub currency: String,
    pub cash: Decimal,
    pub buying_power: Decimal,
    /// cash + Σ position market value
    pub total_value: Decimal,
    pub margin_used: Decimal,
    pub margin_available: Decimal,
    /// P&L since the start of the trading day
    pub daily_pl: Decimal,
}

impl Balance {
    /// Cash-only account with no positions
    pub fn with_cash(currency: impl Into<String>, cash: Decimal) -> Self {
        Self {
            currency: currency.into(),
            cash,
            buying_power: cash,
            total_value: cash,
            margin_used: Decimal::ZERO,
            margin_available: cash,
            daily_pl: Decimal::ZERO,
        }
    }

    /// Today's loss as a percentage of total value (negative when up)
    ///
    /// Saturates at `Decimal::MAX` / `Decimal::MIN` when the ratio does not fit.
    pub fn daily_loss_pct(&self) -> Decimal {
        if self.total_value <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (-self.daily_pl)
            .checked_div(self.total_value)
            .and_then(|ratio| ratio.checked_mul(dec!(100)))
            .unwrap_or(if self.daily_pl.is_sign_negative() {
                Decimal::MAX
            } else {
                Decimal::MIN
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_loss_pct() {
        let mut balance = Balance::with_cash("USD", dec!(100000));
        balance.daily_pl = dec!(-6000);
        assert_eq!(balance.daily_loss_pct(), dec!(6));

        balance.daily_pl = dec!(2500);
        assert_eq!(balance.daily_loss_pct(), dec!(-2.5));
    }

    #[test]
    fn test_daily_loss_pct_without_value() {
        let mut balance = Balance::with_cash("USD", Decimal::ZERO);
        balance.daily_pl = dec!(-10);
        assert_eq!(balance.daily_loss_pct(), Decimal::ZERO);
    }

    #[test]
    fn test_daily_loss_pct_saturates() {
        let mut balance = Balance::with_cash("USD", Decimal::new(1, 28));
        balance.daily_pl = dec!(-1000000);
        assert_eq!(balance.daily_loss_pct(), Decimal::MAX);

        balance.daily_pl = dec!(1000000);
        assert_eq!(balance.daily_loss_pct(), Decimal::MIN);
    }
}
