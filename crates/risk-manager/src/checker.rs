//! Risk Checker
//!
//! Validates a proposed order against [`RiskConfig`] using live account state
//! from the broker. Holds no state of its own.

use crate::limits::RiskConfig;
use log::{debug, warn};
use meridian_core::{OrderRequest, Side};
use meridian_ports::Broker;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Which limit rejected an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCheckType {
    /// A broker query failed
    BrokerUnavailable,
    /// Account total value is zero or negative
    NoAccountValue,
    DailyLossLimit,
    MaxOpenPositions,
    PositionSizeLimit,
}

/// Outcome of a risk check
#[derive(Debug, Clone, PartialEq)]
pub struct RiskCheckResult {
    pub allowed: bool,
    /// Why the order was rejected (empty when allowed)
    pub reason: String,
    pub check: Option<RiskCheckType>,
}

impl RiskCheckResult {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
            check: None,
        }
    }

    pub fn reject(check: RiskCheckType, reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            check: Some(check),
        }
    }
}

/// Pre-trade risk gate
pub struct RiskChecker {
    broker: Arc<dyn Broker>,
    config: RiskConfig,
}

impl RiskChecker {
    pub fn new(broker: Arc<dyn Broker>, config: RiskConfig) -> Self {
        Self { broker, config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Check an order priced at `reference_price`
    pub async fn check(&self, request: &OrderRequest, reference_price: Decimal) -> RiskCheckResult {
        let result = self.evaluate(request, reference_price).await;
        if result.allowed {
            debug!(
                "[RISK] {} {} {} @ {} passed",
                request.side, request.quantity, request.symbol, reference_price
            );
        } else {
            warn!(
                "[RISK REJECTED] {} {} {}: {}",
                request.side, request.quantity, request.symbol, result.reason
            );
        }
        result
    }

    async fn evaluate(&self, request: &OrderRequest, reference_price: Decimal) -> RiskCheckResult {
        // 1. Account state and daily loss
        let balance = match self.broker.get_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                return RiskCheckResult::reject(
                    RiskCheckType::BrokerUnavailable,
                    format!("failed to get balance: {}", e),
                );
            }
        };

        if balance.total_value <= Decimal::ZERO {
            return RiskCheckResult::reject(
                RiskCheckType::NoAccountValue,
                format!("account has no value (total value {})", balance.total_value),
            );
        }

        let daily_loss_pct = balance.daily_loss_pct();
        if daily_loss_pct >= self.config.max_daily_loss_pct {
            return RiskCheckResult::reject(
                RiskCheckType::DailyLossLimit,
                format!(
                    "daily loss limit reached: {}% >= {}%",
                    daily_loss_pct.round_dp(2),
                    self.config.max_daily_loss_pct
                ),
            );
        }

        // 2. Open positions (sells reduce exposure)
        if request.side == Side::Buy {
            let positions = match self.broker.get_positions().await {
                Ok(positions) => positions,
                Err(e) => {
                    return RiskCheckResult::reject(
                        RiskCheckType::BrokerUnavailable,
                        format!("failed to get positions: {}", e),
                    );
                }
            };

            if positions.len() >= self.config.max_open_positions {
                return RiskCheckResult::reject(
                    RiskCheckType::MaxOpenPositions,
                    format!(
                        "max open positions reached: {} >= {}",
                        positions.len(),
                        self.config.max_open_positions
                    ),
                );
            }
        }

        // 3. Order size relative to the account
        let Some((order_value, position_pct)) = request
            .notional(reference_price)
            .ok()
            .and_then(|value| {
                let pct = value.checked_div(balance.total_value)?.checked_mul(dec!(100))?;
                Some((value, pct))
            })
        else {
            return RiskCheckResult::reject(
                RiskCheckType::PositionSizeLimit,
                format!(
                    "order value out of range: {} x {}",
                    request.quantity, reference_price
                ),
            );
        };
        if position_pct > self.config.max_position_pct {
            return RiskCheckResult::reject(
                RiskCheckType::PositionSizeLimit,
                format!(
                    "position size {}% exceeds limit {}% (order value {})",
                    position_pct.round_dp(2),
                    self.config.max_position_pct,
                    order_value
                ),
            );
        }

        RiskCheckResult::allow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use meridian_core::{Balance, Order, OrderId, Position};
    use meridian_ports::{BrokerError, BrokerResult, OrderUpdateHandler};

    /// Broker returning fixed account state
    struct StaticBroker {
        balance: BrokerResult<Balance>,
        positions: BrokerResult<Vec<Position>>,
    }

    impl StaticBroker {
        fn new(total_value: Decimal, daily_pl: Decimal, open_positions: usize) -> Self {
            let mut balance = Balance::with_cash("USD", total_value);
            balance.daily_pl = daily_pl;
            let positions = (0..open_positions)
                .map(|i| Position::flat(format!("SYM{}", i)))
                .collect();
            Self {
                balance: Ok(balance),
                positions: Ok(positions),
            }
        }
    }

    #[async_trait]
    impl Broker for StaticBroker {
        fn name(&self) -> &str {
            "static"
        }

        async fn connect(&self) -> BrokerResult<()> {
            Ok(())
        }

        async fn disconnect(&self) -> BrokerResult<()> {
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn place_order(&self, _request: &OrderRequest) -> BrokerResult<Order> {
            Err(BrokerError::Simulated("not supported".to_string()))
        }

        async fn cancel_order(&self, order_id: OrderId) -> BrokerResult<()> {
            Err(BrokerError::OrderNotFound(order_id))
        }

        async fn get_order(&self, order_id: OrderId) -> BrokerResult<Order> {
            Err(BrokerError::OrderNotFound(order_id))
        }

        async fn get_open_orders(&self) -> BrokerResult<Vec<Order>> {
            Ok(Vec::new())
        }

        async fn get_positions(&self) -> BrokerResult<Vec<Position>> {
            self.positions.clone()
        }

        async fn get_position(&self, symbol: &str) -> BrokerResult<Position> {
            Err(BrokerError::PositionNotFound(symbol.to_string()))
        }

        async fn get_balance(&self) -> BrokerResult<Balance> {
            self.balance.clone()
        }

        fn subscribe(&self, _handler: OrderUpdateHandler) {}

        fn unsubscribe(&self) {}
    }

    fn checker(broker: StaticBroker) -> RiskChecker {
        RiskChecker::new(Arc::new(broker), RiskConfig::default())
    }

    fn buy(quantity: Decimal) -> OrderRequest {
        OrderRequest::market("AAPL", Side::Buy, quantity)
    }

    #[tokio::test]
    async fn test_allows_order_within_limits() {
        let checker = checker(StaticBroker::new(dec!(100000), Decimal::ZERO, 0));

        // 50 @ 100 = 5% of account
        let result = checker.check(&buy(dec!(50)), dec!(100)).await;
        assert_eq!(result, RiskCheckResult::allow());
    }

    #[tokio::test]
    async fn test_daily_loss_limit() {
        let _ = env_logger::try_init();
        let checker = checker(StaticBroker::new(dec!(100000), dec!(-6000), 0));

        let result = checker.check(&buy(dec!(1)), dec!(100)).await;
        assert!(!result.allowed);
        assert_eq!(result.check, Some(RiskCheckType::DailyLossLimit));
        assert!(result.reason.contains("daily loss limit"));
    }

    #[tokio::test]
    async fn test_daily_loss_at_limit_rejects() {
        let checker = checker(StaticBroker::new(dec!(100000), dec!(-5000), 0));

        let result = checker.check(&buy(dec!(1)), dec!(100)).await;
        assert_eq!(result.check, Some(RiskCheckType::DailyLossLimit));
    }

    #[tokio::test]
    async fn test_max_open_positions_applies_to_buys_only() {
        let checker = checker(StaticBroker::new(dec!(100000), Decimal::ZERO, 20));

        let result = checker.check(&buy(dec!(1)), dec!(100)).await;
        assert_eq!(result.check, Some(RiskCheckType::MaxOpenPositions));
        assert!(result.reason.contains("20 >= 20"));

        let sell = OrderRequest::market("AAPL", Side::Sell, dec!(1));
        assert!(checker.check(&sell, dec!(100)).await.allowed);
    }

    #[tokio::test]
    async fn test_position_size_limit() {
        let checker = checker(StaticBroker::new(dec!(100000), Decimal::ZERO, 0));

        // Exactly 10% passes
        assert!(checker.check(&buy(dec!(100)), dec!(100)).await.allowed);

        // 10.1% fails
        let result = checker.check(&buy(dec!(101)), dec!(100)).await;
        assert_eq!(result.check, Some(RiskCheckType::PositionSizeLimit));
    }

    #[tokio::test]
    async fn test_account_without_value_is_rejected() {
        let checker = checker(StaticBroker::new(Decimal::ZERO, Decimal::ZERO, 0));

        let result = checker.check(&buy(dec!(1)), dec!(100)).await;
        assert_eq!(result.check, Some(RiskCheckType::NoAccountValue));
    }

    #[tokio::test]
    async fn test_broker_failures_fail_closed() {
        let mut broker = StaticBroker::new(dec!(100000), Decimal::ZERO, 0);
        broker.balance = Err(BrokerError::NotConnected);
        let result = checker(broker).check(&buy(dec!(1)), dec!(100)).await;
        assert!(!result.allowed);
        assert_eq!(result.check, Some(RiskCheckType::BrokerUnavailable));
        assert!(result.reason.contains("not connected"));

        let mut broker = StaticBroker::new(dec!(100000), Decimal::ZERO, 0);
        broker.positions = Err(BrokerError::Simulated("positions".to_string()));
        let result = checker(broker).check(&buy(dec!(1)), dec!(100)).await;
        assert_eq!(result.check, Some(RiskCheckType::BrokerUnavailable));
    }

    #[tokio::test]
    async fn test_oversized_order_is_rejected_without_panic() {
        let checker = checker(StaticBroker::new(dec!(100000), Decimal::ZERO, 0));

        // quantity x price does not fit in a Decimal
        let result = checker.check(&buy(Decimal::MAX), dec!(2)).await;
        assert_eq!(result.check, Some(RiskCheckType::PositionSizeLimit));
        assert!(result.reason.contains("out of range"));

        // order value / tiny account value does not fit either
        let checker = checker_with_value(Decimal::new(1, 28));
        let result = checker.check(&buy(dec!(1000)), dec!(1000000)).await;
        assert_eq!(result.check, Some(RiskCheckType::PositionSizeLimit));
    }

    fn checker_with_value(total_value: Decimal) -> RiskChecker {
        checker(StaticBroker::new(total_value, Decimal::ZERO, 0))
    }
}
