//! 체결 기록에서 재구성된 포지션.
//!
//! 이 모듈은 분석 한 번의 수명 동안만 존재하는 포지션 엔티티를
//! 정의합니다. 포지션은 같은 방향 체결이 이어지는 동안 열려 있고,
//! 반대 방향 체결이 들어오면 닫힙니다. 영속화되지 않습니다.

use crate::domain::calculations::{net_pnl, realized_pnl, return_pct, weighted_entry_price};
use crate::domain::statistics::TradeInfo;
use crate::domain::Side;
use crate::types::{Price, Quantity, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 체결 흐름에서 재구성된 포지션.
///
/// 진입 구간의 체결들이 가중평균 진입가로 합쳐지며,
/// 청산 시점에 손익이 정확히 한 번 확정됩니다.
/// 불변식: `cost == entry_price × amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// 내부 포지션 ID
    pub id: Uuid,
    /// 거래 심볼
    pub symbol: Symbol,
    /// 진입 방향 (롱 = Buy, 숏 = Sell)
    pub side: Side,
    /// 가중평균 진입 가격
    pub entry_price: Price,
    /// 보유 수량
    pub amount: Quantity,
    /// 누적 진입 비용 (진입가 × 수량)
    pub cost: Decimal,
    /// 누적 수수료 (청산 후에는 청산 수수료 포함)
    pub fees: Decimal,
    /// 진입 시각
    pub entry_time: DateTime<Utc>,
    /// 청산 시각 (미청산이면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_time: Option<DateTime<Utc>>,
    /// 청산 가격 (미청산이면 None)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<Price>,
    /// 확정 손익 (수수료 차감 후, 청산 시 한 번만 설정)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit: Option<Decimal>,
}

impl Position {
    /// 첫 체결로 새 포지션을 엽니다.
    pub fn open(
        symbol: Symbol,
        side: Side,
        price: Price,
        amount: Quantity,
        fee: Decimal,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            symbol,
            side,
            entry_price: price,
            amount,
            cost: price * amount,
            fees: fee,
            entry_time,
            exit_time: None,
            exit_price: None,
            profit: None,
        }
    }

    /// 같은 방향 체결을 포지션에 합칩니다 (가중평균 진입가).
    pub fn add(&mut self, price: Price, amount: Quantity, fee: Decimal) {
        self.entry_price = weighted_entry_price(self.cost, self.amount, price, amount);
        self.amount += amount;
        self.cost += price * amount;
        self.fees += fee;
    }

    /// 포지션을 청산하고 손익을 확정합니다.
    ///
    /// 손익은 이 시점에 정확히 한 번 설정됩니다:
    /// 롱은 `(청산가 - 진입가) × 수량`, 숏은 `(진입가 - 청산가) × 수량`에서
    /// 누적 수수료(진입 + 청산)를 뺀 값입니다.
    pub fn close(&mut self, exit_price: Price, exit_fee: Decimal, exit_time: DateTime<Utc>) {
        debug_assert!(self.profit.is_none(), "position closed twice");

        self.fees += exit_fee;
        let gross = realized_pnl(self.entry_price, exit_price, self.amount, self.side);

        self.exit_price = Some(exit_price);
        self.exit_time = Some(exit_time);
        self.profit = Some(net_pnl(gross, self.fees));
    }

    /// 포지션이 아직 열려 있는지 확인합니다.
    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }

    /// 포지션이 청산되었는지 확인합니다.
    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some()
    }

    /// 수익 포지션인지 확인합니다 (손익 > 0).
    ///
    /// 손익이 정확히 0인 포지션은 수익으로 치지 않습니다.
    pub fn is_winner(&self) -> bool {
        self.profit.is_some_and(|p| p > Decimal::ZERO)
    }

    /// 진입 시점의 명목 가치를 반환합니다.
    pub fn entry_notional(&self) -> Decimal {
        self.entry_price * self.amount
    }

    /// 수익률(%)을 반환합니다 (청산된 포지션만, 미청산이면 0).
    pub fn profit_pct(&self) -> Decimal {
        match self.profit {
            Some(profit) => return_pct(profit, self.entry_notional()),
            None => Decimal::ZERO,
        }
    }
}

impl TradeInfo for Position {
    fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    fn net_profit(&self) -> Option<Decimal> {
        self.profit
    }

    fn fees(&self) -> Decimal {
        self.fees
    }

    fn entry_time(&self) -> DateTime<Utc> {
        self.entry_time
    }

    fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc() -> Symbol {
        Symbol::new("BTC", "USDT")
    }

    #[test]
    fn test_open_sets_cost_invariant() {
        let p = Position::open(btc(), Side::Buy, dec!(100), dec!(2), dec!(1), Utc::now());

        assert_eq!(p.cost, dec!(200));
        assert_eq!(p.cost, p.entry_price * p.amount);
        assert!(p.is_open());
        assert!(p.profit.is_none());
    }

    #[test]
    fn test_add_keeps_weighted_average() {
        let mut p = Position::open(btc(), Side::Buy, dec!(100), dec!(1), dec!(0.5), Utc::now());
        p.add(dec!(110), dec!(1), dec!(0.5));

        assert_eq!(p.entry_price, dec!(105));
        assert_eq!(p.amount, dec!(2));
        assert_eq!(p.cost, dec!(210));
        assert_eq!(p.fees, dec!(1));
        assert_eq!(p.cost, p.entry_price * p.amount);
    }

    #[test]
    fn test_close_long_profit() {
        let mut p = Position::open(btc(), Side::Buy, dec!(100), dec!(2), dec!(1), Utc::now());
        p.close(dec!(110), dec!(1), Utc::now());

        // (110 - 100) × 2 - (1 + 1) = 18
        assert_eq!(p.profit, Some(dec!(18)));
        assert!(p.is_closed());
        assert!(p.is_winner());
    }

    #[test]
    fn test_close_short_profit() {
        let mut p = Position::open(btc(), Side::Sell, dec!(110), dec!(2), Decimal::ZERO, Utc::now());
        p.close(dec!(100), Decimal::ZERO, Utc::now());

        // (110 - 100) × 2 = 20
        assert_eq!(p.profit, Some(dec!(20)));
    }

    #[test]
    fn test_zero_profit_is_not_winner() {
        let mut p = Position::open(btc(), Side::Buy, dec!(100), dec!(1), Decimal::ZERO, Utc::now());
        p.close(dec!(100), Decimal::ZERO, Utc::now());

        assert_eq!(p.profit, Some(Decimal::ZERO));
        assert!(!p.is_winner());
    }

    #[test]
    fn test_profit_pct() {
        let mut p = Position::open(btc(), Side::Buy, dec!(100), dec!(2), Decimal::ZERO, Utc::now());
        p.close(dec!(110), Decimal::ZERO, Utc::now());

        // 20 / 200 × 100 = 10%
        assert_eq!(p.profit_pct(), dec!(10));
    }
}
