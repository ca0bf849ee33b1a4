//! 매매 손익 및 비용 계산 공통 로직.
//!
//! 포지션 재구성과 통계 집계에서 공유하는 P&L 계산 함수를 제공합니다.

use crate::domain::Side;
use crate::types::{Price, Quantity};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 실현 손익 계산 (수수료 제외).
///
/// 진입가와 청산가의 차이로 손익을 계산합니다.
///
/// # Arguments
///
/// * `entry_price` - 진입 가격 (가중평균)
/// * `exit_price` - 청산 가격
/// * `amount` - 청산 수량
/// * `side` - 포지션 방향 (Buy=롱, Sell=숏)
pub fn realized_pnl(entry_price: Price, exit_price: Price, amount: Quantity, side: Side) -> Decimal {
    match side {
        // 롱 포지션: (청산가 - 진입가) × 수량
        Side::Buy => (exit_price - entry_price) * amount,
        // 숏 포지션: (진입가 - 청산가) × 수량
        Side::Sell => (entry_price - exit_price) * amount,
    }
}

/// 수수료 차감 후 순손익 계산.
///
/// # Arguments
///
/// * `gross_pnl` - 총손익 (수수료 제외)
/// * `fees` - 진입 + 청산 수수료 합계
pub fn net_pnl(gross_pnl: Decimal, fees: Decimal) -> Decimal {
    gross_pnl - fees
}

/// 수익률 계산 (백분율).
///
/// # Arguments
///
/// * `pnl` - 손익
/// * `cost_basis` - 진입 시 투입 자본
///
/// # Returns
///
/// 수익률 (백분율, 예: 10.5 = 10.5%). 투입 자본이 0이면 0을 반환합니다.
pub fn return_pct(pnl: Decimal, cost_basis: Decimal) -> Decimal {
    if cost_basis > Decimal::ZERO {
        (pnl / cost_basis) * dec!(100)
    } else {
        Decimal::ZERO
    }
}

/// 가중평균 진입가 계산.
///
/// 같은 방향 체결이 합쳐질 때의 새 진입가입니다:
/// (기존 비용 + 추가 명목 가치) / 합산 수량.
///
/// # Arguments
///
/// * `cost` - 기존 누적 비용 (진입가 × 수량)
/// * `amount` - 기존 수량
/// * `add_price` - 추가 체결 가격
/// * `add_amount` - 추가 체결 수량
pub fn weighted_entry_price(
    cost: Decimal,
    amount: Quantity,
    add_price: Price,
    add_amount: Quantity,
) -> Price {
    let total_amount = amount + add_amount;
    if total_amount.is_zero() {
        return Decimal::ZERO;
    }
    (cost + add_price * add_amount) / total_amount
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realized_pnl_long() {
        let pnl = realized_pnl(dec!(100), dec!(110), dec!(10), Side::Buy);
        assert_eq!(pnl, dec!(100));
    }

    #[test]
    fn test_realized_pnl_short() {
        let pnl = realized_pnl(dec!(110), dec!(100), dec!(10), Side::Sell);
        assert_eq!(pnl, dec!(100));
    }

    #[test]
    fn test_net_pnl() {
        assert_eq!(net_pnl(dec!(100), dec!(5)), dec!(95));
    }

    #[test]
    fn test_return_pct() {
        assert_eq!(return_pct(dec!(50), dec!(1000)), dec!(5));
        assert_eq!(return_pct(dec!(50), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_weighted_entry_price() {
        // 100×10 보유 후 110×5 추가: (1000 + 550) / 15
        let price = weighted_entry_price(dec!(1000), dec!(10), dec!(110), dec!(5));
        let expected = dec!(1550) / dec!(15);
        assert!((price - expected).abs() < dec!(0.0001));
    }
}
