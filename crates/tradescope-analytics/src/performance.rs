//! 청산 완료 포지션의 성과 집계.
//!
//! 재구성된 포지션 목록을 받아 승률, Profit Factor, 기대값, 손익비와
//! 연속 승패 극값을 하나의 지표 묶음으로 계산합니다.
//! 모든 값은 `Decimal` 영역에 머물며, 문자열 렌더링은 리포트 계층이
//! 담당합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tradescope_core::{Fill, Position, ProfitFactor, Side, TradeStatistics};

use crate::streak::{analyze_outcomes, profit_outcomes, StreakSummary};

/// 청산 완료 포지션에 대한 성과 지표 묶음.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionMetrics {
    /// 공통 거래 통계 (승률, PF, 기대값, 손익비 등)
    pub stats: TradeStatistics,
    /// 손익 기준 연속 승패 요약
    pub streaks: StreakSummary,
    /// 첫 포지션 진입 시각
    pub first_entry_time: Option<DateTime<Utc>>,
    /// 마지막 포지션 청산 시각
    pub last_exit_time: Option<DateTime<Utc>>,
}

impl PositionMetrics {
    /// 청산 순서대로 정렬된 완료 포지션 목록에서 지표를 계산합니다.
    pub fn from_positions(closed: &[Position]) -> Self {
        if closed.is_empty() {
            return Self::default();
        }

        let stats = TradeStatistics::from_trades(closed);
        let streaks = analyze_outcomes(&profit_outcomes(closed));

        Self {
            stats,
            streaks,
            first_entry_time: closed.first().map(|p| p.entry_time),
            last_exit_time: closed.last().and_then(|p| p.exit_time),
        }
    }
}

/// 체결 단위 현금 흐름 집계.
///
/// 포지션 매칭 없이 체결 하나하나를 자금 유출입으로만 분류하는
/// 단순화된 관점입니다. 매도는 유입(수익), 매수는 유출(손실)로
/// 집계하며, 분류 자체에는 수수료를 반영하지 않고 순손익 계산에서만
/// 수수료 합계를 차감합니다. 포지션 매칭 손익과 혼동하면 안 됩니다.
#[derive(Debug, Clone, Serialize)]
pub struct FillFlowStats {
    /// 체결 수
    pub total_trades: usize,
    /// 유입(매도) 체결 수
    pub win_count: usize,
    /// 유출(매수) 체결 수
    pub loss_count: usize,
    /// 승률 (백분율)
    pub win_rate_pct: Decimal,
    /// 유입 합계 (매도 명목 가치)
    pub total_profit: Decimal,
    /// 유출 합계 (매수 명목 가치, 양수)
    pub total_loss: Decimal,
    /// 순손익 (유입 - 유출 - 수수료)
    pub net_profit: Decimal,
    /// 수수료 합계
    pub total_fees: Decimal,
    /// Profit Factor (유입 / 유출)
    pub profit_factor: ProfitFactor,
    /// 최대 단일 유입
    pub largest_win: Decimal,
    /// 최대 단일 유출 (양수)
    pub largest_loss: Decimal,
    /// 거래량 합계 (명목 가치)
    pub total_volume: Decimal,
    /// 첫 체결 시각
    pub first_trade: DateTime<Utc>,
    /// 마지막 체결 시각
    pub last_trade: DateTime<Utc>,
}

impl FillFlowStats {
    /// 정규화된 체결 시퀀스에서 현금 흐름 집계를 계산합니다.
    ///
    /// 빈 입력이면 `None`을 반환합니다 (리포트 계층이 "거래 없음"
    /// 결과로 바꿉니다).
    pub fn from_fills(fills: &[Fill]) -> Option<Self> {
        let (first, last) = (fills.first()?, fills.last()?);

        let mut stats = Self {
            total_trades: fills.len(),
            win_count: 0,
            loss_count: 0,
            win_rate_pct: Decimal::ZERO,
            total_profit: Decimal::ZERO,
            total_loss: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            profit_factor: ProfitFactor::default(),
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            total_volume: Decimal::ZERO,
            first_trade: first.executed_at,
            last_trade: last.executed_at,
        };

        for fill in fills {
            let notional = fill.notional();
            stats.total_fees += fill.fee_cost;
            stats.total_volume += notional;

            match fill.side {
                Side::Sell => {
                    stats.win_count += 1;
                    stats.total_profit += notional;
                    if notional > stats.largest_win {
                        stats.largest_win = notional;
                    }
                }
                Side::Buy => {
                    stats.loss_count += 1;
                    stats.total_loss += notional;
                    if notional > stats.largest_loss {
                        stats.largest_loss = notional;
                    }
                }
            }
        }

        stats.win_rate_pct = Decimal::from(stats.win_count)
            / Decimal::from(stats.total_trades)
            * Decimal::from(100);
        stats.net_profit = stats.total_profit - stats.total_loss - stats.total_fees;
        stats.profit_factor = ProfitFactor::from_totals(stats.total_profit, stats.total_loss);

        Some(stats)
    }

    /// 첫 체결부터 마지막 체결까지의 기간(일)을 반환합니다.
    pub fn duration_days(&self) -> Decimal {
        let millis = (self.last_trade - self.first_trade).num_milliseconds();
        Decimal::from(millis) / Decimal::from(86_400_000)
    }

    /// 하루 평균 체결 수를 반환합니다.
    ///
    /// 기간이 0이면 전체 체결 수를 그대로 반환합니다.
    pub fn trades_per_day(&self) -> Decimal {
        let days = self.duration_days();
        if days > Decimal::ZERO {
            Decimal::from(self.total_trades) / days
        } else {
            Decimal::from(self.total_trades)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;
    use tradescope_core::Symbol;

    fn closed_position(profit_sign: Decimal, at_hour: i64) -> Position {
        let entry = Utc.timestamp_millis_opt(0).unwrap() + Duration::hours(at_hour);
        let mut p = Position::open(
            Symbol::new("BTC", "USDT"),
            Side::Buy,
            dec!(100),
            dec!(1),
            Decimal::ZERO,
            entry,
        );
        p.close(dec!(100) + profit_sign, Decimal::ZERO, entry + Duration::hours(1));
        p
    }

    #[test]
    fn test_empty_positions() {
        let metrics = PositionMetrics::from_positions(&[]);

        assert_eq!(metrics.stats.total_trades, 0);
        assert_eq!(metrics.streaks.max_consecutive_wins, 0);
        assert!(metrics.first_entry_time.is_none());
    }

    #[test]
    fn test_counts_agree_with_streaks() {
        let positions = vec![
            closed_position(dec!(10), 0),
            closed_position(dec!(-5), 1),
            closed_position(dec!(3), 2),
        ];

        let metrics = PositionMetrics::from_positions(&positions);

        assert_eq!(metrics.stats.total_trades, 3);
        assert_eq!(metrics.stats.winning_trades, metrics.streaks.win_count);
        assert_eq!(metrics.stats.losing_trades, metrics.streaks.loss_count);
        assert_eq!(
            metrics.stats.winning_trades + metrics.stats.losing_trades,
            metrics.stats.total_trades
        );
    }

    #[test]
    fn test_trade_window() {
        let positions = vec![closed_position(dec!(10), 0), closed_position(dec!(4), 5)];
        let metrics = PositionMetrics::from_positions(&positions);

        assert_eq!(metrics.first_entry_time, Some(positions[0].entry_time));
        assert_eq!(metrics.last_exit_time, positions[1].exit_time);
    }

    #[test]
    fn test_consecutive_extremes() {
        let positions = vec![
            closed_position(dec!(1), 0),
            closed_position(dec!(1), 1),
            closed_position(dec!(-1), 2),
        ];

        let metrics = PositionMetrics::from_positions(&positions);

        assert_eq!(metrics.streaks.max_consecutive_wins, 2);
        assert_eq!(metrics.streaks.max_consecutive_losses, 1);
    }

    fn flow_fill(side: Side, price: Decimal, fee: Decimal, ms: i64) -> Fill {
        Fill::new(Symbol::new("BTC", "USDT"), side, price, dec!(1))
            .with_fee(fee, "USDT")
            .with_executed_at(Utc.timestamp_millis_opt(ms).unwrap())
    }

    #[test]
    fn test_fill_flow_classification() {
        let fills = vec![
            flow_fill(Side::Buy, dec!(100), dec!(1), 0),
            flow_fill(Side::Sell, dec!(110), dec!(1), 86_400_000),
        ];

        let stats = FillFlowStats::from_fills(&fills).unwrap();

        assert_eq!(stats.total_trades, 2);
        assert_eq!(stats.win_count, 1);
        assert_eq!(stats.loss_count, 1);
        assert_eq!(stats.total_profit, dec!(110));
        assert_eq!(stats.total_loss, dec!(100));
        assert_eq!(stats.total_fees, dec!(2));
        // 110 - 100 - 2
        assert_eq!(stats.net_profit, dec!(8));
        assert_eq!(stats.total_volume, dec!(210));
        assert_eq!(stats.largest_win, dec!(110));
        assert_eq!(stats.largest_loss, dec!(100));
        assert_eq!(stats.win_rate_pct, dec!(50));
        assert_eq!(stats.duration_days(), dec!(1));
    }

    #[test]
    fn test_fill_flow_empty_is_none() {
        assert!(FillFlowStats::from_fills(&[]).is_none());
    }

    #[test]
    fn test_trades_per_day_zero_duration() {
        let fills = vec![flow_fill(Side::Sell, dec!(10), dec!(0), 0)];
        let stats = FillFlowStats::from_fills(&fills).unwrap();

        assert_eq!(stats.trades_per_day(), dec!(1));
    }
}
