//! 거래 성과 분석기.
//!
//! 이미 조회·역직렬화된 체결 기록 배열을 받아 구조화된 리포트를
//! 만드는 상태 없는 진입점입니다. 분석기는 I/O를 전혀 하지 않으며,
//! 호출 사이에 아무 상태도 공유하지 않습니다. 서로 다른 계정에 대한
//! 분석을 조율 없이 동시에 실행해도 안전합니다.
//!
//! 모든 연산은 검증 → 정렬 → 계산 순서로 진행되며, 잘못된 체결
//! 기록이 하나라도 있으면 부분 결과 없이 전체가 실패합니다.
//! 빈 입력은 실패가 아니라 "거래 없음" 리포트입니다.

use tradescope_core::{AnalyticsResult, Interval, Period, RawFill};
use tracing::debug;

use crate::normalize::normalize;
use crate::performance::{FillFlowStats, PositionMetrics};
use crate::periodic::PeriodicBreakdown;
use crate::reconstruct::{reconstruct, ReconstructConfig};
use crate::report::{ConsecutiveAnalysis, PerformanceSummary, PeriodicReturns, WinRateMetrics};
use crate::streak::{analyze_outcomes, flip_outcomes};

/// 상태 없는 거래 성과 분석기.
///
/// 포지션 재구성 방식만 설정으로 가지며, 분석 호출마다 입력에서
/// 새로 모든 것을 계산합니다.
#[derive(Debug, Clone, Copy, Default)]
pub struct TradeAnalyzer {
    config: ReconstructConfig,
}

impl TradeAnalyzer {
    /// 기본 설정(심볼별 추적, 전체 청산)의 분석기를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 재구성 설정을 지정한 분석기를 생성합니다.
    pub fn with_config(config: ReconstructConfig) -> Self {
        Self { config }
    }

    /// 재구성 설정을 반환합니다.
    pub fn config(&self) -> ReconstructConfig {
        self.config
    }

    /// 성과 요약 분석 (체결 단위 현금 흐름 관점).
    ///
    /// 체결 하나하나를 자금 유출입으로 분류한 요약입니다. 포지션 매칭
    /// 관점의 [`win_rate_metrics`](Self::win_rate_metrics)와는 의도적으로
    /// 다른 값을 냅니다.
    pub fn performance_summary(
        &self,
        raw: &[RawFill],
        period: Period,
    ) -> AnalyticsResult<PerformanceSummary> {
        let fills = normalize(raw)?;
        debug!(fills = fills.len(), period = %period, "performance summary requested");

        match FillFlowStats::from_fills(&fills) {
            Some(stats) => Ok(PerformanceSummary::from_stats(period, &stats)),
            None => Ok(PerformanceSummary::no_trades(period)),
        }
    }

    /// 승률/수익률 분석 (포지션 매칭 관점).
    ///
    /// 체결을 포지션으로 재구성한 뒤 청산 완료 포지션만 집계합니다.
    /// 마지막까지 닫히지 않은 포지션은 집계에서 제외됩니다.
    pub fn win_rate_metrics(&self, raw: &[RawFill]) -> AnalyticsResult<WinRateMetrics> {
        let fills = normalize(raw)?;
        if fills.is_empty() {
            return Ok(WinRateMetrics::no_trades());
        }

        let reconstruction = reconstruct(&fills, self.config);
        if !reconstruction.has_completed() {
            return Ok(WinRateMetrics::no_completed_positions(fills.len()));
        }

        let metrics = PositionMetrics::from_positions(&reconstruction.closed);
        debug!(
            completed = reconstruction.closed.len(),
            open = reconstruction.open.len(),
            "win rate metrics computed"
        );

        Ok(WinRateMetrics::from_metrics(fills.len(), &metrics))
    }

    /// 연속 승패 분석 (방향 전환 가격 비교 관점).
    ///
    /// 수수료와 무관하게 방향 전환마다 진입가 대비 전환가가 유리했는지만
    /// 봅니다.
    pub fn consecutive_analysis(&self, raw: &[RawFill]) -> AnalyticsResult<ConsecutiveAnalysis> {
        let fills = normalize(raw)?;
        if fills.is_empty() {
            return Ok(ConsecutiveAnalysis::no_trades());
        }

        let outcomes = flip_outcomes(&fills);
        let bools: Vec<bool> = outcomes.iter().map(|o| o.won).collect();
        let summary = analyze_outcomes(&bools);
        debug!(outcomes = outcomes.len(), "consecutive analysis computed");

        Ok(ConsecutiveAnalysis::from_flips(&outcomes, &summary))
    }

    /// 기간별 수익 분석 (현금 흐름 관점).
    pub fn periodic_returns(
        &self,
        raw: &[RawFill],
        interval: Interval,
    ) -> AnalyticsResult<PeriodicReturns> {
        let fills = normalize(raw)?;
        if fills.is_empty() {
            return Ok(PeriodicReturns::no_trades());
        }

        let breakdown = PeriodicBreakdown::from_fills(&fills, interval);
        debug!(
            interval = %interval,
            periods = breakdown.total_periods(),
            "periodic returns computed"
        );

        Ok(PeriodicReturns::from_breakdown(&breakdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tradescope_core::{AnalyticsError, RawFee};

    fn raw_fill(side: &str, price: Decimal, amount: Decimal, ms: i64) -> RawFill {
        RawFill {
            symbol: Some("BTC/USDT".to_string()),
            side: Some(side.to_string()),
            price: Some(price),
            amount: Some(amount),
            fee: Some(RawFee {
                cost: Some(Decimal::ZERO),
                currency: Some("USDT".to_string()),
            }),
            timestamp: Some(ms),
            datetime: None,
        }
    }

    #[test]
    fn test_empty_input_never_errors() {
        let analyzer = TradeAnalyzer::new();

        assert!(matches!(
            analyzer.performance_summary(&[], Period::All).unwrap(),
            PerformanceSummary::NoTrades(_)
        ));
        assert!(matches!(
            analyzer.win_rate_metrics(&[]).unwrap(),
            WinRateMetrics::NoTrades(_)
        ));
        assert!(matches!(
            analyzer.consecutive_analysis(&[]).unwrap(),
            ConsecutiveAnalysis::NoTrades(_)
        ));
        assert!(matches!(
            analyzer.periodic_returns(&[], Interval::Daily).unwrap(),
            PeriodicReturns::NoTrades(_)
        ));
    }

    #[test]
    fn test_malformed_fill_aborts_every_operation() {
        let analyzer = TradeAnalyzer::new();
        let mut bad = raw_fill("buy", dec!(100), dec!(1), 0);
        bad.side = None;
        let fills = vec![raw_fill("buy", dec!(100), dec!(1), 0), bad];

        let err = analyzer.win_rate_metrics(&fills).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::MalformedFill { index: 1, field: "side" }
        ));
        assert!(analyzer.periodic_returns(&fills, Interval::Daily).is_err());
    }

    #[test]
    fn test_no_completed_positions() {
        let analyzer = TradeAnalyzer::new();
        // 매수만 있으면 포지션이 닫히지 않는다
        let fills = vec![raw_fill("buy", dec!(100), dec!(1), 0)];

        let report = analyzer.win_rate_metrics(&fills).unwrap();
        let WinRateMetrics::NoCompletedPositions(report) = report else {
            panic!("expected no completed positions");
        };
        assert_eq!(report.total_trades, 1);
        assert_eq!(report.completed_positions, 0);
    }

    #[test]
    fn test_unsorted_input_is_normalized() {
        let analyzer = TradeAnalyzer::new();
        // 청산 체결이 먼저 와도 시각 기준으로 정렬된 뒤 분석된다
        let fills = vec![
            raw_fill("sell", dec!(110), dec!(1), 2000),
            raw_fill("buy", dec!(100), dec!(1), 1000),
        ];

        let report = analyzer.win_rate_metrics(&fills).unwrap();
        let WinRateMetrics::Ready(report) = report else {
            panic!("expected ready report");
        };
        assert_eq!(report.completed_positions, 1);
        assert_eq!(report.win_count, 1);
    }
}
