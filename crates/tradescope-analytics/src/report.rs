//! 분석 리포트 및 고정 소수점 렌더링.
//!
//! 계산 결과(`Decimal` 영역)를 출력 계약에 맞는 문자열 필드로
//! 렌더링하는 표현 계층입니다. 출력 계약:
//! - 금액: 소수점 8자리 문자열
//! - 비율: 소수점 2자리 + `%` 문자열
//! - 거래량: 소수점 2자리, 기간(일): 소수점 1자리
//! - 필드 이름: camelCase JSON
//!
//! 모든 리포트는 빈 입력에 대해 예외 대신 "거래 없음" 변형을
//! 반환합니다.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tradescope_core::{AnalyticsResult, DecimalExt, Period};

use crate::performance::{FillFlowStats, PositionMetrics};
use crate::periodic::PeriodicBreakdown;
use crate::streak::{FlipOutcome, StreakKind, StreakSummary};

/// 조회 구간에 체결이 없을 때의 안내 문구.
pub const NO_TRADES_MESSAGE: &str = "No trades found for the specified period.";

/// 체결은 있으나 청산 완료 포지션이 없을 때의 안내 문구.
pub const NO_POSITIONS_MESSAGE: &str = "No completed positions found for analysis.";

/// 리포트를 보기 좋은 JSON 문자열로 직렬화합니다.
pub fn to_json_pretty<T: Serialize>(report: &T) -> AnalyticsResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn iso(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// 거래 없음 결과 (기간 레이블 포함).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodNoTrades {
    /// 분석 기간 레이블
    pub period: String,
    /// 체결 수 (항상 0)
    pub total_trades: usize,
    /// 안내 문구
    pub message: String,
}

/// 거래 없음 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoTrades {
    /// 체결 수 (항상 0)
    pub total_trades: usize,
    /// 안내 문구
    pub message: String,
}

impl NoTrades {
    fn new() -> Self {
        Self {
            total_trades: 0,
            message: NO_TRADES_MESSAGE.to_string(),
        }
    }
}

/// 분석 구간 정보.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradingPeriodReport {
    /// 첫 체결 시각 (ISO-8601)
    pub first_trade: String,
    /// 마지막 체결 시각 (ISO-8601)
    pub last_trade: String,
    /// 구간 길이 (일, 소수점 1자리)
    pub duration_days: String,
    /// 하루 평균 체결 수 (소수점 1자리)
    pub trades_per_day: String,
}

/// 성과 요약 리포트 본문 (체결 단위 현금 흐름 관점).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSummaryReport {
    /// 분석 기간 레이블
    pub period: String,
    /// 체결 수
    pub total_trades: usize,
    /// 유입(매도) 체결 수
    pub win_count: usize,
    /// 유출(매수) 체결 수
    pub loss_count: usize,
    /// 승률
    pub win_rate: String,
    /// 유입 합계
    pub total_profit: String,
    /// 유출 합계
    pub total_loss: String,
    /// 순손익
    pub net_profit: String,
    /// 수수료 합계
    pub total_fees: String,
    /// Profit Factor
    pub profit_factor: String,
    /// 최대 단일 유입
    pub largest_win: String,
    /// 최대 단일 유출
    pub largest_loss: String,
    /// 거래량 합계 (소수점 2자리)
    pub total_volume: String,
    /// 분석 구간
    pub trading_period: TradingPeriodReport,
}

/// 성과 요약 분석 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PerformanceSummary {
    /// 조회 구간에 체결 없음
    NoTrades(PeriodNoTrades),
    /// 집계 결과
    Ready(Box<PerformanceSummaryReport>),
}

impl PerformanceSummary {
    /// 거래 없음 결과를 만듭니다.
    pub fn no_trades(period: Period) -> Self {
        Self::NoTrades(PeriodNoTrades {
            period: period.to_string(),
            total_trades: 0,
            message: NO_TRADES_MESSAGE.to_string(),
        })
    }

    /// 현금 흐름 집계를 리포트로 렌더링합니다.
    pub fn from_stats(period: Period, stats: &FillFlowStats) -> Self {
        Self::Ready(Box::new(PerformanceSummaryReport {
            period: period.to_string(),
            total_trades: stats.total_trades,
            win_count: stats.win_count,
            loss_count: stats.loss_count,
            win_rate: stats.win_rate_pct.to_percent_string(),
            total_profit: stats.total_profit.to_amount_string(),
            total_loss: stats.total_loss.to_amount_string(),
            net_profit: stats.net_profit.to_amount_string(),
            total_fees: stats.total_fees.to_amount_string(),
            profit_factor: stats.profit_factor.to_fixed_string(),
            largest_win: stats.largest_win.to_amount_string(),
            largest_loss: stats.largest_loss.to_amount_string(),
            total_volume: stats.total_volume.to_fixed_string(2),
            trading_period: TradingPeriodReport {
                first_trade: iso(stats.first_trade),
                last_trade: iso(stats.last_trade),
                duration_days: stats.duration_days().to_fixed_string(1),
                trades_per_day: stats.trades_per_day().to_fixed_string(1),
            },
        }))
    }
}

/// 승률/수익률 리포트 본문 (포지션 매칭 관점).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinRateReport {
    /// 체결 수
    pub total_trades: usize,
    /// 청산 완료 포지션 수
    pub completed_positions: usize,
    /// 수익 포지션 수
    pub win_count: usize,
    /// 손실 포지션 수
    pub loss_count: usize,
    /// 승률
    pub win_rate: String,
    /// Profit Factor
    pub profit_factor: String,
    /// 순손익
    pub net_profit: String,
    /// 평균 수익
    pub average_win: String,
    /// 평균 손실
    pub average_loss: String,
    /// 손익비 R-multiple
    pub r_multiple: String,
    /// 기대값
    pub expectancy: String,
    /// 최대 연승
    pub max_consecutive_wins: usize,
    /// 최대 연패
    pub max_consecutive_losses: usize,
    /// 첫 포지션 진입 시각
    pub first_trade_date: Option<String>,
    /// 마지막 포지션 청산 시각
    pub last_trade_date: Option<String>,
}

/// 체결은 있으나 청산 완료 포지션이 없는 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoCompletedPositions {
    /// 체결 수
    pub total_trades: usize,
    /// 청산 완료 포지션 수 (항상 0)
    pub completed_positions: usize,
    /// 안내 문구
    pub message: String,
}

/// 승률/수익률 분석 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WinRateMetrics {
    /// 조회 구간에 체결 없음
    NoTrades(NoTrades),
    /// 체결은 있으나 완료 포지션 없음
    NoCompletedPositions(NoCompletedPositions),
    /// 집계 결과
    Ready(Box<WinRateReport>),
}

impl WinRateMetrics {
    /// 거래 없음 결과를 만듭니다.
    pub fn no_trades() -> Self {
        Self::NoTrades(NoTrades::new())
    }

    /// 완료 포지션 없음 결과를 만듭니다.
    pub fn no_completed_positions(total_trades: usize) -> Self {
        Self::NoCompletedPositions(NoCompletedPositions {
            total_trades,
            completed_positions: 0,
            message: NO_POSITIONS_MESSAGE.to_string(),
        })
    }

    /// 포지션 지표를 리포트로 렌더링합니다.
    pub fn from_metrics(total_trades: usize, metrics: &PositionMetrics) -> Self {
        let stats = &metrics.stats;
        Self::Ready(Box::new(WinRateReport {
            total_trades,
            completed_positions: stats.total_trades,
            win_count: stats.winning_trades,
            loss_count: stats.losing_trades,
            win_rate: stats.win_rate_pct.to_percent_string(),
            profit_factor: stats.profit_factor.to_fixed_string(),
            net_profit: stats.net_profit.to_amount_string(),
            average_win: stats.avg_win.to_amount_string(),
            average_loss: stats.avg_loss.to_amount_string(),
            r_multiple: stats.r_multiple.to_fixed_string(2),
            expectancy: stats.expectancy.to_amount_string(),
            max_consecutive_wins: metrics.streaks.max_consecutive_wins,
            max_consecutive_losses: metrics.streaks.max_consecutive_losses,
            first_trade_date: metrics.first_entry_time.map(iso),
            last_trade_date: metrics.last_exit_time.map(iso),
        }))
    }
}

/// 스트릭 구간 (날짜 포함).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakPeriodReport {
    /// 구간 길이
    pub count: usize,
    /// 구간 시작(첫 결과 확정) 시각
    pub start_date: Option<String>,
    /// 구간 끝(마지막 결과 확정) 시각
    pub end_date: Option<String>,
}

/// 연속 승패 리포트 본문.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsecutiveReport {
    /// 완결된 결과 수 (방향 전환 수)
    pub total_completed_trades: usize,
    /// 승 수
    pub win_count: usize,
    /// 패 수
    pub loss_count: usize,
    /// 최대 연승
    pub max_consecutive_wins: usize,
    /// 최대 연패
    pub max_consecutive_losses: usize,
    /// 최장 연승 구간
    pub max_win_streak: StreakPeriodReport,
    /// 최장 연패 구간
    pub max_loss_streak: StreakPeriodReport,
    /// 진행 중인 스트릭 종류 ("win" 또는 "loss")
    pub current_streak_type: String,
    /// 진행 중인 스트릭 길이
    pub current_streak_count: usize,
}

/// 연속 승패 분석 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ConsecutiveAnalysis {
    /// 조회 구간에 체결 없음
    NoTrades(NoTrades),
    /// 분석 결과
    Ready(Box<ConsecutiveReport>),
}

impl ConsecutiveAnalysis {
    /// 거래 없음 결과를 만듭니다.
    pub fn no_trades() -> Self {
        Self::NoTrades(NoTrades::new())
    }

    /// 방향 전환 결과와 스트릭 요약을 리포트로 렌더링합니다.
    ///
    /// 스트릭 구간의 날짜는 결과가 확정된(전환이 일어난) 체결 시각으로
    /// 되짚습니다.
    pub fn from_flips(outcomes: &[FlipOutcome], summary: &StreakSummary) -> Self {
        let streak_dates = |streak: &crate::streak::Streak| StreakPeriodReport {
            count: streak.count,
            start_date: (streak.count > 0)
                .then(|| outcomes.get(streak.start_index).map(|o| iso(o.closed_at)))
                .flatten(),
            end_date: (streak.count > 0)
                .then(|| outcomes.get(streak.end_index).map(|o| iso(o.closed_at)))
                .flatten(),
        };

        let current_streak_type = match summary.current_kind {
            Some(StreakKind::Win) => "win",
            _ => "loss",
        };

        Self::Ready(Box::new(ConsecutiveReport {
            total_completed_trades: summary.total_outcomes,
            win_count: summary.win_count,
            loss_count: summary.loss_count,
            max_consecutive_wins: summary.max_consecutive_wins,
            max_consecutive_losses: summary.max_consecutive_losses,
            max_win_streak: streak_dates(&summary.max_win_streak),
            max_loss_streak: streak_dates(&summary.max_loss_streak),
            current_streak_type: current_streak_type.to_string(),
            current_streak_count: summary.current_count,
        }))
    }
}

/// 기간별 수익 항목.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicEntry {
    /// 기간 레이블 (예: "2024-03-05", "2024-W10", "2024-03")
    pub period: String,
    /// 기간 내 순현금흐름
    pub profit: String,
    /// 기간 내 체결 수
    pub trades: usize,
}

/// 기간별 수익 리포트 본문.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicReturnsReport {
    /// 집계 인터벌
    pub interval: String,
    /// 기간 수
    pub total_periods: usize,
    /// 손익 합계
    pub total_profit: String,
    /// 기간당 평균 손익
    pub average_period_profit: String,
    /// 수익 기간 수
    pub profitable_periods: usize,
    /// 손실 기간 수
    pub loss_periods: usize,
    /// 수익 기간 비율
    pub profitable_period_ratio: String,
    /// 최고 수익 기간
    pub best_period: Option<PeriodicEntry>,
    /// 최대 손실 기간
    pub worst_period: Option<PeriodicEntry>,
    /// 기간별 내역 (시간순)
    pub periodic_returns: Vec<PeriodicEntry>,
}

/// 기간별 수익 분석 결과.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PeriodicReturns {
    /// 조회 구간에 체결 없음
    NoTrades(NoTrades),
    /// 집계 결과
    Ready(Box<PeriodicReturnsReport>),
}

impl PeriodicReturns {
    /// 거래 없음 결과를 만듭니다.
    pub fn no_trades() -> Self {
        Self::NoTrades(NoTrades::new())
    }

    /// 기간별 집계를 리포트로 렌더링합니다.
    pub fn from_breakdown(breakdown: &PeriodicBreakdown) -> Self {
        let entry = |period: &str, bucket: &crate::periodic::PeriodicBucket| PeriodicEntry {
            period: period.to_string(),
            profit: bucket.profit.to_amount_string(),
            trades: bucket.trades,
        };

        let periodic_returns: Vec<_> = breakdown
            .buckets
            .iter()
            .map(|(period, bucket)| entry(period, bucket))
            .collect();

        Self::Ready(Box::new(PeriodicReturnsReport {
            interval: breakdown.interval.to_string(),
            total_periods: breakdown.total_periods(),
            total_profit: breakdown.total_profit().to_amount_string(),
            average_period_profit: breakdown.average_profit().to_amount_string(),
            profitable_periods: breakdown.profitable_periods(),
            loss_periods: breakdown.loss_periods(),
            profitable_period_ratio: breakdown.profitable_ratio_pct().to_percent_string(),
            best_period: breakdown.best().map(|(period, bucket)| entry(period, bucket)),
            worst_period: breakdown.worst().map(|(period, bucket)| entry(period, bucket)),
            periodic_returns,
        }))
    }
}
