//! 거래 통계 집계 공통 로직.
//!
//! 청산이 완료된 포지션 목록에서 승률, Profit Factor, 기대값 등
//! 성과 지표를 집계합니다. 집계 산술은 전부 `Decimal`로 수행하며,
//! 고정 소수점 문자열 렌더링은 리포트 계층의 몫입니다.

use crate::types::{DecimalExt, Percentage, Symbol};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Profit Factor (총수익 / 총손실).
///
/// 손실이 전혀 없는 구간에서는 비율이 정의되지 않으므로,
/// 매직 넘버 대신 명시적인 `Infinite` 값으로 표현합니다.
/// 직렬화 시에는 "Infinity"라는 구분 가능한 문자열이 됩니다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfitFactor {
    /// 총손실 > 0일 때의 유한한 비율
    Finite(Decimal),
    /// 손실 없이 수익만 있는 경우
    Infinite,
}

impl Serialize for ProfitFactor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ProfitFactor::Finite(value) => Serialize::serialize(value, serializer),
            ProfitFactor::Infinite => serializer.serialize_str("Infinity"),
        }
    }
}

impl<'de> Deserialize<'de> for ProfitFactor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Value(Decimal),
            Marker(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Value(value) => Ok(ProfitFactor::Finite(value)),
            Repr::Marker(s) if s == "Infinity" => Ok(ProfitFactor::Infinite),
            Repr::Marker(s) => Err(serde::de::Error::custom(format!(
                "invalid profit factor: {}",
                s
            ))),
        }
    }
}

impl ProfitFactor {
    /// 총수익과 총손실에서 Profit Factor를 계산합니다.
    ///
    /// - 총손실 > 0: 유한한 비율
    /// - 총손실 == 0, 총수익 > 0: `Infinite`
    /// - 둘 다 0: `Finite(0)`
    pub fn from_totals(gross_profit: Decimal, gross_loss: Decimal) -> Self {
        if gross_loss > Decimal::ZERO {
            ProfitFactor::Finite(gross_profit / gross_loss)
        } else if gross_profit > Decimal::ZERO {
            ProfitFactor::Infinite
        } else {
            ProfitFactor::Finite(Decimal::ZERO)
        }
    }

    /// 무한대인지 확인합니다.
    pub fn is_infinite(&self) -> bool {
        matches!(self, ProfitFactor::Infinite)
    }

    /// 소수점 2자리 문자열로 렌더링합니다. 무한대는 "Infinity"입니다.
    pub fn to_fixed_string(&self) -> String {
        match self {
            ProfitFactor::Finite(value) => value.to_fixed_string(2),
            ProfitFactor::Infinite => "Infinity".to_string(),
        }
    }
}

impl Default for ProfitFactor {
    fn default() -> Self {
        ProfitFactor::Finite(Decimal::ZERO)
    }
}

/// 통계 집계가 거래 타입에서 요구하는 정보.
///
/// 재구성된 포지션 등 다양한 거래 표현에서 집계에 필요한 값을
/// 추출하기 위한 인터페이스입니다.
pub trait TradeInfo {
    /// 거래 심볼.
    fn symbol(&self) -> &Symbol;

    /// 확정 순손익 (수수료 차감 후).
    ///
    /// 미청산 거래는 `None`이며 집계에서 제외됩니다.
    fn net_profit(&self) -> Option<Decimal>;

    /// 수수료 (진입 + 청산). 리포트용이며 손익에 이미 반영되어 있습니다.
    fn fees(&self) -> Decimal;

    /// 진입 시각.
    fn entry_time(&self) -> DateTime<Utc>;

    /// 청산 시각. 미청산이면 `None`.
    fn exit_time(&self) -> Option<DateTime<Utc>>;

    /// 보유 기간.
    fn holding_duration(&self) -> Option<Duration> {
        self.exit_time()
            .map(|exit| exit.signed_duration_since(self.entry_time()))
    }
}

/// 거래 통계 집계.
///
/// 승률, Profit Factor, 평균 손익, 기대값, 손익비를 요약합니다.
/// 손익이 정확히 0인 거래는 손실로 분류하므로
/// `winning_trades + losing_trades == total_trades`가 항상 성립합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeStatistics {
    /// 집계된 (청산 완료) 거래 횟수
    pub total_trades: usize,
    /// 수익 거래 횟수 (손익 > 0)
    pub winning_trades: usize,
    /// 손실 거래 횟수 (손익 <= 0)
    pub losing_trades: usize,
    /// 승률 (백분율, 예: 65.5 = 65.5%)
    pub win_rate_pct: Percentage,
    /// 총 수익 (수익 거래 합계)
    pub gross_profit: Decimal,
    /// 총 손실 (손실 거래 합계, 양수)
    pub gross_loss: Decimal,
    /// 순손익 (총수익 - 총손실)
    pub net_profit: Decimal,
    /// Profit Factor (총수익 / 총손실)
    pub profit_factor: ProfitFactor,
    /// 평균 수익 (수익 거래만)
    pub avg_win: Decimal,
    /// 평균 손실 (손실 거래만, 양수)
    pub avg_loss: Decimal,
    /// 최대 수익 거래
    pub largest_win: Decimal,
    /// 최대 손실 거래 (양수)
    pub largest_loss: Decimal,
    /// 기대값 (승률×평균수익 - 패률×평균손실)
    pub expectancy: Decimal,
    /// 손익비 R-multiple (평균수익 / 평균손실, 평균손실 0이면 0)
    pub r_multiple: Decimal,
    /// 총 수수료
    pub total_fees: Decimal,
    /// 평균 보유 기간
    #[serde(skip, default = "Duration::zero")]
    pub avg_holding_period: Duration,
}

impl Default for TradeStatistics {
    fn default() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate_pct: Decimal::ZERO,
            gross_profit: Decimal::ZERO,
            gross_loss: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            profit_factor: ProfitFactor::default(),
            avg_win: Decimal::ZERO,
            avg_loss: Decimal::ZERO,
            largest_win: Decimal::ZERO,
            largest_loss: Decimal::ZERO,
            expectancy: Decimal::ZERO,
            r_multiple: Decimal::ZERO,
            total_fees: Decimal::ZERO,
            avg_holding_period: Duration::zero(),
        }
    }
}

impl TradeStatistics {
    /// 거래 목록으로부터 통계를 계산합니다.
    ///
    /// 미청산 거래(`net_profit() == None`)는 집계에서 제외됩니다.
    /// 각 거래의 손익은 이미 수수료가 차감된 값으로 간주하며,
    /// 수수료는 리포트용으로만 따로 합산합니다.
    pub fn from_trades<T: TradeInfo>(trades: &[T]) -> Self {
        let mut stats = Self::default();

        let mut total_holding = Duration::zero();

        for trade in trades {
            let Some(net) = trade.net_profit() else {
                continue;
            };

            stats.total_trades += 1;
            stats.total_fees += trade.fees();
            stats.net_profit += net;

            if net > Decimal::ZERO {
                stats.winning_trades += 1;
                stats.gross_profit += net;
                if net > stats.largest_win {
                    stats.largest_win = net;
                }
            } else {
                // 손익 0도 손실로 분류한다
                stats.losing_trades += 1;
                let loss = net.abs();
                stats.gross_loss += loss;
                if loss > stats.largest_loss {
                    stats.largest_loss = loss;
                }
            }

            if let Some(duration) = trade.holding_duration() {
                total_holding += duration;
            }
        }

        if stats.total_trades == 0 {
            return stats;
        }

        let total = Decimal::from(stats.total_trades);
        stats.win_rate_pct = Decimal::from(stats.winning_trades) / total * dec!(100);

        stats.profit_factor = ProfitFactor::from_totals(stats.gross_profit, stats.gross_loss);

        if stats.winning_trades > 0 {
            stats.avg_win = stats.gross_profit / Decimal::from(stats.winning_trades);
        }
        if stats.losing_trades > 0 {
            stats.avg_loss = stats.gross_loss / Decimal::from(stats.losing_trades);
        }

        // 기대값: (승률 × 평균수익) - (패률 × 평균손실)
        let win_prob = Decimal::from(stats.winning_trades) / total;
        let loss_prob = Decimal::from(stats.losing_trades) / total;
        stats.expectancy = win_prob * stats.avg_win - loss_prob * stats.avg_loss;

        if stats.avg_loss > Decimal::ZERO {
            stats.r_multiple = stats.avg_win / stats.avg_loss;
        }

        stats.avg_holding_period = total_holding / stats.total_trades as i32;

        stats
    }

    /// 평균 거래당 순손익.
    pub fn avg_trade_profit(&self) -> Decimal {
        if self.total_trades > 0 {
            self.net_profit / Decimal::from(self.total_trades)
        } else {
            Decimal::ZERO
        }
    }
}
