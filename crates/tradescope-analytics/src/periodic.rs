//! 달력 기간별 수익 집계.
//!
//! 정규화된 체결 시퀀스를 달력 버킷(일/주/월)으로 묶고 버킷별
//! 순현금흐름을 집계합니다.
//!
//! 버킷 손익은 체결 단위 현금 흐름 관점([`Fill::net_value`])입니다.
//! 매수는 자금 유출, 매도는 자금 유입으로만 계산하며, 포지션 매칭
//! 손익과는 의도적으로 다른 값입니다. 두 관점을 섞어 쓰면 안 됩니다.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tradescope_core::{Fill, Interval};

/// 버킷 하나의 집계.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeriodicBucket {
    /// 버킷 내 순현금흐름 (수수료 차감)
    pub profit: Decimal,
    /// 버킷 내 체결 수
    pub trades: usize,
}

/// 인터벌 하나에 대한 기간별 집계.
///
/// 버킷 맵은 키(기간 레이블) 사전순으로 순회되며, 사용되는 키 형식에서
/// 사전순은 곧 시간순입니다.
#[derive(Debug, Clone, Serialize)]
pub struct PeriodicBreakdown {
    /// 집계 인터벌
    pub interval: Interval,
    /// 기간 키 → 버킷
    pub buckets: BTreeMap<String, PeriodicBucket>,
}

impl PeriodicBreakdown {
    /// 정규화된 체결 시퀀스를 버킷에 나눠 담습니다.
    pub fn from_fills(fills: &[Fill], interval: Interval) -> Self {
        let mut buckets: BTreeMap<String, PeriodicBucket> = BTreeMap::new();

        for fill in fills {
            let key = interval.bucket_key(fill.executed_at);
            let bucket = buckets.entry(key).or_default();
            bucket.profit += fill.net_value();
            bucket.trades += 1;
        }

        Self { interval, buckets }
    }

    /// 버킷 수를 반환합니다.
    pub fn total_periods(&self) -> usize {
        self.buckets.len()
    }

    /// 전체 버킷의 손익 합계를 반환합니다.
    pub fn total_profit(&self) -> Decimal {
        self.buckets.values().map(|b| b.profit).sum()
    }

    /// 버킷당 평균 손익을 반환합니다.
    pub fn average_profit(&self) -> Decimal {
        if self.buckets.is_empty() {
            return Decimal::ZERO;
        }
        self.total_profit() / Decimal::from(self.buckets.len())
    }

    /// 손익이 양수인 버킷 수를 반환합니다.
    pub fn profitable_periods(&self) -> usize {
        self.buckets
            .values()
            .filter(|b| b.profit > Decimal::ZERO)
            .count()
    }

    /// 손익이 음수인 버킷 수를 반환합니다.
    pub fn loss_periods(&self) -> usize {
        self.buckets
            .values()
            .filter(|b| b.profit < Decimal::ZERO)
            .count()
    }

    /// 손익이 양수인 버킷의 비율(%)을 반환합니다.
    pub fn profitable_ratio_pct(&self) -> Decimal {
        if self.buckets.is_empty() {
            return Decimal::ZERO;
        }
        Decimal::from(self.profitable_periods()) / Decimal::from(self.buckets.len())
            * Decimal::from(100)
    }

    /// 손익이 가장 큰 버킷을 반환합니다 (동률이면 먼저 나온 기간).
    pub fn best(&self) -> Option<(&str, &PeriodicBucket)> {
        self.extreme_by(|candidate, best| candidate > best)
    }

    /// 손익이 가장 작은 버킷을 반환합니다 (동률이면 먼저 나온 기간).
    pub fn worst(&self) -> Option<(&str, &PeriodicBucket)> {
        self.extreme_by(|candidate, worst| candidate < worst)
    }

    fn extreme_by(
        &self,
        replaces: impl Fn(Decimal, Decimal) -> bool,
    ) -> Option<(&str, &PeriodicBucket)> {
        let mut result: Option<(&str, &PeriodicBucket)> = None;
        for (key, bucket) in &self.buckets {
            match result {
                Some((_, current)) if !replaces(bucket.profit, current.profit) => {}
                _ => result = Some((key.as_str(), bucket)),
            }
        }
        result
    }
}
