//! 분석 기간 및 집계 인터벌 정의.
//!
//! 이 모듈은 기간별 수익률 집계에 사용되는 타입을 정의합니다:
//! - `Interval` - 집계 단위 (일간/주간/월간)와 달력 버킷 키 유도
//! - `Period` - 분석 대상 기간 ("7d", "30d" 등)과 조회 하한 계산

use crate::error::AnalyticsError;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 수익률 집계 인터벌.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    /// 일간 집계
    Daily,
    /// 주간 집계 (ISO-8601 주)
    Weekly,
    /// 월간 집계
    Monthly,
}

impl Interval {
    /// 인터벌 문자열을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
        }
    }

    /// 주어진 시각이 속하는 달력 버킷의 키를 반환합니다.
    ///
    /// 키 형식은 사전순 정렬이 곧 시간순 정렬이 되도록 자릿수를 고정합니다:
    /// - 일간: `YYYY-MM-DD` (UTC 기준)
    /// - 주간: `YYYY-Www` (ISO-8601 주차, 주차 연도 기준, 2자리)
    /// - 월간: `YYYY-MM`
    pub fn bucket_key(&self, at: DateTime<Utc>) -> String {
        match self {
            Interval::Daily => at.format("%Y-%m-%d").to_string(),
            Interval::Weekly => {
                let week = at.iso_week();
                format!("{:04}-W{:02}", week.year(), week.week())
            }
            Interval::Monthly => format!("{:04}-{:02}", at.year(), at.month()),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Interval {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            _ => Err(AnalyticsError::InvalidInterval(s.to_string())),
        }
    }
}

/// 분석 대상 기간.
///
/// 체결 내역 조회의 하한(`since`)을 계산하기 위한 선택지입니다.
/// 하한 적용 자체는 엔진 호출 전 단계의 책임이며, 엔진은 레이블만
/// 리포트에 기록합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// 최근 7일
    #[serde(rename = "7d")]
    Days7,
    /// 최근 30일
    #[serde(rename = "30d")]
    Days30,
    /// 최근 90일
    #[serde(rename = "90d")]
    Days90,
    /// 최근 180일
    #[serde(rename = "180d")]
    Days180,
    /// 최근 1년
    #[serde(rename = "1y")]
    Year1,
    /// 전체 기간
    All,
}

impl Period {
    /// 기간 레이블을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Days7 => "7d",
            Period::Days30 => "30d",
            Period::Days90 => "90d",
            Period::Days180 => "180d",
            Period::Year1 => "1y",
            Period::All => "all",
        }
    }

    /// 기준 시각에서 거꾸로 계산한 조회 하한을 반환합니다.
    ///
    /// `All`은 하한이 없으므로 `None`입니다.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let days = match self {
            Period::Days7 => 7,
            Period::Days30 => 30,
            Period::Days90 => 90,
            Period::Days180 => 180,
            Period::Year1 => 365,
            Period::All => return None,
        };
        Some(now - Duration::days(days))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "7d" => Ok(Period::Days7),
            "30d" => Ok(Period::Days30),
            "90d" => Ok(Period::Days90),
            "180d" => Ok(Period::Days180),
            "1y" => Ok(Period::Year1),
            "all" => Ok(Period::All),
            _ => Err(AnalyticsError::InvalidPeriod(s.to_string())),
        }
    }
}
