//! 체결 정규화.
//!
//! 분석 파이프라인의 첫 단계입니다. 거래소 응답 그대로의 체결 기록을
//! 검증하고 체결 시각 오름차순으로 정렬합니다.
//!
//! 빈 입력은 에러가 아니라 유효한 종단 상태입니다. 이후 모든 단계는
//! 빈 시퀀스를 받으면 "거래 없음" 결과를 만들어야 합니다.

use chrono::{DateTime, Utc};
use tradescope_core::{AnalyticsResult, Fill, RawFill, Symbol};

/// 체결 기록을 검증합니다.
///
/// 하나라도 필수 필드가 빠져 있으면 분석 전체가 중단됩니다.
/// 부분 결과는 반환하지 않습니다.
pub fn validate_fills(raw: &[RawFill]) -> AnalyticsResult<Vec<Fill>> {
    raw.iter()
        .enumerate()
        .map(|(index, fill)| fill.validate(index))
        .collect()
}

/// 체결 시각 오름차순으로 정렬합니다.
///
/// 안정 정렬이므로 같은 시각의 체결은 입력 순서를 유지하며,
/// 이미 정렬된 입력에 다시 적용해도 결과가 바뀌지 않습니다.
pub fn sort_by_execution_time(mut fills: Vec<Fill>) -> Vec<Fill> {
    fills.sort_by_key(|fill| fill.executed_at);
    fills
}

/// 검증과 정렬을 한 번에 수행합니다.
pub fn normalize(raw: &[RawFill]) -> AnalyticsResult<Vec<Fill>> {
    Ok(sort_by_execution_time(validate_fills(raw)?))
}

/// 조회 하한 이전의 체결을 걸러냅니다.
///
/// 하한 적용은 원래 체결을 가져오는 쪽의 책임이지만,
/// 상류에서 거르지 않은 입력을 위해 같은 규칙을 제공합니다.
pub fn filter_since(fills: Vec<Fill>, since: Option<DateTime<Utc>>) -> Vec<Fill> {
    match since {
        Some(bound) => fills
            .into_iter()
            .filter(|fill| fill.executed_at >= bound)
            .collect(),
        None => fills,
    }
}

/// 특정 심볼의 체결만 남깁니다.
pub fn filter_symbol(fills: Vec<Fill>, symbol: Option<&Symbol>) -> Vec<Fill> {
    match symbol {
        Some(target) => fills
            .into_iter()
            .filter(|fill| &fill.symbol == target)
            .collect(),
        None => fills,
    }
}
