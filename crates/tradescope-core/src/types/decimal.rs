//! 정밀한 금융 계산을 위한 Decimal 유틸리티.
//!
//! 모든 금액 연산은 `rust_decimal::Decimal`로 수행합니다.
//! 이진 부동소수점은 누적 오차 때문에 금액 계산에 사용하지 않으며,
//! 고정 소수점 문자열 렌더링은 출력 직전에만 적용합니다.

use rust_decimal::{Decimal, RoundingStrategy};

/// 금융 정밀도를 위한 가격 타입.
pub type Price = Decimal;

/// 체결 수량을 위한 타입.
pub type Quantity = Decimal;

/// 퍼센트 타입 (65.5 = 65.5%).
pub type Percentage = Decimal;

/// 리포트 렌더링을 위한 Decimal 확장 트레이트.
///
/// 계산 경로에서는 호출하지 않습니다. 문자열 출력 계약:
/// 금액은 소수점 8자리, 비율은 2자리 + `%` 접미사입니다.
pub trait DecimalExt {
    /// 지정된 자릿수로 반올림한 고정 소수점 문자열을 반환합니다.
    fn to_fixed_string(&self, dp: u32) -> String;

    /// 금액 문자열로 변환합니다 (소수점 8자리).
    fn to_amount_string(&self) -> String;

    /// 퍼센트 문자열로 변환합니다 (예: "65.50%").
    fn to_percent_string(&self) -> String;
}

impl DecimalExt for Decimal {
    fn to_fixed_string(&self, dp: u32) -> String {
        let rounded = self.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        format!("{:.prec$}", rounded, prec = dp as usize)
    }

    fn to_amount_string(&self) -> String {
        self.to_fixed_string(8)
    }

    fn to_percent_string(&self) -> String {
        format!("{}%", self.to_fixed_string(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_amount_string_pads_to_eight_places() {
        assert_eq!(dec!(10).to_amount_string(), "10.00000000");
        assert_eq!(dec!(-0.5).to_amount_string(), "-0.50000000");
    }

    #[test]
    fn test_amount_string_rounds_midpoint_away() {
        assert_eq!(dec!(0.000000005).to_amount_string(), "0.00000001");
    }

    #[test]
    fn test_percent_string() {
        assert_eq!(dec!(65.5).to_percent_string(), "65.50%");
        assert_eq!(dec!(66.666666).to_percent_string(), "66.67%");
    }
}
