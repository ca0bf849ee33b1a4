//! 체결(Fill) 기록.
//!
//! 이 모듈은 거래소 체결 관련 타입을 정의합니다:
//! - `Side` - 체결 방향 (매수/매도)
//! - `RawFill` - 거래소 응답 그대로의 체결 기록 (모든 분석 필드가 선택적)
//! - `Fill` - 검증이 끝난 거래소 중립적 체결 기록
//!
//! 거래소 커넥터가 반환한 `RawFill`은 분석 전에 반드시 `Fill`로
//! 변환되어야 하며, 필수 필드가 빠진 기록은 분석 전체를 중단시킵니다.

use crate::error::{AnalyticsError, AnalyticsResult};
use crate::types::{Price, Quantity, Symbol};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 체결 방향 (매수 또는 매도).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// 매수
    Buy,
    /// 매도
    Sell,
}

impl Side {
    /// 반대 방향을 반환합니다.
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// 거래소 응답의 수수료 항목.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFee {
    /// 수수료 금액
    pub cost: Option<Decimal>,
    /// 수수료 통화
    pub currency: Option<String>,
}

/// 거래소 응답 그대로의 체결 기록.
///
/// 외부 클라이언트가 역직렬화한 형태이며, 모든 분석 필드가 선택적입니다.
/// 필드 누락은 `AnalyticsError::MalformedFill`로 이어집니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFill {
    /// 거래 심볼 ("BTC/USDT" 형식)
    pub symbol: Option<String>,
    /// 체결 방향 ("buy" 또는 "sell")
    pub side: Option<String>,
    /// 체결 가격
    pub price: Option<Decimal>,
    /// 체결 수량
    pub amount: Option<Decimal>,
    /// 수수료
    pub fee: Option<RawFee>,
    /// 체결 타임스탬프 (epoch 밀리초)
    pub timestamp: Option<i64>,
    /// 체결 일시 (ISO-8601)
    pub datetime: Option<String>,
}

impl RawFill {
    /// 필수 필드를 검증하고 거래소 중립적 `Fill`로 변환합니다.
    ///
    /// # Arguments
    ///
    /// * `index` - 입력 배열에서의 위치 (에러 메시지에 포함)
    ///
    /// # Errors
    ///
    /// `side`/`price`/`amount`/`symbol`이 없거나 유효하지 않으면,
    /// 또는 `timestamp`와 `datetime`이 모두 없으면
    /// `AnalyticsError::MalformedFill`을 반환합니다.
    pub fn validate(&self, index: usize) -> AnalyticsResult<Fill> {
        let malformed = |field: &'static str| AnalyticsError::MalformedFill { index, field };

        let symbol = self
            .symbol
            .as_deref()
            .and_then(Symbol::parse)
            .ok_or_else(|| malformed("symbol"))?;

        let side = match self.side.as_deref() {
            Some(s) if s.eq_ignore_ascii_case("buy") => Side::Buy,
            Some(s) if s.eq_ignore_ascii_case("sell") => Side::Sell,
            _ => return Err(malformed("side")),
        };

        let price = self
            .price
            .filter(|p| *p > Decimal::ZERO)
            .ok_or_else(|| malformed("price"))?;

        let amount = self
            .amount
            .filter(|a| *a > Decimal::ZERO)
            .ok_or_else(|| malformed("amount"))?;

        // 타임스탬프는 epoch-ms를 우선하고, 없으면 ISO 문자열을 파싱한다
        let executed_at = match self.timestamp {
            Some(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| malformed("timestamp"))?,
            None => self
                .datetime
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc))
                .ok_or_else(|| malformed("timestamp"))?,
        };

        let fee_cost = self
            .fee
            .as_ref()
            .and_then(|f| f.cost)
            .unwrap_or(Decimal::ZERO);
        let fee_currency = self.fee.as_ref().and_then(|f| f.currency.clone());

        Ok(Fill {
            symbol,
            side,
            price,
            amount,
            fee_cost,
            fee_currency,
            executed_at,
        })
    }
}

/// 검증이 끝난 거래소 중립적 체결 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// 거래 심볼
    pub symbol: Symbol,
    /// 체결 방향
    pub side: Side,
    /// 체결 가격
    pub price: Price,
    /// 체결 수량
    pub amount: Quantity,
    /// 수수료 금액
    pub fee_cost: Decimal,
    /// 수수료 통화
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_currency: Option<String>,
    /// 체결 시각
    pub executed_at: DateTime<Utc>,
}

impl Fill {
    /// 새 체결 기록을 생성합니다.
    pub fn new(symbol: Symbol, side: Side, price: Price, amount: Quantity) -> Self {
        Self {
            symbol,
            side,
            price,
            amount,
            fee_cost: Decimal::ZERO,
            fee_currency: None,
            executed_at: Utc::now(),
        }
    }

    /// 수수료를 설정합니다.
    pub fn with_fee(mut self, cost: Decimal, currency: impl Into<String>) -> Self {
        self.fee_cost = cost;
        self.fee_currency = Some(currency.into());
        self
    }

    /// 체결 시각을 설정합니다.
    pub fn with_executed_at(mut self, executed_at: DateTime<Utc>) -> Self {
        self.executed_at = executed_at;
        self
    }

    /// 체결의 명목 가치를 반환합니다 (가격 × 수량).
    pub fn notional(&self) -> Decimal {
        self.price * self.amount
    }

    /// 현금 흐름 관점의 순가치를 반환합니다 (매수: 음수, 매도: 양수).
    ///
    /// 포지션 매칭 없이 체결 단위로 자금 유출입만 보는 단순화된 관점이며,
    /// 매칭된 포지션 손익과는 의도적으로 다른 값입니다.
    pub fn net_value(&self) -> Decimal {
        match self.side {
            Side::Buy => -self.notional() - self.fee_cost,
            Side::Sell => self.notional() - self.fee_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn raw(symbol: &str, side: &str, price: Decimal, amount: Decimal, ts: i64) -> RawFill {
        RawFill {
            symbol: Some(symbol.to_string()),
            side: Some(side.to_string()),
            price: Some(price),
            amount: Some(amount),
            fee: Some(RawFee {
                cost: Some(dec!(0.1)),
                currency: Some("USDT".to_string()),
            }),
            timestamp: Some(ts),
            datetime: None,
        }
    }

    #[test]
    fn test_validate_ok() {
        let fill = raw("BTC/USDT", "buy", dec!(50000), dec!(0.1), 1_700_000_000_000)
            .validate(0)
            .unwrap();

        assert_eq!(fill.symbol.to_string(), "BTC/USDT");
        assert_eq!(fill.side, Side::Buy);
        assert_eq!(fill.fee_cost, dec!(0.1));
        assert_eq!(fill.executed_at.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn test_validate_missing_price() {
        let mut r = raw("BTC/USDT", "sell", dec!(1), dec!(1), 0);
        r.price = None;

        let err = r.validate(2).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::MalformedFill { index: 2, field: "price" }
        ));
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        let mut r = raw("BTC/USDT", "sell", dec!(1), dec!(1), 0);
        r.amount = Some(Decimal::ZERO);

        let err = r.validate(0).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::MalformedFill { field: "amount", .. }
        ));
    }

    #[test]
    fn test_validate_unknown_side() {
        let mut r = raw("BTC/USDT", "hold", dec!(1), dec!(1), 0);
        r.side = Some("hold".to_string());

        let err = r.validate(1).unwrap_err();
        assert!(matches!(
            err,
            AnalyticsError::MalformedFill { field: "side", .. }
        ));
    }

    #[test]
    fn test_validate_datetime_fallback() {
        let mut r = raw("BTC/USDT", "buy", dec!(1), dec!(1), 0);
        r.timestamp = None;
        r.datetime = Some("2024-03-05T12:00:00Z".to_string());

        let fill = r.validate(0).unwrap();
        assert_eq!(fill.executed_at.to_rfc3339(), "2024-03-05T12:00:00+00:00");
    }

    #[test]
    fn test_net_value_sign_convention() {
        let symbol = Symbol::new("BTC", "USDT");
        let buy = Fill::new(symbol.clone(), Side::Buy, dec!(100), dec!(2)).with_fee(dec!(1), "USDT");
        let sell = Fill::new(symbol, Side::Sell, dec!(100), dec!(2)).with_fee(dec!(1), "USDT");

        // 매수: -(100*2) - 1, 매도: (100*2) - 1
        assert_eq!(buy.net_value(), dec!(-201));
        assert_eq!(sell.net_value(), dec!(199));
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }
}
