//! 거래 심볼 정의.
//!
//! 거래소 체결 기록이 사용하는 `"BASE/QUOTE"` 형식(예: "BTC/USDT")의
//! 심볼 타입을 정의합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래 가능한 상품을 나타내는 트레이딩 심볼.
///
/// 기준 자산과 호가 자산으로 구성됩니다. 예: BTC/USDT.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC, ETH)
    pub base: String,
    /// 호가 자산 (예: USDT, KRW)
    pub quote: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// "BASE/QUOTE" 형식 문자열에서 심볼을 파싱합니다.
    pub fn parse(s: &str) -> Option<Self> {
        let (base, quote) = s.split_once('/')?;
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self::new(base, quote))
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        let symbol = Symbol::parse("BTC/USDT").unwrap();
        assert_eq!(symbol.base, "BTC");
        assert_eq!(symbol.quote, "USDT");
        assert_eq!(symbol.to_string(), "BTC/USDT");
    }

    #[test]
    fn test_parse_normalizes_case() {
        let symbol = Symbol::parse("eth/krw").unwrap();
        assert_eq!(symbol.to_string(), "ETH/KRW");
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert!(Symbol::parse("BTCUSDT").is_none());
        assert!(Symbol::parse("/USDT").is_none());
        assert!(Symbol::parse("BTC/").is_none());
    }
}
