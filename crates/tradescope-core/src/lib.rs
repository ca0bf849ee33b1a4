//! # Tradescope Core
//!
//! 거래 성과 분석 엔진의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 분석 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 체결(Fill) 기록 및 검증
//! - 재구성된 포지션 타입
//! - 손익 계산 공통 로직
//! - 거래 통계 집계
//! - 기간 및 인터벌 정의
//! - 에러 타입
//! - 로깅 인프라

pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
