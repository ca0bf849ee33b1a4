//! 거래 성과 분석 엔진.
//!
//! 거래소에서 조회한 체결 기록의 평평한 목록을 받아 포지션을
//! 재구성하고 성과 지표를 계산합니다. 이 크레이트는 다음을 제공합니다:
//! - 체결 정규화 (검증 + 시각 정렬)
//! - 포지션 재구성 (심볼별 슬롯, 선입선출 원장, 레거시 단일 슬롯)
//! - 연속 승패 분석
//! - 성과 지표 집계 (승률, Profit Factor, 기대값, 손익비)
//! - 달력 기간별 수익 집계
//! - 고정 소수점 문자열로 렌더링된 리포트
//!
//! 엔진은 동기적이고 호출 간 상태가 없으며 I/O를 하지 않습니다.
//! 체결 조회와 자격증명 관리는 외부 협력자의 책임입니다.
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! use tradescope_analytics::TradeAnalyzer;
//! use tradescope_core::Period;
//!
//! let analyzer = TradeAnalyzer::new();
//! let report = analyzer.performance_summary(&fills, Period::Days30)?;
//! println!("{}", tradescope_analytics::report::to_json_pretty(&report)?);
//! ```

pub mod engine;
pub mod normalize;
pub mod performance;
pub mod periodic;
pub mod reconstruct;
pub mod report;
pub mod streak;

// 엔진 re-exports
pub use engine::TradeAnalyzer;

// 재구성 re-exports
pub use reconstruct::{
    reconstruct, ClosePolicy, ReconstructConfig, Reconstruction, TrackingMode,
};

// 정규화 re-exports
pub use normalize::{filter_since, filter_symbol, normalize, sort_by_execution_time, validate_fills};

// 집계 re-exports
pub use performance::{FillFlowStats, PositionMetrics};
pub use periodic::{PeriodicBreakdown, PeriodicBucket};
pub use streak::{analyze_outcomes, flip_outcomes, profit_outcomes, Streak, StreakKind, StreakSummary};

// 리포트 re-exports
pub use report::{
    to_json_pretty, ConsecutiveAnalysis, PerformanceSummary, PeriodicReturns, WinRateMetrics,
};
