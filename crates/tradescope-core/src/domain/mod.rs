//! 거래 성과 분석의 도메인 모델.

pub mod calculations;
pub mod fill;
pub mod position;
pub mod statistics;

pub use calculations::*;
pub use fill::*;
pub use position::*;
pub use statistics::*;
