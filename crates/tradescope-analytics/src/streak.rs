//! 연속 승패 분석.
//!
//! 승/패 결과 시퀀스에서 최장 연승/연패 구간과 현재 진행 중인
//! 스트릭을 계산합니다.
//!
//! 결과 시퀀스를 만드는 방법은 두 가지이며 서로 다른 질문에 답합니다:
//! - [`profit_outcomes`]: 청산 완료 포지션의 확정 손익 기준.
//!   수수료까지 반영해 "이 포지션이 실제로 남는 장사였는가"를 본다.
//! - [`flip_outcomes`]: 체결 방향 전환 시점의 가격 비교 기준.
//!   수수료와 무관하게 "방향 전환이 가격상 유리했는가"만 본다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradescope_core::{Fill, Position, Side};

/// 스트릭 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakKind {
    /// 연승
    Win,
    /// 연패
    Loss,
}

/// 결과 시퀀스 위의 연속 구간.
///
/// `count > 0`이면 `count == end_index - start_index + 1`이 성립합니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// 구간 길이
    pub count: usize,
    /// 시작 인덱스 (결과 시퀀스 기준)
    pub start_index: usize,
    /// 끝 인덱스 (결과 시퀀스 기준)
    pub end_index: usize,
}

/// 연속 승패 분석 결과.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreakSummary {
    /// 결과 수
    pub total_outcomes: usize,
    /// 승 수
    pub win_count: usize,
    /// 패 수
    pub loss_count: usize,
    /// 최대 연승 횟수
    pub max_consecutive_wins: usize,
    /// 최대 연패 횟수
    pub max_consecutive_losses: usize,
    /// 최장 연승 구간 (동률이면 먼저 나온 구간)
    pub max_win_streak: Streak,
    /// 최장 연패 구간 (동률이면 먼저 나온 구간)
    pub max_loss_streak: Streak,
    /// 시퀀스 끝에서 진행 중인 스트릭 종류 (빈 입력이면 None)
    pub current_kind: Option<StreakKind>,
    /// 진행 중인 스트릭 길이
    pub current_count: usize,
}

/// 승/패 결과 시퀀스를 분석합니다.
///
/// 결과 하나만 있어도 길이 1의 스트릭입니다. 빈 입력은 에러가 아니라
/// 전부 0인 요약을 반환합니다.
pub fn analyze_outcomes(outcomes: &[bool]) -> StreakSummary {
    let mut summary = StreakSummary {
        total_outcomes: outcomes.len(),
        ..Default::default()
    };

    let mut run_kind: Option<StreakKind> = None;
    let mut run_len = 0usize;

    for (index, &won) in outcomes.iter().enumerate() {
        let kind = if won { StreakKind::Win } else { StreakKind::Loss };
        if won {
            summary.win_count += 1;
        } else {
            summary.loss_count += 1;
        }

        if run_kind == Some(kind) {
            run_len += 1;
        } else {
            run_kind = Some(kind);
            run_len = 1;
        }

        let run = Streak {
            count: run_len,
            start_index: index + 1 - run_len,
            end_index: index,
        };

        // 동률일 때는 먼저 나온 구간을 유지한다
        match kind {
            StreakKind::Win => {
                summary.max_consecutive_wins = summary.max_consecutive_wins.max(run_len);
                if run.count > summary.max_win_streak.count {
                    summary.max_win_streak = run;
                }
            }
            StreakKind::Loss => {
                summary.max_consecutive_losses = summary.max_consecutive_losses.max(run_len);
                if run.count > summary.max_loss_streak.count {
                    summary.max_loss_streak = run;
                }
            }
        }
    }

    summary.current_kind = run_kind;
    summary.current_count = run_len;
    summary
}

/// 청산 완료 포지션 목록에서 손익 기준 결과 시퀀스를 만듭니다.
///
/// 손익이 정확히 0인 포지션은 패로 분류합니다.
pub fn profit_outcomes(closed: &[Position]) -> Vec<bool> {
    closed.iter().map(Position::is_winner).collect()
}

/// 방향 전환 하나가 만든 결과.
///
/// 스트릭 구간을 실제 날짜로 되짚을 수 있도록
/// 진입/전환 시각을 함께 보관합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlipOutcome {
    /// 가격상 유리한 전환이었는지
    pub won: bool,
    /// 진입 시각
    pub opened_at: DateTime<Utc>,
    /// 전환(청산) 시각
    pub closed_at: DateTime<Utc>,
}

/// 체결 시퀀스에서 방향 전환 기준 결과 시퀀스를 만듭니다.
///
/// 첫 체결이 진입이 되고, 반대 방향 체결이 나올 때마다 진입가와
/// 전환가를 비교해 승패 하나를 기록한 뒤 그 체결가로 재진입합니다.
/// 같은 방향 체결은 진입가를 바꾸지 않으며, 심볼은 구분하지 않습니다.
/// 수수료도 반영하지 않습니다. 확정 손익 기준 분석과는 의도적으로
/// 다른 관점입니다.
pub fn flip_outcomes(fills: &[Fill]) -> Vec<FlipOutcome> {
    let mut outcomes = Vec::new();
    let mut entry: Option<(Side, rust_decimal::Decimal, DateTime<Utc>)> = None;

    for fill in fills {
        match entry {
            None => {
                entry = Some((fill.side, fill.price, fill.executed_at));
            }
            Some((side, entry_price, opened_at)) if side != fill.side => {
                let won = match side {
                    Side::Buy => fill.price > entry_price,
                    Side::Sell => fill.price < entry_price,
                };
                outcomes.push(FlipOutcome {
                    won,
                    opened_at,
                    closed_at: fill.executed_at,
                });
                entry = Some((fill.side, fill.price, fill.executed_at));
            }
            Some(_) => {}
        }
    }

    outcomes
}
