//! 체결 흐름에서 포지션을 재구성합니다.
//!
//! 정렬된 체결 시퀀스를 한 번 훑으면서 청산 완료 포지션 목록과
//! 아직 열려 있는 포지션들을 만들어 냅니다.
//!
//! # 추적 모드
//!
//! - [`TrackingMode::PerSymbol`] (기본): 심볼별로 독립된 슬롯을 유지하며,
//!   다른 심볼의 체결이 서로 합쳐지거나 청산되는 일이 없습니다.
//! - [`TrackingMode::SingleSlot`]: 전역 슬롯 하나만 쓰는 레거시 모드.
//!   초기 버전의 출력과 비교할 때만 사용합니다. 이 모드에서는 방향이
//!   같으면 심볼이 달라도 같은 슬롯에 누적되는 알려진 한계가 있습니다.
//!
//! # 청산 정책
//!
//! - [`ClosePolicy::Full`] (기본): 반대 방향 체결은 수량과 무관하게
//!   포지션 전체를 청산하며, 청산 체결 자체는 새 포지션을 열지 않습니다.
//! - [`ClosePolicy::Fifo`]: 수량 매칭 원장. 진입 로트를 선입선출로
//!   소진하고, 남은 로트는 이월하며, 청산 수량이 초과하면 초과분이
//!   반대 방향의 새 포지션으로 반전됩니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use tradescope_core::{Fill, Position, Price, Quantity, Side, Symbol};

/// 포지션 슬롯을 어떻게 나눌지 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// 심볼별 독립 슬롯 (기본)
    #[default]
    PerSymbol,
    /// 전역 슬롯 하나 (레거시 출력 호환용)
    SingleSlot,
}

/// 반대 방향 체결이 포지션을 어떻게 닫을지 결정합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosePolicy {
    /// 수량과 무관하게 전체 청산 (기본)
    #[default]
    Full,
    /// 선입선출 수량 매칭 (부분 청산 및 반전 지원)
    Fifo,
}

/// 포지션 재구성 설정.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReconstructConfig {
    /// 슬롯 추적 모드
    pub tracking: TrackingMode,
    /// 청산 정책 (`SingleSlot` 모드에서는 항상 전체 청산)
    pub close_policy: ClosePolicy,
}

impl ReconstructConfig {
    /// 레거시 출력 호환 설정을 반환합니다.
    pub fn compat() -> Self {
        Self {
            tracking: TrackingMode::SingleSlot,
            close_policy: ClosePolicy::Full,
        }
    }

    /// 선입선출 수량 매칭 설정을 반환합니다.
    pub fn fifo() -> Self {
        Self {
            tracking: TrackingMode::PerSymbol,
            close_policy: ClosePolicy::Fifo,
        }
    }
}

/// 재구성 결과.
///
/// 집계 통계는 청산 완료 포지션만 사용하지만, 미청산 포지션도
/// 별도로 조회할 수 있어야 하므로 함께 반환합니다.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconstruction {
    /// 청산 순서대로 정렬된 완료 포지션
    pub closed: Vec<Position>,
    /// 마지막까지 닫히지 않은 포지션 (진입 시각 순)
    pub open: Vec<Position>,
}

impl Reconstruction {
    /// 청산 완료 포지션이 하나도 없는지 확인합니다.
    pub fn has_completed(&self) -> bool {
        !self.closed.is_empty()
    }
}

/// 정렬된 체결 시퀀스에서 포지션을 재구성합니다.
///
/// 입력은 체결 시각 오름차순이어야 합니다 ([`crate::normalize`] 참고).
pub fn reconstruct(fills: &[Fill], config: ReconstructConfig) -> Reconstruction {
    let result = match config.tracking {
        TrackingMode::SingleSlot => reconstruct_single_slot(fills),
        TrackingMode::PerSymbol => match config.close_policy {
            ClosePolicy::Full => reconstruct_per_symbol_full(fills),
            ClosePolicy::Fifo => reconstruct_per_symbol_fifo(fills),
        },
    };

    tracing::debug!(
        fills = fills.len(),
        closed = result.closed.len(),
        open = result.open.len(),
        "position reconstruction finished"
    );

    result
}

/// 전역 슬롯 하나로 접는 레거시 모드.
///
/// 반대 방향이면서 심볼까지 같은 체결만 슬롯을 닫고, 그 외의 체결은
/// 전부 현재 슬롯에 누적됩니다. 청산 체결은 새 포지션을 열지 않습니다.
fn reconstruct_single_slot(fills: &[Fill]) -> Reconstruction {
    let mut closed = Vec::new();
    let mut slot: Option<Position> = None;

    for fill in fills {
        match slot.take() {
            None => {
                slot = Some(open_from_fill(fill));
            }
            Some(mut position) => {
                if position.side != fill.side && position.symbol == fill.symbol {
                    position.close(fill.price, fill.fee_cost, fill.executed_at);
                    closed.push(position);
                } else {
                    position.add(fill.price, fill.amount, fill.fee_cost);
                    slot = Some(position);
                }
            }
        }
    }

    Reconstruction {
        closed,
        open: slot.into_iter().collect(),
    }
}

/// 심볼별 슬롯 + 전체 청산.
fn reconstruct_per_symbol_full(fills: &[Fill]) -> Reconstruction {
    let mut closed = Vec::new();
    let mut slots: HashMap<Symbol, Position> = HashMap::new();

    for fill in fills {
        match slots.remove(&fill.symbol) {
            None => {
                slots.insert(fill.symbol.clone(), open_from_fill(fill));
            }
            Some(mut position) => {
                if position.side == fill.side {
                    position.add(fill.price, fill.amount, fill.fee_cost);
                    slots.insert(fill.symbol.clone(), position);
                } else {
                    // 수량과 무관하게 전체 청산. 청산 체결은 소비만 된다.
                    position.close(fill.price, fill.fee_cost, fill.executed_at);
                    closed.push(position);
                }
            }
        }
    }

    Reconstruction {
        closed,
        open: drain_open_slots(slots.into_values()),
    }
}

/// 선입선출 원장의 진입 로트.
#[derive(Debug, Clone)]
struct Lot {
    price: Price,
    amount: Quantity,
    fee: Decimal,
    entry_time: DateTime<Utc>,
}

/// 심볼 하나의 선입선출 원장.
#[derive(Debug, Clone)]
struct Ledger {
    side: Side,
    lots: VecDeque<Lot>,
}

impl Ledger {
    fn total_amount(&self) -> Quantity {
        self.lots.iter().map(|lot| lot.amount).sum()
    }
}

/// 심볼별 슬롯 + 선입선출 수량 매칭.
///
/// 청산 체결은 열린 로트를 앞에서부터 소진합니다. 부분 소진된 로트는
/// 남은 수량과 수수료(수량 비례)가 이월되고, 청산 수량이 열린 수량을
/// 초과하면 초과분이 청산 체결 방향의 새 포지션으로 반전됩니다.
/// 청산 이벤트 하나당 완료 포지션 하나가 만들어지며, 진입가는 소진된
/// 수량의 가중평균입니다.
fn reconstruct_per_symbol_fifo(fills: &[Fill]) -> Reconstruction {
    let mut closed = Vec::new();
    let mut ledgers: HashMap<Symbol, Ledger> = HashMap::new();

    for fill in fills {
        match ledgers.remove(&fill.symbol) {
            None => {
                ledgers.insert(fill.symbol.clone(), ledger_from_fill(fill));
            }
            Some(mut ledger) if ledger.side == fill.side => {
                ledger.lots.push_back(Lot {
                    price: fill.price,
                    amount: fill.amount,
                    fee: fill.fee_cost,
                    entry_time: fill.executed_at,
                });
                ledgers.insert(fill.symbol.clone(), ledger);
            }
            Some(mut ledger) => {
                let matched = fill.amount.min(ledger.total_amount());

                // 청산 수수료는 매칭분과 반전분에 수량 비례로 배분한다
                let exit_fee_share = fill.fee_cost * matched / fill.amount;

                let position = consume_lots(&mut ledger, &fill.symbol, matched, fill, exit_fee_share);
                closed.push(position);

                let remainder = fill.amount - matched;
                if !ledger.lots.is_empty() {
                    // 부분 청산: 남은 로트가 이월된다
                    ledgers.insert(fill.symbol.clone(), ledger);
                } else if remainder > Decimal::ZERO {
                    // 초과 청산분은 청산 체결 방향의 새 포지션으로 반전된다
                    ledgers.insert(
                        fill.symbol.clone(),
                        Ledger {
                            side: fill.side,
                            lots: VecDeque::from([Lot {
                                price: fill.price,
                                amount: remainder,
                                fee: fill.fee_cost - exit_fee_share,
                                entry_time: fill.executed_at,
                            }]),
                        },
                    );
                }
            }
        }
    }

    let open = ledgers
        .into_iter()
        .map(|(symbol, ledger)| position_from_ledger(&symbol, &ledger));

    Reconstruction {
        closed,
        open: drain_open_slots(open),
    }
}

/// 원장의 로트를 앞에서부터 `matched` 수량만큼 소진해
/// 청산 완료 포지션 하나를 만듭니다.
fn consume_lots(
    ledger: &mut Ledger,
    symbol: &Symbol,
    matched: Quantity,
    exit: &Fill,
    exit_fee: Decimal,
) -> Position {
    let mut remaining = matched;
    let mut position: Option<Position> = None;

    while remaining > Decimal::ZERO {
        let Some(mut lot) = ledger.lots.pop_front() else {
            break;
        };

        let take = lot.amount.min(remaining);
        let fee_share = if lot.amount.is_zero() {
            Decimal::ZERO
        } else {
            lot.fee * take / lot.amount
        };

        match position.as_mut() {
            None => {
                position = Some(Position::open(
                    symbol.clone(),
                    ledger.side,
                    lot.price,
                    take,
                    fee_share,
                    lot.entry_time,
                ));
            }
            Some(p) => p.add(lot.price, take, fee_share),
        }

        remaining -= take;
        if take < lot.amount {
            // 부분 소진: 남은 수량과 수수료를 이월한다
            lot.amount -= take;
            lot.fee -= fee_share;
            ledger.lots.push_front(lot);
        }
    }

    let mut position = position.expect("matched amount requires at least one lot");
    position.close(exit.price, exit_fee, exit.executed_at);
    position
}

fn ledger_from_fill(fill: &Fill) -> Ledger {
    Ledger {
        side: fill.side,
        lots: VecDeque::from([Lot {
            price: fill.price,
            amount: fill.amount,
            fee: fill.fee_cost,
            entry_time: fill.executed_at,
        }]),
    }
}

/// 원장에 남아 있는 로트를 미청산 포지션 하나로 합칩니다.
fn position_from_ledger(symbol: &Symbol, ledger: &Ledger) -> Position {
    let mut lots = ledger.lots.iter();
    let first = lots.next().expect("ledger keeps at least one lot");

    let mut position = Position::open(
        symbol.clone(),
        ledger.side,
        first.price,
        first.amount,
        first.fee,
        first.entry_time,
    );
    for lot in lots {
        position.add(lot.price, lot.amount, lot.fee);
    }
    position
}

fn open_from_fill(fill: &Fill) -> Position {
    Position::open(
        fill.symbol.clone(),
        fill.side,
        fill.price,
        fill.amount,
        fill.fee_cost,
        fill.executed_at,
    )
}

/// 미청산 슬롯을 진입 시각 순으로 정렬해 반환합니다.
fn drain_open_slots(slots: impl Iterator<Item = Position>) -> Vec<Position> {
    let mut open: Vec<Position> = slots.collect();
    open.sort_by_key(|position| position.entry_time);
    open
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn fill(
        symbol: &str,
        side: Side,
        price: Decimal,
        amount: Decimal,
        fee: Decimal,
        ms: i64,
    ) -> Fill {
        Fill::new(Symbol::parse(symbol).unwrap(), side, price, amount)
            .with_fee(fee, "USDT")
            .with_executed_at(Utc.timestamp_millis_opt(ms).unwrap())
    }

    #[test]
    fn test_simple_round_trip() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(1), dec!(0), 1),
        ];

        let result = reconstruct(&fills, ReconstructConfig::default());

        assert_eq!(result.closed.len(), 1);
        assert!(result.open.is_empty());
        assert_eq!(result.closed[0].profit, Some(dec!(10)));
    }

    #[test]
    fn test_merge_then_full_close() {
        // 같은 방향 체결이 가중평균으로 합쳐진 뒤 전체 청산된다
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 1),
            fill("BTC/USDT", Side::Sell, dec!(90), dec!(2), dec!(0), 2),
        ];

        let result = reconstruct(&fills, ReconstructConfig::default());

        assert_eq!(result.closed.len(), 1);
        let position = &result.closed[0];
        assert_eq!(position.entry_price, dec!(100));
        assert_eq!(position.amount, dec!(2));
        assert_eq!(position.profit, Some(dec!(-20)));
    }

    #[test]
    fn test_full_close_ignores_quantity_mismatch() {
        // 전체 청산 정책: 반대 방향 수량이 달라도 포지션 전체가 닫힌다
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(2), dec!(0), 0),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(0.5), dec!(0), 1),
        ];

        let result = reconstruct(&fills, ReconstructConfig::default());

        assert_eq!(result.closed.len(), 1);
        assert_eq!(result.closed[0].amount, dec!(2));
        // (110 - 100) × 2 = 20
        assert_eq!(result.closed[0].profit, Some(dec!(20)));
        assert!(result.open.is_empty());
    }

    #[test]
    fn test_closing_fill_does_not_reopen() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(1), dec!(0), 1),
            fill("BTC/USDT", Side::Sell, dec!(120), dec!(1), dec!(0), 2),
        ];

        let result = reconstruct(&fills, ReconstructConfig::default());

        // 두 번째 매도는 새 포지션(숏)을 연다. 청산 매도가 연 것이 아니다.
        assert_eq!(result.closed.len(), 1);
        assert_eq!(result.open.len(), 1);
        assert_eq!(result.open[0].side, Side::Sell);
        assert_eq!(result.open[0].entry_price, dec!(120));
    }

    #[test]
    fn test_per_symbol_keeps_symbols_apart() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("ETH/USDT", Side::Buy, dec!(10), dec!(5), dec!(0), 1),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(1), dec!(0), 2),
        ];

        let result = reconstruct(&fills, ReconstructConfig::default());

        assert_eq!(result.closed.len(), 1);
        assert_eq!(result.closed[0].symbol.to_string(), "BTC/USDT");
        assert_eq!(result.open.len(), 1);
        assert_eq!(result.open[0].symbol.to_string(), "ETH/USDT");
    }

    #[test]
    fn test_single_slot_merges_across_symbols() {
        // 레거시 모드: 방향이 같으면 다른 심볼도 같은 슬롯에 누적된다
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("ETH/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 1),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(1), dec!(0), 2),
        ];

        let result = reconstruct(&fills, ReconstructConfig::compat());

        assert_eq!(result.closed.len(), 1);
        let position = &result.closed[0];
        assert_eq!(position.symbol.to_string(), "BTC/USDT");
        assert_eq!(position.amount, dec!(2));
    }

    #[test]
    fn test_single_slot_different_symbol_does_not_close() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("ETH/USDT", Side::Sell, dec!(10), dec!(1), dec!(0), 1),
        ];

        let result = reconstruct(&fills, ReconstructConfig::compat());

        // 반대 방향이라도 심볼이 다르면 청산이 아니라 누적이다
        assert!(result.closed.is_empty());
        assert_eq!(result.open.len(), 1);
        assert_eq!(result.open[0].amount, dec!(2));
    }

    #[test]
    fn test_fifo_partial_close_carries_remainder() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(2), dec!(2), 0),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(0.5), dec!(1), 1),
        ];

        let result = reconstruct(&fills, ReconstructConfig::fifo());

        assert_eq!(result.closed.len(), 1);
        let closed = &result.closed[0];
        assert_eq!(closed.amount, dec!(0.5));
        // 진입 수수료 2 중 0.5/2 = 0.5, 청산 수수료 1 전액
        // (110 - 100) × 0.5 - (0.5 + 1) = 3.5
        assert_eq!(closed.profit, Some(dec!(3.5)));

        assert_eq!(result.open.len(), 1);
        let open = &result.open[0];
        assert_eq!(open.amount, dec!(1.5));
        assert_eq!(open.fees, dec!(1.5));
    }

    #[test]
    fn test_fifo_consumes_lots_front_to_back() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("BTC/USDT", Side::Buy, dec!(120), dec!(1), dec!(0), 1),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(1.5), dec!(0), 2),
        ];

        let result = reconstruct(&fills, ReconstructConfig::fifo());

        assert_eq!(result.closed.len(), 1);
        let closed = &result.closed[0];
        assert_eq!(closed.amount, dec!(1.5));
        // 소진 분의 가중평균 진입가: (100×1 + 120×0.5) / 1.5
        let expected_entry = dec!(160) / dec!(1.5);
        assert!((closed.entry_price - expected_entry).abs() < dec!(0.0000001));

        assert_eq!(result.open.len(), 1);
        assert_eq!(result.open[0].amount, dec!(0.5));
        assert_eq!(result.open[0].entry_price, dec!(120));
    }

    #[test]
    fn test_fifo_overfill_reverses_position() {
        let fills = vec![
            fill("BTC/USDT", Side::Buy, dec!(100), dec!(1), dec!(0), 0),
            fill("BTC/USDT", Side::Sell, dec!(110), dec!(3), dec!(0), 1),
        ];

        let result = reconstruct(&fills, ReconstructConfig::fifo());

        assert_eq!(result.closed.len(), 1);
        assert_eq!(result.closed[0].amount, dec!(1));
        assert_eq!(result.closed[0].profit, Some(dec!(10)));

        // 초과분 2는 매도 방향의 새 포지션이 된다
        assert_eq!(result.open.len(), 1);
        let reversal = &result.open[0];
        assert_eq!(reversal.side, Side::Sell);
        assert_eq!(reversal.amount, dec!(2));
        assert_eq!(reversal.entry_price, dec!(110));
    }

    #[test]
    fn test_empty_input_yields_empty_result() {
        let result = reconstruct(&[], ReconstructConfig::default());
        assert!(result.closed.is_empty());
        assert!(result.open.is_empty());
        assert!(!result.has_completed());
    }
}
