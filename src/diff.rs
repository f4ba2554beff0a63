use std::fmt;

use rust_decimal::Decimal;

use crate::product::Snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    New {
        name: String,
        price: Option<Decimal>,
    },
    Removed {
        name: String,
    },
    PriceChanged {
        name: String,
        old: Decimal,
        new: Decimal,
        direction: Direction,
    },
}

#[cfg(test)]
impl Change {
    fn name(&self) -> &str {
        match self {
            Change::New { name, .. } | Change::Removed { name } | Change::PriceChanged { name, .. } => name,
        }
    }
}

/// Currency amount with exactly two decimal places.
fn money(amount: Decimal) -> Decimal {
    let mut cents = amount.round_dp(2);
    cents.rescale(2);
    cents
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::New { name, price: Some(p) } => write!(f, "🆕 NEW: {name} - ${}", money(*p)),
            Change::New { name, price: None } => write!(f, "🆕 NEW: {name} - $n/a"),
            Change::Removed { name } => write!(f, "❌ REMOVED: {name}"),
            Change::PriceChanged { name, old, new, direction } => {
                let arrow = match direction {
                    Direction::Up => "📈 UP",
                    Direction::Down => "📉 DOWN",
                };
                write!(f, "{arrow}: {name} changed from ${} to ${}", money(*old), money(*new))
            }
        }
    }
}

/// Differences between two snapshots: new products first, then removed ones,
/// then price moves. Products without a known price on either side never
/// produce a price move.
pub fn compare(old: &Snapshot, new: &Snapshot) -> Vec<Change> {
    let mut changes = Vec::new();

    for (name, record) in new {
        if !old.contains_key(name) {
            changes.push(Change::New {
                name: name.clone(),
                price: record.effective_price,
            });
        }
    }

    for name in old.keys() {
        if !new.contains_key(name) {
            changes.push(Change::Removed { name: name.clone() });
        }
    }

    for (name, record) in new {
        let Some(prev) = old.get(name) else { continue };
        let (Some(old_price), Some(new_price)) = (prev.effective_price, record.effective_price) else {
            continue;
        };
        if old_price != new_price {
            let direction = if new_price - old_price > Decimal::ZERO {
                Direction::Up
            } else {
                Direction::Down
            };
            changes.push(Change::PriceChanged {
                name: name.clone(),
                old: old_price,
                new: new_price,
                direction,
            });
        }
    }

    changes
}
