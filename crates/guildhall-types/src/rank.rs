use serde::{Deserialize, Serialize};

/// Rank tiers, ordered lowest to highest. Derived from a user's point
/// total on every read — never persisted, so it can't go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Pawn,
    Bishop,
    Knight,
    Rook,
}

impl Rank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rank::Pawn => "Pawn",
            Rank::Bishop => "Bishop",
            Rank::Knight => "Knight",
            Rank::Rook => "Rook",
        }
    }
}

/// Inclusive lower bound per tier. Configuration, not protocol — the
/// table must stay sorted ascending by threshold.
pub const RANK_THRESHOLDS: [(i64, Rank); 4] = [
    (0, Rank::Pawn),
    (800, Rank::Bishop),
    (1200, Rank::Knight),
    (2000, Rank::Rook),
];

/// Map a point total to its rank. Total over all non-negative inputs;
/// negative inputs clamp to the lowest tier.
pub fn rank_for(points: i64) -> Rank {
    RANK_THRESHOLDS
        .iter()
        .rev()
        .find(|(min, _)| points >= *min)
        .map(|(_, rank)| *rank)
        .unwrap_or(Rank::Pawn)
}
