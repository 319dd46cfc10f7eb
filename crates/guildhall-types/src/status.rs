use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Review state of a quest submission.
///
/// `Pending` is the initial state. `Approved` and `Rejected` are both
/// re-reviewable: an appeal can flip `Rejected` to `Approved`, and a
/// correction can flip `Approved` to `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Approved => "approved",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SubmissionStatus::Pending),
            "approved" => Some(SubmissionStatus::Approved),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }

    /// Collapse precedence when a user holds several submissions for the
    /// same quest: approved beats everything, pending beats rejected.
    pub const fn precedence(self) -> u8 {
        match self {
            SubmissionStatus::Approved => 2,
            SubmissionStatus::Pending => 1,
            SubmissionStatus::Rejected => 0,
        }
    }

    /// A live submission blocks a new attempt at the same quest.
    /// Rejected submissions don't — resubmission after rejection is allowed.
    pub const fn blocks_resubmission(self) -> bool {
        !matches!(self, SubmissionStatus::Rejected)
    }
}

/// Fold a user's submission history down to one status per quest using
/// [`SubmissionStatus::precedence`]. Order independent: at equal precedence
/// the first-seen entry wins, and equal-precedence duplicates carry the
/// same status anyway.
pub fn collapse_by_quest<I>(submissions: I) -> HashMap<String, SubmissionStatus>
where
    I: IntoIterator<Item = (String, SubmissionStatus)>,
{
    let mut collapsed: HashMap<String, SubmissionStatus> = HashMap::new();
    for (quest_id, status) in submissions {
        collapsed
            .entry(quest_id)
            .and_modify(|current| {
                if status.precedence() > current.precedence() {
                    *current = status;
                }
            })
            .or_insert(status);
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use SubmissionStatus::*;

    fn entries(list: &[(&str, SubmissionStatus)]) -> Vec<(String, SubmissionStatus)> {
        list.iter().map(|(q, s)| (q.to_string(), *s)).collect()
    }

    #[test]
    fn approved_beats_everything() {
        let map = collapse_by_quest(entries(&[("q1", Rejected), ("q1", Approved), ("q1", Pending)]));
        assert_eq!(map["q1"], Approved);
    }

    #[test]
    fn pending_beats_rejected() {
        let map = collapse_by_quest(entries(&[("q1", Rejected), ("q1", Pending)]));
        assert_eq!(map["q1"], Pending);
    }

    #[test]
    fn fold_is_order_independent() {
        let forward = collapse_by_quest(entries(&[("q1", Rejected), ("q1", Pending), ("q2", Approved)]));
        let reverse = collapse_by_quest(entries(&[("q2", Approved), ("q1", Pending), ("q1", Rejected)]));
        assert_eq!(forward, reverse);
    }

    #[test]
    fn quests_collapse_independently() {
        let map = collapse_by_quest(entries(&[("q1", Approved), ("q2", Rejected), ("q3", Pending)]));
        assert_eq!(map["q1"], Approved);
        assert_eq!(map["q2"], Rejected);
        assert_eq!(map["q3"], Pending);
    }

    #[test]
    fn rejected_does_not_block_resubmission() {
        assert!(Pending.blocks_resubmission());
        assert!(Approved.blocks_resubmission());
        assert!(!Rejected.blocks_resubmission());
    }
}
