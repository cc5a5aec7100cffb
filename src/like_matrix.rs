use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Likes broken down by (message sender, liker).
///
/// Stored as receiver -> giver -> count. Every ordered pair of distinct known
/// participants has an entry once [`LikeMatrix::add_participant`] has been
/// called for both of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LikeMatrix {
    cells: BTreeMap<String, BTreeMap<String, u64>>,
}

impl LikeMatrix {
    pub fn contains_participant(&self, username: &str) -> bool {
        self.cells.contains_key(username)
    }

    /// Register `username`, adding zero cells against every existing participant in
    /// both directions. No-op if already known.
    pub fn add_participant(&mut self, username: &str) {
        if self.contains_participant(username) {
            return;
        }

        let others: Vec<String> = self.cells.keys().cloned().collect();
        for givers in self.cells.values_mut() {
            givers.insert(username.to_string(), 0);
        }
        self.cells.insert(
            username.to_string(),
            others.into_iter().map(|other| (other, 0)).collect(),
        );
    }

    /// Likes that `giver` left on messages sent by `receiver`. Absent pairs read as zero.
    pub fn get(&self, receiver: &str, giver: &str) -> u64 {
        self.cells
            .get(receiver)
            .and_then(|givers| givers.get(giver))
            .copied()
            .unwrap_or(0)
    }

    /// Count one like. A participant liking their own message has no cell and is
    /// not recorded here.
    pub fn record(&mut self, receiver: &str, giver: &str) {
        if receiver == giver {
            return;
        }
        self.add_participant(receiver);
        self.add_participant(giver);
        if let Some(count) = self
            .cells
            .get_mut(receiver)
            .and_then(|givers| givers.get_mut(giver))
        {
            *count += 1;
        }
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    /// Every `(receiver, giver, count)` cell in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, u64)> {
        self.cells.iter().flat_map(|(receiver, givers)| {
            givers
                .iter()
                .map(move |(giver, count)| (receiver.as_str(), giver.as_str(), *count))
        })
    }
}

impl std::ops::AddAssign<&LikeMatrix> for LikeMatrix {
    fn add_assign(&mut self, rhs: &LikeMatrix) {
        for participant in rhs.participants() {
            self.add_participant(participant);
        }
        for (receiver, giver, count) in rhs.iter() {
            if let Some(cell) = self
                .cells
                .get_mut(receiver)
                .and_then(|givers| givers.get_mut(giver))
            {
                *cell += count;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(participants: &[&str]) -> LikeMatrix {
        let mut matrix = LikeMatrix::default();
        for participant in participants {
            matrix.add_participant(participant);
        }
        matrix
    }

    fn total(matrix: &LikeMatrix) -> u64 {
        matrix.iter().map(|(_, _, count)| count).sum()
    }

    #[test]
    fn new_participant_gets_cells_in_both_directions() {
        let mut matrix = matrix(&["a", "b"]);
        matrix.add_participant("c");

        let pairs: Vec<(&str, &str)> = matrix.iter().map(|(r, g, _)| (r, g)).collect();
        assert_eq!(
            pairs,
            vec![
                ("a", "b"),
                ("a", "c"),
                ("b", "a"),
                ("b", "c"),
                ("c", "a"),
                ("c", "b")
            ]
        );
        assert_eq!(total(&matrix), 0);
    }

    #[test]
    fn record_counts_receiver_giver_pairs() {
        let mut matrix = matrix(&["alice", "bob"]);
        matrix.record("bob", "alice");
        matrix.record("bob", "alice");
        matrix.record("alice", "alice");

        assert_eq!(matrix.get("bob", "alice"), 2);
        assert_eq!(matrix.get("alice", "bob"), 0);
        assert_eq!(matrix.get("alice", "alice"), 0);
        assert_eq!(matrix.get("nobody", "alice"), 0);
        assert_eq!(total(&matrix), 2);
    }

    #[test]
    fn add_assign_unions_participants() {
        let mut left = matrix(&["a", "b"]);
        left.record("a", "b");
        let mut right = matrix(&["a", "c"]);
        right.record("a", "c");
        right.record("c", "a");

        left += &right;

        assert_eq!(left.get("a", "b"), 1);
        assert_eq!(left.get("a", "c"), 1);
        assert_eq!(left.get("c", "a"), 1);
        // b and c never met on either side but still have zero cells.
        assert_eq!(left.iter().count(), 6);
        assert_eq!(total(&left), 3);
    }
}
