use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::like_matrix::LikeMatrix;

/// Message and like counters for one conversation, or one week of one conversation.
///
/// Every participant known to the totals has a (possibly zero) entry in `sent`,
/// `likes_given` and `likes_received`, and a cell against every other participant
/// in `detailed_likes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTotals {
    pub total: u64,
    pub sent: BTreeMap<String, u64>,
    pub total_likes: u64,
    pub likes_given: BTreeMap<String, u64>,
    pub likes_received: BTreeMap<String, u64>,
    pub detailed_likes: LikeMatrix,
}

impl MessageTotals {
    /// Zeroed totals with entries for every participant.
    pub fn new<'a>(participants: impl IntoIterator<Item = &'a str>) -> Self {
        let mut totals = Self::default();
        for participant in participants {
            totals.add_participant(participant);
        }
        totals
    }

    pub fn has_participant(&self, username: &str) -> bool {
        self.sent.contains_key(username)
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.sent.keys().map(String::as_str)
    }

    /// Add zero entries for `username`. Must run before any of their counters move.
    pub fn add_participant(&mut self, username: &str) {
        if self.has_participant(username) {
            return;
        }
        self.sent.insert(username.to_string(), 0);
        self.likes_given.insert(username.to_string(), 0);
        self.likes_received.insert(username.to_string(), 0);
        self.detailed_likes.add_participant(username);
    }

    pub fn record_message(&mut self, sender: &str) {
        self.add_participant(sender);
        self.total += 1;
        *self.sent.entry(sender.to_string()).or_insert(0) += 1;
    }

    /// `liker` liked a message sent by `sender`.
    pub fn record_like(&mut self, sender: &str, liker: &str) {
        self.add_participant(sender);
        self.add_participant(liker);
        self.total_likes += 1;
        *self.likes_given.entry(liker.to_string()).or_insert(0) += 1;
        *self.likes_received.entry(sender.to_string()).or_insert(0) += 1;
        self.detailed_likes.record(sender, liker);
    }

    pub fn sent_by(&self, username: &str) -> u64 {
        self.sent.get(username).copied().unwrap_or(0)
    }

    /// Messages not authored by `owner`.
    pub fn received(&self, owner: &str) -> u64 {
        self.total.saturating_sub(self.sent_by(owner))
    }

    pub fn likes_given_by(&self, username: &str) -> u64 {
        self.likes_given.get(username).copied().unwrap_or(0)
    }

    pub fn likes_received_by(&self, username: &str) -> u64 {
        self.likes_received.get(username).copied().unwrap_or(0)
    }

    /// Sum of both sides. Keys present on only one side are treated as zero on the other.
    pub fn combine(a: &MessageTotals, b: &MessageTotals) -> MessageTotals {
        let mut combined = a.clone();
        combined += b;
        combined
    }
}

fn add_counts(dst: &mut BTreeMap<String, u64>, src: &BTreeMap<String, u64>) {
    for (username, count) in src {
        *dst.entry(username.clone()).or_insert(0) += count;
    }
}

impl std::ops::AddAssign<&MessageTotals> for MessageTotals {
    fn add_assign(&mut self, rhs: &MessageTotals) {
        for participant in rhs.participants() {
            self.add_participant(participant);
        }
        self.total += rhs.total;
        self.total_likes += rhs.total_likes;
        add_counts(&mut self.sent, &rhs.sent);
        add_counts(&mut self.likes_given, &rhs.likes_given);
        add_counts(&mut self.likes_received, &rhs.likes_received);
        self.detailed_likes += &rhs.detailed_likes;
    }
}

impl std::ops::Add for MessageTotals {
    type Output = MessageTotals;

    fn add(mut self, rhs: MessageTotals) -> MessageTotals {
        self += &rhs;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(participants: &[&str], messages: &[&str], likes: &[(&str, &str)]) -> MessageTotals {
        let mut totals = MessageTotals::new(participants.iter().copied());
        for sender in messages {
            totals.record_message(sender);
        }
        for (sender, liker) in likes {
            totals.record_like(sender, liker);
        }
        totals
    }

    fn assert_zero_complete(totals: &MessageTotals) {
        let participants: Vec<&str> = totals.participants().collect();
        for p in &participants {
            assert!(totals.likes_given.contains_key(*p), "likes_given missing {p}");
            assert!(totals.likes_received.contains_key(*p), "likes_received missing {p}");
            for q in &participants {
                if p != q {
                    assert!(
                        totals.detailed_likes.iter().any(|(r, g, _)| r == *p && g == *q),
                        "detailed_likes missing ({p}, {q})"
                    );
                }
            }
        }
    }

    #[test]
    fn fresh_totals_are_zero_complete() {
        let totals = MessageTotals::new(["alice", "bob", "carol"]);
        assert_eq!(totals.total, 0);
        assert_eq!(totals.sent.len(), 3);
        assert!(totals.sent.values().all(|&v| v == 0));
        assert_eq!(totals.detailed_likes.iter().count(), 6);
        assert_zero_complete(&totals);
    }

    #[test]
    fn add_participant_is_idempotent() {
        let mut totals = sample(&["alice", "bob"], &["bob"], &[]);
        totals.add_participant("bob");
        assert_eq!(totals.sent_by("bob"), 1);

        totals.add_participant("dave");
        assert_eq!(totals.sent_by("dave"), 0);
        assert_eq!(totals.detailed_likes.iter().count(), 6);
        assert_zero_complete(&totals);
    }

    #[test]
    fn counters_stay_consistent() {
        let totals = sample(
            &["alice", "bob"],
            &["bob", "bob", "alice"],
            &[("bob", "alice"), ("alice", "bob"), ("bob", "alice")],
        );
        assert_eq!(totals.total, totals.sent.values().sum::<u64>());
        assert_eq!(totals.received("alice"), 2);
        assert_eq!(totals.received("bob"), 1);
        assert_eq!(totals.total_likes, totals.likes_given.values().sum::<u64>());
        assert_eq!(totals.total_likes, totals.likes_received.values().sum::<u64>());
        assert_eq!(totals.detailed_likes.get("bob", "alice"), 2);
        assert_eq!(totals.detailed_likes.get("alice", "bob"), 1);
    }

    #[test]
    fn received_for_absent_owner_is_everything() {
        let totals = sample(&["bob", "carol"], &["bob", "carol"], &[]);
        assert_eq!(totals.received("alice"), 2);
    }

    #[test]
    fn combine_is_commutative_and_associative() {
        let people = ["alice", "bob", "carol"];
        let a = sample(&people, &["alice", "bob"], &[("bob", "alice")]);
        let b = sample(&people, &["carol"], &[("carol", "bob"), ("carol", "alice")]);
        let c = sample(&people, &["bob", "bob", "bob"], &[("bob", "carol")]);

        assert_eq!(MessageTotals::combine(&a, &b), MessageTotals::combine(&b, &a));
        assert_eq!(
            MessageTotals::combine(&MessageTotals::combine(&a, &b), &c),
            MessageTotals::combine(&a, &MessageTotals::combine(&b, &c))
        );

        let sum = a.clone() + b.clone() + c.clone();
        assert_eq!(sum.total, 6);
        assert_eq!(sum.total_likes, 4);
        assert_eq!(sum.sent_by("bob"), 4);
    }

    #[test]
    fn combine_unions_mismatched_participants() {
        let a = sample(&["alice", "bob"], &["bob"], &[("bob", "alice")]);
        let b = sample(&["alice", "carol"], &["carol", "alice"], &[]);

        let combined = MessageTotals::combine(&a, &b);
        assert_eq!(combined.total, 3);
        assert_eq!(combined.sent_by("bob"), 1);
        assert_eq!(combined.sent_by("carol"), 1);
        assert_eq!(combined.sent_by("alice"), 1);
        assert_eq!(combined.detailed_likes.get("bob", "carol"), 0);
        assert_zero_complete(&combined);
        assert_eq!(combined, MessageTotals::combine(&b, &a));
    }

    #[test]
    fn combining_with_empty_is_identity() {
        let a = sample(&["alice", "bob"], &["bob"], &[("bob", "alice")]);
        assert_eq!(MessageTotals::combine(&a, &MessageTotals::default()), a);
        assert_eq!(MessageTotals::combine(&MessageTotals::default(), &a), a);
    }
}
