use std::collections::HashSet;

/// Append-only, insertion-ordered set of usernames in a conversation.
///
/// Users are never removed: someone who left a group still shows up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParticipantRegistry {
    order: Vec<String>,
    known: HashSet<String>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a raw participant list, dropping repeats.
    pub fn from_seed<I, S>(seed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for username in seed {
            registry.insert(username.as_ref());
        }
        registry
    }

    /// Returns true if `username` was not known before.
    pub fn insert(&mut self, username: &str) -> bool {
        if self.known.contains(username) {
            return false;
        }
        self.known.insert(username.to_string());
        self.order.push(username.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}
