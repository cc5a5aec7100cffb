use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use crate::debug_log;
use crate::participants::ParticipantRegistry;
use crate::totals::MessageTotals;
use crate::types::{Message, RawConversation};
use crate::week::{days_between, week_index};

/// Usernames of deleted accounts contain this marker in the export.
pub const DELETED_USER_MARKER: &str = "__deleted__";

/// Folded statistics for one logical conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationAggregate {
    id: usize,
    owner: String,
    participants: ParticipantRegistry,
    title: String,
    /// Participant count the title was derived from.
    seed_size: usize,
    totals: MessageTotals,
    weekly_totals: BTreeMap<i64, MessageTotals>,
    /// First and last message dates; `None` until a message is folded.
    span: Option<(NaiveDate, NaiveDate)>,
    daily_rate: f64,
    display_users: Vec<String>,
}

impl ConversationAggregate {
    /// An aggregate with no messages yet. The title is fixed from `seed` here.
    pub fn empty<S: AsRef<str>>(id: usize, owner: &str, seed: &[S]) -> Self {
        let participants = ParticipantRegistry::from_seed(seed);
        let totals = MessageTotals::new(participants.iter());
        let title = derive_title(participants.as_slice(), owner);
        let seed_size = participants.len();
        let display_users = derive_display_users(&totals.sent, participants.as_slice(), owner);

        Self {
            id,
            owner: owner.to_string(),
            participants,
            title,
            seed_size,
            totals,
            weekly_totals: BTreeMap::new(),
            span: None,
            daily_rate: 0.0,
            display_users,
        }
    }

    /// Fold `messages` (in any order) into a finished aggregate.
    pub fn from_messages<S: AsRef<str>>(
        id: usize,
        owner: &str,
        seed: &[S],
        messages: &[Message],
    ) -> Self {
        let mut aggregate = Self::empty(id, owner, seed);
        for message in messages {
            aggregate.fold_message(message);
        }
        aggregate.finalize();
        aggregate
    }

    /// Build from an export record. Fails if any message timestamp is unparsable.
    pub fn from_raw(id: usize, owner: &str, raw: &RawConversation) -> Result<Self> {
        let messages = raw
            .conversation
            .iter()
            .enumerate()
            .map(|(index, message)| {
                Message::from_raw(message).with_context(|| format!("message #{index}"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::from_messages(id, owner, raw.participants.as_slice(), &messages))
    }

    /// Register `username` on the totals and on every weekly bucket seen so far.
    fn ensure_participant(&mut self, username: &str) {
        if !self.participants.insert(username) {
            return;
        }
        self.totals.add_participant(username);
        for bucket in self.weekly_totals.values_mut() {
            bucket.add_participant(username);
        }
    }

    fn fold_message(&mut self, message: &Message) {
        self.ensure_participant(&message.sender);
        for like in &message.likes {
            self.ensure_participant(&like.liker);
        }

        let week = week_index(message.timestamp);
        let bucket = self
            .weekly_totals
            .entry(week)
            .or_insert_with(|| MessageTotals::new(self.participants.iter()));

        bucket.record_message(&message.sender);
        self.totals.record_message(&message.sender);
        for like in &message.likes {
            bucket.record_like(&message.sender, &like.liker);
            self.totals.record_like(&message.sender, &like.liker);
        }

        self.span = Some(match self.span {
            Some((first, last)) => (first.min(message.timestamp), last.max(message.timestamp)),
            None => (message.timestamp, message.timestamp),
        });
    }

    /// Fill week gaps and compute the derived fields. Runs once every message is in.
    fn finalize(&mut self) {
        self.backfill_weeks();
        self.daily_rate = self.compute_daily_rate();
        self.display_users =
            derive_display_users(&self.totals.sent, self.participants.as_slice(), &self.owner);

        if debug_log::is_enabled() {
            debug_log::log(
                "fold",
                "FINALIZED",
                &format!(
                    "id={} messages={} weeks={} participants={}",
                    self.id,
                    self.totals.total,
                    self.weekly_totals.len(),
                    self.participants.len()
                ),
            );
        }
    }

    fn backfill_weeks(&mut self) {
        let Some((first, last)) = self.span else {
            return;
        };
        for week in week_index(first)..=week_index(last) {
            if !self.weekly_totals.contains_key(&week) {
                self.weekly_totals
                    .insert(week, MessageTotals::new(self.participants.iter()));
            }
        }
    }

    fn compute_daily_rate(&self) -> f64 {
        match self.span {
            Some((first, last)) => {
                let days = days_between(first, last).max(1);
                round2(self.totals.total as f64 / days as f64)
            }
            None => 0.0,
        }
    }

    /// Merge another aggregate of the same logical conversation into this one.
    ///
    /// Identity, title and display users stay as they are on `self`.
    pub fn absorb(&mut self, other: &ConversationAggregate) {
        for username in other.participants.iter() {
            self.ensure_participant(username);
        }

        self.totals = MessageTotals::combine(&self.totals, &other.totals);
        for (week, bucket) in &other.weekly_totals {
            let slot = self
                .weekly_totals
                .entry(*week)
                .or_insert_with(|| MessageTotals::new(self.participants.iter()));
            *slot += bucket;
        }

        self.span = match (self.span, other.span) {
            (Some((a_first, a_last)), Some((b_first, b_last))) => {
                Some((a_first.min(b_first), a_last.max(b_last)))
            }
            (span, None) | (None, span) => span,
        };

        self.backfill_weeks();
        self.daily_rate = self.compute_daily_rate();

        if debug_log::is_enabled() {
            debug_log::log(
                "combine",
                "ABSORBED",
                &format!(
                    "id={} +{} messages, now {}",
                    self.id, other.totals.total, self.totals.total
                ),
            );
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn with_id(mut self, id: usize) -> Self {
        self.id = id;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn participants(&self) -> &[String] {
        self.participants.as_slice()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_group(&self) -> bool {
        self.participants.len() > 2
    }

    /// Whether the title was derived as a group, regardless of who joined later.
    pub fn titled_as_group(&self) -> bool {
        self.seed_size > 2
    }

    pub fn totals(&self) -> &MessageTotals {
        &self.totals
    }

    /// Messages not sent by the owner.
    pub fn received(&self) -> u64 {
        self.totals.received(&self.owner)
    }

    /// Per-week totals in week order.
    pub fn weekly_totals(&self) -> &BTreeMap<i64, MessageTotals> {
        &self.weekly_totals
    }

    pub fn has_messages(&self) -> bool {
        self.span.is_some()
    }

    /// Date of the earliest message, or today when there are none.
    pub fn first_msg(&self) -> NaiveDate {
        self.span
            .map(|(first, _)| first)
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Date of the latest message, or today when there are none.
    pub fn last_msg(&self) -> NaiveDate {
        self.span
            .map(|(_, last)| last)
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn daily_rate(&self) -> f64 {
        self.daily_rate
    }

    pub fn display_users(&self) -> &[String] {
        &self.display_users
    }
}

impl std::ops::Add for ConversationAggregate {
    type Output = ConversationAggregate;

    fn add(mut self, rhs: ConversationAggregate) -> ConversationAggregate {
        self.absorb(&rhs);
        self
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn is_deleted_account(username: &str) -> bool {
    username.contains(DELETED_USER_MARKER)
}

/// Sidebar title: "Group (n)" for groups, otherwise the other person's username.
pub fn derive_title<S: AsRef<str>>(participants: &[S], owner: &str) -> String {
    if participants.len() > 2 {
        return format!("Group ({})", participants.len());
    }

    let other = if participants.len() > 1 {
        participants
            .iter()
            .map(AsRef::as_ref)
            .find(|username| *username != owner)
            .or_else(|| participants.first().map(AsRef::as_ref))
    } else {
        participants.first().map(AsRef::as_ref)
    };

    match other {
        Some(username) if is_deleted_account(username) => "Deleted User".to_string(),
        Some(username) => username.to_string(),
        None => "Unknown".to_string(),
    }
}

/// Pick up to two avatars: the most active non-owner sender, plus the runner-up in
/// groups. Falls back to the first non-owner participant when nobody has sent anything.
pub fn derive_display_users(
    sent: &BTreeMap<String, u64>,
    participants: &[String],
    owner: &str,
) -> Vec<String> {
    let include_owner = participants.len() == 1;
    let mut ranked: Vec<(&str, u64)> = participants
        .iter()
        .filter(|username| include_owner || username.as_str() != owner)
        .map(|username| (username.as_str(), sent.get(username).copied().unwrap_or(0)))
        .collect();
    // Stable, so ties keep participant order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    let Some(&(top, top_count)) = ranked.first() else {
        return Vec::new();
    };

    let mut users = vec![top.to_string()];
    if top_count > 0
        && participants.len() > 2
        && let Some(&(second, second_count)) = ranked.get(1)
        && second_count > 0
    {
        users.push(second.to_string());
    }
    users
}
