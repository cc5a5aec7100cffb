//! Groups export records into logical conversations and folds each group.
//!
//! Two records belong to the same conversation when their participant lists are
//! equal as sets. Groups keep the order in which they were first seen; folding runs
//! in parallel across groups since no state is shared between them.

use std::collections::hash_map::Entry;
use std::collections::{BTreeSet, HashMap};

use rayon::prelude::*;

use crate::conversation::ConversationAggregate;
use crate::debug_log;
use crate::types::RawConversation;
use crate::utils::warn_once;

/// Order- and duplicate-insensitive identity of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantSet(BTreeSet<String>);

impl ParticipantSet {
    pub fn new<S: AsRef<str>>(participants: &[S]) -> Self {
        Self(
            participants
                .iter()
                .map(|username| username.as_ref().to_string())
                .collect(),
        )
    }
}

/// Record indices per logical conversation, in first-seen order.
pub fn group_records(records: &[RawConversation]) -> Vec<Vec<usize>> {
    let mut group_of: HashMap<ParticipantSet, usize> = HashMap::with_capacity(records.len());
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for (index, record) in records.iter().enumerate() {
        match group_of.entry(ParticipantSet::new(record.participants.as_slice())) {
            Entry::Occupied(entry) => groups[*entry.get()].push(index),
            Entry::Vacant(entry) => {
                entry.insert(groups.len());
                groups.push(vec![index]);
            }
        }
    }

    groups
}

/// Build one aggregate per logical conversation.
///
/// Records whose fold fails (bad timestamps) are reported and skipped. Ids are
/// sequential over the returned aggregates.
pub fn group_conversations(records: &[RawConversation], owner: &str) -> Vec<ConversationAggregate> {
    let groups = group_records(records);

    debug_log::log(
        "group",
        "GROUPED",
        &format!("{} records into {} conversations", records.len(), groups.len()),
    );

    let folded: Vec<Option<ConversationAggregate>> = groups
        .par_iter()
        .map(|members| fold_group(records, members, owner))
        .collect();

    folded
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(id, aggregate)| aggregate.with_id(id))
        .collect()
}

fn fold_group(
    records: &[RawConversation],
    members: &[usize],
    owner: &str,
) -> Option<ConversationAggregate> {
    let mut combined: Option<ConversationAggregate> = None;

    for &index in members {
        let record = &records[index];
        match ConversationAggregate::from_raw(0, owner, record) {
            Ok(aggregate) => {
                if let Some(existing) = combined.as_mut() {
                    existing.absorb(&aggregate);
                } else {
                    combined = Some(aggregate);
                }
            }
            Err(e) => warn_once(format!(
                "⚠️  Skipping conversation record #{index} with {}: {e:#}",
                record.participants.join(", ")
            )),
        }
    }

    combined
}
