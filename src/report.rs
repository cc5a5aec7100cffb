//! Read-only views of finished aggregates, as JSON and as plain text.

use std::fmt::Write as _;

use chrono::NaiveDate;
use serde::Serialize;

use crate::conversation::ConversationAggregate;
use crate::totals::MessageTotals;
use crate::utils::{NumberFormatOptions, format_date_for_display, format_number, format_rate};
use crate::week::week_start;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SortOrder {
    /// First-seen order
    #[default]
    Id,
    /// Most messages first
    Messages,
}

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub sort: SortOrder,
    pub limit: Option<usize>,
    pub include_totals: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantLikes {
    pub username: String,
    pub messages_sent: u64,
    pub likes_received: u64,
    pub likes_given: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekPoint {
    pub week: i64,
    /// `None` when the week starts before the earliest representable date.
    pub week_start: Option<NaiveDate>,
    pub total: u64,
    pub total_likes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationReport {
    pub id: usize,
    pub title: String,
    pub long_title: String,
    pub participants: Vec<String>,
    pub is_group: bool,
    pub total: u64,
    /// Messages sent by the owner
    pub sent: u64,
    pub received: u64,
    pub total_likes: u64,
    /// Likes the owner gave
    pub likes_given: u64,
    /// Likes the owner's messages got
    pub likes_received: u64,
    pub participant_likes: Vec<ParticipantLikes>,
    pub has_messages: bool,
    pub first_msg: NaiveDate,
    pub last_msg: NaiveDate,
    pub daily_rate: f64,
    pub display_users: Vec<String>,
    pub weekly: Vec<WeekPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub totals: Option<MessageTotals>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    pub owner: String,
    pub num_conversations: usize,
    pub total_messages: u64,
    pub conversations: Vec<ConversationReport>,
}

impl ConversationReport {
    pub fn from_aggregate(conversation: &ConversationAggregate, include_totals: bool) -> Self {
        let owner = conversation.owner();
        let totals = conversation.totals();
        let is_group = conversation.is_group();

        let long_title = if conversation.titled_as_group() {
            format!(
                "Unnamed group with {} members",
                conversation.participants().len()
            )
        } else {
            format!("Conversation with {}", conversation.title())
        };

        let participant_likes = conversation
            .participants()
            .iter()
            .map(|username| ParticipantLikes {
                username: username.clone(),
                messages_sent: totals.sent_by(username),
                likes_received: totals.likes_received_by(username),
                likes_given: totals.likes_given_by(username),
            })
            .collect();

        let weekly = conversation
            .weekly_totals()
            .iter()
            .map(|(week, bucket)| WeekPoint {
                week: *week,
                week_start: week_start(*week),
                total: bucket.total,
                total_likes: bucket.total_likes,
            })
            .collect();

        Self {
            id: conversation.id(),
            title: conversation.title().to_string(),
            long_title,
            participants: conversation.participants().to_vec(),
            is_group,
            total: totals.total,
            sent: totals.sent_by(owner),
            received: conversation.received(),
            total_likes: totals.total_likes,
            likes_given: totals.likes_given_by(owner),
            likes_received: totals.likes_received_by(owner),
            participant_likes,
            has_messages: conversation.has_messages(),
            first_msg: conversation.first_msg(),
            last_msg: conversation.last_msg(),
            daily_rate: conversation.daily_rate(),
            display_users: conversation.display_users().to_vec(),
            weekly,
            totals: include_totals.then(|| totals.clone()),
        }
    }

    /// Summary block in the same shape the desktop viewer showed.
    pub fn render_text(&self, format_options: &NumberFormatOptions) -> String {
        let n = |value: u64| format_number(value, format_options);
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.long_title);
        let _ = writeln!(out, "Total Messages: {}", n(self.total));
        let _ = writeln!(out, "Sent: {}", n(self.sent));
        let _ = writeln!(out, "Received: {}", n(self.received));
        let _ = writeln!(out);
        let _ = writeln!(out, "Total Likes: {}", n(self.total_likes));

        if self.is_group {
            let _ = writeln!(out);
            let _ = writeln!(out, "Participants:");
            for participant in &self.participant_likes {
                let _ = writeln!(
                    out,
                    " - {} ({}/{} likes)",
                    participant.username,
                    n(participant.likes_received),
                    n(participant.likes_given)
                );
            }
        } else {
            let _ = writeln!(out, "Likes Given: {}", n(self.likes_given));
            let _ = writeln!(out, "Likes Received: {}", n(self.likes_received));
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "First Message: {}",
            format_date_for_display(self.first_msg)
        );
        let _ = writeln!(
            out,
            "Last Message: {}",
            format_date_for_display(self.last_msg)
        );
        let _ = writeln!(
            out,
            "Daily Messages: {}",
            format_rate(self.daily_rate, format_options)
        );

        out
    }
}

pub fn build_reports(
    conversations: &[ConversationAggregate],
    options: &ReportOptions,
) -> Vec<ConversationReport> {
    let mut ordered: Vec<&ConversationAggregate> = conversations.iter().collect();
    if options.sort == SortOrder::Messages {
        // Stable, so equal counts stay in id order.
        ordered.sort_by(|a, b| b.totals().total.cmp(&a.totals().total));
    }
    if let Some(limit) = options.limit {
        ordered.truncate(limit);
    }

    ordered
        .into_iter()
        .map(|conversation| ConversationReport::from_aggregate(conversation, options.include_totals))
        .collect()
}

pub fn build_stats_output(
    owner: &str,
    conversations: &[ConversationAggregate],
    options: &ReportOptions,
) -> StatsOutput {
    StatsOutput {
        owner: owner.to_string(),
        num_conversations: conversations.len(),
        total_messages: conversations.iter().map(|c| c.totals().total).sum(),
        conversations: build_reports(conversations, options),
    }
}

pub fn render_text_report(
    reports: &[ConversationReport],
    format_options: &NumberFormatOptions,
) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(out, "#{} {}", report.id, report.title);
        let _ = writeln!(out, "{}", "─".repeat(40));
        out.push_str(&report.render_text(format_options));
        out.push('\n');
    }
    out
}
