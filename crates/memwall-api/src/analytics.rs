use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use tracing::{debug, info};

use memwall_db::{OrderBy, tables};
use memwall_types::events::WallEvent;
use memwall_types::models::{
    AnalyticsReport, Message, NewAnalyticsReport, Reaction, TimeDistribution, TimeOfDay, User,
    WeeklyReport, WordCount,
};

use crate::error::Result;
use crate::state::AppStateInner;

pub const TOP_WORDS: usize = 5;

/// Filler words left out of the word ranking.
const STOP_WORDS: &[&str] = &[
    "the", "and", "to", "of", "in", "is", "it", "you", "that", "for", "on", "with", "this",
    "my", "me", "be", "are", "was", "at", "as", "so", "all", "our", "your", "here", "how",
    "has", "have", "an", "or", "but", "not", "we", "do",
    "и", "в", "не", "на", "что", "с", "по", "это", "этой", "мой", "мне", "как", "а", "но",
    "быть", "очень", "всем", "здесь", "за", "же",
];

/// Aggregate a snapshot of the three tables. Hours are read in `offset`.
///
/// An empty message set reports `avg_toxicity = 0.0`.
pub fn generate_report(
    messages: &[Message],
    reactions: &[Reaction],
    users: &[User],
    offset: FixedOffset,
) -> WeeklyReport {
    let avg_toxicity = if messages.is_empty() {
        0.0
    } else {
        messages.iter().map(|m| m.toxicity_score).sum::<f64>() / messages.len() as f64
    };

    let mut language_distribution = BTreeMap::new();
    let mut time_distribution = TimeDistribution::default();
    for m in messages {
        *language_distribution.entry(m.language.clone()).or_insert(0) += 1;
        let hour = m.created_at.with_timezone(&offset).hour();
        time_distribution.record(TimeOfDay::from_hour(hour));
    }

    let mut reaction_distribution = BTreeMap::new();
    for r in reactions {
        *reaction_distribution.entry(r.emoji.clone()).or_insert(0) += 1;
    }

    WeeklyReport {
        message_count: messages.len(),
        active_users: users.iter().filter(|u| !u.banned).count(),
        avg_toxicity,
        total_reactions: reactions.len(),
        top_words: top_words(messages, TOP_WORDS),
        language_distribution,
        reaction_distribution,
        time_distribution,
    }
}

/// The `limit` most frequent words across all message content, most
/// frequent first; equal counts keep the order the words first appeared in.
pub fn top_words(messages: &[Message], limit: usize) -> Vec<WordCount> {
    // word -> (count, first position)
    let mut seen: HashMap<String, (usize, usize)> = HashMap::new();
    let mut position = 0;

    for m in messages {
        let lower = m.content.to_lowercase();
        for word in lower.split(|c: char| !c.is_alphanumeric()) {
            if word.chars().count() < 2 || STOP_WORDS.contains(&word) {
                continue;
            }
            seen.entry(word.to_string()).or_insert((0, position)).0 += 1;
            position += 1;
        }
    }

    let mut ranked: Vec<(String, (usize, usize))> = seen.into_iter().collect();
    ranked.sort_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(text, (count, _))| WordCount { text, count })
        .collect()
}

/// Sunday 00:00:00.000 through Saturday 23:59:59.999 of the week containing
/// `now`, with days counted in `offset`.
pub fn week_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local = now.with_timezone(&offset);
    let days_since_sunday = i64::from(local.weekday().num_days_from_sunday());
    let sunday = local.date_naive() - TimeDelta::days(days_since_sunday);

    let start = local_to_utc(sunday.and_time(NaiveTime::default()), offset);
    let end = start + TimeDelta::days(7) - TimeDelta::milliseconds(1);
    (start, end)
}

fn local_to_utc(local: NaiveDateTime, offset: FixedOffset) -> DateTime<Utc> {
    (local - TimeDelta::seconds(i64::from(offset.local_minus_utc()))).and_utc()
}

pub fn generate_and_save_analytics(state: &AppStateInner) -> Result<AnalyticsReport> {
    generate_and_save_analytics_at(state, Utc::now())
}

/// Read messages, reactions and users, aggregate them, and store the result
/// as a report for the week containing `now`.
///
/// The three reads take separate locks; writers running in between may or
/// may not be reflected.
pub fn generate_and_save_analytics_at(
    state: &AppStateInner,
    now: DateTime<Utc>,
) -> Result<AnalyticsReport> {
    let messages: Vec<Message> = state.store.select_as(tables::MESSAGES, &[])?;
    let reactions: Vec<Reaction> = state.store.select_as(tables::REACTIONS, &[])?;
    let users: Vec<User> = state.store.select_as(tables::USERS, &[])?;

    let offset = state.offset_at(now);
    let report_json = generate_report(&messages, &reactions, &users, offset);
    let (week_start, week_end) = week_bounds(now, offset);

    let report: AnalyticsReport = state.store.insert_as(
        tables::ANALYTICS,
        &NewAnalyticsReport { week_start, week_end, report_json, created_at: now },
    )?;

    info!(
        id = %report.id,
        week_start = %report.week_start,
        messages = report.report_json.message_count,
        "Weekly analytics saved"
    );
    state.dispatcher.broadcast(WallEvent::AnalyticsReady {
        id: report.id.clone(),
        week_start: report.week_start,
    });

    Ok(report)
}

/// Report for the latest week, or `None` before the first one is saved.
/// When a week has several reports the most recently inserted one wins.
pub fn get_weekly_analytics(state: &AppStateInner) -> Result<Option<WeeklyReport>> {
    let reports: Vec<AnalyticsReport> = state
        .store
        .select_ordered_as(tables::ANALYTICS, &OrderBy::desc("week_start"))?;

    // The sort is stable, so the latest week's reports lead in insertion order.
    let latest = reports.first().map(|r| r.week_start);
    let report = reports
        .into_iter()
        .take_while(|r| Some(r.week_start) == latest)
        .last();

    debug!(found = report.is_some(), "Weekly analytics lookup");
    Ok(report.map(|r| r.report_json))
}
