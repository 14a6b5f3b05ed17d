use crate::dates::{EventDate, parse_date};
use crate::schema::Action;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct DatedAction<'a> {
    pub action: &'a Action,
    pub date: Option<EventDate>, // None when the raw date did not parse
}

fn dated(actions: &[Action]) -> Vec<DatedAction<'_>> {
    actions
        .iter()
        .map(|action| {
            let date = parse_date(&action.date);
            if date.is_none() {
                debug!(date = %action.date, description = %action.description, "unparseable action date");
            }
            DatedAction { action, date }
        })
        .collect()
}

/// Oldest first. Undated actions keep their stored order after every dated one.
pub fn chronological(actions: &[Action]) -> Vec<DatedAction<'_>> {
    let mut timeline = dated(actions);
    timeline.sort_by_key(|entry| (entry.date.is_none(), entry.date.map(|date| date.sort_key())));
    timeline
}

/// Newest first. Undated actions are dropped since they cannot be "recent".
pub fn most_recent_first(actions: &[Action]) -> Vec<DatedAction<'_>> {
    let mut timeline: Vec<_> = dated(actions)
        .into_iter()
        .filter(|entry| entry.date.is_some())
        .collect();
    timeline.sort_by_key(|entry| std::cmp::Reverse(entry.date.map(|date| date.sort_key())));
    timeline
}
