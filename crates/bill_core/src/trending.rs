use crate::dates::parse_date;
use crate::schema::Bill;
use crate::settings::{ChamberSizes, ChamberTable, TrendingRules};
use crate::timeline::most_recent_first;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::trace;

/// The criterion that made a bill trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TrendingSignal {
    Velocity,
    BroadSponsorship,
    CloseVote,
}

pub fn trending_signal(
    bill: &Bill,
    rules: &TrendingRules,
    chambers: &ChamberTable,
    now: OffsetDateTime,
) -> Option<TrendingSignal> {
    let timeline = most_recent_first(&bill.actions);

    let recent = timeline
        .iter()
        .filter(|entry| {
            entry
                .date
                .is_some_and(|date| date.within_last_days(now, rules.velocity_days))
        })
        .count();
    if bill.actions.len() >= 2 && recent >= rules.velocity_min_actions {
        trace!(bill = %bill.id, recent, "trending on velocity");
        return Some(TrendingSignal::Velocity);
    }

    if let Some(latest) = timeline.first() {
        let fresh = latest
            .date
            .is_some_and(|date| date.within_last_days(now, rules.sponsorship_days));
        if fresh && has_broad_sponsorship(bill, latest.action.chamber(), rules, chambers) {
            trace!(bill = %bill.id, sponsors = bill.sponsor_count(), "trending on sponsorship");
            return Some(TrendingSignal::BroadSponsorship);
        }
    }

    let close_vote = bill.votes().iter().any(|vote| {
        let recent = vote
            .date
            .as_deref()
            .and_then(parse_date)
            .is_some_and(|date| date.within_last_days(now, rules.vote_days));
        if !recent {
            return false;
        }
        let (yes, no) = (vote.count("yes"), vote.count("no"));
        (yes > 0 || no > 0) && yes.abs_diff(no) <= rules.close_vote_margin
    });
    if close_vote {
        trace!(bill = %bill.id, "trending on close vote");
        return Some(TrendingSignal::CloseVote);
    }

    None
}

fn has_broad_sponsorship(
    bill: &Bill,
    latest_chamber: Option<&str>,
    rules: &TrendingRules,
    chambers: &ChamberTable,
) -> bool {
    let Some(sizes) = bill.jurisdiction_name().and_then(|name| chambers.get(name)) else {
        return false;
    };
    let seats = match (sizes, latest_chamber) {
        (ChamberSizes::Unicameral { seats }, _) => seats,
        (ChamberSizes::Bicameral { upper, .. }, Some("upper")) => upper,
        (ChamberSizes::Bicameral { lower, .. }, Some("lower")) => lower,
        (ChamberSizes::Bicameral { .. }, _) => return false,
    };
    bill.sponsor_count() as f64 > rules.sponsor_ratio * f64::from(seats)
}

pub fn is_trending(
    bill: &Bill,
    rules: &TrendingRules,
    chambers: &ChamberTable,
    now: OffsetDateTime,
) -> bool {
    trending_signal(bill, rules, chambers, now).is_some()
}
