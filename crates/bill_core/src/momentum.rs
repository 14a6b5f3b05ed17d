use crate::dates::{days_between, parse_date};
use crate::schema::{Bill, present};
use crate::settings::Windows;
use crate::timeline::chronological;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::trace;

// Narrower than the progress classifier's list; the two are kept apart.
const STALL_KEYWORDS: &[&str] = &[
    "died",
    "failed",
    "rejected",
    "vetoed",
    "indefinitely postponed",
    "withdrawn",
];

const COMMITTEE_PASSAGE_POINTS: i32 = 5;
const THIRD_READING_POINTS: i32 = 3;
const REFERRAL_POINTS: i32 = 1;
const RECENT_ACTION_POINTS: i32 = 2;
const AGE_PENALTY: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum MomentumLevel {
    Enacted,
    Passed,
    High,
    Medium,
    Low,
    Stalled,
}

impl std::fmt::Display for MomentumLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            MomentumLevel::Enacted => "Enacted",
            MomentumLevel::Passed => "Passed",
            MomentumLevel::High => "High",
            MomentumLevel::Medium => "Medium",
            MomentumLevel::Low => "Low",
            MomentumLevel::Stalled => "Stalled",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MomentumResult {
    pub level: MomentumLevel,
    pub score: i32,
    pub reasons: Vec<String>, // discovery order
}

impl MomentumResult {
    fn verdict(level: MomentumLevel, score: i32, reason: &str) -> Self {
        Self {
            level,
            score,
            reasons: vec![reason.to_string()],
        }
    }
}

pub fn score_momentum(bill: &Bill, windows: &Windows, now: OffsetDateTime) -> MomentumResult {
    let stalled = bill.actions.iter().any(|action| {
        let description = action.description_lower();
        STALL_KEYWORDS.iter().any(|keyword| description.contains(keyword))
    });
    if stalled {
        return MomentumResult::verdict(MomentumLevel::Stalled, -100, "Bill has failed or stalled");
    }

    if present(&bill.enacted_date).is_some()
        || bill.actions.iter().any(|action| action.has_classification("became-law"))
    {
        return MomentumResult::verdict(MomentumLevel::Enacted, 100, "Enacted into law");
    }

    match (
        present(&bill.house_passage_date).is_some(),
        present(&bill.senate_passage_date).is_some(),
    ) {
        (true, true) => {
            return MomentumResult::verdict(MomentumLevel::Passed, 90, "Passed both chambers");
        }
        (true, false) => return MomentumResult::verdict(MomentumLevel::High, 75, "Passed the House"),
        (false, true) => {
            return MomentumResult::verdict(MomentumLevel::High, 75, "Passed the Senate");
        }
        (false, false) => {}
    }

    let mut score = 0;
    let mut reasons = Vec::new();
    let timeline = chronological(&bill.actions);

    for entry in &timeline {
        let action = entry.action;
        if action.has_classification("committee-passage") {
            score += COMMITTEE_PASSAGE_POINTS;
            reasons.push("Passed a committee".to_string());
        }
        if action.has_classification("reading-3") {
            score += THIRD_READING_POINTS;
            reasons.push("Advanced to 3rd reading".to_string());
        }
        if action.has_classification("referral-committee") {
            score += REFERRAL_POINTS;
            reasons.push("Referred to committee".to_string());
        }
    }

    let recent = timeline
        .iter()
        .filter(|entry| {
            entry
                .date
                .is_some_and(|date| date.within_last_days(now, windows.recent_activity_days))
        })
        .count();
    if recent > 0 {
        score += RECENT_ACTION_POINTS * recent as i32;
        reasons.push(format!("{recent} recent action(s)"));
    }

    let first_action = present(&bill.first_action_date).and_then(parse_date);
    if let Some(first) = first_action {
        if days_between(&first, now) > windows.stale_after_days {
            score -= AGE_PENALTY;
        }
    }

    trace!(bill = %bill.id, score, recent, "momentum score");

    let level = match score {
        s if s >= 10 => MomentumLevel::High,
        s if s >= 5 => MomentumLevel::Medium,
        s if s > 0 => MomentumLevel::Low,
        _ => return MomentumResult::verdict(MomentumLevel::Low, 0, "Introduced"),
    };

    MomentumResult {
        level,
        score,
        reasons,
    }
}
