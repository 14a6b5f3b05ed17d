//! Lifecycle stage classification.
//!
//! Walks a bill's actions oldest-first and records the first date each of
//! the four stages (introduced, house, senate, enacted) was reached.

use crate::schema::{Action, Bill, present};
use crate::timeline::chronological;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::trace;

const FAILURE_KEYWORDS: &[&str] = &[
    "died",
    "failed",
    "rejected",
    "withdrawn",
    "indefinitely postponed",
    "tabled",
    "killed",
    "vetoed",
    "do not pass",
];

const ENACTMENT_KEYWORDS: &[&str] = &[
    "chaptered by secretary of state",
    "signed by governor",
    "became law",
    "enacted",
    "approved by governor",
    "signed into law",
];

const ENACTMENT_CLASSIFICATIONS: &[&str] = &["became-law", "executive-signature"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum Stage {
    Introduced,
    House,
    Senate,
    Enacted,
}

impl Stage {
    pub fn percentage(self) -> u8 {
        match self {
            Stage::Introduced => 25,
            Stage::House => 50,
            Stage::Senate => 75,
            Stage::Enacted => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Introduced => "introduced",
            Stage::House => "house",
            Stage::Senate => "senate",
            Stage::Enacted => "enacted",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            Stage::Introduced => "Introduced",
            Stage::House => "House",
            Stage::Senate => "Senate",
            Stage::Enacted => "Enacted",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ProgressStatus {
    Passed,
    Failed,
    #[serde(rename = "In Progress")]
    InProgress,
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            ProgressStatus::Passed => "Passed",
            ProgressStatus::Failed => "Failed",
            ProgressStatus::InProgress => "In Progress",
        };
        write!(f, "{value}")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageRecord {
    pub completed: bool,
    pub date: Option<String>, // raw date of the record that completed the stage
}

impl StageRecord {
    /// Completes the stage unless an earlier record already did.
    fn complete(&mut self, date: &str) -> bool {
        if self.completed {
            return false;
        }
        self.completed = true;
        self.date = Some(date.to_string());
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageRecords {
    pub introduced: StageRecord,
    pub house: StageRecord,
    pub senate: StageRecord,
    pub enacted: StageRecord,
}

impl StageRecords {
    pub fn get(&self, stage: Stage) -> &StageRecord {
        match stage {
            Stage::Introduced => &self.introduced,
            Stage::House => &self.house,
            Stage::Senate => &self.senate,
            Stage::Enacted => &self.enacted,
        }
    }

    fn mark_enacted(&mut self, date: &str) {
        self.enacted.complete(date);
        self.house.complete(date);
        self.senate.complete(date);
    }

    fn mark_chamber(&mut self, chamber: Chamber, date: &str) -> bool {
        match chamber {
            Chamber::Lower => self.house.complete(date),
            Chamber::Upper => self.senate.complete(date),
        }
    }

    fn current_stage(&self) -> Stage {
        if self.enacted.completed {
            Stage::Enacted
        } else if self.senate.completed {
            Stage::Senate
        } else if self.house.completed {
            Stage::House
        } else {
            Stage::Introduced
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressResult {
    pub stage: Stage,
    pub percentage: u8,
    pub status: ProgressStatus,
    pub description: String,
    pub stages: StageRecords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chamber {
    Lower,
    Upper,
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Chambers a passage action counts toward. Each chamber matches on its
/// organization classification or its name in the description, so one
/// action can complete both.
fn passage_chambers(action: &Action, description: &str) -> Vec<Chamber> {
    let chamber = action.chamber();
    let mut chambers = Vec::with_capacity(2);
    if chamber == Some("lower") || description.contains("assembly") {
        chambers.push(Chamber::Lower);
    }
    if chamber == Some("upper") || description.contains("senate") {
        chambers.push(Chamber::Upper);
    }
    chambers
}

fn is_enactment(action: &Action, description: &str) -> bool {
    ENACTMENT_CLASSIFICATIONS
        .iter()
        .any(|tag| action.has_classification(tag))
        || contains_any(description, ENACTMENT_KEYWORDS)
}

fn is_chamber_passage(action: &Action, description: &str) -> bool {
    action.has_classification("passage")
        || (action.has_classification("amendment-passage")
            && (description.contains("adopted") || description.contains("passed")))
}

pub fn classify_progress(bill: &Bill) -> ProgressResult {
    let mut stages = StageRecords::default();

    if let Some(date) = present(&bill.first_action_date) {
        stages.introduced.complete(date);
    }
    if let Some(date) = present(&bill.house_passage_date) {
        stages.house.complete(date);
    }
    if let Some(date) = present(&bill.senate_passage_date) {
        stages.senate.complete(date);
    }
    // Last, so explicit chamber dates are not overwritten by the enactment date.
    if let Some(date) = present(&bill.enacted_date) {
        stages.mark_enacted(date);
    }

    let mut has_failure_indicator = false;

    for entry in chronological(&bill.actions) {
        let action = entry.action;
        let description = action.description_lower();

        if contains_any(&description, FAILURE_KEYWORDS) {
            trace!(bill = %bill.id, description = %action.description, "failure indicator");
            has_failure_indicator = true;
            continue;
        }

        if is_enactment(action, &description) {
            trace!(bill = %bill.id, date = %action.date, "enactment action");
            stages.mark_enacted(&action.date);
            continue;
        }

        if is_chamber_passage(action, &description) {
            for chamber in passage_chambers(action, &description) {
                if stages.mark_chamber(chamber, &action.date) {
                    trace!(bill = %bill.id, ?chamber, date = %action.date, "chamber passage");
                }
            }
        }
    }

    let stage = stages.current_stage();
    let percentage = if stages.get(stage).completed {
        stage.percentage()
    } else {
        0
    };

    // A failure keyword never blocks later enactment; enacted bills read as passed.
    let status = if stages.enacted.completed {
        ProgressStatus::Passed
    } else if has_failure_indicator {
        ProgressStatus::Failed
    } else {
        ProgressStatus::InProgress
    };

    let description = match (stage, status) {
        (Stage::Enacted, _) => "Enacted into law".to_string(),
        (stage, ProgressStatus::Failed) => format!("Failed during {} stage", stage.label()),
        (Stage::Senate, _) => "Passed both chambers, awaiting governor's action".to_string(),
        (stage, _) => format!("Currently in {} stage", stage.label()),
    };

    ProgressResult {
        stage,
        percentage,
        status,
        description,
        stages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Organization;

    fn action(date: &str, description: &str, classification: &[&str], org: Option<&str>) -> Action {
        Action {
            date: date.to_string(),
            description: description.to_string(),
            classification: classification.iter().map(|tag| tag.to_string()).collect(),
            organization: org.map(|value| Organization {
                classification: Some(value.to_string()),
                ..Organization::default()
            }),
            ..Action::default()
        }
    }

    fn bill(actions: Vec<Action>) -> Bill {
        Bill {
            id: "ocd-bill/test".to_string(),
            first_action_date: Some("2024-01-01".to_string()),
            actions,
            ..Bill::default()
        }
    }

    #[test]
    fn empty_bill_is_introduced_at_zero() {
        let result = classify_progress(&Bill::default());
        assert_eq!(result.stage, Stage::Introduced);
        assert_eq!(result.percentage, 0);
        assert_eq!(result.status, ProgressStatus::InProgress);
        assert_eq!(result.description, "Currently in introduced stage");
    }

    #[test]
    fn first_action_date_sets_the_floor() {
        let result = classify_progress(&bill(vec![]));
        assert_eq!(result.percentage, 25);
        assert_eq!(result.stages.introduced.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn chamber_passage_uses_first_occurrence() {
        let result = classify_progress(&bill(vec![
            action("2024-03-01", "Passed the Senate again", &["passage"], Some("upper")),
            action("2024-02-01", "Passed the Senate", &["passage"], Some("upper")),
        ]));
        assert_eq!(result.stage, Stage::Senate);
        assert_eq!(result.stages.senate.date.as_deref(), Some("2024-02-01"));
        assert!(!result.stages.house.completed);
        assert_eq!(result.description, "Passed both chambers, awaiting governor's action");
    }

    #[test]
    fn description_decides_chamber_without_organization() {
        let result = classify_progress(&bill(vec![action(
            "2024-02-01",
            "Read third time. Passed Assembly.",
            &["passage"],
            None,
        )]));
        assert_eq!(result.stage, Stage::House);
        assert_eq!(result.percentage, 50);
        assert_eq!(result.description, "Currently in house stage");
    }

    #[test]
    fn organization_and_description_both_count_toward_chambers() {
        let result = classify_progress(&bill(vec![action(
            "2024-02-01",
            "Passed Senate. Ordered to the Assembly.",
            &["passage"],
            Some("upper"),
        )]));
        assert_eq!(result.stages.senate.date.as_deref(), Some("2024-02-01"));
        assert_eq!(result.stages.house.date.as_deref(), Some("2024-02-01"));
        assert_eq!(result.stage, Stage::Senate);
    }

    #[test]
    fn milestone_dates_keep_their_own_chamber_dates() {
        let mut subject = bill(vec![]);
        subject.house_passage_date = Some("2024-02-01".to_string());
        subject.senate_passage_date = Some("2024-03-01".to_string());
        subject.enacted_date = Some("2024-05-01".to_string());

        let result = classify_progress(&subject);
        assert_eq!(result.stage, Stage::Enacted);
        assert_eq!(result.stages.house.date.as_deref(), Some("2024-02-01"));
        assert_eq!(result.stages.senate.date.as_deref(), Some("2024-03-01"));
        assert_eq!(result.stages.enacted.date.as_deref(), Some("2024-05-01"));
    }

    #[test]
    fn adopted_amendment_counts_as_passage() {
        let result = classify_progress(&bill(vec![action(
            "2024-02-01",
            "Resolution adopted",
            &["amendment-passage"],
            Some("lower"),
        )]));
        assert_eq!(result.stage, Stage::House);

        let ignored = classify_progress(&bill(vec![action(
            "2024-02-01",
            "Amendment offered",
            &["amendment-passage"],
            Some("lower"),
        )]));
        assert_eq!(ignored.stage, Stage::Introduced);
    }

    #[test]
    fn enactment_completes_both_chambers() {
        let result = classify_progress(&bill(vec![
            action("2024-02-01", "Passed Assembly", &["passage"], Some("lower")),
            action("2024-04-01", "Chaptered by Secretary of State", &[], None),
        ]));
        assert_eq!(result.stage, Stage::Enacted);
        assert_eq!(result.percentage, 100);
        assert_eq!(result.status, ProgressStatus::Passed);
        assert_eq!(result.stages.house.date.as_deref(), Some("2024-02-01"));
        assert_eq!(result.stages.senate.date.as_deref(), Some("2024-04-01"));
        assert_eq!(result.description, "Enacted into law");
    }

    #[test]
    fn failure_is_reported_at_the_reached_stage() {
        let result = classify_progress(&bill(vec![
            action("2024-02-01", "Passed Assembly", &["passage"], Some("lower")),
            action("2024-03-01", "Died in committee", &[], Some("upper")),
        ]));
        assert_eq!(result.stage, Stage::House);
        assert_eq!(result.status, ProgressStatus::Failed);
        assert_eq!(result.description, "Failed during house stage");
    }

    #[test]
    fn failure_keyword_action_is_not_classified_further() {
        let result = classify_progress(&bill(vec![action(
            "2024-02-01",
            "Motion to pass failed in Senate",
            &["passage"],
            Some("upper"),
        )]));
        assert!(!result.stages.senate.completed);
        assert_eq!(result.status, ProgressStatus::Failed);
    }

    #[test]
    fn later_enactment_overrides_failure() {
        let result = classify_progress(&bill(vec![
            action("2024-02-01", "Amendment rejected", &[], Some("lower")),
            action("2024-05-01", "Signed by Governor", &["executive-signature"], None),
        ]));
        assert_eq!(result.stage, Stage::Enacted);
        assert_eq!(result.status, ProgressStatus::Passed);
    }

    #[test]
    fn undated_actions_still_classify() {
        let result = classify_progress(&bill(vec![action(
            "sometime in May",
            "Passed Assembly",
            &["passage"],
            Some("lower"),
        )]));
        assert_eq!(result.stage, Stage::House);
        assert_eq!(result.stages.house.date.as_deref(), Some("sometime in May"));
    }
}
