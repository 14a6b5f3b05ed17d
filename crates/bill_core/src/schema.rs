use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Organization {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub classification: Option<String>, // "lower", "upper", "legislature", "executive", ...
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Jurisdiction {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,                   // chamber-size lookup key, e.g. "California"
    #[serde(default)]
    pub classification: Option<String>, // "state", "municipality", ...
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Action {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: String,                // ISO-8601 date or timestamp, not guaranteed sorted
    #[serde(default)]
    pub classification: Vec<String>, // e.g. "passage", "committee-passage", "became-law"
    #[serde(default)]
    pub order: Option<i64>,
}

impl Action {
    pub fn has_classification(&self, tag: &str) -> bool {
        self.classification.iter().any(|value| value == tag)
    }

    /// Organization classification of the chamber that took the action.
    pub fn chamber(&self) -> Option<&str> {
        self.organization
            .as_ref()
            .and_then(|org| org.classification.as_deref())
    }

    pub fn description_lower(&self) -> String {
        self.description.to_lowercase()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Source {
    #[serde(default)]
    pub note: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct PersonRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Sponsorship {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub person: Option<PersonRef>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default, rename = "type")]
    pub kind: Option<String>, // "person", "organization"
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct VoteCount {
    pub option: String, // "yes", "no", "other", "absent", ...
    pub value: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Vote {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub motion_text: Option<String>,
    #[serde(default)]
    pub organization: Option<Organization>,
    #[serde(default, alias = "start_date")]
    pub date: Option<String>,
    #[serde(default)]
    pub counts: Vec<VoteCount>,
}

impl Vote {
    pub fn count(&self, option: &str) -> u32 {
        self.counts
            .iter()
            .find(|count| count.option.eq_ignore_ascii_case(option))
            .map(|count| count.value)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Bill {
    pub id: String,
    #[serde(default)]
    pub identifier: Option<String>, // e.g. "AB 1234"
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subject: Vec<String>,
    #[serde(default)]
    pub jurisdiction: Option<Jurisdiction>,
    #[serde(default)]
    pub actions: Vec<Action>,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub sponsorships: Option<Vec<Sponsorship>>,
    #[serde(default)]
    pub votes: Option<Vec<Vote>>,
    #[serde(default)]
    pub first_action_date: Option<String>,
    #[serde(default)]
    pub latest_action_date: Option<String>,
    #[serde(default)]
    pub house_passage_date: Option<String>,
    #[serde(default)]
    pub senate_passage_date: Option<String>,
    #[serde(default)]
    pub enacted_date: Option<String>,
}

impl Bill {
    pub fn sponsor_count(&self) -> usize {
        self.sponsorships.as_ref().map_or(0, Vec::len)
    }

    pub fn votes(&self) -> &[Vote] {
        self.votes.as_deref().unwrap_or(&[])
    }

    pub fn jurisdiction_name(&self) -> Option<&str> {
        self.jurisdiction.as_ref().map(|j| j.name.as_str())
    }
}

/// Treats a blank milestone string the same as a missing one.
pub fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
