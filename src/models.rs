use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Roles the fronting academy backend attaches to each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    SuperAdmin,
    Admin,
    Creator,
    Coach,
    Student,
    Viewer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Role> {
        match raw.trim().to_lowercase().as_str() {
            "superadmin" => Some(Role::SuperAdmin),
            "admin" => Some(Role::Admin),
            "creator" => Some(Role::Creator),
            "coach" => Some(Role::Coach),
            "student" => Some(Role::Student),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Only admins may trigger a re-fetch of the upstream feeds.
    pub fn can_manage_analysis(self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    /// The backend stores medals as free-form strings; parse tolerantly and
    /// let the caller count anything unrecognized.
    pub fn parse(raw: &str) -> Option<Medal> {
        match raw.trim().to_lowercase().as_str() {
            "gold" => Some(Medal::Gold),
            "silver" => Some(Medal::Silver),
            "bronze" => Some(Medal::Bronze),
            _ => None,
        }
    }

    pub fn individual_points(self) -> u32 {
        match self {
            Medal::Gold => 5,
            Medal::Silver => 3,
            Medal::Bronze => 1,
        }
    }

    pub fn group_points(self) -> u32 {
        match self {
            Medal::Gold => 10,
            Medal::Silver => 7,
            Medal::Bronze => 4,
        }
    }
}

// --- Upstream wire shapes ---
// These mirror the ad hoc JSON the academy backend serves. Most fields are
// optional because the data predates any schema enforcement.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearDetail {
    #[serde(default)]
    pub diploma_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRow {
    /// Per-year row id. Not stable across years.
    #[serde(default, alias = "playerId")]
    pub id: Option<String>,
    /// Intended-stable cross-year identity. Sometimes absent or regenerated.
    #[serde(default)]
    pub master_id: Option<String>,
    #[serde(default)]
    pub kpm_no: Option<String>,
    pub name: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub diploma_year: Option<i32>,
    #[serde(default)]
    pub participation_year: Option<i32>,
    /// Explicit year -> diploma-year mappings, keyed by year-as-string.
    #[serde(default)]
    pub year_details: HashMap<String, YearDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBatch {
    pub year: i32,
    #[serde(default)]
    pub players: Vec<PlayerRow>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndividualResult {
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde(default)]
    pub kpm_no: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub event: String,
    pub medal: String,
    pub year: i32,
    #[serde(default)]
    pub diploma_year: Option<i32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberDetail {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "playerId")]
    pub id: Option<String>,
    #[serde(default)]
    pub kpm_no: Option<String>,
}

/// Members arrive either as plain name strings or as objects, sometimes mixed
/// within the same team.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GroupMemberRef {
    Name(String),
    Detailed(GroupMemberDetail),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<GroupMemberRef>,
    /// Parallel to `members`, but may be shorter or hold nulls.
    #[serde(default)]
    pub member_ids: Vec<Option<String>>,
    #[serde(default)]
    pub member_kpm_nos: Vec<Option<String>>,
    pub event: String,
    pub medal: String,
    pub year: i32,
}
