use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use utoipa::ToSchema;

pub type Id = i64;

/// Column order of the remote table. Writes always emit exactly these.
pub const COLUMNS: [&str; 6] = ["id", "text", "submitter", "votes", "timestamp", "status"];

pub const ANONYMOUS: &str = "Anonymous";

/// Format used for `Question::timestamp` at creation time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: Id,
    pub text: String,
    pub submitter: String,
    pub votes: i64,
    pub timestamp: String, // stored verbatim, never reparsed
    #[schema(value_type = String, example = "pending")]
    pub status: Status,
}

impl Question {
    pub fn is_active(&self) -> bool {
        self.status != Status::Deleted
    }
}

/// Moderation state of a question.
///
/// Anything other than the three known values is kept as `Other` so that it
/// survives a read/write cycle byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Status {
    #[default]
    Pending,
    Asked,
    Deleted,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => "pending",
            Status::Asked => "asked",
            Status::Deleted => "deleted",
            Status::Other(s) => s,
        }
    }

    /// Badge a dashboard shows for this status; unknown values render as pending.
    pub fn badge(&self) -> &'static str {
        match self {
            Status::Asked => "asked",
            Status::Deleted => "deleted",
            Status::Pending | Status::Other(_) => "pending",
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        match s {
            "pending" => Status::Pending,
            "asked" => Status::Asked,
            "deleted" => Status::Deleted,
            other => Status::Other(other.to_string()),
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match Status::from(s.as_str()) {
            Status::Other(_) => Status::Other(s),
            known => known,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Status {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Status::from(String::deserialize(deserializer)?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewQuestion {
    pub text: String,
    #[serde(default)]
    pub submitter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatus {
    #[schema(value_type = String, example = "asked")]
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Counts {
    pub total: usize,
    pub pending: usize,
    pub asked: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusGroup {
    #[schema(value_type = String)]
    pub status: Status,
    pub count: usize,
    pub mean_votes: f64,
    pub total_votes: i64,
}

/// A question as a dashboard lists it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuestionCard {
    #[serde(flatten)]
    pub question: Question,
    pub badge: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardView {
    pub kind: DashboardKind,
    pub questions: Vec<QuestionCard>,
    pub counts: Counts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_status: Option<Vec<StatusGroup>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DashboardKind {
    Submitter,
    Moderator,
}
