//! Network protocol message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire. Each
//! request carries a caller-chosen `id` that the matching response echoes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Caller identity as vouched for by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetIdentity {
    pub user_id: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// A request frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: u64,
    #[serde(default)]
    pub identity: Option<NetIdentity>,
    pub op: Op,
}

/// Operations a client can ask for. Omitted dates mean "today".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Op {
    Ping,
    SelectionChance {
        submitter_id: String,
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    AlbumOfDay {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    CreateOutage {
        submitter_id: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        reason: String,
        #[serde(default)]
        imposed_by_admin: bool,
    },
    ListOutages {
        #[serde(default)]
        submitter_id: Option<String>,
    },
    DeleteOutage {
        outage_id: Uuid,
    },
    ReplaceSelection {
        date: NaiveDate,
        submission_id: String,
        #[serde(default)]
        admin_message: Option<String>,
    },
    Eligibility {
        #[serde(default)]
        date: Option<NaiveDate>,
    },
    SubmitAlbum {
        album_id: String,
        #[serde(default)]
        hidden: bool,
    },
    ListSubmissions {
        #[serde(default)]
        include_hidden: bool,
    },
    RemoveSubmission {
        album_id: String,
    },
    History {
        from: NaiveDate,
        to: NaiveDate,
    },
}

impl Op {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Op::Ping => "ping",
            Op::SelectionChance { .. } => "selection_chance",
            Op::AlbumOfDay { .. } => "album_of_day",
            Op::CreateOutage { .. } => "create_outage",
            Op::ListOutages { .. } => "list_outages",
            Op::DeleteOutage { .. } => "delete_outage",
            Op::ReplaceSelection { .. } => "replace_selection",
            Op::Eligibility { .. } => "eligibility",
            Op::SubmitAlbum { .. } => "submit_album",
            Op::ListSubmissions { .. } => "list_submissions",
            Op::RemoveSubmission { .. } => "remove_submission",
            Op::History { .. } => "history",
        }
    }
}

/// Why a submitter is blocked (mirrors the core block types but decoupled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetBlockType {
    Outage,
    AdminOutage,
    ConsecutiveCap,
    SelectedToday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSelection {
    pub date: NaiveDate,
    pub submission_id: String,
    pub submitter_id: String,
    pub manually_selected: bool,
    pub admin_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetOutage {
    pub id: Uuid,
    pub submitter_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub admin_outage: bool,
    pub block_type: NetBlockType,
    pub created_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetSubmission {
    pub id: String,
    pub submitter_id: String,
    pub hidden: bool,
    pub submission_date: DateTime<Utc>,
    pub last_selected_date: Option<NaiveDate>,
    pub times_selected: u32,
}

/// An eligible submitter and the albums that could represent them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetCandidate {
    pub submitter_id: String,
    pub percent: f64,
    pub album_ids: Vec<String>,
}

/// Tooltip data for a blocked submitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetBlocked {
    pub submitter_id: String,
    pub selection_blocked: bool,
    pub block_type: NetBlockType,
    pub outage_end: Option<NaiveDate>,
    pub admin_outage: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetEligibility {
    pub date: NaiveDate,
    pub eligible: Vec<NetCandidate>,
    pub blocked: Vec<NetBlocked>,
}

/// Successful response payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reply {
    Pong,
    /// Chance as a percentage, 0 to 100
    Chance {
        submitter_id: String,
        date: NaiveDate,
        percent: f64,
    },
    AlbumOfDay {
        selection: NetSelection,
    },
    /// The date's draw has not happened yet
    NotYetSelected {
        date: NaiveDate,
    },
    Outage {
        outage: NetOutage,
    },
    Outages {
        outages: Vec<NetOutage>,
    },
    Selection {
        selection: NetSelection,
    },
    Eligibility {
        eligibility: NetEligibility,
    },
    Submission {
        submission: NetSubmission,
    },
    Submissions {
        submissions: Vec<NetSubmission>,
    },
    History {
        selections: Vec<NetSelection>,
    },
    Done,
}

/// Error categories a client can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Forbidden,
    NotFound,
    NoEligibleSubmissions,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::NoEligibleSubmissions => "no_eligible_submissions",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Error payload; `crid` is logged server-side for follow-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
    pub crid: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Ok { data: Reply },
    Error(ErrorBody),
}

/// A response frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Response {
    pub fn ok(id: u64, data: Reply) -> Self {
        Self {
            id,
            outcome: Outcome::Ok { data },
        }
    }

    pub fn error(id: u64, body: ErrorBody) -> Self {
        Self {
            id,
            outcome: Outcome::Error(body),
        }
    }
}
