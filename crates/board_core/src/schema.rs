use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Lowercase text form shared by the store, the CLI and the JSON output.
macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VotingType {
    SimpleMajority,
    TwoThirds,
    Unanimous,
}

text_enum!(VotingType, "voting_type", {
    SimpleMajority => "simple_majority",
    TwoThirds => "two_thirds",
    Unanimous => "unanimous",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    Draft,
    Open,
    Passed,
    Failed,
}

text_enum!(ResolutionStatus, "status", {
    Draft => "draft",
    Open => "open",
    Passed => "passed",
    Failed => "failed",
});

impl ResolutionStatus {
    /// Passed and failed resolutions never change status again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResolutionStatus::Passed | ResolutionStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    Approve,
    Reject,
    Abstain,
}

text_enum!(VoteChoice, "vote", {
    Approve => "approve",
    Reject => "reject",
    Abstain => "abstain",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignatureMethod {
    Drawn,
    Typed,
    Uploaded,
}

text_enum!(SignatureMethod, "signature_type", {
    Drawn => "drawn",
    Typed => "typed",
    Uploaded => "uploaded",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn status(&self) -> ResolutionStatus {
        match self {
            Outcome::Passed => ResolutionStatus::Passed,
            Outcome::Failed => ResolutionStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Meeting {
    pub id: String,
    pub organization_id: String,
    pub title: String,
    pub scheduled_at: Option<String>, // ISO-8601 timestamp (UTC recommended)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BoardMember {
    pub id: String,
    pub organization_id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Option<String>, // e.g. "chair", "treasurer", "member"
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub id: String,
    pub organization_id: String,
    pub meeting_id: String,
    pub title: String,
    pub description: Option<String>,
    pub voting_type: VotingType,
    pub status: ResolutionStatus,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    /// Set exactly when `status` is passed or failed.
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Vote {
    pub resolution_id: String,
    pub board_member_id: String,
    pub vote: VoteChoice,
    pub comment: Option<String>,
    pub voted_at: String,
}

/// Immutable e-signature with the request provenance captured for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Signature {
    pub id: String,
    pub resolution_id: String,
    pub board_member_id: String,
    pub signature_data: String, // data URL of the drawn/uploaded image, or the typed name
    pub signature_type: SignatureMethod,
    pub typed_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub signed_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoteSummary {
    pub approve: u32,
    pub reject: u32,
    pub abstain: u32,
    pub total: u32,
    pub result: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NewResolution {
    pub meeting_id: String,
    pub title: String,
    pub description: Option<String>,
    pub voting_type: VotingType,
}

/// Metadata edits; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub voting_type: Option<VotingType>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SignatureRequest {
    pub signature_type: SignatureMethod,
    pub signature_data: Option<String>,
    pub typed_name: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolutionDetail {
    pub resolution: Resolution,
    pub summary: VoteSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct VoteListing {
    pub votes: Vec<Vote>,
    pub summary: VoteSummary,
}
