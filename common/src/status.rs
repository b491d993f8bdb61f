//! Replica-set member states and status snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role a replica-set member reports for itself (`myState`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum MemberState {
    /// Not yet an active member of any set.
    Startup,
    /// Accepts writes.
    Primary,
    /// Replicates from the primary.
    Secondary,
    /// Performing startup self-checks or rollback recovery.
    Recovering,
    /// Joined a set, running initial sync.
    Startup2,
    /// State not yet known from this member's point of view.
    Unknown,
    /// Votes in elections, holds no data.
    Arbiter,
    /// Unreachable from this member's point of view.
    Down,
    /// Rolling back writes.
    Rollback,
    /// Removed from the set configuration.
    Removed,
    /// A code this tool has no name for.
    Other(i32),
}

impl MemberState {
    /// Decode a numeric state code.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => MemberState::Startup,
            1 => MemberState::Primary,
            2 => MemberState::Secondary,
            3 => MemberState::Recovering,
            5 => MemberState::Startup2,
            6 => MemberState::Unknown,
            7 => MemberState::Arbiter,
            8 => MemberState::Down,
            9 => MemberState::Rollback,
            10 => MemberState::Removed,
            other => MemberState::Other(other),
        }
    }

    /// Numeric state code.
    pub fn code(&self) -> i32 {
        match self {
            MemberState::Startup => 0,
            MemberState::Primary => 1,
            MemberState::Secondary => 2,
            MemberState::Recovering => 3,
            MemberState::Startup2 => 5,
            MemberState::Unknown => 6,
            MemberState::Arbiter => 7,
            MemberState::Down => 8,
            MemberState::Rollback => 9,
            MemberState::Removed => 10,
            MemberState::Other(code) => *code,
        }
    }

    /// Upper-case name as reported by the server (`stateStr`).
    pub fn name(&self) -> &'static str {
        match self {
            MemberState::Startup => "STARTUP",
            MemberState::Primary => "PRIMARY",
            MemberState::Secondary => "SECONDARY",
            MemberState::Recovering => "RECOVERING",
            MemberState::Startup2 => "STARTUP2",
            MemberState::Unknown => "UNKNOWN",
            MemberState::Arbiter => "ARBITER",
            MemberState::Down => "DOWN",
            MemberState::Rollback => "ROLLBACK",
            MemberState::Removed => "REMOVED",
            MemberState::Other(_) => "OTHER",
        }
    }

    /// PRIMARY and SECONDARY both count as settled.
    ///
    /// A lone member normally elects itself primary, but may be observed as
    /// secondary depending on election timing; either ends the readiness poll.
    pub fn is_stable(&self) -> bool {
        matches!(self, MemberState::Primary | MemberState::Secondary)
    }
}

impl From<i32> for MemberState {
    fn from(code: i32) -> Self {
        MemberState::from_code(code)
    }
}

impl From<MemberState> for i32 {
    fn from(state: MemberState) -> Self {
        state.code()
    }
}

impl fmt::Display for MemberState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

/// Per-member summary inside a status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatus {
    /// Member id from the set configuration.
    pub id: i32,
    /// host:port of the member.
    pub name: String,
    /// Reported state.
    pub state: MemberState,
    /// Whether the member is reachable.
    pub healthy: bool,
}

/// A momentary read of the deployment's self-reported status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Replica set name, when reported.
    pub set_name: Option<String>,
    /// State of the member we are connected to.
    pub my_state: MemberState,
    /// Members known to the responding node.
    pub members: Vec<MemberStatus>,
    /// When this snapshot was taken (local clock).
    pub observed_at: DateTime<Utc>,
}

impl StatusSnapshot {
    /// Create a snapshot with only the local state set.
    pub fn new(my_state: MemberState) -> Self {
        Self {
            set_name: None,
            my_state,
            members: Vec::new(),
            observed_at: Utc::now(),
        }
    }

    /// Set the replica set name.
    pub fn with_set_name(mut self, name: impl Into<String>) -> Self {
        self.set_name = Some(name.into());
        self
    }

    /// Add a member summary.
    pub fn with_member(mut self, member: MemberStatus) -> Self {
        self.members.push(member);
        self
    }

    /// The member this snapshot was read from is PRIMARY or SECONDARY.
    pub fn is_stable(&self) -> bool {
        self.my_state.is_stable()
    }
}
