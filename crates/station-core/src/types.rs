//! Core types for the call station

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StationError;

/// Identity of a station subscriber
///
/// The station never interprets a user beyond equality and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct User(String);

impl User {
    /// Create a new user identity
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for User {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for User {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique call identifier, allocated by the station when a record is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub Uuid);

impl CallId {
    /// Create a new call ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CallId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallId {
    type Err = StationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Why a call reached its terminal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Normal hangup of a connected call
    End,
    /// Hangup before the call was answered
    Cancel,
    /// The recipient (or the initiator) was already on another call
    UserBusy,
    /// Recipient not registered, or a party was removed mid-call
    Error,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::End => "end",
            EndReason::Cancel => "cancel",
            EndReason::UserBusy => "user_busy",
            EndReason::Error => "error",
        };
        f.write_str(s)
    }
}

/// Call status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Ringing, not yet answered
    Calling,
    /// Connected, both parties active
    Talk,
    /// Terminal state; no transition leaves it
    Ended(EndReason),
}

impl CallStatus {
    /// Whether the call still occupies both parties
    pub fn is_active(&self) -> bool {
        matches!(self, CallStatus::Calling | CallStatus::Talk)
    }

    /// The end reason, if the call has ended
    pub fn end_reason(&self) -> Option<EndReason> {
        match self {
            CallStatus::Ended(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Calling => f.write_str("calling"),
            CallStatus::Talk => f.write_str("talk"),
            CallStatus::Ended(reason) => write!(f, "ended({})", reason),
        }
    }
}

/// A call record
///
/// Records are values: a status transition produces a new `Call` with the
/// same id and parties, which replaces the previous record in the station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    /// Unique call identifier
    pub id: CallId,
    /// The party that started the call
    pub incoming_user: User,
    /// The party being called
    pub outgoing_user: User,
    /// Current call status
    pub status: CallStatus,
}

impl Call {
    /// Create a new call record with a freshly allocated id
    pub fn new(incoming_user: User, outgoing_user: User, status: CallStatus) -> Self {
        Self {
            id: CallId::new(),
            incoming_user,
            outgoing_user,
            status,
        }
    }

    /// Produce the successor record for a status transition
    pub fn with_status(&self, status: CallStatus) -> Self {
        Self {
            id: self.id,
            incoming_user: self.incoming_user.clone(),
            outgoing_user: self.outgoing_user.clone(),
            status,
        }
    }

    /// Whether `user` is either party of this call
    pub fn involves(&self, user: &User) -> bool {
        self.incoming_user == *user || self.outgoing_user == *user
    }

    /// The other party of the call, if `user` takes part in it
    pub fn peer_of(&self, user: &User) -> Option<&User> {
        if self.incoming_user == *user {
            Some(&self.outgoing_user)
        } else if self.outgoing_user == *user {
            Some(&self.incoming_user)
        } else {
            None
        }
    }
}

/// Actions a subscriber may ask the station to execute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallAction {
    /// `from` calls `to`
    Start { from: User, to: User },
    /// `from` answers the call ringing for them
    Answer { from: User },
    /// `from` hangs up their current call
    End { from: User },
}

impl CallAction {
    /// `from` calls `to`
    pub fn start(from: impl Into<User>, to: impl Into<User>) -> Self {
        CallAction::Start { from: from.into(), to: to.into() }
    }

    /// `from` answers their ringing call
    pub fn answer(from: impl Into<User>) -> Self {
        CallAction::Answer { from: from.into() }
    }

    /// `from` hangs up
    pub fn end(from: impl Into<User>) -> Self {
        CallAction::End { from: from.into() }
    }

    /// The user requesting the action
    pub fn originator(&self) -> &User {
        match self {
            CallAction::Start { from, .. }
            | CallAction::Answer { from }
            | CallAction::End { from } => from,
        }
    }
}
