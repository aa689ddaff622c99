//! # Station Core for RVOIP
//!
//! An in-process call station: a registry of subscribers and the lifecycle of
//! two-party calls between them. There is no transport and no persistence;
//! host programs bind the [`Station`] operations to whatever transport they use.
//!
//! ## Call lifecycle
//!
//! ```text
//! start ──► calling ──answer──► talk ──end──► ended(end)
//!              │
//!              └──────end─────► ended(cancel)
//!
//! start with unregistered recipient ──► ended(error)
//! start with a busy party           ──► ended(user_busy)
//! remove(user) during a call        ──► ended(error)
//! ```
//!
//! Failures never surface as errors: every rejected or interrupted call is a
//! terminal record that stays queryable by id for the life of the station.
//!
//! ## Quick Start
//!
//! ```rust
//! use rvoip_station_core::prelude::*;
//!
//! let station = CallStation::new();
//! station.add(User::from("alice"));
//! station.add(User::from("bob"));
//!
//! let id = station.execute(CallAction::start("alice", "bob")).unwrap();
//! station.execute(CallAction::answer("bob"));
//! assert_eq!(station.call(&id).unwrap().status, CallStatus::Talk);
//!
//! station.execute(CallAction::end("alice"));
//! assert_eq!(
//!     station.call(&id).unwrap().status,
//!     CallStatus::Ended(EndReason::End)
//! );
//! assert!(station.current_call(&User::from("bob")).is_none());
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod station;
pub mod types;

pub use config::{LoggingSettings, StationConfig};
pub use error::{Result, StationError};
pub use events::{EventPublisher, StationEvent};
pub use logging::{setup_logging, LoggingConfig};
pub use station::{CallStation, Station, StationStats};
pub use types::{Call, CallAction, CallId, CallStatus, EndReason, User};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::StationConfig;
    pub use crate::error::{Result, StationError};
    pub use crate::events::StationEvent;
    pub use crate::station::{CallStation, Station, StationStats};
    pub use crate::types::{Call, CallAction, CallId, CallStatus, EndReason, User};
}
