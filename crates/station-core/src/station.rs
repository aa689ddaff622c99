//! Call station
//!
//! The station owns three tables: the registered users, every call record
//! ever created, and the active call of each busy user. All three live in one
//! [`StationState`] behind a single lock, and every operation runs to
//! completion while holding it, so availability checks and the mutations
//! that follow them can never interleave with another operation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::config::StationConfig;
use crate::error::Result;
use crate::events::{EventPublisher, StationEvent};
use crate::types::{Call, CallAction, CallId, CallStatus, EndReason, User};

/// Capability interface of a call station
///
/// Rejected attempts and forced terminations are reported as ended call
/// records, never as errors. `execute` returns `None` only when the action
/// had nothing to act on.
pub trait Station {
    /// Register a user; adding a present user is a no-op
    fn add(&self, user: User);

    /// Unregister a user, force-terminating their active call
    fn remove(&self, user: &User);

    /// Registered users, in no particular order
    fn users(&self) -> Vec<User>;

    /// Execute a call action, returning the id of the record it produced
    fn execute(&self, action: CallAction) -> Option<CallId>;

    /// Every call record ever created, in no particular order
    fn calls(&self) -> Vec<Call>;

    /// Call records where `user` is either party
    fn calls_for(&self, user: &User) -> Vec<Call>;

    /// Current record of a call
    fn call(&self, id: &CallId) -> Option<Call>;

    /// The active (calling or talking) call of `user`
    fn current_call(&self, user: &User) -> Option<Call>;
}

/// Snapshot of station counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StationStats {
    pub registered_users: usize,
    pub total_calls: usize,
    pub active_calls: usize,
    pub ended_normally: usize,
    pub cancelled: usize,
    pub rejected_busy: usize,
    pub errored: usize,
}

/// The three station tables
#[derive(Debug, Default)]
struct StationState {
    /// Registered users
    users: HashSet<User>,
    /// All call records, keyed by id
    calls: HashMap<CallId, Call>,
    /// Active call of each busy user (user -> call id)
    current_calls: HashMap<User, CallId>,
}

impl StationState {
    fn is_registered(&self, user: &User) -> bool {
        self.users.contains(user)
    }

    fn is_busy(&self, user: &User) -> bool {
        self.current_calls.contains_key(user)
    }

    fn current_call(&self, user: &User) -> Option<&Call> {
        self.current_calls.get(user).and_then(|id| self.calls.get(id))
    }

    /// Store a record and keep the active-call mapping in step with its status
    fn store(&mut self, call: Call) -> Call {
        if call.status.is_active() {
            self.current_calls.insert(call.incoming_user.clone(), call.id);
            self.current_calls.insert(call.outgoing_user.clone(), call.id);
        } else {
            for party in [&call.incoming_user, &call.outgoing_user] {
                if self.current_calls.get(party) == Some(&call.id) {
                    self.current_calls.remove(party);
                }
            }
        }
        self.calls.insert(call.id, call.clone());
        call
    }

    fn start(&mut self, from: User, to: User) -> Option<Call> {
        if !self.is_registered(&from) {
            debug!("Ignoring start from unregistered user {}", from);
            return None;
        }

        let status = if !self.is_registered(&to) {
            CallStatus::Ended(EndReason::Error)
        } else if self.is_busy(&from) || self.is_busy(&to) {
            CallStatus::Ended(EndReason::UserBusy)
        } else {
            CallStatus::Calling
        };

        let call = self.store(Call::new(from, to, status));
        match call.status {
            CallStatus::Calling => info!(
                "Call {} started: {} -> {}",
                call.id, call.incoming_user, call.outgoing_user
            ),
            status => info!(
                "Call {} from {} to {} rejected: {}",
                call.id, call.incoming_user, call.outgoing_user, status
            ),
        }
        Some(call)
    }

    fn answer(&mut self, from: &User) -> Option<Call> {
        let ringing = match self.current_call(from) {
            Some(call) if call.status == CallStatus::Calling => call.with_status(CallStatus::Talk),
            Some(call) => {
                debug!("{} cannot answer call {} in state {}", from, call.id, call.status);
                return None;
            }
            None => {
                debug!("{} has no call to answer", from);
                return None;
            }
        };

        let call = self.store(ringing);
        info!("Call {} answered by {}", call.id, from);
        Some(call)
    }

    fn end(&mut self, from: &User) -> Option<Call> {
        let Some(current) = self.current_call(from) else {
            debug!("{} has no call to end", from);
            return None;
        };

        let reason = match current.status {
            CallStatus::Talk => EndReason::End,
            CallStatus::Calling => EndReason::Cancel,
            CallStatus::Ended(_) => {
                warn!("Active-call table referenced ended call {}", current.id);
                return None;
            }
        };

        let next = current.with_status(CallStatus::Ended(reason));
        let call = self.store(next);
        info!("Call {} ended by {}: {}", call.id, from, reason);
        Some(call)
    }

    fn force_terminate(&mut self, user: &User) -> Option<Call> {
        let next = self.current_call(user)?.with_status(CallStatus::Ended(EndReason::Error));
        let call = self.store(next);
        warn!("Call {} force-terminated: {} disconnected", call.id, user);
        Some(call)
    }

    fn stats(&self) -> StationStats {
        let mut stats = StationStats {
            registered_users: self.users.len(),
            total_calls: self.calls.len(),
            ..Default::default()
        };
        for call in self.calls.values() {
            match call.status {
                CallStatus::Calling | CallStatus::Talk => stats.active_calls += 1,
                CallStatus::Ended(EndReason::End) => stats.ended_normally += 1,
                CallStatus::Ended(EndReason::Cancel) => stats.cancelled += 1,
                CallStatus::Ended(EndReason::UserBusy) => stats.rejected_busy += 1,
                CallStatus::Ended(EndReason::Error) => stats.errored += 1,
            }
        }
        stats
    }
}

/// In-memory call station
///
/// Cheap to clone; clones share the same tables and event stream.
#[derive(Debug, Clone)]
pub struct CallStation {
    state: Arc<RwLock<StationState>>,
    events: EventPublisher,
}

impl CallStation {
    /// Create a station with the default configuration
    pub fn new() -> Self {
        Self::build(&StationConfig::default())
    }

    /// Create a station from a validated configuration
    pub fn with_config(config: StationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(&config))
    }

    fn build(config: &StationConfig) -> Self {
        debug!("Creating call station (event capacity {})", config.event_capacity);
        Self {
            state: Arc::new(RwLock::new(StationState::default())),
            events: EventPublisher::new(config.event_capacity),
        }
    }

    /// Subscribe to lifecycle events published from now on
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StationEvent> {
        self.events.subscribe()
    }

    /// Snapshot of station counters
    pub fn stats(&self) -> StationStats {
        self.state.read().stats()
    }

    /// Whether `user` is currently registered
    pub fn is_registered(&self, user: &User) -> bool {
        self.state.read().is_registered(user)
    }
}

impl Default for CallStation {
    fn default() -> Self {
        Self::new()
    }
}

impl Station for CallStation {
    fn add(&self, user: User) {
        let mut state = self.state.write();
        if state.users.insert(user.clone()) {
            info!("User {} registered", user);
            self.events.publish(StationEvent::UserAdded { user });
        }
    }

    fn remove(&self, user: &User) {
        let mut state = self.state.write();
        if state.users.remove(user) {
            info!("User {} unregistered", user);
            self.events.publish(StationEvent::UserRemoved { user: user.clone() });
        }
        if let Some(call) = state.force_terminate(user) {
            self.events.publish(StationEvent::CallUpdated { call });
        }
    }

    fn users(&self) -> Vec<User> {
        self.state.read().users.iter().cloned().collect()
    }

    fn execute(&self, action: CallAction) -> Option<CallId> {
        let mut state = self.state.write();
        debug!("Executing {:?} for {}", action, action.originator());
        let call = match action {
            CallAction::Start { from, to } => state.start(from, to),
            CallAction::Answer { from } => state.answer(&from),
            CallAction::End { from } => state.end(&from),
        }?;

        let id = call.id;
        self.events.publish(StationEvent::CallUpdated { call });
        Some(id)
    }

    fn calls(&self) -> Vec<Call> {
        self.state.read().calls.values().cloned().collect()
    }

    fn calls_for(&self, user: &User) -> Vec<Call> {
        self.state
            .read()
            .calls
            .values()
            .filter(|call| call.involves(user))
            .cloned()
            .collect()
    }

    fn call(&self, id: &CallId) -> Option<Call> {
        self.state.read().calls.get(id).cloned()
    }

    fn current_call(&self, user: &User) -> Option<Call> {
        self.state.read().current_call(user).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station_with(users: &[&str]) -> CallStation {
        let station = CallStation::new();
        for user in users {
            station.add(User::from(*user));
        }
        station
    }

    #[test]
    fn test_store_clears_mapping_only_for_its_own_call() {
        let mut state = StationState::default();
        state.users.extend(["a", "b", "c"].map(User::from));

        let active = state.start("a".into(), "b".into()).unwrap();
        let busy = state.start("c".into(), "a".into()).unwrap();
        assert_eq!(busy.status, CallStatus::Ended(EndReason::UserBusy));

        // Storing the rejected record must not disturb a's active call
        assert_eq!(state.current_calls.get(&User::from("a")), Some(&active.id));
        assert!(!state.is_busy(&"c".into()));
    }

    #[test]
    fn test_answer_ended_call_is_noop() {
        let station = station_with(&["alice", "bob"]);
        let id = station.execute(CallAction::start("alice", "bob")).unwrap();
        station.execute(CallAction::end("bob")).unwrap();

        assert_eq!(station.execute(CallAction::answer("bob")), None);
        assert_eq!(station.execute(CallAction::end("alice")), None);
        assert_eq!(
            station.call(&id).unwrap().status,
            CallStatus::Ended(EndReason::Cancel)
        );
    }

    #[test]
    fn test_answer_while_talking_is_noop() {
        let station = station_with(&["alice", "bob"]);
        let id = station.execute(CallAction::start("alice", "bob")).unwrap();
        assert_eq!(station.execute(CallAction::answer("bob")), Some(id));
        assert_eq!(station.execute(CallAction::answer("alice")), None);
        assert_eq!(station.call(&id).unwrap().status, CallStatus::Talk);
    }

    #[test]
    fn test_initiator_may_answer_without_swapping_parties() {
        let station = station_with(&["alice", "bob"]);
        let id = station.execute(CallAction::start("alice", "bob")).unwrap();
        assert_eq!(station.execute(CallAction::answer("alice")), Some(id));

        let call = station.call(&id).unwrap();
        assert_eq!(call.status, CallStatus::Talk);
        assert_eq!(call.incoming_user, User::from("alice"));
        assert_eq!(call.outgoing_user, User::from("bob"));
    }

    #[test]
    fn test_stats() {
        let station = station_with(&["a", "b", "c", "d"]);
        station.execute(CallAction::start("a", "b"));
        station.execute(CallAction::start("c", "a"));
        station.execute(CallAction::start("c", "nobody"));
        station.execute(CallAction::start("c", "d"));
        station.execute(CallAction::end("d"));

        let stats = station.stats();
        assert_eq!(
            stats,
            StationStats {
                registered_users: 4,
                total_calls: 4,
                active_calls: 1,
                ended_normally: 0,
                cancelled: 1,
                rejected_busy: 1,
                errored: 1,
            }
        );
    }

    #[test]
    fn test_with_config_validates() {
        let config = StationConfig {
            event_capacity: 0,
            ..Default::default()
        };
        assert!(CallStation::with_config(config).is_err());
        assert!(CallStation::with_config(StationConfig::default()).is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let station = CallStation::new();
        let other = station.clone();
        station.add("alice".into());
        assert!(other.is_registered(&"alice".into()));
    }
}
