//! Concurrent access tests
//!
//! Many threads race call actions against one shared station. Whatever the
//! interleaving, no user may ever end up in two active calls.

use std::collections::HashMap;
use std::sync::{Arc, Barrier};
use std::thread;

use rvoip_station_core::prelude::*;

#[test]
fn test_racing_starts_never_double_book() {
    let station = CallStation::new();
    station.add(User::from("target"));
    let callers: Vec<User> = (0..16).map(|i| User::from(format!("caller-{}", i))).collect();
    for caller in &callers {
        station.add(caller.clone());
    }

    let barrier = Arc::new(Barrier::new(callers.len()));
    let handles: Vec<_> = callers
        .iter()
        .cloned()
        .map(|caller| {
            let station = station.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                station.execute(CallAction::Start {
                    from: caller,
                    to: User::from("target"),
                })
            })
        })
        .collect();

    let ids: Vec<CallId> = handles
        .into_iter()
        .map(|h| h.join().expect("caller thread panicked"))
        .map(|id| id.expect("registered caller always produces a record"))
        .collect();

    let statuses: Vec<CallStatus> = ids
        .iter()
        .map(|id| station.call(id).unwrap().status)
        .collect();

    let ringing = statuses.iter().filter(|s| **s == CallStatus::Calling).count();
    let busy = statuses
        .iter()
        .filter(|s| **s == CallStatus::Ended(EndReason::UserBusy))
        .count();

    assert_eq!(ringing, 1);
    assert_eq!(busy, callers.len() - 1);

    let current = station.current_call(&User::from("target")).unwrap();
    assert_eq!(current.status, CallStatus::Calling);
    assert_eq!(station.current_call(&current.incoming_user), Some(current));
}

#[test]
fn test_concurrent_pairs_stay_consistent() {
    let station = CallStation::new();
    let users: Vec<User> = (0..8).map(|i| User::from(format!("user-{}", i))).collect();
    for u in &users {
        station.add(u.clone());
    }

    let handles: Vec<_> = (0..users.len())
        .map(|i| {
            let station = station.clone();
            let users = users.clone();
            thread::spawn(move || {
                for round in 0..200 {
                    let me = users[i].clone();
                    let peer = users[(i + round + 1) % users.len()].clone();
                    match round % 4 {
                        0 => {
                            station.execute(CallAction::Start { from: me, to: peer });
                        }
                        1 => {
                            station.execute(CallAction::Answer { from: me });
                        }
                        2 => {
                            station.execute(CallAction::End { from: me });
                        }
                        _ => {
                            if round % 40 == 3 {
                                station.remove(&me);
                                station.add(me);
                            }
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    let mut occupancy: HashMap<User, usize> = HashMap::new();
    for call in station.calls().into_iter().filter(|c| c.status.is_active()) {
        *occupancy.entry(call.incoming_user.clone()).or_default() += 1;
        if call.outgoing_user != call.incoming_user {
            *occupancy.entry(call.outgoing_user.clone()).or_default() += 1;
        }
        assert_eq!(station.current_call(&call.incoming_user), Some(call.clone()));
        assert_eq!(station.current_call(&call.outgoing_user), Some(call.clone()));
    }
    assert!(occupancy.values().all(|count| *count == 1));

    for u in &users {
        if let Some(call) = station.current_call(u) {
            assert!(call.status.is_active());
            assert!(call.involves(u));
        }
    }
}
