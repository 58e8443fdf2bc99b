//! Unit tests for des-executive.

use des_core::{EventId, SimTime};

use crate::{EventCalendar, Executive, ExecutiveError};

#[test]
fn pops_in_time_order_and_advances_clock() {
    let mut cal = EventCalendar::new();
    cal.schedule(5.0, "late").unwrap();
    cal.schedule(1.0, "early").unwrap();
    assert_eq!(cal.peek_time(), Some(SimTime(1.0)));

    let first = cal.pop_next().unwrap();
    assert_eq!(first.payload, "early");
    assert_eq!(cal.current_time(), SimTime(1.0));

    // Delays are relative to the advanced clock.
    cal.schedule(1.0, "middle").unwrap();
    assert_eq!(cal.pop_next().unwrap().payload, "middle");
    assert_eq!(cal.pop_next().unwrap().payload, "late");
    assert_eq!(cal.now(), SimTime(5.0));
    assert!(cal.pop_next().is_none());
    assert_eq!(cal.executed(), 3);
}

#[test]
fn same_time_is_fifo() {
    let mut cal = EventCalendar::new();
    for i in 0..5 {
        cal.schedule(2.0, i).unwrap();
    }
    let order: Vec<i32> = std::iter::from_fn(|| cal.pop_next().map(|e| e.payload)).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4]);
}

#[test]
fn cancel_removes_pending_only() {
    let mut cal = EventCalendar::new();
    let a = cal.schedule(1.0, 'a').unwrap();
    let b = cal.schedule(2.0, 'b').unwrap();
    assert!(cal.is_pending(a));
    assert_eq!(cal.cancel(a), Some('a'));
    assert_eq!(cal.cancel(a), None);
    assert_eq!(cal.len(), 1);
    assert_eq!(cal.pop_next().unwrap().id, b);
    assert_eq!(cal.cancel(b), None);
    assert_eq!(cal.cancel(EventId(99)), None);
}

#[test]
fn rejects_bad_delays() {
    let mut cal: EventCalendar<()> = EventCalendar::new();
    assert!(matches!(cal.schedule(-1.0, ()), Err(ExecutiveError::InvalidDelay(_))));
    assert!(matches!(cal.schedule(f64::NAN, ()), Err(ExecutiveError::InvalidDelay(_))));
    cal.schedule(3.0, ()).unwrap();
    cal.pop_next();
    assert!(matches!(
        cal.schedule_at(SimTime(1.0), ()),
        Err(ExecutiveError::InPast { .. })
    ));
}

#[test]
fn zero_delay_runs_at_current_time() {
    let mut cal = EventCalendar::new();
    cal.schedule(4.0, 1).unwrap();
    cal.pop_next();
    cal.schedule(0.0, 2).unwrap();
    let ev = cal.pop_next().unwrap();
    assert_eq!(ev.time, SimTime(4.0));
}
