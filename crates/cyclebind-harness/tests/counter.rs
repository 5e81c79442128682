//! The counter fixture end to end: action → scan → one-way and two-way sinks.

use cyclebind_harness::fixtures::Counter;
use cyclebind_harness::{EventLog, TestHost};
use cyclebind_runtime::{ChangeKind, MountOutcome, Value};

#[test]
fn clicks_accumulate_into_both_sinks() {
    let host = TestHost::new();
    let counter = Counter::create();
    assert_eq!(host.bind(&counter).expect("mount"), MountOutcome::Started);
    assert_eq!(counter.property("count"), Value::Int(0));

    host.invoke(&counter, "change", [1]);
    host.invoke(&counter, "change", [1]);
    host.invoke(&counter, "change", [-5]);

    assert_eq!(counter.property("count"), Value::Int(-3));
    assert_eq!(counter.property("input"), Value::Int(-3));
}

#[test]
fn every_click_is_reported_as_an_action() {
    let host = TestHost::new();
    let counter = Counter::create();
    let log = EventLog::attach(&counter);
    host.bind(&counter).expect("mount");

    host.invoke(&counter, "change", [2]);
    host.invoke(&counter, "change", [3]);

    assert_eq!(log.count(ChangeKind::ActionInvoked), 2);
    let counts: Vec<Value> = log
        .for_property("count")
        .into_iter()
        .map(|event| event.value)
        .collect();
    assert_eq!(counts, vec![Value::Int(0), Value::Int(2), Value::Int(5)]);
}

#[test]
fn the_total_restarts_on_remount() {
    let host = TestHost::new();
    let counter = Counter::create();
    host.bind(&counter).expect("mount");
    host.invoke(&counter, "change", [4]);
    host.unbind(&counter);

    host.invoke(&counter, "change", [100]);
    assert_eq!(counter.property("count"), Value::Int(4));

    host.bind(&counter).expect("remount");
    assert_eq!(counter.property("count"), Value::Int(0));
    host.invoke(&counter, "change", [1]);
    assert_eq!(counter.property("count"), Value::Int(1));
}

#[test]
fn identical_sessions_produce_identical_logs() {
    let run = || {
        let host = TestHost::new();
        let counter = Counter::create();
        let log = EventLog::attach(&counter);
        host.bind(&counter).expect("mount");
        for delta in [1, 2, 3] {
            host.invoke(&counter, "change", [delta]);
        }
        host.unbind(&counter);
        log.digest()
    };
    assert_eq!(run(), run());
}
