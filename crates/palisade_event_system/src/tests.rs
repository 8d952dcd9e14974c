//! Behavior tests for the dispatch bus.

use crate::{
    create_event_bus, impl_cancellable_event, impl_event, CancelFlag, EventError, Listen,
    ListenOrder, Listener, Subscription,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct DamageEvent {
    amount: u32,
    cancelled: CancelFlag,
}
impl_cancellable_event!(DamageEvent, cancelled);

impl DamageEvent {
    fn new(amount: u32) -> Self {
        Self {
            amount,
            cancelled: CancelFlag::new(),
        }
    }
}

#[derive(Debug)]
struct ChatEvent {
    message: String,
}
impl_event!(ChatEvent);

#[derive(Debug)]
struct TickEvent;
impl_event!(TickEvent);

fn chat(message: &str) -> ChatEvent {
    ChatEvent {
        message: message.to_string(),
    }
}

#[test]
fn test_handlers_match_exact_event_type_only() {
    let bus = create_event_bus();
    let chats_seen = Arc::new(AtomicUsize::new(0));

    let probe = Arc::clone(&chats_seen);
    bus.register(ListenOrder::Normal, move |_: &ChatEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    bus.post(&TickEvent);
    assert_eq!(chats_seen.load(Ordering::SeqCst), 0);

    bus.post(&chat("hello"));
    assert_eq!(chats_seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_band_order_beats_registration_order() {
    let bus = create_event_bus();
    let log = Arc::new(Mutex::new(Vec::new()));

    // Late first, Early second; dispatch must still run Early before Late.
    let late_log = Arc::clone(&log);
    bus.register(ListenOrder::Late, move |_: &ChatEvent| {
        late_log.lock().unwrap().push("late");
        Ok(())
    });
    let early_log = Arc::clone(&log);
    bus.register(ListenOrder::Early, move |_: &ChatEvent| {
        early_log.lock().unwrap().push("early");
        Ok(())
    });

    bus.post(&chat("ordering"));
    assert_eq!(*log.lock().unwrap(), vec!["early", "late"]);
}

#[test]
fn test_same_band_runs_in_registration_order() {
    let bus = create_event_bus();
    let log = Arc::new(Mutex::new(Vec::new()));

    for label in ["first", "second", "third"] {
        let probe = Arc::clone(&log);
        bus.register(ListenOrder::Normal, move |_: &ChatEvent| {
            probe.lock().unwrap().push(label);
            Ok(())
        });
    }

    bus.post(&chat("fifo"));
    assert_eq!(*log.lock().unwrap(), vec!["first", "second", "third"]);
}

/// Listener exercising the cancellation contract: an early handler cancels,
/// one late handler opts out of cancelled events, the other does not.
struct CombatGuard {
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Listener for CombatGuard {
    fn name(&self) -> &str {
        "combat_guard"
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        let canceller = Arc::clone(&self);
        let skipper = Arc::clone(&self);
        let recorder = Arc::clone(&self);
        vec![
            Subscription::new(
                Listen::order(ListenOrder::Early),
                "combat_guard::block_damage",
                move |event: &DamageEvent| {
                    canceller.log.lock().unwrap().push("early");
                    if event.amount > 0 {
                        event.cancelled.set_cancelled(true);
                    }
                    Ok(())
                },
            ),
            Subscription::new(
                Listen::order(ListenOrder::Late).ignore_cancelled(),
                "combat_guard::apply_damage",
                move |_: &DamageEvent| {
                    skipper.log.lock().unwrap().push("late_skipping");
                    Ok(())
                },
            ),
            Subscription::new(
                Listen::order(ListenOrder::Late),
                "combat_guard::record_attempt",
                move |_: &DamageEvent| {
                    recorder.log.lock().unwrap().push("late_plain");
                    Ok(())
                },
            ),
        ]
    }
}

#[test]
fn test_early_cancel_suppresses_ignore_cancelled_handler() {
    let bus = create_event_bus();
    let log = Arc::new(Mutex::new(Vec::new()));

    bus.register_listener(Arc::new(CombatGuard {
        log: Arc::clone(&log),
    }))
    .unwrap();

    let event = DamageEvent::new(7);
    bus.post(&event);

    assert!(event.cancelled.is_cancelled());
    // The ignore_cancelled handler never ran; the plain late handler did.
    assert_eq!(*log.lock().unwrap(), vec!["early", "late_plain"]);
}

#[test]
fn test_cancelled_event_still_reaches_plain_handlers() {
    let bus = create_event_bus();
    let early_seen = Arc::new(AtomicUsize::new(0));
    let normal_seen = Arc::new(AtomicUsize::new(0));

    let probe = Arc::clone(&early_seen);
    bus.register(ListenOrder::Early, move |event: &DamageEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        event.cancelled.set_cancelled(true);
        Ok(())
    });
    let probe = Arc::clone(&normal_seen);
    bus.register(ListenOrder::Normal, move |_: &DamageEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let event = DamageEvent::new(12);
    bus.post(&event);

    assert!(event.cancelled.is_cancelled());
    assert_eq!(early_seen.load(Ordering::SeqCst), 1);
    assert_eq!(normal_seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_handlers_do_not_abort_dispatch() {
    let bus = create_event_bus();
    let survivors = Arc::new(AtomicUsize::new(0));

    bus.register(ListenOrder::Early, |_: &ChatEvent| {
        Err(EventError::HandlerExecution("muted channel".to_string()))
    });
    bus.register(ListenOrder::Normal, |event: &ChatEvent| -> Result<(), EventError> {
        panic!("bad handler: {}", event.message);
    });
    let probe = Arc::clone(&survivors);
    bus.register(ListenOrder::Late, move |_: &ChatEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    // Must not panic or propagate either failure.
    bus.post(&chat("boom"));

    assert_eq!(survivors.load(Ordering::SeqCst), 1);
    let stats = bus.stats();
    assert_eq!(stats.handler_failures, 2);
    assert_eq!(stats.handlers_invoked, 1);
}

#[test]
fn test_unregister_removes_by_identity() {
    let bus = create_event_bus();
    let seen = Arc::new(AtomicUsize::new(0));

    let probe = Arc::clone(&seen);
    let keep = bus.register(ListenOrder::Normal, move |_: &ChatEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let probe = Arc::clone(&seen);
    let drop_me = bus.register(ListenOrder::Normal, move |_: &ChatEvent| {
        probe.fetch_add(10, Ordering::SeqCst);
        Ok(())
    });

    bus.unregister::<ChatEvent>(ListenOrder::Normal, &drop_me);
    bus.post(&chat("once"));

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert_eq!(bus.handler_count(), 1);
    drop(keep);
}

#[test]
fn test_unregister_unknown_bucket_is_noop() {
    let bus = create_event_bus();
    let handler = bus.register(ListenOrder::Normal, |_: &ChatEvent| Ok(()));

    // Wrong band and never-seen event type; both must be silent no-ops.
    bus.unregister::<ChatEvent>(ListenOrder::Monitor, &handler);
    bus.unregister::<TickEvent>(ListenOrder::Normal, &handler);
    assert_eq!(bus.handler_count(), 1);
}

/// Listener with an invalid marker: `ignore_cancelled` on an event type that
/// has no cancelled flag.
struct BrokenListener;

impl Listener for BrokenListener {
    fn name(&self) -> &str {
        "broken"
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        vec![
            Subscription::new(
                Listen::order(ListenOrder::Normal),
                "broken::fine",
                |_: &ChatEvent| Ok(()),
            ),
            Subscription::new(
                Listen::order(ListenOrder::Late).ignore_cancelled(),
                "broken::bad_marker",
                |_: &ChatEvent| Ok(()),
            ),
        ]
    }
}

#[test]
fn test_listener_validation_fails_fast_and_registers_nothing() {
    let bus = create_event_bus();

    let err = bus
        .register_listener(Arc::new(BrokenListener))
        .unwrap_err();
    assert!(err.to_string().contains("bad_marker"));

    // The valid binding of the same call must not have been installed.
    assert_eq!(bus.handler_count(), 0);
}

struct ChatMirror {
    seen: Arc<AtomicUsize>,
}

impl Listener for ChatMirror {
    fn name(&self) -> &str {
        "chat_mirror"
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        let mirror = Arc::clone(&self);
        let counter = Arc::clone(&self);
        vec![
            Subscription::new(
                Listen::order(ListenOrder::Normal),
                "chat_mirror::echo",
                move |_: &ChatEvent| {
                    mirror.seen.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            ),
            Subscription::new(
                Listen::order(ListenOrder::Monitor),
                "chat_mirror::count_ticks",
                move |_: &TickEvent| {
                    counter.seen.fetch_add(100, Ordering::SeqCst);
                    Ok(())
                },
            ),
        ]
    }
}

#[test]
fn test_unregister_all_sweeps_only_the_listener() {
    let bus = create_event_bus();
    let listener_seen = Arc::new(AtomicUsize::new(0));
    let direct_seen = Arc::new(AtomicUsize::new(0));

    let id = bus
        .register_listener(Arc::new(ChatMirror {
            seen: Arc::clone(&listener_seen),
        }))
        .unwrap();
    let probe = Arc::clone(&direct_seen);
    bus.register(ListenOrder::Normal, move |_: &ChatEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    assert_eq!(bus.handler_count(), 3);

    let removed = bus.unregister_all(id);
    assert_eq!(removed, 2);
    assert_eq!(bus.handler_count(), 1);

    bus.post(&chat("still here"));
    bus.post(&TickEvent);
    assert_eq!(listener_seen.load(Ordering::SeqCst), 0);
    assert_eq!(direct_seen.load(Ordering::SeqCst), 1);
}

#[test]
fn test_post_without_handlers_is_silent() {
    let bus = create_event_bus();
    bus.post(&TickEvent);
    assert_eq!(bus.stats().events_posted, 1);
    assert_eq!(bus.stats().handlers_invoked, 0);
}

#[test]
fn test_concurrent_posts_and_registrations_across_types() {
    let bus = create_event_bus();
    let chats_seen = Arc::new(AtomicUsize::new(0));

    let probe = Arc::clone(&chats_seen);
    bus.register(ListenOrder::Normal, move |_: &ChatEvent| {
        probe.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    let mut threads = Vec::new();
    for _ in 0..4 {
        let bus = Arc::clone(&bus);
        threads.push(std::thread::spawn(move || {
            for n in 0..100 {
                bus.post(&chat(&format!("message {n}")));
            }
        }));
    }
    // Registration against a different event type must not contend with the
    // chat dispatches above.
    let registrar_bus = Arc::clone(&bus);
    threads.push(std::thread::spawn(move || {
        for _ in 0..50 {
            registrar_bus.register(ListenOrder::Monitor, |_: &TickEvent| Ok(()));
        }
    }));

    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(chats_seen.load(Ordering::SeqCst), 400);
    assert_eq!(bus.handler_count(), 51);
    assert_eq!(bus.stats().events_posted, 400);
}
