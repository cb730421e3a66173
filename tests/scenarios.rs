//! End-to-end behaviour of `#[vthread]` procedures.

use vthreads::{vthread, Continuation, Scheduler, SlotState, Thread, VirtualThread};

/// Per-instance trace of the segments a slice executed
#[derive(Default)]
struct Trace {
    seen: Vec<char>,
}

impl Trace {
    fn take(&mut self) -> Vec<char> {
        core::mem::take(&mut self.seen)
    }
}

// A; yield; B; yield; mark BeforeC; C; end; D
#[vthread(Abc, ip = *ip)]
fn abc(ip: &mut Continuation<Abc>, t: &mut Trace) {
    begin!();
    t.seen.push('A');
    yield_now!();
    t.seen.push('B');
    yield_now!();
    mark!(BeforeC);
    t.seen.push('C');
    end!();
    t.seen.push('D');
}

#[test]
fn test_three_segment_scenario() {
    let mut ip = Continuation::<Abc>::new();
    let mut t = Trace::default();
    assert!(!ip.is_initialized());

    ip = Abc::init();

    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['A', 'D']);
    assert_eq!(ip, Continuation::At(Abc::__Yield1));

    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['B', 'D']);
    assert_eq!(ip, Continuation::At(Abc::__Yield2));

    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['C', 'D']);
    assert_eq!(ip, Continuation::Stopped);

    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['D']);
    assert_eq!(ip, Continuation::Stopped);
}

#[test]
fn test_seek_skips_segment() {
    let mut ip = Abc::init();
    let mut t = Trace::default();

    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['A', 'D']);

    ip.seek(Abc::BeforeC);
    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['C', 'D']);
    assert!(ip.is_stopped());
}

#[test]
fn test_seek_from_any_state() {
    let starts = [
        Continuation::Uninitialized,
        Continuation::Begin,
        Continuation::At(Abc::__Yield1),
        Continuation::At(Abc::__Yield2),
        Continuation::Stopped,
    ];
    for start in starts {
        let mut ip = start;
        let mut t = Trace::default();
        ip.seek(Abc::BeforeC);
        abc(&mut ip, &mut t);
        assert_eq!(t.take(), ['C', 'D'], "seek from {start:?}");
    }
}

#[test]
fn test_uninitialized_runs_epilogue_only() {
    let mut ip = Continuation::<Abc>::new();
    let mut t = Trace::default();
    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['D']);
    assert_eq!(ip, Continuation::Uninitialized);
}

#[test]
fn test_stopped_is_idempotent() {
    let mut ip = Abc::init();
    let mut t = Trace::default();
    for _ in 0..3 {
        abc(&mut ip, &mut t);
    }
    t.take();

    for _ in 0..10 {
        abc(&mut ip, &mut t);
        assert!(ip.is_stopped());
    }
    assert_eq!(t.take(), ['D'; 10]);
}

#[test]
fn test_restart_from_any_state() {
    let mut ip = Abc::init();
    let mut t = Trace::default();

    abc(&mut ip, &mut t);
    abc(&mut ip, &mut t);
    ip.restart();
    t.take();
    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['A', 'D']);

    ip.stop();
    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['D']);
    ip.restart();
    abc(&mut ip, &mut t);
    assert_eq!(t.take(), ['A', 'D']);
}

#[test]
fn test_instances_are_isolated() {
    let mut first = Abc::init();
    let mut second = Abc::init();
    let mut t1 = Trace::default();
    let mut t2 = Trace::default();

    abc(&mut first, &mut t1);
    abc(&mut first, &mut t1);
    abc(&mut second, &mut t2);

    assert_eq!(t1.take(), ['A', 'D', 'B', 'D']);
    assert_eq!(t2.take(), ['A', 'D']);
    assert_eq!(first, Continuation::At(Abc::__Yield2));
    assert_eq!(second, Continuation::At(Abc::__Yield1));
}

#[test]
fn test_generated_points() {
    assert_eq!(Abc::NAME, "abc");
    assert_eq!(Abc::POINTS, [Abc::__Yield1, Abc::__Yield2, Abc::BeforeC]);
    assert_eq!(Abc::MARKS, [Abc::BeforeC]);
    assert_eq!(Abc::BeforeC.tag(), 2);
    assert!(Abc::BeforeC.is_mark());
    assert_eq!(core::mem::size_of::<Continuation<Abc>>(), 1);
}

/// Input a thread waits on
#[derive(Default)]
struct Gate {
    open: bool,
    seen: Vec<char>,
}

// A; wait for the gate; B; end; D
#[vthread(Waiter, ip = *ip)]
fn waiter(ip: &mut Continuation<Waiter>, g: &mut Gate) {
    begin!();
    g.seen.push('A');
    yield_now!();
    if !g.open {
        return;
    }
    g.seen.push('B');
    end!();
    g.seen.push('D');
}

#[test]
fn test_early_return_keeps_point_and_runs_epilogue() {
    let mut ip = Waiter::init();
    let mut g = Gate::default();

    waiter(&mut ip, &mut g);
    assert_eq!(ip, Continuation::At(Waiter::__Yield1));

    waiter(&mut ip, &mut g);
    waiter(&mut ip, &mut g);
    assert_eq!(ip, Continuation::At(Waiter::__Yield1));
    assert_eq!(core::mem::take(&mut g.seen), ['A', 'D', 'D', 'D']);

    g.open = true;
    waiter(&mut ip, &mut g);
    assert!(ip.is_stopped());
    assert_eq!(g.seen, ['B', 'D']);
}

// N yield points: N + 1 slices, each segment once, in order
#[vthread(Five, ip = *ip)]
fn five(ip: &mut Continuation<Five>, t: &mut Trace) {
    begin!();
    t.seen.push('0');
    yield_now!();
    t.seen.push('1');
    yield_now!();
    t.seen.push('2');
    yield_now!();
    t.seen.push('3');
    yield_now!();
    t.seen.push('4');
    end!();
}

#[test]
fn test_round_trip_visits_every_segment_once() {
    let mut ip = Five::init();
    let mut t = Trace::default();
    let n = Five::POINTS.len();
    assert_eq!(n, 4);

    for slice in 0..=n {
        assert!(!ip.is_stopped(), "stopped early at slice {slice}");
        assert_initialized(&ip);
        five(&mut ip, &mut t);
    }
    assert!(ip.is_stopped());
    assert_eq!(t.take(), ['0', '1', '2', '3', '4']);

    five(&mut ip, &mut t);
    assert!(t.take().is_empty());
}

fn assert_initialized(ip: &Continuation<Five>) {
    assert!(ip.is_initialized());
}

/// Sensor polling with a retry checkpoint; everything that survives a yield
/// lives in this struct.
#[derive(Default)]
struct Sensor {
    ip: Continuation<Poller>,
    readings: [Option<u16>; 4],
    attempts: u32,
    samples: u32,
    polls: u32,
}

#[vthread(Poller, ip = s.ip)]
fn poller(s: &mut Sensor) {
    begin!();
    s.samples = 0;
    mark!(Retry);
    s.attempts += 1;
    yield_now!();
    match s.readings[s.attempts as usize % 4] {
        Some(value) if value < 1000 => s.samples += 1,
        Some(_) => seek!(Retry),
        None => stop!(),
    }
    yield_now!();
    restart!();
    end!();
    s.polls += 1;
}

#[test]
fn test_place_expression_in_struct() {
    let mut s = Sensor {
        ip: Poller::init(),
        readings: [None, Some(5000), Some(12), None],
        ..Default::default()
    };

    poller(&mut s); // attempt 1
    assert_eq!(s.ip.point(), Some(Poller::__Yield1));

    poller(&mut s); // readings[1] out of range: back to Retry
    assert_eq!(s.ip, Continuation::At(Poller::Retry));

    poller(&mut s); // attempt 2
    poller(&mut s); // readings[2] good
    assert_eq!(s.samples, 1);
    assert_eq!(s.ip.point(), Some(Poller::__Yield2));

    poller(&mut s); // restart
    assert_eq!(s.ip, Continuation::Begin);

    poller(&mut s); // attempt 3
    poller(&mut s); // readings[3] missing: stop
    assert!(s.ip.is_stopped());
    assert_eq!(s.attempts, 3);
    assert_eq!(s.polls, 7);
}

#[test]
fn test_raw_round_trip_through_register() {
    let mut register: u8 = Abc::init().to_raw();
    let mut t = Trace::default();

    for _ in 0..4 {
        let mut ip = Continuation::<Abc>::from_raw(register).unwrap();
        abc(&mut ip, &mut t);
        register = ip.to_raw();
    }
    assert_eq!(t.take(), ['A', 'D', 'B', 'D', 'C', 'D', 'D']);
    assert_eq!(register, vthreads::continuation::RAW_STOPPED);
    assert!(Continuation::<Abc>::from_raw(0x40).is_err());
}

#[test]
fn test_scheduler_drives_threads() {
    let mut a = Thread::new(abc, Trace::default());
    let mut b = Thread::new(five, Trace::default());
    let mut sched: Scheduler = Scheduler::new();
    let ia = sched.register(&mut a).unwrap();
    let ib = sched.register(&mut b).unwrap();

    let stats = sched.run(100);
    assert_eq!(stats.rounds, 5);
    assert_eq!(stats.slices, 3 + 5);
    assert_eq!(stats.stopped, 2);
    assert_eq!(sched.state(ia), Ok(SlotState::Stopped));
    assert_eq!(sched.state(ib), Ok(SlotState::Stopped));
    drop(sched);

    assert_eq!(a.state_mut().take(), ['A', 'D', 'B', 'D', 'C', 'D']);
    assert_eq!(b.state_mut().take(), ['0', '1', '2', '3', '4']);
}
