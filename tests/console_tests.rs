//! Integration tests for the console scheduler

use train_console::{
    hal::{MockBusStatus, MockChannel, MockCounter, MockDisplay, MockTrackBus},
    Console, ConsoleConfig, DispatchResult, KeyEvent, PauseGate, QueuedCommand, RunState,
    SensorStep,
};

type TestConsole = Console<MockTrackBus, MockChannel, MockCounter, MockDisplay>;

fn console(counter: MockCounter) -> TestConsole {
    let config = ConsoleConfig::default();
    Console::new(
        &config,
        MockTrackBus::new(config.opcodes.sensor_read_one, config.sensors.decoder_count),
        MockChannel::new(),
        counter,
        MockDisplay::new(),
    )
}

fn started(counter: MockCounter) -> TestConsole {
    let mut console = console(counter);
    console.start(&MockBusStatus::ready()).unwrap();
    console
}

fn steps(console: &mut TestConsole, n: usize) {
    for _ in 0..n {
        console.step().unwrap();
    }
}

fn is_request(byte: u8) -> bool {
    (193..=197).contains(&byte)
}

#[test]
fn poll_exchange_closes_then_reopens_gate() {
    let mut console = started(MockCounter::default());

    // bootstrap request goes out, gate closes
    let report = console.step().unwrap();
    assert_eq!(report.dispatch, DispatchResult::Dispatched(193));
    assert_eq!(console.queue().gate(), PauseGate::Closed);

    // answer arrives on flush; nothing else may go out meanwhile
    let report = console.step().unwrap();
    assert_eq!(report.sensor, SensorStep::Idle);
    assert_eq!(report.dispatch, DispatchResult::Paused);

    let report = console.step().unwrap();
    assert!(matches!(report.sensor, SensorStep::Received { .. }));
    assert_eq!(console.queue().gate(), PauseGate::Closed);

    let report = console.step().unwrap();
    match report.sensor {
        SensorStep::Received { outcome, .. } => assert!(outcome.resumed),
        other => panic!("expected Received, got {:?}", other),
    }
    assert_eq!(console.queue().gate(), PauseGate::Open);

    // next module is polled
    let report = console.step().unwrap();
    assert_eq!(report.sensor, SensorStep::Requested(194));
    assert_eq!(report.dispatch, DispatchResult::Dispatched(194));
}

#[test]
fn train_command_is_sent_between_poll_exchanges() {
    let mut console = started(MockCounter::default());
    console.terminal_mut().feed(b"tr 5 10\n");

    for _ in 0..40 {
        let report = console.step().unwrap();
        if let DispatchResult::Dispatched(byte) = report.dispatch {
            if !is_request(byte) {
                // a command only goes out once the previous answer is fully in
                assert!(console.sensors().cursor().at_chunk_boundary());
            }
        }
    }

    assert_eq!(console.bus().commands_sent(), vec![10, 5, 32]);
    assert_eq!(console.display().line_text(2).as_deref(), Some("tr 5 10"));
}

#[test]
fn edited_line_is_what_gets_sent() {
    let mut console = started(MockCounter::default());
    console.terminal_mut().feed(b"rx\x08v 3\n");
    steps(&mut console, 40);

    assert_eq!(console.bus().commands_sent(), vec![15, 3, 32]);
    assert_eq!(console.display().line_text(2).as_deref(), Some("rv 3"));
}

#[test]
fn switch_and_system_commands() {
    let mut console = started(MockCounter::default());
    console.terminal_mut().feed(b"sw 12 S\nsw 7 C\ng\ns\n");
    steps(&mut console, 80);

    assert_eq!(
        console.bus().commands_sent(),
        vec![33, 12, 32, 34, 7, 32, 96, 97]
    );
}

#[test]
fn sensor_contacts_show_on_screen() {
    let mut console = console(MockCounter::default());
    console.bus_mut().set_module(0, [0x80, 0x00]);
    console.bus_mut().set_module(2, [0x00, 0x01]);
    console.start(&MockBusStatus::ready()).unwrap();

    steps(&mut console, 30);

    let strip = console.display().line_text(3).unwrap();
    assert!(strip.starts_with("|A1:1"), "strip was {strip:?}");
    assert!(strip.contains("|C16:1"), "strip was {strip:?}");
    assert!(console.stats().sensor_events >= 2);
}

#[test]
fn elapsed_time_survives_counter_wrap() {
    // 200 ticks per sample = one tenth per iteration, wrapping after five
    let mut console = started(MockCounter::starting_at(1_000).with_step(200));
    steps(&mut console, 50);

    assert_eq!(console.time().elapsed_tenths(), 50);
    assert_eq!(console.time().carry_ticks(), 0);
    assert!(console
        .display()
        .line_text(1)
        .unwrap()
        .starts_with("Time elapsed: 0:05,0"));
}

#[test]
fn full_queue_drops_operator_command() {
    let mut console = console(MockCounter::default());
    // a head item that never comes due holds everything behind it
    while console
        .queue_mut()
        .enqueue(QueuedCommand::new(7, 10, false))
    {}
    console.start(&MockBusStatus::ready()).unwrap();
    console.terminal_mut().feed(b"g\n");

    let mut commit = None;
    for _ in 0..2 {
        if let KeyEvent::Committed(c) = console.step().unwrap().key {
            commit = Some(c);
        }
    }

    let commit = commit.expect("g should commit");
    assert_eq!(commit.queued, 0);
    assert_eq!(commit.dropped, 1);
    assert!(console.stats().dropped >= 1);
    assert!(console.bus().sent.is_empty());
}

#[test]
fn quit_tears_down() {
    let mut console = console(MockCounter::default().with_step(10));
    console.terminal_mut().feed(b"tr 1 2\nq\n");

    let stats = console.run(&MockBusStatus::quiet_after(5)).unwrap();

    assert_eq!(console.state(), RunState::Stopped);
    assert!(!console.counter().enabled);
    assert_eq!(console.display().cursor(), (35, 1));
    assert!(console.terminal().flush_count() > 0);
    assert_eq!(stats.iterations, 9);
}

#[test]
fn quit_ignores_pending_work() {
    let mut console = started(MockCounter::default());
    for byte in 1..=20 {
        assert!(console.queue_mut().enqueue(QueuedCommand::new(byte, 100, false)));
    }
    console.terminal_mut().feed(b"q\n");

    let mut quit = false;
    for _ in 0..2 {
        quit |= console.step().unwrap().is_quit();
    }
    assert!(quit);
    assert!(!console.queue().is_empty());
}
