//! Property tests for the queue, time base, decoder, and number parsing

use proptest::prelude::*;
use train_console::config::QUEUE_SLOTS;
use train_console::hal::MockChannel;
use train_console::interpreter::parse_number;
use train_console::{CommandQueue, ConsoleConfig, QueuedCommand, SensorDecoder, TimeBase};

proptest! {
    #[test]
    fn queue_keeps_fifo_order_up_to_capacity(bytes in prop::collection::vec(any::<u8>(), 0..250)) {
        let mut queue = CommandQueue::new();
        let accepted: Vec<u8> = bytes
            .iter()
            .copied()
            .take_while(|b| queue.enqueue(QueuedCommand::immediate(*b)))
            .collect();

        prop_assert_eq!(accepted.len(), bytes.len().min(QUEUE_SLOTS - 1));
        prop_assert_eq!(queue.len(), accepted.len());

        let mut bus = MockChannel::new();
        while !queue.is_empty() {
            queue.tick(0, &mut bus).unwrap();
        }
        prop_assert_eq!(bus.written(), accepted.as_slice());
    }

    #[test]
    fn time_base_accounts_every_tick(
        start in any::<u32>(),
        gaps in prop::collection::vec(0u32..100_000, 1..64),
    ) {
        let mut time = TimeBase::new(start, 200);
        let mut raw = start;
        let mut total: u64 = 0;
        let mut returned: u64 = 0;

        for gap in gaps {
            raw = raw.wrapping_sub(gap);
            total += u64::from(gap);
            returned += u64::from(time.accumulate(raw));
        }

        let accounted = u64::from(time.elapsed_tenths()) * 200
            + u64::from(time.carry_ticks())
            + u64::from(time.raw_delta(raw));
        prop_assert_eq!(accounted, total);
        prop_assert_eq!(returned, u64::from(time.elapsed_tenths()));
        prop_assert!(time.carry_ticks() < 200);
    }

    #[test]
    fn decoder_reports_one_event_per_set_bit(bytes in prop::collection::vec(any::<u8>(), 1..40)) {
        let mut decoder = SensorDecoder::new(&ConsoleConfig::default());
        let mut queue = CommandQueue::new();
        let mut expected = 0u32;

        for byte in bytes {
            let outcome = decoder.ingest(byte, &mut queue);
            prop_assert_eq!(outcome.events.len() as u32, byte.count_ones());
            for (_, event) in &outcome.events {
                prop_assert!((1..=16).contains(&event.sensor_id));
                prop_assert!(('A'..='E').contains(&event.decoder_id));
            }
            expected += byte.count_ones();
        }
        prop_assert_eq!(decoder.events_total(), expected);
    }

    #[test]
    fn numbers_wrap_to_a_byte(n in any::<u32>(), suffix in "[a-z ]{0,4}") {
        let token = format!("{n}{suffix}");
        prop_assert_eq!(parse_number(&token), (n % 256) as u8);
    }
}
