mod common;

mod tests {
    use myrtio_tlc5940::{
        DriverConfig, EngineConfig, FrameKind, MAX_CHIPS, RunState, StartError, Tlc5940, start,
    };

    use crate::common::{
        BLANK, GSCLK, Mode, NoUnits, PIN_COUNT, RecordingClock, RecordingPins, ScopedUnits, config,
        wait_until,
    };

    #[test]
    fn test_start_sends_requested_frames_and_stops() {
        let tlc = Tlc5940::<48>::new();
        let mut pins = RecordingPins::new();
        let clock = RecordingClock::default();

        std::thread::scope(|scope| {
            let executor = ScopedUnits(scope);
            let mut driver = start(&tlc, &config(3), &mut pins, clock.clone(), &executor).unwrap();
            assert!(driver.is_running());
            assert_eq!(tlc.run_state(), RunState::Running);

            let controller = driver.controller();
            controller.set_channel(10, 1234);
            controller.request_update();
            wait_until(|| tlc.counters().sent(FrameKind::Grayscale) >= 1);

            controller.set_all_dot_correction(20);
            wait_until(|| tlc.counters().sent(FrameKind::DotCorrection) >= 1);

            driver.stop();
            driver.stop();
            assert!(!driver.is_running());
        });

        assert_eq!(tlc.run_state(), RunState::Stopped);
        assert_eq!(clock.start_count(), 1);
        assert_eq!(*clock.pins.lock().unwrap(), [GSCLK, BLANK]);

        let frames = pins.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].mode, Mode::Grayscale);
        assert_eq!(frames[0].channels(12)[10], 1234);
        assert_eq!(frames[1].mode, Mode::DotCorrection);
        assert!(frames[1].channels(6).iter().all(|&v| v == 20));
    }

    #[test]
    fn test_idle_engine_backs_off_with_timer() {
        let tlc = Tlc5940::<16>::new();
        let mut pins = RecordingPins::new();
        let config = config(1).with_engine(EngineConfig::DEFAULT);

        std::thread::scope(|scope| {
            let executor = ScopedUnits(scope);
            let driver =
                start(&tlc, &config, &mut pins, RecordingClock::default(), &executor).unwrap();

            driver.controller().request_update();
            wait_until(|| tlc.counters().sent(FrameKind::Grayscale) == 1);
            // Dropping the handle stops the engine.
        });

        assert_eq!(tlc.run_state(), RunState::Stopped);
    }

    #[test]
    fn test_start_rejects_invalid_configuration() {
        let tlc = Tlc5940::<48>::new();
        let mut pins = RecordingPins::new();
        let clock = RecordingClock::default();

        let cases = [
            (
                DriverConfig {
                    sin: PIN_COUNT,
                    ..config(3)
                },
                StartError::InvalidPin(PIN_COUNT),
            ),
            (config(0), StartError::InvalidChipCount(0)),
            (
                config(MAX_CHIPS + 1),
                StartError::InvalidChipCount(MAX_CHIPS + 1),
            ),
            (
                config(4),
                StartError::CapacityExceeded {
                    channels: 64,
                    capacity: 48,
                },
            ),
            (
                config(3).with_base_offset(49),
                StartError::InvalidBaseOffset(49),
            ),
        ];

        for (config, expected) in cases {
            let result = start(&tlc, &config, &mut pins, clock.clone(), &NoUnits);
            assert_eq!(result.err(), Some(expected));
        }

        assert_eq!(tlc.run_state(), RunState::Idle);
        assert_eq!(clock.start_count(), 0);
        assert!(pins.claimed.is_empty());
    }

    #[test]
    fn test_start_without_execution_unit_fails() {
        let tlc = Tlc5940::<48>::new();
        let mut pins = RecordingPins::new();

        let result = start(&tlc, &config(3), &mut pins, RecordingClock::default(), &NoUnits);
        assert_eq!(result.err(), Some(StartError::NoExecutionUnit));
        assert_eq!(tlc.run_state(), RunState::Stopped);
    }

    #[test]
    fn test_state_can_only_be_started_once() {
        let tlc = Tlc5940::<48>::new();
        let mut pins = RecordingPins::new();

        std::thread::scope(|scope| {
            let executor = ScopedUnits(scope);
            let mut driver =
                start(&tlc, &config(3), &mut pins, RecordingClock::default(), &executor).unwrap();

            let mut other_pins = RecordingPins::new();
            let second = start(
                &tlc,
                &config(3),
                &mut other_pins,
                RecordingClock::default(),
                &executor,
            );
            assert_eq!(second.err(), Some(StartError::AlreadyStarted));

            driver.stop();
        });

        let mut pins = RecordingPins::new();
        let restart = start(&tlc, &config(3), &mut pins, RecordingClock::default(), &NoUnits);
        assert_eq!(restart.err(), Some(StartError::AlreadyStarted));
    }

    #[test]
    fn test_instances_are_independent() {
        let first = Tlc5940::<16>::new();
        let second = Tlc5940::<16>::new();
        let mut first_pins = RecordingPins::new();
        let mut second_pins = RecordingPins::new();

        std::thread::scope(|scope| {
            let executor = ScopedUnits(scope);
            let mut a = start(
                &first,
                &config(1),
                &mut first_pins,
                RecordingClock::default(),
                &executor,
            )
            .unwrap();
            let mut b = start(
                &second,
                &config(1),
                &mut second_pins,
                RecordingClock::default(),
                &executor,
            )
            .unwrap();

            a.stop();
            assert_eq!(first.run_state(), RunState::Stopped);
            assert_eq!(second.run_state(), RunState::Running);

            b.controller().set_all_channels(9);
            b.controller().request_update();
            wait_until(|| second.counters().sent(FrameKind::Grayscale) == 1);
            b.stop();
        });

        assert!(first_pins.frames().is_empty());
        assert!(second_pins.frames()[0].channels(12).iter().all(|&v| v == 9));
    }
}
