//! Bus-level behaviour against the simulated controller

use super::*;
use spimux_core::{
    BusConfig, Capability, CsMode, CsState, DeviceConfig, DeviceId, Error, PollBound, SpiBus,
    SpiMode, Words,
};

type Bus = SpiBus<SimController, 8>;

fn pin(name: &str) -> Pins {
    name.parse().unwrap()
}

fn bus() -> Bus {
    SpiBus::new(SimController::new(), BusConfig::sam7s())
}

fn position(sim: &SimController, f: impl Fn(&Event) -> bool) -> Vec<usize> {
    sim.events()
        .iter()
        .enumerate()
        .filter(|(_, e)| f(e))
        .map(|(i, _)| i)
        .collect()
}

fn is_word(e: &Event) -> bool {
    matches!(e, Event::Word { .. })
}

#[test]
fn test_loopback_toggle_end_to_end() {
    let mut bus = bus();
    let cs = pin("PA8");
    let dev = bus.create(&DeviceConfig::new(2).with_cs(cs)).unwrap();
    assert_eq!(bus.device(dev).unwrap().capability(), Capability::Gpio);
    bus.hardware_mut().clear_events();

    let mut rx = [0u8; 2];
    let n = bus
        .transfer(dev, Words::Duplex(&[0x55, 0xAA], &mut rx), true)
        .unwrap();

    assert_eq!(n, 2);
    assert_eq!(rx, [0x55, 0xAA]);

    let sim = bus.hardware();
    assert_eq!(sim.words(), vec![(0x55, 0x55), (0xAA, 0xAA)]);
    assert_eq!(sim.lows(cs), 2);
    assert_eq!(sim.highs(cs), 2);
    assert!(sim.is_high(cs));
    assert_eq!(sim.mr().selected_channel(), Some(Channel::CH2));
}

#[test]
fn test_words_clocked_in_buffer_order() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();
    bus.hardware_mut().clear_events();

    let tx: Vec<u8> = (0..32).collect();
    assert_eq!(bus.write(dev, &tx, true).unwrap(), 32);

    let sent: Vec<u16> = bus.hardware().words().iter().map(|w| w.0).collect();
    let expected: Vec<u16> = (0..32).collect();
    assert_eq!(sent, expected);
}

#[test]
fn test_automatic_chip_select_leaves_pin_alone() {
    let mut bus = bus();
    let cs = pin("PA10");
    let dev = bus.create(&DeviceConfig::new(2).with_cs(cs)).unwrap();

    assert_eq!(
        bus.device(dev).unwrap().capability(),
        Capability::Automatic(PeripheralFunction::B)
    );
    assert_eq!(bus.hardware().function(cs), Some(PeripheralFunction::B));
    bus.hardware_mut().clear_events();

    let mut rx = [0u8; 2];
    bus.transfer(dev, Words::Duplex(&[0x55, 0xAA], &mut rx), true)
        .unwrap();

    assert_eq!(rx, [0x55, 0xAA]);
    assert_eq!(bus.hardware().lows(cs), 0);
    assert_eq!(bus.hardware().highs(cs), 0);
}

#[test]
fn test_second_sync_writes_nothing() {
    let mut bus = bus();
    let dev = bus
        .create(&DeviceConfig::new(1).with_cs(pin("PA9")).with_bits(12))
        .unwrap();

    assert!(bus.sync(dev).unwrap());
    bus.hardware_mut().clear_events();
    assert!(!bus.sync(dev).unwrap());
    assert_eq!(bus.hardware().register_writes(), 0);
}

#[test]
fn test_repeat_transfer_only_writes_tdr() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();
    bus.write(dev, &[1, 2], true).unwrap();

    bus.hardware_mut().clear_events();
    bus.write(dev, &[3, 4], true).unwrap();

    let sim = bus.hardware();
    assert_eq!(sim.register_writes(), 2);
    assert_eq!(
        sim.count(|e| matches!(e, Event::RegWrite { reg: Reg::Tdr, .. })),
        2
    );
}

#[test]
fn test_frame_terminated() {
    let mut bus = bus();
    let cs = pin("PA7");
    let dev = bus
        .create(
            &DeviceConfig::new(0)
                .with_cs(cs)
                .with_cs_mode(CsMode::Frame),
        )
        .unwrap();
    bus.hardware_mut().clear_events();

    bus.write(dev, &[1, 2, 3], true).unwrap();

    let sim = bus.hardware();
    let lows = position(sim, |e| *e == Event::Low(cs));
    let highs = position(sim, |e| *e == Event::High(cs));
    let words = position(sim, is_word);

    assert_eq!(lows.len(), 1);
    assert_eq!(highs.len(), 1);
    assert_eq!(words.len(), 3);
    assert!(lows[0] < words[0]);
    assert!(highs[0] > words[2]);
    assert_eq!(bus.device(dev).unwrap().cs_state(), CsState::Negated);
}

#[test]
fn test_frame_unterminated_stays_asserted() {
    let mut bus = bus();
    let cs = pin("PA7");
    let dev = bus
        .create(
            &DeviceConfig::new(0)
                .with_cs(cs)
                .with_cs_mode(CsMode::Frame),
        )
        .unwrap();
    bus.hardware_mut().clear_events();

    bus.write(dev, &[0x9f], false).unwrap();
    assert!(!bus.hardware().is_high(cs));
    assert!(bus.device(dev).unwrap().cs_active());

    // Continue the frame and close it
    let mut id = [0u8; 3];
    bus.read(dev, &mut id, true).unwrap();

    let sim = bus.hardware();
    assert_eq!(sim.lows(cs), 1);
    assert_eq!(sim.highs(cs), 1);
    assert!(sim.is_high(cs));
    assert_eq!(sim.words().len(), 4);
}

#[test]
fn test_device_switch_resyncs_identical_settings() {
    let mut bus = bus();
    let a = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();
    let b = bus.create(&DeviceConfig::new(0).with_cs(pin("PA8"))).unwrap();

    bus.write(a, &[1], true).unwrap();
    assert_eq!(bus.cached(), Some(a));

    bus.hardware_mut().clear_events();
    bus.write(b, &[2], true).unwrap();
    assert_eq!(bus.cached(), Some(b));

    let sim = bus.hardware();
    let csr = position(sim, |e| {
        matches!(e, Event::RegWrite { reg: Reg::Csr(ch), .. } if *ch == Channel::CH0)
    });
    let words = position(sim, is_word);
    assert_eq!(csr.len(), 1);
    assert!(csr[0] < words[0]);
}

#[test]
fn test_setter_invalidates_only_its_device() {
    let mut bus = bus();
    let a = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();
    let b = bus.create(&DeviceConfig::new(1).with_cs(pin("PA8"))).unwrap();

    bus.sync(a).unwrap();
    bus.set_mode(b, SpiMode::Mode3).unwrap();
    assert_eq!(bus.cached(), Some(a));

    bus.set_cs_negate_delay(a, 64).unwrap();
    assert_eq!(bus.cached(), None);

    assert!(bus.sync(a).unwrap());
    assert_eq!(bus.hardware().csr(Channel::CH0).dlybct(), 2);
}

#[test]
fn test_lifecycle_is_reference_counted() {
    let mut bus = bus();
    let cs_a = pin("PA7");
    let cs_b = pin("PA10");
    let a = bus.create(&DeviceConfig::new(0).with_cs(cs_a)).unwrap();
    let b = bus.create(&DeviceConfig::new(2).with_cs(cs_b)).unwrap();
    let spi_id = bus.profile().peripheral_id;

    let sim = bus.hardware();
    assert_eq!(sim.count(|e| *e == Event::ClockEnabled(spi_id)), 1);
    assert_eq!(sim.count(|e| *e == Event::Command(Control::SPIEN)), 1);
    assert!(sim.is_enabled());

    bus.shutdown(a).unwrap();
    assert!(bus.is_powered());
    assert!(bus.hardware().clock_enabled(spi_id));
    let mut rx = [0u8; 1];
    bus.transfer(b, Words::Duplex(&[0x42], &mut rx), true).unwrap();
    assert_eq!(rx, [0x42]);

    bus.shutdown(b).unwrap();
    assert!(!bus.is_powered());
    assert_eq!(bus.cached(), None);

    let profile = bus.profile();
    let sim = bus.hardware();
    assert!(!sim.is_enabled());
    assert!(!sim.clock_enabled(spi_id));
    assert!(sim.is_output(profile.mosi) && !sim.is_high(profile.mosi));
    assert!(sim.is_output(profile.spck) && !sim.is_high(profile.spck));
    assert!(!sim.is_output(profile.miso));
    assert!(sim.pullup_disabled(profile.bus_pins()));

    for cs in [cs_a, cs_b] {
        assert!(sim.is_output(cs));
        assert!(!sim.is_high(cs));
    }
    assert_eq!(bus.device(a).unwrap().cs_state(), CsState::Parked);
    assert_eq!(bus.device(b).unwrap().cs_state(), CsState::Parked);
}

#[test]
fn test_wakeup_restores_parked_pins() {
    let mut bus = bus();
    let cs_a = pin("PA7");
    let cs_b = pin("PA10");
    let a = bus.create(&DeviceConfig::new(0).with_cs(cs_a)).unwrap();
    let b = bus.create(&DeviceConfig::new(2).with_cs(cs_b)).unwrap();
    bus.shutdown(a).unwrap();
    bus.shutdown(b).unwrap();

    bus.wakeup(a).unwrap();

    let profile = bus.profile();
    let sim = bus.hardware();
    assert!(sim.is_enabled());
    assert_eq!(sim.function(profile.bus_pins()), Some(PeripheralFunction::A));
    assert!(sim.is_output(cs_a) && sim.is_high(cs_a));
    assert_eq!(sim.function(cs_b), Some(PeripheralFunction::B));
    assert_eq!(bus.device(a).unwrap().cs_state(), CsState::Negated);
    assert_eq!(bus.device(b).unwrap().cs_state(), CsState::Negated);

    bus.write(b, &[1], true).unwrap();
}

#[test]
fn test_stray_shutdown_keeps_power() {
    let mut bus = bus();
    let a = bus.create(&DeviceConfig::new(0)).unwrap();
    let b = bus.create(&DeviceConfig::new(1)).unwrap();
    bus.shutdown(b).unwrap();
    bus.shutdown(b).unwrap();
    assert!(bus.is_powered());

    bus.shutdown(a).unwrap();
    assert!(!bus.is_powered());
    bus.hardware_mut().clear_events();
    bus.shutdown(a).unwrap();
    assert_eq!(bus.hardware().register_writes(), 0);
}

#[test]
fn test_unwired_pin_always_bit_banged() {
    for cs_mode in [CsMode::Toggle, CsMode::Frame] {
        let mut bus = bus();
        // PA10 carries NPCS2, not NPCS1
        let cs = pin("PA10");
        let dev = bus
            .create(&DeviceConfig::new(1).with_cs(cs).with_cs_mode(cs_mode))
            .unwrap();
        assert_eq!(bus.device(dev).unwrap().capability(), Capability::Gpio);
        assert!(bus.hardware().is_output(cs));

        bus.hardware_mut().clear_events();
        bus.write(dev, &[1, 2], true).unwrap();
        assert!(bus.hardware().lows(cs) > 0);
    }
}

#[test]
fn test_cs_auto_toggle() {
    let mut bus = bus();
    let cs = pin("PA10");
    let dev = bus.create(&DeviceConfig::new(2).with_cs(cs)).unwrap();
    bus.sync(dev).unwrap();

    assert_eq!(bus.set_cs_auto(dev, false).unwrap(), Capability::Gpio);
    assert_eq!(bus.cached(), None);
    assert!(bus.hardware().is_output(cs) && bus.hardware().is_high(cs));

    bus.hardware_mut().clear_events();
    bus.write(dev, &[0x55, 0xAA], true).unwrap();
    assert_eq!(bus.hardware().lows(cs), 2);

    assert_eq!(
        bus.set_cs_auto(dev, true).unwrap(),
        Capability::Automatic(PeripheralFunction::B)
    );
    assert_eq!(bus.hardware().function(cs), Some(PeripheralFunction::B));
}

#[test]
fn test_cs_auto_on_unwired_pin_stays_gpio() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();
    assert_eq!(bus.set_cs_auto(dev, true).unwrap(), Capability::Gpio);
}

#[test]
fn test_always_high_never_touches_chip_select() {
    let mut bus = bus();
    let cs = pin("PA7");
    let dev = bus
        .create(
            &DeviceConfig::new(3)
                .with_cs(cs)
                .with_cs_mode(CsMode::AlwaysHigh),
        )
        .unwrap();
    bus.hardware_mut().clear_events();

    bus.write(dev, &[1, 2, 3], true).unwrap();

    let sim = bus.hardware();
    assert_eq!(sim.lows(cs) + sim.highs(cs), 0);
    assert_eq!(sim.mr().pcs(), Mr::PCS_NONE);
    assert_eq!(sim.words().len(), 3);
}

#[test]
fn test_automatic_byte_frame_releases_before_last_word() {
    let mut bus = bus();
    let dev = bus
        .create(
            &DeviceConfig::new(0)
                .with_cs(pin("PA11"))
                .with_cs_mode(CsMode::Frame),
        )
        .unwrap();

    bus.write(dev, &[1, 2, 3], false).unwrap();
    assert!(bus.hardware().csr(Channel::CH0).csaat());

    bus.hardware_mut().clear_events();
    bus.write(dev, &[4, 5, 6], true).unwrap();
    assert!(!bus.hardware().csr(Channel::CH0).csaat());

    let sim = bus.hardware();
    let release = position(sim, |e| {
        matches!(e, Event::RegWrite { reg: Reg::Csr(_), value } if !Csr(*value).csaat())
    });
    let words = position(sim, is_word);
    assert_eq!(release.len(), 1);
    assert!(words[1] < release[0] && release[0] < words[2]);

    // The next frame holds chip select again
    bus.hardware_mut().clear_events();
    bus.write(dev, &[7], false).unwrap();
    assert!(bus.hardware().csr(Channel::CH0).csaat());
}

#[test]
fn test_automatic_wide_words_raise_lastxfer_before_final_word() {
    let mut bus = bus();
    let dev = bus
        .create(
            &DeviceConfig::new(0)
                .with_cs(pin("PA11"))
                .with_cs_mode(CsMode::Frame)
                .with_bits(16),
        )
        .unwrap();
    bus.hardware_mut().clear_events();

    let tx = [0x34, 0x12, 0x78, 0x56, 0xbc, 0x9a];
    let mut rx = [0u8; 6];
    assert_eq!(
        bus.transfer(dev, Words::Duplex(&tx, &mut rx), true).unwrap(),
        6
    );
    assert_eq!(rx, tx);

    let sim = bus.hardware();
    assert_eq!(
        sim.words(),
        vec![(0x1234, 0x1234), (0x5678, 0x5678), (0x9abc, 0x9abc)]
    );

    let last = position(sim, |e| *e == Event::Command(Control::LASTXFER));
    let words = position(sim, is_word);
    assert_eq!(last.len(), 1);
    assert!(words[1] < last[0] && last[0] < words[2]);
}

#[test]
fn test_unterminated_wide_transfer_keeps_chip_select() {
    let mut bus = bus();
    let dev = bus
        .create(
            &DeviceConfig::new(0)
                .with_cs(pin("PA11"))
                .with_cs_mode(CsMode::Frame)
                .with_bits(16),
        )
        .unwrap();
    bus.hardware_mut().clear_events();

    bus.write(dev, &[0, 0, 0, 0], false).unwrap();
    assert_eq!(
        bus.hardware()
            .count(|e| *e == Event::Command(Control::LASTXFER)),
        0
    );
}

#[test]
fn test_wide_words_masked_to_width() {
    let mut bus = bus();
    let dev = bus
        .create(&DeviceConfig::new(1).with_cs(pin("PA8")).with_bits(12))
        .unwrap();

    assert_eq!(bus.exchange(dev, 0xfabc).unwrap(), 0x0abc);
}

#[test]
fn test_wide_toggle_frames_every_word() {
    let mut bus = bus();
    let cs = pin("PA8");
    let dev = bus
        .create(&DeviceConfig::new(1).with_cs(cs).with_bits(12))
        .unwrap();
    assert_eq!(bus.device(dev).unwrap().capability(), Capability::Gpio);
    bus.hardware_mut().clear_events();

    let tx = [0x01, 0x0a, 0x02, 0x0b, 0x03, 0x0c];
    let mut rx = [0u8; 6];
    assert_eq!(
        bus.transfer(dev, Words::Duplex(&tx, &mut rx), true)
            .unwrap(),
        6
    );
    assert_eq!(rx, tx);

    let sim = bus.hardware();
    assert_eq!(sim.words().len(), 3);
    assert_eq!(sim.lows(cs), 3);
    assert_eq!(sim.highs(cs), 3);

    let lows = position(sim, |e| *e == Event::Low(cs));
    let highs = position(sim, |e| *e == Event::High(cs));
    let words = position(sim, is_word);
    for i in 0..3 {
        assert!(lows[i] < words[i] && words[i] < highs[i]);
    }
}

#[test]
fn test_single_word_helpers() {
    let responder = Responder::Script([0x5a, 0xa5].into_iter().collect());
    let mut bus: Bus = SpiBus::new(SimController::with_responder(responder), BusConfig::sam7s());
    let dev = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();

    bus.put(dev, 0x06).unwrap();
    assert_eq!(bus.get(dev).unwrap(), 0xa5);
    assert_eq!(bus.get(dev).unwrap(), 0xff);

    let sent: Vec<u16> = bus.hardware().words().iter().map(|w| w.0).collect();
    assert_eq!(sent, vec![0x06, 0x00, 0x00]);
}

#[test]
fn test_read_sends_buffer_as_filler() {
    let mut bus: Bus = SpiBus::new(
        SimController::with_responder(Responder::Constant(0x3c)),
        BusConfig::sam7s(),
    );
    let dev = bus.create(&DeviceConfig::new(0)).unwrap();

    let mut buf = [0x11, 0x22];
    assert_eq!(bus.read(dev, &mut buf, true).unwrap(), 2);
    assert_eq!(buf, [0x3c, 0x3c]);
    assert_eq!(bus.hardware().words(), vec![(0x11, 0x3c), (0x22, 0x3c)]);
}

#[test]
fn test_zero_length_touches_nothing() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0).with_cs(pin("PA7"))).unwrap();
    bus.hardware_mut().clear_events();

    assert_eq!(bus.write(dev, &[], true).unwrap(), 0);
    assert!(bus.hardware().events().is_empty());
    assert_eq!(bus.cached(), None);
}

#[test]
fn test_duplex_uses_shorter_buffer() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0)).unwrap();

    let mut rx = [0u8; 2];
    assert_eq!(
        bus.transfer(dev, Words::Duplex(&[1, 2, 3], &mut rx), true)
            .unwrap(),
        2
    );
    assert_eq!(rx, [1, 2]);
}

#[test]
fn test_stuck_controller_times_out() {
    let config = BusConfig::sam7s().with_poll(PollBound::Spins(5));
    let mut bus: Bus = SpiBus::new(SimController::new(), config);
    let cs = pin("PA7");
    let dev = bus.create(&DeviceConfig::new(0).with_cs(cs)).unwrap();

    bus.hardware_mut().set_stuck(true);
    bus.hardware_mut().clear_events();
    assert_eq!(
        bus.write(dev, &[1, 2], true),
        Err(Error::Timeout { device: dev })
    );
    assert_eq!(bus.hardware().status_reads(), 5);

    // Chip select state still matches the pin
    let asserted = bus.device(dev).unwrap().cs_active();
    assert_eq!(asserted, !bus.hardware().is_high(cs));

    bus.hardware_mut().set_stuck(false);
    assert!(bus.write_ready());
}

#[test]
fn test_toggle_timeout_negates_chip_select() {
    let config = BusConfig::sam7s().with_poll(PollBound::Spins(3));
    let mut bus: Bus = SpiBus::new(SimController::new(), config);
    let cs = pin("PA7");
    let dev = bus.create(&DeviceConfig::new(0).with_cs(cs)).unwrap();

    bus.hardware_mut().set_stuck(true);
    bus.hardware_mut().clear_events();
    assert_eq!(
        bus.write(dev, &[1, 2, 3], true),
        Err(Error::Timeout { device: dev })
    );

    let sim = bus.hardware();
    assert!(sim.is_high(cs));
    assert_eq!(sim.lows(cs), 1);
    assert_eq!(sim.highs(cs), 1);
    assert_eq!(bus.device(dev).unwrap().cs_state(), CsState::Negated);
}

#[test]
fn test_frame_timeout_closes_frame() {
    let config = BusConfig::sam7s().with_poll(PollBound::Spins(3));
    let mut bus: Bus = SpiBus::new(SimController::new(), config);
    let cs = pin("PA7");
    let dev = bus
        .create(&DeviceConfig::new(0).with_cs(cs).with_cs_mode(CsMode::Frame))
        .unwrap();

    bus.hardware_mut().set_stuck(true);
    assert_eq!(
        bus.write(dev, &[1, 2], true),
        Err(Error::Timeout { device: dev })
    );
    assert!(bus.hardware().is_high(cs));
    assert!(!bus.device(dev).unwrap().cs_active());

    // An unterminated frame is closed as well
    assert!(bus.write(dev, &[1], false).is_err());
    assert!(bus.hardware().is_high(cs));

    bus.hardware_mut().set_stuck(false);
    bus.hardware_mut().clear_events();
    assert_eq!(bus.write(dev, &[3], true).unwrap(), 1);

    let sim = bus.hardware();
    assert_eq!(sim.lows(cs), 1);
    assert_eq!(sim.highs(cs), 1);
    assert_eq!(sim.words(), vec![(3, 3)]);
}

#[test]
fn test_ready_flags() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0)).unwrap();
    assert!(bus.write_ready());
    assert!(!bus.read_ready());

    bus.write(dev, &[1], true).unwrap();
    assert!(!bus.read_ready());

    bus.hardware_mut().set_stuck(true);
    assert!(!bus.write_ready());
}

#[test]
fn test_pool_exhaustion() {
    let mut bus: SpiBus<SimController, 2> = SpiBus::new(SimController::new(), BusConfig::sam7s());
    bus.create(&DeviceConfig::new(0)).unwrap();
    bus.create(&DeviceConfig::new(1)).unwrap();
    bus.hardware_mut().clear_events();

    assert_eq!(
        bus.create(&DeviceConfig::new(2).with_cs(pin("PA8"))),
        Err(Error::PoolExhausted)
    );
    assert!(bus.hardware().events().is_empty());
}

#[test]
fn test_foreign_handle_rejected() {
    let mut small = bus();
    small.create(&DeviceConfig::new(0)).unwrap();

    let mut big = bus();
    big.create(&DeviceConfig::new(0)).unwrap();
    let foreign = big.create(&DeviceConfig::new(1)).unwrap();

    assert_eq!(
        small.write(foreign, &[1], true),
        Err(Error::UnknownDevice(foreign))
    );
    assert_eq!(small.set_bits(foreign, 8), Err(Error::UnknownDevice(foreign)));
}

#[test]
fn test_invalid_settings_rejected() {
    let mut bus = bus();
    assert_eq!(
        bus.create(&DeviceConfig::new(0).with_bits(20)),
        Err(Error::InvalidBits(20))
    );

    let dev = bus.create(&DeviceConfig::new(0)).unwrap();
    assert_eq!(bus.set_bits(dev, 7), Err(Error::InvalidBits(7)));
    assert_eq!(bus.device(dev).unwrap().bits(), 8);
    assert_eq!(bus.set_speed(dev, 0), Err(Error::InvalidSpeed(0)));
    assert_eq!(bus.set_speed(dev, 100), Err(Error::InvalidSpeed(100)));
}

#[test]
fn test_set_speed_rounds_down() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0)).unwrap();

    assert_eq!(bus.set_speed(dev, 1_000_000).unwrap(), 980_711);
    assert_eq!(bus.device(dev).unwrap().divisor(), 49);

    // Faster than MCK clamps to divisor 1
    let mck = bus.config().mck_hz;
    assert_eq!(bus.set_speed(dev, u32::MAX).unwrap(), mck);
}

#[test]
fn test_divisor_zero_means_default() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0).with_divisor(4)).unwrap();
    bus.set_divisor(dev, 0).unwrap();
    assert_eq!(bus.device(dev).unwrap().divisor(), 128);
}

#[test]
fn test_reset_reprograms_master_mode() {
    let mut bus = bus();
    let dev = bus.create(&DeviceConfig::new(0)).unwrap();
    bus.sync(dev).unwrap();

    bus.reset();

    assert_eq!(bus.cached(), None);
    let sim = bus.hardware();
    assert!(sim.is_enabled());
    assert_eq!(sim.mr(), Mr::master());
    bus.write(dev, &[1], true).unwrap();
}

#[test]
fn test_sam4s_extra_routes() {
    let mut bus: Bus = SpiBus::new(SimController::new(), BusConfig::sam4s());
    let cs = pin("PB14");
    let dev = bus.create(&DeviceConfig::new(1).with_cs(cs)).unwrap();

    assert!(bus.device(dev).unwrap().is_automatic());
    assert_eq!(bus.hardware().function(cs), Some(PeripheralFunction::A));
    assert_eq!(bus.hardware().count(|e| *e == Event::ClockEnabled(21)), 1);
}

#[test]
fn test_handles_are_sequential() {
    let mut bus = bus();
    let ids: Vec<DeviceId> = (0..3)
        .map(|ch| bus.create(&DeviceConfig::new(ch)).unwrap())
        .collect();
    assert_eq!(
        ids.iter().map(|id| id.index()).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(bus.devices().count(), 3);
}
