//! Integration tests: the runtime loop driven against a mock board.
//!
//! Time is simulated in milliseconds and only moves when a test says so
//! (or when the farewell blink delays), so every deadline is exact.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, InputPin, OutputPin};

use mouse_ring::battery::{BatterySource, ChargeCurrent};
use mouse_ring::config::{Config, Hand, PinId};
use mouse_ring::connection::{BleSession, ConnectionState};
use mouse_ring::diagnostics::ResetCause;
use mouse_ring::hid::{BatteryLevelSink, MouseButton, MouseSink};
use mouse_ring::input::{ButtonId, ButtonState};
use mouse_ring::led::LedColor;
use mouse_ring::logging::{LogLevel, LogSink};
use mouse_ring::power_logic::{DeepSleep, SleepReason};
use mouse_ring::timer::{Clock, Instant};
use mouse_ring::{Board, BoardParts, Error, Runtime, Step};

// ═══════════════════════════════════════════════════════════════════════════
// Mock board
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug)]
struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Button input. The cell holds the electrical level: `true` = released.
struct MockPin {
    level: Rc<Cell<bool>>,
    fault: Rc<Cell<bool>>,
}

impl ErrorType for MockPin {
    type Error = PinFault;
}

impl InputPin for MockPin {
    fn is_high(&mut self) -> Result<bool, PinFault> {
        if self.fault.get() {
            return Err(PinFault);
        }
        Ok(self.level.get())
    }

    fn is_low(&mut self) -> Result<bool, PinFault> {
        self.is_high().map(|high| !high)
    }
}

/// LED output. The cell holds the level: `false` (low) = lit.
struct MockLed(Rc<Cell<bool>>);

impl ErrorType for MockLed {
    type Error = PinFault;
}

impl OutputPin for MockLed {
    fn set_low(&mut self) -> Result<(), PinFault> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), PinFault> {
        self.0.set(true);
        Ok(())
    }
}

struct MockClock(Rc<Cell<u64>>);

impl Clock for MockClock {
    fn now(&self) -> Instant {
        Instant::from_millis(self.0.get())
    }
}

/// Advances the simulated clock and snapshots the LED on every wait.
struct MockDelay {
    now: Rc<Cell<u64>>,
    leds: [Rc<Cell<bool>>; 3],
    snapshots: Rc<RefCell<Vec<(bool, bool, bool)>>>,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.snapshots.borrow_mut().push(lit(&self.leds));
        self.now.set(self.now.get() + u64::from(ns / 1_000_000));
    }
}

struct MockBattery {
    voltage: Rc<Cell<f32>>,
    charging: Rc<Cell<bool>>,
    current: Rc<Cell<Option<ChargeCurrent>>>,
}

impl BatterySource for MockBattery {
    fn voltage(&mut self) -> Result<f32, Error> {
        Ok(self.voltage.get())
    }

    fn charging(&mut self) -> Result<bool, Error> {
        Ok(self.charging.get())
    }

    fn set_charge_current(&mut self, level: ChargeCurrent) -> Result<(), Error> {
        self.current.set(Some(level));
        Ok(())
    }
}

struct MockBle {
    connected: Rc<Cell<bool>>,
    advertising: Rc<Cell<bool>>,
}

impl BleSession for MockBle {
    fn start_advertising(&mut self) -> Result<(), Error> {
        self.advertising.set(true);
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), Error> {
        self.advertising.set(false);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn connection_count(&self) -> usize {
        usize::from(self.connected.get())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MouseEvent {
    Press(MouseButton),
    Release(MouseButton),
    Scroll(i8),
}

/// Records what went to the host and when (ms).
struct MockMouse {
    now: Rc<Cell<u64>>,
    events: Rc<RefCell<Vec<(u64, MouseEvent)>>>,
}

impl MockMouse {
    fn record(&mut self, event: MouseEvent) {
        self.events.borrow_mut().push((self.now.get(), event));
    }
}

impl MouseSink for MockMouse {
    fn press(&mut self, button: MouseButton) {
        self.record(MouseEvent::Press(button));
    }

    fn release(&mut self, button: MouseButton) {
        self.record(MouseEvent::Release(button));
    }

    fn scroll(&mut self, wheel: i8) {
        self.record(MouseEvent::Scroll(wheel));
    }
}

struct MockLevel(Rc<RefCell<Vec<u8>>>);

impl BatteryLevelSink for MockLevel {
    fn set_level(&mut self, percent: u8) {
        self.0.borrow_mut().push(percent);
    }
}

struct MockSleep;

impl DeepSleep for MockSleep {
    fn sleep_until_pin_low(&mut self, wake_pin: PinId) -> ! {
        panic!("deep sleep, wake on pin {}", wake_pin.0);
    }
}

struct MockLog(Rc<RefCell<Vec<(LogLevel, String)>>>);

impl LogSink for MockLog {
    fn write(&mut self, level: LogLevel, args: std::fmt::Arguments<'_>) {
        self.0.borrow_mut().push((level, args.to_string()));
    }
}

struct Mock;

impl Board for Mock {
    type Input = MockPin;
    type Output = MockLed;
    type Clock = MockClock;
    type Delay = MockDelay;
    type Battery = MockBattery;
    type Ble = MockBle;
    type Mouse = MockMouse;
    type Level = MockLevel;
    type Sleep = MockSleep;
    type Log = MockLog;
}

fn lit(leds: &[Rc<Cell<bool>>; 3]) -> (bool, bool, bool) {
    (!leds[0].get(), !leds[1].get(), !leds[2].get())
}

/// Test-side handles on everything the mocks share with the runtime.
struct Rig {
    now: Rc<Cell<u64>>,
    left: Rc<Cell<bool>>,
    right: Rc<Cell<bool>>,
    up: Rc<Cell<bool>>,
    down: Rc<Cell<bool>>,
    fault: Rc<Cell<bool>>,
    leds: [Rc<Cell<bool>>; 3],
    connected: Rc<Cell<bool>>,
    advertising: Rc<Cell<bool>>,
    voltage: Rc<Cell<f32>>,
    charging: Rc<Cell<bool>>,
    current: Rc<Cell<Option<ChargeCurrent>>>,
    mouse: Rc<RefCell<Vec<(u64, MouseEvent)>>>,
    levels: Rc<RefCell<Vec<u8>>>,
    log: Rc<RefCell<Vec<(LogLevel, String)>>>,
    snapshots: Rc<RefCell<Vec<(bool, bool, bool)>>>,
}

impl Rig {
    fn new() -> (Self, BoardParts<Mock>) {
        let rig = Rig {
            now: Rc::new(Cell::new(0)),
            left: Rc::new(Cell::new(true)),
            right: Rc::new(Cell::new(true)),
            up: Rc::new(Cell::new(true)),
            down: Rc::new(Cell::new(true)),
            fault: Rc::new(Cell::new(false)),
            leds: [
                Rc::new(Cell::new(false)),
                Rc::new(Cell::new(false)),
                Rc::new(Cell::new(false)),
            ],
            connected: Rc::new(Cell::new(false)),
            advertising: Rc::new(Cell::new(false)),
            voltage: Rc::new(Cell::new(4.00)),
            charging: Rc::new(Cell::new(false)),
            current: Rc::new(Cell::new(None)),
            mouse: Rc::new(RefCell::new(Vec::new())),
            levels: Rc::new(RefCell::new(Vec::new())),
            log: Rc::new(RefCell::new(Vec::new())),
            snapshots: Rc::new(RefCell::new(Vec::new())),
        };
        let pin = |level: &Rc<Cell<bool>>| MockPin {
            level: level.clone(),
            fault: rig.fault.clone(),
        };
        let parts = BoardParts {
            left: pin(&rig.left),
            right: pin(&rig.right),
            scroll_up: pin(&rig.up),
            scroll_down: pin(&rig.down),
            red: MockLed(rig.leds[0].clone()),
            green: MockLed(rig.leds[1].clone()),
            blue: MockLed(rig.leds[2].clone()),
            clock: MockClock(rig.now.clone()),
            delay: MockDelay {
                now: rig.now.clone(),
                leds: rig.leds.clone(),
                snapshots: rig.snapshots.clone(),
            },
            battery: MockBattery {
                voltage: rig.voltage.clone(),
                charging: rig.charging.clone(),
                current: rig.current.clone(),
            },
            ble: MockBle {
                connected: rig.connected.clone(),
                advertising: rig.advertising.clone(),
            },
            mouse: MockMouse {
                now: rig.now.clone(),
                events: rig.mouse.clone(),
            },
            level: MockLevel(rig.levels.clone()),
            sleep: MockSleep,
            log: MockLog(rig.log.clone()),
        };
        (rig, parts)
    }

    fn poll_at(&self, rt: &mut Runtime<Mock>, ms: u64) -> Step {
        self.now.set(ms);
        rt.poll().expect("poll failed")
    }

    /// Poll once per millisecond over `from..=to`, stopping at the first
    /// sleep request.
    fn run(&self, rt: &mut Runtime<Mock>, from: u64, to: u64) -> Option<(u64, SleepReason)> {
        for t in from..=to {
            if let Step::Sleep(reason) = self.poll_at(rt, t) {
                return Some((t, reason));
            }
        }
        None
    }

    fn events(&self) -> Vec<(u64, MouseEvent)> {
        self.mouse.borrow().clone()
    }

    fn logged(&self, text: &str) -> bool {
        self.log.borrow().iter().any(|(_, line)| line.contains(text))
    }

    fn count_logged(&self, text: &str) -> usize {
        self.log
            .borrow()
            .iter()
            .filter(|(_, line)| line.contains(text))
            .count()
    }
}

fn press(button: &Rc<Cell<bool>>) {
    button.set(false);
}

fn release(button: &Rc<Cell<bool>>) {
    button.set(true);
}

fn test_config() -> Config {
    Config::for_hand(Hand::Left)
}

fn boot_with(config: Config) -> (Rig, Runtime<Mock>) {
    let (rig, parts) = Rig::new();
    let mut rt = Runtime::new(config, parts).expect("valid config");
    rt.start(ResetCause::PowerOn).expect("start");
    (rig, rt)
}

fn boot() -> (Rig, Runtime<Mock>) {
    boot_with(test_config())
}

/// Boot, come up connected at t=0.
fn boot_connected() -> (Rig, Runtime<Mock>) {
    let (rig, mut rt) = boot();
    rig.connected.set(true);
    assert_eq!(rig.poll_at(&mut rt, 0), Step::Continue);
    assert_eq!(rt.connection_state(), ConnectionState::Connected);
    (rig, rt)
}

// ═══════════════════════════════════════════════════════════════════════════
// Boot
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn start_reports_battery_and_applies_charge_current() {
    let (rig, rt) = boot();
    assert_eq!(rig.current.get(), Some(ChargeCurrent::Ma50));
    assert_eq!(*rig.levels.borrow(), vec![65]);
    assert!(rig.logged("Reset cause: power-on"));
    assert!(rig.logged("Charging: false"));
    assert!(rig.logged("Voltage: 4.00V"));
    assert!(rig.logged("Charge current: 50 mA"));
    assert_eq!(rt.led_color(), LedColor::Off);
    assert_eq!(lit(&rig.leds), (false, false, false));
}

#[test]
fn start_after_fault_logs_crash_at_error_level() {
    let (rig, parts) = Rig::new();
    let mut rt = Runtime::new(test_config(), parts).expect("valid config");
    rt.start(ResetCause::Watchdog).expect("start");

    let log = rig.log.borrow();
    let errors: Vec<_> = log
        .iter()
        .filter(|(level, _)| *level == LogLevel::Error)
        .map(|(_, line)| line.as_str())
        .collect();
    assert_eq!(
        errors,
        vec!["Previous run crashed.. reset cause follows...", "watchdog timeout"]
    );
}

#[test]
fn invalid_config_is_rejected() {
    let (_rig, parts) = Rig::new();
    let mut config = test_config();
    config.sp_accel = 0.0;
    assert!(matches!(
        Runtime::<Mock>::new(config, parts),
        Err(Error::Config(_))
    ));
}

#[test]
fn pin_read_failure_surfaces_as_input_error() {
    let (rig, mut rt) = boot();
    rig.fault.set(true);
    assert_eq!(rt.poll().err(), Some(Error::Input));
}

// ═══════════════════════════════════════════════════════════════════════════
// Connection lifecycle
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn lifecycle_advertise_connect_lose_readvertise() {
    let (rig, mut rt) = boot();

    rig.poll_at(&mut rt, 0);
    assert_eq!(rt.connection_state(), ConnectionState::Advertising);
    assert!(rig.advertising.get());
    assert!(rig.logged("Advertising..."));

    rig.connected.set(true);
    rig.poll_at(&mut rt, 10);
    assert_eq!(rt.connection_state(), ConnectionState::Connected);
    assert!(!rig.advertising.get());
    assert!(rig.logged("Connected 1"));

    rig.connected.set(false);
    rig.poll_at(&mut rt, 20);
    assert_eq!(rt.connection_state(), ConnectionState::Disconnected);
    assert!(rig.logged("Not Connected (lost connection)"));

    rig.poll_at(&mut rt, 30);
    assert_eq!(rt.connection_state(), ConnectionState::Advertising);
    assert!(rig.advertising.get());
    assert_eq!(rig.count_logged("Advertising..."), 2);
}

#[test]
fn buttons_are_not_sent_while_advertising() {
    let (rig, mut rt) = boot();
    press(&rig.left);
    assert!(rig.run(&mut rt, 0, 1000).is_none());
    assert!(rig.events().is_empty());
}

#[test]
fn advertising_blinks_blue_without_blocking() {
    let (rig, mut rt) = boot();
    rig.poll_at(&mut rt, 0);
    assert_eq!(rt.led_color(), LedColor::Blue);
    rig.poll_at(&mut rt, 500);
    assert_eq!(rt.led_color(), LedColor::Blue);
    rig.poll_at(&mut rt, 1000);
    assert_eq!(rt.led_color(), LedColor::Off);
    rig.poll_at(&mut rt, 2000);
    assert_eq!(rt.led_color(), LedColor::Blue);
    assert_eq!(lit(&rig.leds), (false, false, true));
}

#[test]
fn connecting_switches_the_advertising_led_off() {
    let (rig, mut rt) = boot();
    rig.poll_at(&mut rt, 0);
    assert_eq!(rt.led_color(), LedColor::Blue);
    rig.connected.set(true);
    rig.poll_at(&mut rt, 1);
    assert_eq!(rt.led_color(), LedColor::Off);
}

// ═══════════════════════════════════════════════════════════════════════════
// Status LED cadence
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn battery_flash_then_heartbeat() {
    let mut config = test_config();
    config.blink_interval = 3;
    let (rig, mut rt) = boot_with(config);
    rig.connected.set(true);

    let mut polls = 0;
    while rt.led_color() == LedColor::Off {
        rig.poll_at(&mut rt, 0);
        polls += 1;
        assert!(polls <= 10, "battery flash never came");
    }
    // Scenario: 4.00 V, not charging
    assert_eq!(rt.led_color(), LedColor::Amber);
    assert_eq!(lit(&rig.leds), (true, true, false));
    assert_eq!(*rig.levels.borrow(), vec![65, 65]);
    assert!(rig.logged("Voltage: 4.00V Charge: 65% Charging: false"));

    rig.poll_at(&mut rt, 0);
    assert_eq!(rt.led_color(), LedColor::Amber);
    rig.poll_at(&mut rt, 100);
    assert_eq!(rt.led_color(), LedColor::Off);
    rig.poll_at(&mut rt, 100);
    assert_eq!(rt.led_color(), LedColor::Blue);
    rig.poll_at(&mut rt, 200);
    assert_eq!(rt.led_color(), LedColor::Off);
}

#[test]
fn empty_battery_flashes_red_and_charging_flashes_green() {
    let mut config = test_config();
    config.blink_interval = 2;
    let (rig, mut rt) = boot_with(config);
    rig.voltage.set(3.50);
    rig.connected.set(true);

    let mut t = 0;
    while rt.led_color() == LedColor::Off {
        rig.poll_at(&mut rt, t);
        t += 1;
        assert!(t < 10);
    }
    assert_eq!(rt.led_color(), LedColor::Red);
    assert_eq!(rig.levels.borrow().last(), Some(&0));

    rig.charging.set(true);
    // Off, then heartbeat, then the next battery flash
    let mut seen = Vec::new();
    for _ in 0..40 {
        t += 50;
        rig.poll_at(&mut rt, t);
        let color = rt.led_color();
        if seen.last() != Some(&color) {
            seen.push(color);
        }
        if color == LedColor::Green {
            break;
        }
    }
    assert_eq!(seen.last(), Some(&LedColor::Green));
    assert!(seen.contains(&LedColor::Blue));
}

// ═══════════════════════════════════════════════════════════════════════════
// Buttons
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn clean_click_reports_press_then_release() {
    let (rig, mut rt) = boot_connected();

    press(&rig.left);
    rig.run(&mut rt, 1000, 1400);
    release(&rig.left);
    rig.run(&mut rt, 1401, 2000);

    assert_eq!(
        rig.events(),
        vec![
            (1000, MouseEvent::Press(MouseButton::Left)),
            (1401, MouseEvent::Release(MouseButton::Left)),
        ]
    );
    assert!(rig.logged("Left Button is pressed"));
    assert!(rig.logged("Left Button is released"));
    assert_eq!(rt.last_activity(), Instant::from_millis(1401));
}

#[test]
fn short_bouncy_click_sends_one_press_and_release() {
    let (rig, mut rt) = boot_connected();

    // a 50 ms click with three flickers, released for good at 1050
    let script = [
        (1000, true),
        (1010, false),
        (1015, true),
        (1025, false),
        (1030, true),
        (1040, false),
        (1045, true),
        (1050, false),
    ];
    for t in 1000..=2000u64 {
        if let Some(&(_, low)) = script.iter().find(|(at, _)| *at == t) {
            if low {
                press(&rig.left);
            } else {
                release(&rig.left);
            }
        }
        rig.poll_at(&mut rt, t);
    }

    assert_eq!(
        rig.events(),
        vec![
            (1000, MouseEvent::Press(MouseButton::Left)),
            (1150, MouseEvent::Release(MouseButton::Left)),
        ]
    );
    assert_eq!(rig.count_logged("Left Button is pressed"), 1);
    assert_eq!(rig.count_logged("Left Button is released"), 1);
}

#[test]
fn quick_tap_inside_the_window_is_not_lost() {
    let (rig, mut rt) = boot_connected();

    press(&rig.right);
    rig.run(&mut rt, 1000, 1060);
    release(&rig.right);
    rig.run(&mut rt, 1061, 1500);

    assert_eq!(
        rig.events(),
        vec![
            (1000, MouseEvent::Press(MouseButton::Right)),
            (1150, MouseEvent::Release(MouseButton::Right)),
        ]
    );
}

#[test]
fn bouncy_press_sends_exactly_one_press() {
    let (rig, mut rt) = boot_connected();

    // 50 ms of contact bounce, then a solid hold
    for t in 1000..=2000u64 {
        if t <= 1050 {
            rig.right.set((t / 10) % 2 == 1);
        } else if t < 1500 {
            press(&rig.right);
        } else {
            release(&rig.right);
        }
        rig.poll_at(&mut rt, t);
    }

    let events = rig.events();
    let presses = events
        .iter()
        .filter(|(_, e)| *e == MouseEvent::Press(MouseButton::Right))
        .count();
    let releases = events
        .iter()
        .filter(|(_, e)| *e == MouseEvent::Release(MouseButton::Right))
        .count();
    assert_eq!(presses, 1);
    assert_eq!(releases, 1);
    assert_eq!(rig.count_logged("Right Button is pressed"), 1);
}

#[test]
fn left_button_has_priority_over_scroll() {
    let (rig, mut rt) = boot_connected();

    press(&rig.left);
    press(&rig.up);
    rig.run(&mut rt, 1000, 2000);
    assert_eq!(rig.events(), vec![(1000, MouseEvent::Press(MouseButton::Left))]);

    release(&rig.left);
    rig.run(&mut rt, 2001, 2200);
    let events = rig.events();
    assert_eq!(events[1], (2001, MouseEvent::Release(MouseButton::Left)));
    // scroll resumes on the following iteration, never in the same one
    assert_eq!(events[2], (2002, MouseEvent::Scroll(1)));
}

#[test]
fn held_left_blocks_right_button() {
    let (rig, mut rt) = boot_connected();

    press(&rig.left);
    rig.run(&mut rt, 1000, 1200);
    press(&rig.right);
    rig.run(&mut rt, 1201, 2000);

    assert_eq!(rig.events(), vec![(1000, MouseEvent::Press(MouseButton::Left))]);
    assert_eq!(rt.button_state(ButtonId::Right), ButtonState::Held);
}

// ═══════════════════════════════════════════════════════════════════════════
// Scroll
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn held_scroll_accelerates_to_floor() {
    let (rig, mut rt) = boot_connected();

    press(&rig.up);
    rig.run(&mut rt, 1000, 4000);

    let times: Vec<u64> = rig
        .events()
        .into_iter()
        .map(|(t, e)| {
            assert_eq!(e, MouseEvent::Scroll(1));
            t
        })
        .collect();
    assert_eq!(times[0], 1000);

    let expected = [185, 170, 155, 140, 125, 110, 95, 80, 65, 50, 35, 20, 10, 10, 10];
    for (i, want) in expected.iter().enumerate() {
        let gap = times[i + 1] - times[i];
        assert!(
            gap >= *want && gap <= want + 1,
            "gap {} was {} ms, expected {}",
            i,
            gap,
            want
        );
    }
    assert!((rt.scroll_speed() - 0.01).abs() < 1e-6);
}

#[test]
fn scroll_down_sends_negative_wheel_and_resets_after_release() {
    let (rig, mut rt) = boot_connected();

    press(&rig.down);
    rig.run(&mut rt, 1000, 1600);
    assert!(rt.scroll_speed() < 0.2);
    assert!(rig
        .events()
        .iter()
        .all(|(_, e)| *e == MouseEvent::Scroll(-1)));
    assert!(rig.logged("Down Button is pressed"));

    release(&rig.down);
    rig.run(&mut rt, 1601, 1800);
    assert_eq!(rt.scroll_speed(), 0.2);
    assert_eq!(rig.count_logged("scroll speed reset"), 1);
}

#[test]
fn scroll_stops_the_moment_the_button_is_released() {
    let (rig, mut rt) = boot_connected();

    press(&rig.up);
    rig.run(&mut rt, 1000, 4000);
    let ticks = rig.events().len();
    assert!(ticks > 15);

    release(&rig.up);
    rig.poll_at(&mut rt, 4001);
    assert_eq!(rt.scroll_speed(), 0.2);
    rig.run(&mut rt, 4002, 4500);

    let events = rig.events();
    assert_eq!(events.len(), ticks);
    assert!(events.iter().all(|(t, _)| *t <= 4000));
    assert_eq!(rig.count_logged("scroll speed reset"), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// Sleep triggers
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn idle_timeout_while_connected() {
    let (rig, mut rt) = boot_connected();
    assert_eq!(rig.poll_at(&mut rt, 600_000), Step::Continue);
    assert_eq!(
        rig.poll_at(&mut rt, 600_001),
        Step::Sleep(SleepReason::IdleTimeout)
    );
    // at the default Info level the timeout itself stays quiet
    assert!(!rig.logged("Idle timeout"));
}

#[test]
fn idle_timeout_while_advertising() {
    let (rig, mut rt) = boot();
    rig.poll_at(&mut rt, 0);
    assert_eq!(rig.poll_at(&mut rt, 300_000), Step::Continue);
    assert_eq!(
        rig.poll_at(&mut rt, 600_001),
        Step::Sleep(SleepReason::IdleTimeout)
    );
}

#[test]
fn activity_postpones_idle_timeout() {
    let (rig, mut rt) = boot_connected();
    press(&rig.left);
    rig.run(&mut rt, 100_000, 100_200);
    release(&rig.left);
    rig.run(&mut rt, 100_201, 100_400);
    // released at 100_201
    assert_eq!(rig.poll_at(&mut rt, 700_201), Step::Continue);
    assert_eq!(
        rig.poll_at(&mut rt, 700_202),
        Step::Sleep(SleepReason::IdleTimeout)
    );
}

#[test]
fn both_buttons_held_for_push_time_sleeps() {
    let (rig, mut rt) = boot_connected();
    press(&rig.left);
    press(&rig.right);

    assert!(rig.run(&mut rt, 1000, 5999).is_none());
    assert_eq!(
        rig.poll_at(&mut rt, 6000),
        Step::Sleep(SleepReason::LongPress)
    );
}

#[test]
fn single_button_does_not_sleep_while_connected() {
    let (rig, mut rt) = boot_connected();
    press(&rig.left);
    assert!(rig.run(&mut rt, 1000, 12_000).is_none());
}

#[test]
fn releasing_early_restarts_the_hold() {
    let (rig, mut rt) = boot_connected();
    press(&rig.left);
    press(&rig.right);
    assert!(rig.run(&mut rt, 1000, 5000).is_none());

    release(&rig.right);
    assert!(rig.run(&mut rt, 5001, 5400).is_none());
    press(&rig.right);
    // right accepted again at 5401; the hold counts from there
    assert!(rig.run(&mut rt, 5401, 10_400).is_none());
    assert_eq!(
        rig.poll_at(&mut rt, 10_401),
        Step::Sleep(SleepReason::LongPress)
    );
}

#[test]
fn either_button_held_while_advertising_sleeps() {
    let (rig, mut rt) = boot();
    press(&rig.right);
    assert!(rig.run(&mut rt, 0, 4999).is_none());
    assert_eq!(
        rig.poll_at(&mut rt, 5000),
        Step::Sleep(SleepReason::LongPress)
    );
}

#[test]
fn gesture_can_be_disabled() {
    let mut config = test_config();
    config.deep_sleep_by_click = false;
    let (rig, mut rt) = boot_with(config);
    press(&rig.left);
    assert!(rig.run(&mut rt, 0, 8000).is_none());
}

// ═══════════════════════════════════════════════════════════════════════════
// Entering sleep
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn prepare_sleep_plays_farewell_and_returns_wake_pin() {
    let (rig, mut rt) = boot_connected();
    let wake = rt
        .prepare_sleep(SleepReason::IdleTimeout)
        .expect("prepare");

    assert_eq!(wake, PinId::p1(11));
    let off = (false, false, false);
    assert_eq!(
        *rig.snapshots.borrow(),
        vec![
            off,
            (true, false, false),
            off,
            (false, true, false),
            off,
            (false, false, true),
        ]
    );
    assert_eq!(lit(&rig.leds), off);
    assert_eq!(rig.now.get(), 1200);
    let last = rig.log.borrow().last().cloned().expect("log line");
    assert_eq!(last.1, "Enter to Deep Sleep");
    assert!(!rig.logged("Sleep requested"));
}

#[test]
#[should_panic(expected = "deep sleep")]
fn enter_sleep_hands_over_to_platform() {
    let (rig, mut rt) = boot_connected();
    press(&rig.left);
    press(&rig.right);
    let (_, reason) = rig.run(&mut rt, 1000, 7000).expect("long press");
    rt.enter_sleep(reason);
}
