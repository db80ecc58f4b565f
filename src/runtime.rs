//! The runtime loop.
//!
//! One [`Runtime::poll`] is one iteration of the firmware's only loop. It
//! never blocks: every wait is a [`Deadline`] checked on a later
//! iteration. Within an iteration the order is fixed:
//!
//! 1. sample buttons and follow the BLE connection,
//! 2. idle check (may end in [`Step::Sleep`]),
//! 3. status LED cadence,
//! 4. button / scroll dispatch, at most one category per iteration
//!    (left, right, scroll up, scroll down, nothing). Clicks go out on the
//!    first debounced edge; scroll ticks follow the raw level, paced by
//!    the accelerator's deadline.
//!
//! While not connected, steps 3 and 4 are replaced by the advertising
//! blink and the single-button sleep gesture.
//!
//! Sleep is terminal. Once `poll` returns [`Step::Sleep`] the caller hands
//! the runtime to [`Runtime::enter_sleep`], which consumes it.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::battery::BatterySource;
use crate::config::{Config, PinId};
use crate::connection::{BleSession, ConnectionController, ConnectionEvent, ConnectionState};
use crate::diagnostics::ResetCause;
use crate::error::Error;
use crate::hid::{BatteryLevelSink, MouseButton, MouseSink};
use crate::input::{ButtonId, ButtonState, Buttons};
use crate::led::{LedColor, StatusLed};
use crate::logging::{LogSink, Logger};
use crate::power_logic::{idle_expired, ActivityClock, DeepSleep, LongPress, SleepReason};
use crate::scroll::ScrollAccelerator;
use crate::timer::{Clock, Deadline, Instant};

/// Collaborators the runtime drives. Implemented by the firmware binary
/// for real hardware and by test harnesses for mocks.
pub trait Board {
    type Input: InputPin;
    type Output: OutputPin;
    type Clock: Clock;
    type Delay: DelayNs;
    type Battery: BatterySource;
    type Ble: BleSession;
    type Mouse: MouseSink;
    type Level: BatteryLevelSink;
    type Sleep: DeepSleep;
    type Log: LogSink;
}

/// The collaborators themselves, handed over once at construction.
pub struct BoardParts<B: Board> {
    pub left: B::Input,
    pub right: B::Input,
    pub scroll_up: B::Input,
    pub scroll_down: B::Input,
    pub red: B::Output,
    pub green: B::Output,
    pub blue: B::Output,
    pub clock: B::Clock,
    pub delay: B::Delay,
    pub battery: B::Battery,
    pub ble: B::Ble,
    pub mouse: B::Mouse,
    pub level: B::Level,
    pub sleep: B::Sleep,
    pub log: B::Log,
}

/// Outcome of one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Continue,
    /// Sleep is committed; call [`Runtime::enter_sleep`].
    Sleep(SleepReason),
}

pub struct Runtime<B: Board> {
    config: Config,
    clock: B::Clock,
    delay: B::Delay,
    buttons: Buttons<B::Input>,
    led: StatusLed<B::Output>,
    battery: B::Battery,
    ble: B::Ble,
    mouse: B::Mouse,
    level: B::Level,
    sleep: B::Sleep,
    log: Logger<B::Log>,

    connection: ConnectionController,
    activity: ActivityClock,
    scroll: ScrollAccelerator,
    gesture: LongPress,
    /// Free-running LED cadence counter.
    tick: i64,
    led_off: Deadline,
    scroll_next: Deadline,
    advertising_blink: Deadline,
    /// Buttons currently reported as held to the host.
    left_down: bool,
    right_down: bool,
}

impl<B: Board> Runtime<B> {
    pub fn new(config: Config, parts: BoardParts<B>) -> Result<Self, Error> {
        config.validate()?;

        let buttons = Buttons::new(
            parts.left,
            parts.right,
            parts.scroll_up,
            parts.scroll_down,
            config.debounce,
        );
        let led = StatusLed::new(parts.red, parts.green, parts.blue)?;
        let activity = ActivityClock::new(parts.clock.now());
        let scroll = ScrollAccelerator::new(config.sp_initial, config.sp_accel, config.sp_max);
        let log = Logger::new(parts.log, config.log_level);

        Ok(Self {
            config,
            clock: parts.clock,
            delay: parts.delay,
            buttons,
            led,
            battery: parts.battery,
            ble: parts.ble,
            mouse: parts.mouse,
            level: parts.level,
            sleep: parts.sleep,
            log,
            connection: ConnectionController::new(),
            activity,
            scroll,
            gesture: LongPress::new(),
            tick: -1,
            led_off: Deadline::UNSET,
            scroll_next: Deadline::UNSET,
            advertising_blink: Deadline::UNSET,
            left_down: false,
            right_down: false,
        })
    }

    /// Boot sequence: report how the last run ended, apply the charge
    /// current and publish the first battery reading.
    pub fn start(&mut self, reset: ResetCause) -> Result<(), Error> {
        self.led.all_off()?;

        if reset.is_fault() {
            self.log
                .error(format_args!("Previous run crashed.. reset cause follows..."));
            self.log.error(format_args!("{}", reset));
        } else {
            self.log.info(format_args!("Reset cause: {}", reset));
        }

        let reading = self.battery.read()?;
        self.log
            .info(format_args!("Charging: {}", reading.charging));
        self.log
            .info(format_args!("Voltage: {:.2}V", reading.voltage));

        let current = self.config.charge_current;
        self.battery.set_charge_current(current)?;
        self.log
            .info(format_args!("Charge current: {} mA", current.milliamps()));

        self.level.set_level(reading.percent());
        self.activity.touch(self.clock.now());
        Ok(())
    }

    /// Run one loop iteration.
    pub fn poll(&mut self) -> Result<Step, Error> {
        let now = self.clock.now();
        self.buttons.poll(now)?;

        if let Some(event) = self.connection.update(&mut self.ble)? {
            self.on_connection_event(event)?;
        }

        if idle_expired(self.activity.idle_for(now), self.config.idle_timeout) {
            self.log.debug(format_args!("Idle timeout"));
            return Ok(Step::Sleep(SleepReason::IdleTimeout));
        }

        match self.connection.state() {
            ConnectionState::Connected => {
                self.update_status_led(now)?;
                self.dispatch(now)
            }
            ConnectionState::Disconnected | ConnectionState::Advertising => {
                self.poll_advertising(now)
            }
        }
    }

    /// Everything before the platform primitive: LEDs off, the farewell
    /// blink, the final log line. Returns the wake pin to arm.
    pub fn prepare_sleep(&mut self, reason: SleepReason) -> Result<PinId, Error> {
        self.log.debug(format_args!("Sleep requested: {:?}", reason));
        self.led.all_off()?;
        self.led
            .farewell_blink(&mut self.delay, self.config.farewell_pulse_ms)?;
        self.log.info(format_args!("Enter to Deep Sleep"));
        Ok(self.config.pins.power)
    }

    /// Commit to deep sleep. Does not return; the next thing to run is
    /// the reset handler after the wake button is pressed.
    pub fn enter_sleep(mut self, reason: SleepReason) -> ! {
        let wake = match self.prepare_sleep(reason) {
            Ok(pin) => pin,
            Err(e) => {
                // Sleep is committed; a dead LED must not keep the ring awake.
                self.log
                    .error(format_args!("Farewell failed: {:?}", e));
                self.config.pins.power
            }
        };
        self.sleep.sleep_until_pin_low(wake)
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) -> Result<(), Error> {
        self.gesture.reset();
        self.led_off.clear();
        self.advertising_blink.clear();
        self.led.all_off()?;

        match event {
            ConnectionEvent::AdvertisingStarted => {
                self.log.info(format_args!("Advertising..."));
            }
            ConnectionEvent::Connected { connections } => {
                self.tick = -1;
                self.scroll_next.clear();
                self.log.info(format_args!("Connected {}", connections));
            }
            ConnectionEvent::Lost => {
                self.left_down = false;
                self.right_down = false;
                self.log
                    .info(format_args!("Not Connected (lost connection)"));
            }
        }
        Ok(())
    }

    fn poll_advertising(&mut self, now: Instant) -> Result<Step, Error> {
        if !self.advertising_blink.is_pending(now) {
            if self.led.current() == LedColor::Blue {
                self.led.all_off()?;
            } else {
                self.log.debug(format_args!("Connecting..."));
                self.led.set(LedColor::Blue)?;
            }
            self.advertising_blink
                .arm(now, self.config.advertising_blink);
        }

        if self.config.deep_sleep_by_click {
            let either = self.buttons.left.is_pressed() || self.buttons.right.is_pressed();
            if self.gesture.update(now, either, self.config.push_time) {
                return Ok(Step::Sleep(SleepReason::LongPress));
            }
        }
        Ok(Step::Continue)
    }

    /// Heartbeat flash, battery colour, and LED-off after a flash.
    fn update_status_led(&mut self, now: Instant) -> Result<(), Error> {
        let interval = i64::from(self.config.blink_interval);

        if self.tick == interval * 2 {
            self.led.set(LedColor::Blue)?;
            self.led_off.arm(now, self.config.led_flash);
            self.tick = -1;
        } else if self.tick == interval {
            let reading = self.battery.read()?;
            let percent = reading.percent();
            self.log.info(format_args!(
                "Voltage: {:.2}V Charge: {}% Charging: {}",
                reading.voltage, percent, reading.charging
            ));
            self.led.set(reading.color())?;
            self.level.set_level(percent);
            self.led_off.arm(now, self.config.led_flash);
        } else if self.led_off.take_elapsed(now) {
            self.log.debug(format_args!("LightsOut"));
            self.led.all_off()?;
        }
        self.tick += 1;
        Ok(())
    }

    fn dispatch(&mut self, now: Instant) -> Result<Step, Error> {
        if self.left_down || self.buttons.left.is_pressed() {
            return self.service_button(MouseButton::Left, now);
        }
        if self.right_down || self.buttons.right.is_pressed() {
            return self.service_button(MouseButton::Right, now);
        }

        // Scroll follows the raw level; ticks stop with the release.
        self.gesture.reset();
        if self.buttons.scroll_up.is_low_raw() {
            return Ok(self.service_scroll(1, now));
        }
        if self.buttons.scroll_down.is_low_raw() {
            return Ok(self.service_scroll(-1, now));
        }

        if self.scroll.on_idle_tick() {
            self.log.info(format_args!("scroll speed reset"));
        }
        Ok(Step::Continue)
    }

    fn service_button(&mut self, button: MouseButton, now: Instant) -> Result<Step, Error> {
        let (pressed, down) = match button {
            MouseButton::Left => (self.buttons.left.is_pressed(), self.left_down),
            MouseButton::Right => (self.buttons.right.is_pressed(), self.right_down),
        };

        if self.config.deep_sleep_by_click {
            let both = self.buttons.left.is_pressed() && self.buttons.right.is_pressed();
            if self.gesture.update(now, both, self.config.push_time) {
                return Ok(Step::Sleep(SleepReason::LongPress));
            }
        }

        match (pressed, down) {
            (true, false) => {
                self.mouse.press(button);
                self.set_down(button, true);
                self.activity.touch(now);
                self.log
                    .info(format_args!("{} Button is pressed", label(button)));
            }
            (false, true) => {
                self.mouse.release(button);
                self.set_down(button, false);
                self.activity.touch(now);
                self.log
                    .info(format_args!("{} Button is released", label(button)));
            }
            // Held: nothing new to report, the gesture check above covers it.
            _ => {}
        }
        Ok(Step::Continue)
    }

    fn service_scroll(&mut self, wheel: i8, now: Instant) -> Step {
        if self.scroll_next.is_pending(now) {
            return Step::Continue;
        }
        let delay = self.scroll.on_scroll_event();
        self.scroll_next.arm(now, delay);
        self.mouse.scroll(wheel);
        self.activity.touch(now);
        let direction = if wheel > 0 { "Up" } else { "Down" };
        self.log
            .info(format_args!("{} Button is pressed", direction));
        Step::Continue
    }

    fn set_down(&mut self, button: MouseButton, down: bool) {
        match button {
            MouseButton::Left => self.left_down = down,
            MouseButton::Right => self.right_down = down,
        }
    }

    // Inspection

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn button_state(&self, id: ButtonId) -> ButtonState {
        self.buttons.state(id)
    }

    pub fn scroll_speed(&self) -> f32 {
        self.scroll.speed()
    }

    pub fn last_activity(&self) -> Instant {
        self.activity.last()
    }

    pub fn led_color(&self) -> LedColor {
        self.led.current()
    }

    pub fn log_sink(&self) -> &B::Log {
        self.log.sink()
    }
}

fn label(button: MouseButton) -> &'static str {
    match button {
        MouseButton::Left => "Left",
        MouseButton::Right => "Right",
    }
}
