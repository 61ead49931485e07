use std::fmt;
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;
use vibrator_hw::{HwError, HwGpio, HwResult};

use super::FakeHwApi;

#[derive(Default)]
struct GpioState {
    initialized: bool,
    level: bool,
    rising_edges: u32,
    fail_init: bool,
    fail_output: bool,
}

/// Fake trigger line fanning its rising edge out to connected actuators.
#[derive(Default)]
pub struct FakeHwGpio {
    state: Mutex<GpioState>,
    targets: Mutex<Vec<Arc<FakeHwApi>>>,
}

impl FakeHwGpio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Line whose initialization fails.
    pub fn broken() -> Self {
        let gpio = Self::default();
        gpio.state.lock().fail_init = true;
        gpio
    }

    /// Deliver rising edges to `api`.
    pub fn connect(&self, api: Arc<FakeHwApi>) {
        self.targets.lock().push(api);
    }

    pub fn fail_output(&self, fail: bool) {
        self.state.lock().fail_output = fail;
    }

    pub fn rising_edges(&self) -> u32 {
        self.state.lock().rising_edges
    }

    pub fn level(&self) -> bool {
        self.state.lock().level
    }
}

impl HwGpio for FakeHwGpio {
    fn init(&self) -> HwResult<()> {
        let mut state = self.state.lock();
        if state.fail_init {
            return Err(HwError::Unavailable("gpio".to_string()));
        }
        state.initialized = true;
        Ok(())
    }

    fn set_output(&self, level: bool) -> HwResult<()> {
        let rising = {
            let mut state = self.state.lock();
            if state.fail_output || !state.initialized {
                return Err(HwError::io(
                    "gpio set_output",
                    io::Error::other("line not writable"),
                ));
            }
            let rising = level && !state.level;
            state.level = level;
            if rising {
                state.rising_edges += 1;
            }
            rising
        };
        if rising {
            for target in self.targets.lock().iter() {
                target.gpio_edge();
            }
        }
        Ok(())
    }

    fn debug(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let state = self.state.lock();
        writeln!(out, "FakeHwGpio:")?;
        writeln!(out, "  Level: {}", u8::from(state.level))?;
        writeln!(out, "  Rising edges: {}", state.rising_edges)
    }
}
