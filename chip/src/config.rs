//! Runtime configuration of the interpreter.
use std::time::Duration;

use crate::{
    definitions::{cpu, display, memory, timer},
    LoadError,
};

/// The knobs a front end may turn, everything else is fixed by the
/// [`definitions`](crate::definitions).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    load_address: usize,
    cpu_hertz: u64,
    timer_hertz: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            load_address: cpu::PROGRAM_COUNTER,
            cpu_hertz: cpu::HERTZ,
            timer_hertz: timer::HERTZ,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Will move the program region to the given address.
    ///
    /// # Example
    /// ```rust
    /// # use chip::{Config, definitions::cpu};
    /// let config = Config::new().with_load_address(cpu::LOW_PROGRAM_COUNTER).unwrap();
    /// assert_eq!(config.load_address(), 0x50);
    /// assert!(Config::new().with_load_address(0x20).is_err());
    /// ```
    pub fn with_load_address(mut self, address: usize) -> Result<Self, LoadError> {
        if address < display::fontset::END || address >= memory::SIZE {
            return Err(LoadError::InvalidLoadAddress(address));
        }
        self.load_address = address;
        Ok(self)
    }

    /// Sets the instruction rate, a value of zero is raised to one.
    pub fn with_cpu_hertz(mut self, hertz: u64) -> Self {
        self.cpu_hertz = hertz.max(1);
        self
    }

    /// Sets the timer rate, a value of zero is raised to one.
    pub fn with_timer_hertz(mut self, hertz: u64) -> Self {
        self.timer_hertz = hertz.max(1);
        self
    }

    pub fn load_address(&self) -> usize {
        self.load_address
    }

    pub fn cpu_hertz(&self) -> u64 {
        self.cpu_hertz
    }

    pub fn timer_hertz(&self) -> u64 {
        self.timer_hertz
    }

    /// The largest program image that fits behind the load address.
    pub fn max_rom_size(&self) -> usize {
        memory::SIZE - self.load_address
    }

    /// The wall clock time a single instruction tick takes.
    pub fn cpu_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.cpu_hertz)
    }
}
