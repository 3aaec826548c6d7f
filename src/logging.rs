//! Logging setup for a process that owns the terminal.
use std::{
    collections::VecDeque,
    fs::File,
    io::{self, Write},
    path::Path,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::{Context, Result};
use env_logger::{Env, Target};

/// How much of the log is kept while the terminal is in use.
pub const HELD_BYTES: usize = 64 * 1024;

/// Keeps the newest log output in memory until the terminal is given back,
/// anything older than the capacity is dropped.
#[derive(Debug, Clone)]
pub struct HeldLog {
    buffer: Arc<Mutex<VecDeque<u8>>>,
    capacity: usize,
}

impl HeldLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(4096)))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<u8>> {
        // a panicking writer cannot leave the bytes in a broken state
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves everything held so far into the output.
    pub fn release_into<W: Write>(&self, output: &mut W) -> io::Result<()> {
        let held: Vec<u8> = self.lock().drain(..).collect();
        output.write_all(&held)?;
        output.flush()
    }
}

impl Write for HeldLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.lock();
        let keep = &buf[buf.len().saturating_sub(self.capacity)..];
        let overflow = (buffer.len() + keep.len()).saturating_sub(self.capacity);
        buffer.drain(..overflow);
        buffer.extend(keep);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Installs the logger. With a log file everything goes there, otherwise
/// the output is held back and has to be released once the terminal is restored.
pub fn init(log_file: Option<&Path>) -> Result<Option<HeldLog>> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    let held = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Unable to create the log file '{}'", path.display()))?;
            builder
                .target(Target::Pipe(Box::new(file)))
                .filter_level(log::LevelFilter::Info)
                .parse_env(Env::default());
            None
        }
        None => {
            let held = HeldLog::new(HELD_BYTES);
            builder.target(Target::Pipe(Box::new(held.clone())));
            Some(held)
        }
    };
    builder.init();
    Ok(held)
}
