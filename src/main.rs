mod logging;
mod terminal;

use std::{io, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use chip::{
    definitions::{cpu, keyboard, timer},
    resources::Rom,
    Config, Shutdown,
};
use clap::Parser;

use terminal::{TerminalDisplay, TerminalInput, TerminalSound};

/// Runs a chip8 program inside of the terminal.
///
/// The keypad sits on the keys 1-4, Q-R, A-F and Z-V, Esc quits.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The program image to run
    rom: PathBuf,
    /// The instructions executed per second
    #[arg(long, default_value_t = cpu::HERTZ)]
    hertz: u64,
    /// The rate the delay and sound timers count down at
    #[arg(long, default_value_t = timer::HERTZ)]
    timer_hertz: u64,
    /// Load the program right after the font instead of at 0x200
    #[arg(long)]
    low_memory: bool,
    /// How long a key counts as held after the terminal reported it
    #[arg(long, default_value_t = keyboard::HOLD.as_millis() as u64)]
    key_hold_ms: u64,
    /// Write the log into this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Result<Config> {
        let mut config = Config::new()
            .with_cpu_hertz(self.hertz)
            .with_timer_hertz(self.timer_hertz);
        if self.low_memory {
            config = config.with_load_address(cpu::LOW_PROGRAM_COUNTER)?;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let held = logging::init(args.log_file.as_deref())?;

    let res = start(&args);
    // the terminal is restored by now, so the held back log can be shown
    if let Some(held) = held {
        if let Err(err) = held.release_into(&mut io::stderr()) {
            eprintln!("Unable to write the log: {}", err);
        }
    }
    res
}

fn start(args: &Args) -> Result<()> {
    let config = args.config()?;
    let rom = Rom::from_path(&args.rom)?;
    log::info!(
        "Starting '{}' ({} bytes) at {:#06X}",
        rom.get_name(),
        rom.len(),
        config.load_address()
    );

    let shutdown = Shutdown::new();
    let input = TerminalInput::new(Duration::from_millis(args.key_hold_ms), shutdown.clone());
    let sound = TerminalSound::new().context("Unable to start the bell")?;
    let display = TerminalDisplay::new().context("Unable to set up the terminal")?;

    // the devices are dropped when the run ends, which gives the terminal back
    chip::run(config, &rom, display, input, sound, shutdown)?;

    log::info!("Stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        let args = Args::try_parse_from(["chip8-term", "pong.ch8"]).unwrap();
        assert_eq!(args.rom, PathBuf::from("pong.ch8"));
        assert_eq!(args.hertz, 500);
        assert_eq!(args.timer_hertz, 60);
        assert_eq!(args.key_hold_ms, 200);
        assert!(!args.low_memory);
        assert_eq!(args.config().unwrap(), Config::default());
    }

    #[test]
    fn test_args_options() {
        let args = Args::try_parse_from([
            "chip8-term",
            "--hertz",
            "700",
            "--low-memory",
            "--key-hold-ms",
            "50",
            "pong.ch8",
        ])
        .unwrap();
        let config = args.config().unwrap();
        assert_eq!(config.cpu_hertz(), 700);
        assert_eq!(config.load_address(), 0x50);
        assert_eq!(args.key_hold_ms, 50);
    }

    #[test]
    fn test_args_rom_required() {
        assert!(Args::try_parse_from(["chip8-term"]).is_err());
        assert!(Args::try_parse_from(["chip8-term", "a.ch8", "b.ch8"]).is_err());
    }
}
