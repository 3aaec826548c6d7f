//! The loop driving the chip and its devices.
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    chip8::ChipSet,
    devices::{DisplayCommands, KeyboardCommands, SoundCommands},
    opcode::Operation,
    resources::Rom,
    timer::{Cadence, Pacer},
    ChipError, Config, ProcessError,
};

/// A cloneable handle to stop a running [`Runner`] from the outside.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the loop to stop before its next tick.
    pub fn signal(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_signaled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// What the loop shall do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

/// Owns the chip and feeds it from and to the devices.
pub struct Runner<D, K, S> {
    chip: ChipSet,
    display: D,
    keyboard: K,
    sound: S,
    cadence: Cadence,
    config: Config,
    shutdown: Shutdown,
}

impl<D, K, S> Runner<D, K, S>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    pub fn new(
        chip: ChipSet,
        config: Config,
        display: D,
        keyboard: K,
        sound: S,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            chip,
            display,
            keyboard,
            sound,
            cadence: Cadence::new(config.cpu_hertz(), config.timer_hertz()),
            config,
            shutdown,
        }
    }

    /// Runs a single logical tick.
    pub fn tick(&mut self) -> Result<Flow, ProcessError> {
        if self.shutdown.is_signaled() {
            log::info!("Shutdown requested");
            return Ok(Flow::Stop);
        }

        for event in self.keyboard.poll() {
            log::debug!("Key event {:?}", event);
            self.chip.apply_key(event);
        }

        match self.chip.next() {
            Ok(Operation::Unsupported(opcode)) => {
                log::warn!(
                    "Skipping the unsupported opcode {:#06X} at {:#06X}",
                    opcode,
                    self.chip.get_program_counter().wrapping_sub(2)
                );
            }
            Ok(_) => {}
            Err(err) => {
                log::error!("{}\n{}", err, self.chip);
                return Err(err);
            }
        }

        for _ in 0..self.cadence.tick() {
            if self.chip.tick_timers() {
                self.sound.beep();
            }
        }

        if self.chip.draw_flag() {
            self.display.display(self.chip.get_display());
        } else {
            self.display.refresh();
        }

        if !self.display.is_open() {
            log::info!("The display was closed");
            return Ok(Flow::Stop);
        }

        Ok(Flow::Continue)
    }

    /// Will tick at the configured rate until told to stop.
    pub fn run(&mut self) -> Result<(), ProcessError> {
        log::info!(
            "Running '{}' at {} Hz",
            self.chip.get_name(),
            self.config.cpu_hertz()
        );
        let mut pacer = Pacer::new(self.config.cpu_interval());
        while self.tick()? == Flow::Continue {
            pacer.wait();
        }
        Ok(())
    }

    pub fn chip(&self) -> &ChipSet {
        &self.chip
    }

    /// Gives the devices back.
    pub fn into_parts(self) -> (ChipSet, D, K, S) {
        (self.chip, self.display, self.keyboard, self.sound)
    }
}

/// Will load the rom and run it until it is stopped.
pub fn run<D, K, S>(
    config: Config,
    rom: &Rom,
    display: D,
    keyboard: K,
    sound: S,
    shutdown: Shutdown,
) -> Result<(), ChipError>
where
    D: DisplayCommands,
    K: KeyboardCommands,
    S: SoundCommands,
{
    let chip = ChipSet::with_rom(&config, rom)?;
    Runner::new(chip, config, display, keyboard, sound, shutdown).run()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{KeyEvent, MockDisplayCommands, MockKeyboardCommands, MockSoundCommands};
    use mockall::Sequence;

    fn rom(opcodes: &[u16]) -> Rom {
        let data: Vec<u8> = opcodes.iter().flat_map(|op| op.to_be_bytes()).collect();
        Rom::new("runner", data)
    }

    fn runner(
        opcodes: &[u16],
        config: Config,
        display: MockDisplayCommands,
        keyboard: MockKeyboardCommands,
        sound: MockSoundCommands,
    ) -> Runner<MockDisplayCommands, MockKeyboardCommands, MockSoundCommands> {
        let chip = ChipSet::with_rom(&config, &rom(opcodes)).unwrap();
        Runner::new(chip, config, display, keyboard, sound, Shutdown::new())
    }

    fn open_display() -> MockDisplayCommands {
        let mut display = MockDisplayCommands::new();
        display.expect_is_open().return_const(true);
        display
    }

    fn quiet_keyboard() -> MockKeyboardCommands {
        let mut keyboard = MockKeyboardCommands::new();
        keyboard.expect_poll().returning(Vec::new);
        keyboard
    }

    #[test]
    fn test_draw_and_refresh() {
        let mut display = open_display();
        let mut seq = Sequence::new();
        display
            .expect_display()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|pixels| assert!(pixels.iter().flatten().all(|p| !p)));
        display
            .expect_refresh()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        display
            .expect_display()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|pixels| assert!(pixels[0][0]));

        let mut runner = runner(
            &[0x00E0, 0xA000, 0xD005],
            Config::default(),
            display,
            quiet_keyboard(),
            MockSoundCommands::new(),
        );
        for _ in 0..3 {
            assert_eq!(runner.tick(), Ok(Flow::Continue));
        }
    }

    #[test]
    fn test_shutdown_first() {
        let mut display = MockDisplayCommands::new();
        display.expect_display().never();
        display.expect_refresh().never();
        let mut keyboard = MockKeyboardCommands::new();
        keyboard.expect_poll().never();

        let chip = ChipSet::with_rom(&Config::default(), &rom(&[0x1200])).unwrap();
        let shutdown = Shutdown::new();
        let mut runner = Runner::new(
            chip,
            Config::default(),
            display,
            keyboard,
            MockSoundCommands::new(),
            shutdown.clone(),
        );
        shutdown.signal();
        assert_eq!(runner.tick(), Ok(Flow::Stop));
        assert_eq!(runner.chip().get_program_counter(), 0x200);
        // the run loop ends right away as well
        assert_eq!(runner.run(), Ok(()));
    }

    #[test]
    fn test_closed_display_stops() {
        let mut display = MockDisplayCommands::new();
        display.expect_refresh().return_const(());
        display.expect_is_open().times(1).return_const(false);

        let mut runner = runner(
            &[0x1200],
            Config::default(),
            display,
            quiet_keyboard(),
            MockSoundCommands::new(),
        );
        assert_eq!(runner.run(), Ok(()));
    }

    #[test]
    fn test_beep_once() {
        let mut display = open_display();
        display.expect_refresh().return_const(());
        let mut sound = MockSoundCommands::new();
        sound.expect_beep().times(1).return_const(());

        // one timer tick per instruction
        let config = Config::new().with_cpu_hertz(60).with_timer_hertz(60);
        // V0 = 2, sound timer = V0, loop
        let mut runner = runner(
            &[0x6002, 0xF018, 0x1204],
            config,
            display,
            quiet_keyboard(),
            sound,
        );
        for _ in 0..10 {
            assert_eq!(runner.tick(), Ok(Flow::Continue));
        }
        assert_eq!(runner.chip().get_sound_timer(), 0);
    }

    #[test]
    fn test_wait_for_key() {
        let mut display = open_display();
        display.expect_refresh().return_const(());

        let mut keyboard = MockKeyboardCommands::new();
        let mut seq = Sequence::new();
        keyboard
            .expect_poll()
            .times(3)
            .in_sequence(&mut seq)
            .returning(Vec::new);
        keyboard
            .expect_poll()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![KeyEvent::Down(0x7)]);
        keyboard
            .expect_poll()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| vec![KeyEvent::Up(0x7)]);

        let config = Config::new().with_cpu_hertz(60).with_timer_hertz(60);
        let mut runner = runner(
            &[0x6A05, 0xFA15, 0xF10A, 0x1206],
            config,
            display,
            keyboard,
            MockSoundCommands::new(),
        );

        // set the delay timer and start waiting
        for _ in 0..3 {
            assert_eq!(runner.tick(), Ok(Flow::Continue));
        }
        assert!(runner.chip().is_waiting());
        assert_eq!(runner.chip().get_program_counter(), 0x204);

        // the key is applied before the step, so the wait ends here
        assert_eq!(runner.tick(), Ok(Flow::Continue));
        assert!(!runner.chip().is_waiting());
        assert_eq!(runner.chip().get_registers()[0x1], 0x7);
        assert_eq!(runner.chip().get_program_counter(), 0x206);
        // the timer ran the whole time
        assert_eq!(runner.chip().get_delay_timer(), 5 - 3);

        assert_eq!(runner.tick(), Ok(Flow::Continue));
    }

    #[test]
    fn test_fatal_error() {
        let mut display = open_display();
        display.expect_refresh().never();
        let mut runner = runner(
            &[0x00EE],
            Config::default(),
            display,
            quiet_keyboard(),
            MockSoundCommands::new(),
        );
        assert_eq!(runner.tick(), Err(ProcessError::StackUnderflow));
    }

    #[test]
    fn test_unsupported_continues() {
        let mut display = open_display();
        display.expect_refresh().times(2).return_const(());
        let mut runner = runner(
            &[0xFFFF, 0x6001],
            Config::default(),
            display,
            quiet_keyboard(),
            MockSoundCommands::new(),
        );
        assert_eq!(runner.tick(), Ok(Flow::Continue));
        assert_eq!(runner.tick(), Ok(Flow::Continue));
        assert_eq!(runner.chip().get_registers()[0x0], 0x1);
    }

    #[test]
    fn test_run_load_error() {
        let display = MockDisplayCommands::new();
        let keyboard = MockKeyboardCommands::new();
        let sound = MockSoundCommands::new();
        let rom = Rom::new("huge", vec![0; 4000]);
        let res = run(Config::default(), &rom, display, keyboard, sound, Shutdown::new());
        assert!(matches!(
            res,
            Err(ChipError::Load(crate::LoadError::ImageTooLarge { len: 4000, max: 3584 }))
        ));
    }

    #[test]
    fn test_run_process_error() {
        let mut display = open_display();
        display.expect_refresh().times(1).return_const(());
        let sound = MockSoundCommands::new();
        // V0 = 1, then return without a call
        let res = run(
            Config::default(),
            &rom(&[0x6001, 0x00EE]),
            display,
            quiet_keyboard(),
            sound,
            Shutdown::new(),
        );
        assert!(matches!(
            res,
            Err(ChipError::Process(ProcessError::StackUnderflow))
        ));
    }

    #[test]
    fn test_key_events_reach_chip() {
        let mut display = open_display();
        display.expect_refresh().return_const(());
        let mut keyboard = MockKeyboardCommands::new();
        keyboard
            .expect_poll()
            .times(1)
            .returning(|| vec![KeyEvent::Down(0x3), KeyEvent::Down(0x20)]);

        let mut runner = runner(
            &[0x1200],
            Config::default(),
            display,
            keyboard,
            MockSoundCommands::new(),
        );
        assert_eq!(runner.tick(), Ok(Flow::Continue));
        let (chip, ..) = runner.into_parts();
        assert!(chip.get_keyboard()[0x3]);
        assert_eq!(
            chip.get_keyboard().iter().filter(|k| **k).count(),
            1,
            "unknown keys are dropped"
        );
    }
}
