use {
    crate::{
        definitions::{cpu, display, memory},
        devices::{KeyEvent, Keyboard, Pixels},
        opcode::{self, Instruction, Opcode, Operation, ProgramCounterStep},
        resources::Rom,
        timer::Timer,
        Config, LoadError, ProcessError,
    },
    rand::RngCore,
    tinyvec::ArrayVec,
};

/// The ChipSet struct represents the current state
/// of the system, it contains all the structures
/// needed for emulating an instant on the
/// Chip8 CPU.
pub struct ChipSet {
    /// name of the loaded rom
    pub(super) name: String,
    /// - `0x000-0x04F` - Used for the built in `4x5` pixel font set (`0-F`)
    /// - `0x050-0x1FF` - Unused, unless the program is loaded right after the font
    /// - `0x200-0xFFF` - Program ROM and work RAM
    pub(super) memory: Box<[u8; memory::SIZE]>,
    /// `8-bit` data registers named `V0` to `VF`. The `VF` register doubles as a flag for some
    /// instructions; thus, it should be avoided. In an addition operation, `VF` is the carry flag,
    /// while in subtraction, it is the "no borrow" flag. In the draw instruction `VF` is set upon
    /// pixel collision.
    pub(super) registers: [u8; cpu::register::SIZE],
    /// The index for the register, this is a special register entry
    /// called index `I`
    pub(super) index_register: u16,
    /// The program counter is a CPU register in the computer processor which has the address of the
    /// next instruction to be executed from memory.
    pub(super) program_counter: u16,
    /// The stack is only used to store return addresses when subroutines are called. The original
    /// [RCA 1802](https://de.wikipedia.org/wiki/RCA1802) version allocated `48` bytes for up to
    /// `12` levels of nesting; modern implementations usually have more.
    /// (here we are using `16`)
    pub(super) stack: ArrayVec<[u16; cpu::stack::SIZE]>,
    /// Delay timer: This timer is intended to be used for timing the events of games. Its value
    /// can be set and read.
    pub(super) delay_timer: Timer,
    /// Sound timer: This timer is used for sound effects. When it runs out a beep is fired.
    pub(super) sound_timer: Timer,
    /// The graphics of the Chip 8 are black and white and the screen has a total of `2048` pixels
    /// `(64 x 32)`, stored row by row.
    pub(super) display: Box<Pixels>,
    /// Set by the clear and draw instructions, reset before every fetch.
    pub(super) draw_flag: bool,
    pub(super) keyboard: Keyboard,
    /// The register a key is awaited for (`FX0A`).
    pub(super) waiting: Option<usize>,
    pub(super) load_address: usize,
    pub(super) loaded: bool,
    /// This stores the random number generator, used by the chipset.
    /// It is stored into the chipset, so as to enable simple mocking
    /// of the given type.
    pub(super) rng: Box<dyn RngCore + Send>,
}

impl ChipSet {
    /// will create a new chipset object with only the font in memory
    pub fn new(config: &Config) -> Self {
        // initialize all the memory with 0
        let mut ram = Box::new([0; memory::SIZE]);

        // load fonts
        ram[display::fontset::LOCATION..display::fontset::END]
            .copy_from_slice(&display::fontset::FONTSET);

        Self {
            name: String::new(),
            memory: ram,
            registers: [0; cpu::register::SIZE],
            index_register: 0,
            program_counter: config.load_address() as u16,
            stack: ArrayVec::new(),
            delay_timer: Timer::default(),
            sound_timer: Timer::default(),
            display: Box::new([[false; display::WIDTH]; display::HEIGHT]),
            draw_flag: false,
            keyboard: Keyboard::new(),
            waiting: None,
            load_address: config.load_address(),
            loaded: false,
            rng: Box::new(rand::rngs::OsRng),
        }
    }

    /// Will create a new chipset and put the rom into memory.
    pub fn with_rom(config: &Config, rom: &Rom) -> Result<Self, LoadError> {
        let mut chip = Self::new(config);
        chip.load_rom(rom)?;
        Ok(chip)
    }

    /// Will copy the rom into the program region, this can only be done once.
    /// Nothing is written if the rom does not fit.
    pub fn load_rom(&mut self, rom: &Rom) -> Result<(), LoadError> {
        if self.loaded {
            return Err(LoadError::AlreadyLoaded);
        }

        let max = memory::SIZE - self.load_address;
        let data = rom.get_data();
        if data.len() > max {
            return Err(LoadError::ImageTooLarge {
                len: data.len(),
                max,
            });
        }

        // write the rom data into memory
        self.memory[self.load_address..(self.load_address + data.len())].copy_from_slice(data);
        self.name = rom.get_name().to_string();
        self.loaded = true;

        log::debug!(
            "Loaded '{}' ({} bytes) at {:#06X}",
            self.name,
            data.len(),
            self.load_address
        );
        Ok(())
    }

    /// will advance the program by a single step
    pub fn next(&mut self) -> Result<Operation, ProcessError> {
        self.draw_flag = false;

        if let Some(x) = self.waiting {
            return Ok(self.resume(x));
        }

        // get next opcode
        let opcode = opcode::build_opcode(&self.memory[..], self.program_counter as usize)?;
        // run the opcode
        self.calc(opcode)
    }

    /// Will decode and run the given opcode as if it was fetched from
    /// the current program counter.
    pub fn calc(&mut self, opcode: Opcode) -> Result<Operation, ProcessError> {
        let instruction = Instruction::from(opcode);
        log::trace!(
            "{:#06X}: {:#06X} {}",
            self.program_counter,
            opcode,
            instruction
        );

        let (step, operation) = self.execute(instruction)?;
        self.step(step);

        if operation == Operation::Draw {
            self.draw_flag = true;
        }
        Ok(operation)
    }

    /// Checks on the awaited key, the program counter is only moved once one is down.
    fn resume(&mut self, x: usize) -> Operation {
        match self.keyboard.take_any() {
            Some(key) => {
                log::debug!("Key {:#X} ends the wait on V{:X}", key, x);
                self.registers[x] = key as u8;
                self.waiting = None;
                self.step(ProgramCounterStep::Next);
                Operation::None
            }
            None => Operation::Wait,
        }
    }

    /// Will move the program counter
    pub fn step(&mut self, step: ProgramCounterStep) {
        self.program_counter = step.apply(self.program_counter);
    }

    /// Will count both timers down by one and report if the sound timer ran out.
    pub fn tick_timers(&mut self) -> bool {
        self.delay_timer.tick();
        self.sound_timer.tick()
    }

    /// Will apply the key transition to the internal keyboard.
    pub fn apply_key(&mut self, event: KeyEvent) {
        self.keyboard.apply(event)
    }

    pub fn press_key(&mut self, key: usize) {
        self.keyboard.press(key)
    }

    pub fn release_key(&mut self, key: usize) {
        self.keyboard.release(key)
    }

    /// Will get the current state of the keyboard
    pub fn get_keyboard(&self) -> &[bool] {
        self.keyboard.get_keys()
    }

    /// will return the sound timer
    pub fn get_sound_timer(&self) -> u8 {
        self.sound_timer.get_value()
    }

    /// will return the delay timer
    pub fn get_delay_timer(&self) -> u8 {
        self.delay_timer.get_value()
    }

    /// Will return the current display configuration
    pub fn get_display(&self) -> &Pixels {
        &self.display
    }

    /// True if the last instruction changed the display.
    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    /// True while the chip waits on a key press.
    pub fn is_waiting(&self) -> bool {
        self.waiting.is_some()
    }

    pub fn get_registers(&self) -> &[u8] {
        &self.registers
    }

    pub fn get_program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn get_index_register(&self) -> u16 {
        self.index_register
    }

    pub fn get_stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Will push the return address to the stack
    pub(super) fn push_stack(&mut self, pointer: u16) -> Result<(), ProcessError> {
        match self.stack.try_push(pointer) {
            None => Ok(()),
            Some(_) => Err(ProcessError::StackOverflow(cpu::stack::SIZE)),
        }
    }

    /// Will pop the last return address
    pub(super) fn pop_stack(&mut self) -> Result<u16, ProcessError> {
        self.stack.pop().ok_or(ProcessError::StackUnderflow)
    }
}
