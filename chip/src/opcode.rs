//! Opcode abstractions, functionality and constants.
use std::fmt;

use crate::{definitions::memory, ProcessError};

/// the base mask used for generating all the other sub masks
pub(crate) const OPCODE_MASK_FFFF: u16 = u16::MAX;

/// the mask for the first twelve bits
pub(crate) const OPCODE_MASK_FFF0: u16 = OPCODE_MASK_FFFF << 4;

/// the mask for the first eight bits
pub(crate) const OPCODE_MASK_FF00: u16 = OPCODE_MASK_FFFF << 8;

/// the mask for the first four bits
pub(crate) const OPCODE_MASK_F000: u16 = OPCODE_MASK_FFFF << 12;

/// the mask for the last four bits
pub(crate) const OPCODE_MASK_000F: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FFF0;

/// the mask for the last eight bits
pub(crate) const OPCODE_MASK_00FF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_FF00;

/// the mask for the last twelve bits
pub(crate) const OPCODE_MASK_0FFF: u16 = OPCODE_MASK_FFFF ^ OPCODE_MASK_F000;

/// the size of a nibble
const NIBBLE: u16 = 0x4;

/// a wrapper type for u16 to make it clear what is meant to be used
pub type Opcode = u16;

/// will build an opcode from data and the given point
/// # Arguments
///
/// - `data` - A slice of u8 data entries used to generate the opcodes
/// - `pointer` - Where in the data the opcode shall be extracted, so `pointer` and `pointer + 1` make
/// the opcode up
///
/// # Example
/// ```rust
/// # use chip::opcode::*;
/// # use chip::ProcessError;
///  const OPCODES: [Opcode; 2] = [0x00EE, 0x1EDA];
///  const SPLIT_OPCODE: [u8; 4] = [0x00, 0xEE, 0x1E, 0xDA];
///  for (i, val) in OPCODES.iter().enumerate() {
///      let opcode = build_opcode(&SPLIT_OPCODE, i * 2).expect("This will work.");
///      assert_eq!(opcode, *val);
///  }
/// # let pointer = 3;
/// # let err = ProcessError::MemoryInvalid { pointer, len: SPLIT_OPCODE.len() };
/// # assert_eq!(Err(err), build_opcode(&SPLIT_OPCODE, pointer));
/// ```
pub fn build_opcode(data: &[u8], pointer: usize) -> Result<Opcode, ProcessError> {
    // controlling that there is no illegal access here
    if pointer + 1 < data.len() {
        Ok(Opcode::from_be_bytes([data[pointer], data[pointer + 1]]))
    } else {
        Err(ProcessError::MemoryInvalid {
            pointer,
            len: data.len(),
        })
    }
}

/// These are special traits used to filter out information
/// from opcodes
pub trait OpcodeTrait {
    /// the opcode type, the top nibble `T` of `TXYN`
    fn t(&self) -> u8;

    /// this is an opcode extractor for the opcode type `TNNN`
    /// - `NNN` is an address
    fn nnn(&self) -> u16;

    /// this is an opcode extractor for the opcode type `TXNN`
    /// - `X` is a register index
    /// - `NN` is a constant
    fn xnn(&self) -> (usize, u8);

    /// this is an opcode extractor for the opcode type `TXYN`
    /// - `X` is a register index
    /// - `Y` is a register index
    /// - `N` is a constant or an opcode subtype
    fn xyn(&self) -> (usize, usize, usize);

    /// this is an opcode extractor for the opcode type `TXYT`
    fn xy(&self) -> (usize, usize);

    /// this is an opcode extractor for the opcode type `TXTT`
    fn x(&self) -> usize;
}

impl OpcodeTrait for Opcode {
    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.t(), 0x1);
    /// ```
    fn t(&self) -> u8 {
        ((self & OPCODE_MASK_F000) >> (3 * NIBBLE)) as u8
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.nnn(), 0xEDA)
    /// ```
    fn nnn(&self) -> u16 {
        self & OPCODE_MASK_0FFF
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    /// const BASE_OPCODE: Opcode = 0x1EDA;
    /// assert_eq!(BASE_OPCODE.xnn(), (0xE, 0xDA));
    /// ```
    fn xnn(&self) -> (usize, u8) {
        let x = self.x();
        let nn = (self & OPCODE_MASK_00FF) as u8;
        (x, nn)
    }

    /// # Example
    /// ```rust
    /// # use chip::opcode::*;
    ///  const BASE_OPCODE: Opcode = 0x1EDA;
    ///  assert_eq!(BASE_OPCODE.xyn(), (0xE, 0xD, 0xA));
    /// ```
    fn xyn(&self) -> (usize, usize, usize) {
        let (x, y) = self.xy();
        let n = (self & OPCODE_MASK_000F) as usize;
        (x, y, n)
    }

    fn xy(&self) -> (usize, usize) {
        let x = self.x();
        const MASK: u16 = OPCODE_MASK_00FF ^ OPCODE_MASK_000F;
        let y = ((self & MASK) >> NIBBLE) as usize;
        (x, y)
    }

    fn x(&self) -> usize {
        ((self & OPCODE_MASK_0FFF & OPCODE_MASK_FF00) >> (2 * NIBBLE)) as usize
    }
}

/// A decoded instruction, every bit pattern maps to exactly one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    ClearDisplay,
    /// `00EE`
    Return,
    /// `1NNN`
    Jump { nnn: u16 },
    /// `2NNN`
    Call { nnn: u16 },
    /// `3XNN`
    SkipIfEqual { x: usize, nn: u8 },
    /// `4XNN`
    SkipIfNotEqual { x: usize, nn: u8 },
    /// `5XY0`
    SkipIfRegistersEqual { x: usize, y: usize },
    /// `6XNN`
    SetRegister { x: usize, nn: u8 },
    /// `7XNN`
    AddToRegister { x: usize, nn: u8 },
    /// `8XY0`
    Assign { x: usize, y: usize },
    /// `8XY1`
    Or { x: usize, y: usize },
    /// `8XY2`
    And { x: usize, y: usize },
    /// `8XY3`
    Xor { x: usize, y: usize },
    /// `8XY4`
    AddWithCarry { x: usize, y: usize },
    /// `8XY5`
    SubWithBorrow { x: usize, y: usize },
    /// `8XY6`
    ShiftRight { x: usize, y: usize },
    /// `8XY7`
    ReverseSubWithBorrow { x: usize, y: usize },
    /// `8XYE`
    ShiftLeft { x: usize, y: usize },
    /// `9XY0`
    SkipIfRegistersNotEqual { x: usize, y: usize },
    /// `ANNN`
    SetIndex { nnn: u16 },
    /// `BNNN`
    JumpWithOffset { nnn: u16 },
    /// `CXNN`
    Random { x: usize, nn: u8 },
    /// `DXYN`
    Draw { x: usize, y: usize, n: usize },
    /// `EX9E`
    SkipIfPressed { x: usize },
    /// `EXA1`
    SkipIfNotPressed { x: usize },
    /// `FX07`
    GetDelayTimer { x: usize },
    /// `FX0A`
    AwaitKeyPress { x: usize },
    /// `FX15`
    SetDelayTimer { x: usize },
    /// `FX18`
    SetSoundTimer { x: usize },
    /// `FX1E`
    AddVxToI { x: usize },
    /// `FX29`
    SetIToSprite { x: usize },
    /// `FX33`
    StoreBCD { x: usize },
    /// `FX55`
    StoreV0ToVx { x: usize },
    /// `FX65`
    FillV0ToVx { x: usize },
    /// Any bit pattern not listed above.
    Unknown(Opcode),
}

impl From<Opcode> for Instruction {
    fn from(opcode: Opcode) -> Self {
        use Instruction::*;

        let (x, y, n) = opcode.xyn();
        let (_, nn) = opcode.xnn();
        let nnn = opcode.nnn();

        match opcode.t() {
            0x0 => match opcode {
                0x00E0 => ClearDisplay,
                0x00EE => Return,
                // 0NNN machine code routines are not supported
                _ => Unknown(opcode),
            },
            0x1 => Jump { nnn },
            0x2 => Call { nnn },
            0x3 => SkipIfEqual { x, nn },
            0x4 => SkipIfNotEqual { x, nn },
            0x5 if n == 0 => SkipIfRegistersEqual { x, y },
            0x6 => SetRegister { x, nn },
            0x7 => AddToRegister { x, nn },
            0x8 => match n {
                0x0 => Assign { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => AddWithCarry { x, y },
                0x5 => SubWithBorrow { x, y },
                0x6 => ShiftRight { x, y },
                0x7 => ReverseSubWithBorrow { x, y },
                0xE => ShiftLeft { x, y },
                _ => Unknown(opcode),
            },
            0x9 if n == 0 => SkipIfRegistersNotEqual { x, y },
            0xA => SetIndex { nnn },
            0xB => JumpWithOffset { nnn },
            0xC => Random { x, nn },
            0xD => Draw { x, y, n },
            0xE => match nn {
                0x9E => SkipIfPressed { x },
                0xA1 => SkipIfNotPressed { x },
                _ => Unknown(opcode),
            },
            0xF => match nn {
                0x07 => GetDelayTimer { x },
                0x0A => AwaitKeyPress { x },
                0x15 => SetDelayTimer { x },
                0x18 => SetSoundTimer { x },
                0x1E => AddVxToI { x },
                0x29 => SetIToSprite { x },
                0x33 => StoreBCD { x },
                0x55 => StoreV0ToVx { x },
                0x65 => FillV0ToVx { x },
                _ => Unknown(opcode),
            },
            _ => Unknown(opcode),
        }
    }
}

/// Prints the instruction as an assembler like mnemonic.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match *self {
            ClearDisplay => write!(f, "CLS"),
            Return => write!(f, "RET"),
            Jump { nnn } => write!(f, "JP {:#05X}", nnn),
            Call { nnn } => write!(f, "CALL {:#05X}", nnn),
            SkipIfEqual { x, nn } => write!(f, "SE V{:X}, {:#04X}", x, nn),
            SkipIfNotEqual { x, nn } => write!(f, "SNE V{:X}, {:#04X}", x, nn),
            SkipIfRegistersEqual { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            SetRegister { x, nn } => write!(f, "LD V{:X}, {:#04X}", x, nn),
            AddToRegister { x, nn } => write!(f, "ADD V{:X}, {:#04X}", x, nn),
            Assign { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddWithCarry { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            SubWithBorrow { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            ShiftRight { x, y } => write!(f, "SHR V{:X}, V{:X}", x, y),
            ReverseSubWithBorrow { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            ShiftLeft { x, y } => write!(f, "SHL V{:X}, V{:X}", x, y),
            SkipIfRegistersNotEqual { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            SetIndex { nnn } => write!(f, "LD I, {:#05X}", nnn),
            JumpWithOffset { nnn } => write!(f, "JP V0, {:#05X}", nnn),
            Random { x, nn } => write!(f, "RND V{:X}, {:#04X}", x, nn),
            Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            SkipIfPressed { x } => write!(f, "SKP V{:X}", x),
            SkipIfNotPressed { x } => write!(f, "SKNP V{:X}", x),
            GetDelayTimer { x } => write!(f, "LD V{:X}, DT", x),
            AwaitKeyPress { x } => write!(f, "LD V{:X}, K", x),
            SetDelayTimer { x } => write!(f, "LD DT, V{:X}", x),
            SetSoundTimer { x } => write!(f, "LD ST, V{:X}", x),
            AddVxToI { x } => write!(f, "ADD I, V{:X}", x),
            SetIToSprite { x } => write!(f, "LD F, V{:X}", x),
            StoreBCD { x } => write!(f, "LD B, V{:X}", x),
            StoreV0ToVx { x } => write!(f, "LD [I], V{:X}", x),
            FillV0ToVx { x } => write!(f, "LD V{:X}, [I]", x),
            Unknown(opcode) => write!(f, "??? {:#06X}", opcode),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents the program steps that the chip
/// can take.
pub enum ProgramCounterStep {
    /// Will not change the program counter
    None,
    /// Will move the program counter to the next instruction
    Next,
    /// Will skip the next instruction
    Skip,
    /// Will simply move the program counter to the given location.
    Jump(u16),
}

impl ProgramCounterStep {
    /// Will return a Skip if the condition is true.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Next, ProgramCounterStep::cond(false));
    /// assert_eq!(ProgramCounterStep::Skip, ProgramCounterStep::cond(true));
    /// ```
    #[inline]
    pub fn cond(cond: bool) -> Self {
        if cond {
            ProgramCounterStep::Skip
        } else {
            ProgramCounterStep::Next
        }
    }

    /// Will calculate the program counter after the step was taken.
    ///
    /// # Example
    /// ```rust
    /// # use chip::opcode::ProgramCounterStep;
    /// assert_eq!(ProgramCounterStep::Skip.apply(0x200), 0x204);
    /// assert_eq!(ProgramCounterStep::Jump(0x300).apply(0x200), 0x300);
    /// ```
    #[inline]
    pub fn apply(&self, program_counter: u16) -> u16 {
        const SIZE: u16 = memory::opcodes::SIZE as u16;
        match *self {
            ProgramCounterStep::None => program_counter,
            ProgramCounterStep::Next => program_counter.wrapping_add(SIZE),
            ProgramCounterStep::Skip => program_counter.wrapping_add(2 * SIZE),
            ProgramCounterStep::Jump(pointer) => pointer,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// Represents a command from the interpreter up to the driver.
pub enum Operation {
    /// If no action has to be taken.
    None,
    /// The chip is suspended until the next key press.
    Wait,
    /// The display was changed and has to be redrawn.
    Draw,
    /// The opcode is not part of the instruction set, it was skipped.
    Unsupported(Opcode),
}
