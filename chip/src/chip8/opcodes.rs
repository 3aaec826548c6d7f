use std::ops::Range;

use crate::{
    definitions::{cpu, display, memory},
    opcode::{Instruction, Operation, ProgramCounterStep},
    ProcessError,
};

use super::ChipSet;

/// The flag register `VF`
const FLAG: usize = cpu::register::LAST;

type Outcome = Result<(ProgramCounterStep, Operation), ProcessError>;

impl ChipSet {
    /// Will run a single decoded instruction, the program counter
    /// is moved afterwards by the caller.
    pub(super) fn execute(&mut self, instruction: Instruction) -> Outcome {
        use Instruction::*;

        let step = match instruction {
            ClearDisplay => return Ok(self.clear_display()),
            Return => {
                // Return from sub routine => pop from stack
                let pc = self.pop_stack()?;
                ProgramCounterStep::Jump(pc)
            }
            Jump { nnn } => ProgramCounterStep::Jump(nnn),
            Call { nnn } => {
                // the return address points at the instruction after the call
                self.push_stack(ProgramCounterStep::Next.apply(self.program_counter))?;
                ProgramCounterStep::Jump(nnn)
            }
            SkipIfEqual { x, nn } => ProgramCounterStep::cond(self.registers[x] == nn),
            SkipIfNotEqual { x, nn } => ProgramCounterStep::cond(self.registers[x] != nn),
            SkipIfRegistersEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] == self.registers[y])
            }
            SetRegister { x, nn } => {
                self.registers[x] = nn;
                ProgramCounterStep::Next
            }
            AddToRegister { x, nn } => {
                // let VX overflow, but ignore carry
                self.registers[x] = self.registers[x].wrapping_add(nn);
                ProgramCounterStep::Next
            }
            Assign { .. }
            | Or { .. }
            | And { .. }
            | Xor { .. }
            | AddWithCarry { .. }
            | SubWithBorrow { .. }
            | ShiftRight { .. }
            | ReverseSubWithBorrow { .. }
            | ShiftLeft { .. } => {
                self.arithmetic(instruction);
                ProgramCounterStep::Next
            }
            SkipIfRegistersNotEqual { x, y } => {
                ProgramCounterStep::cond(self.registers[x] != self.registers[y])
            }
            SetIndex { nnn } => {
                self.index_register = nnn;
                ProgramCounterStep::Next
            }
            JumpWithOffset { nnn } => ProgramCounterStep::Jump(nnn + self.registers[0] as u16),
            Random { x, nn } => {
                // using a fill bytes call here, as the trait RngCore does not
                // support random u8.
                let mut rand: [u8; 1] = [0];
                self.rng.fill_bytes(&mut rand);
                self.registers[x] = nn & rand[0];
                ProgramCounterStep::Next
            }
            Draw { x, y, n } => return self.draw(x, y, n),
            SkipIfPressed { x } => {
                ProgramCounterStep::cond(self.keyboard.consume(self.registers[x] as usize))
            }
            SkipIfNotPressed { x } => {
                ProgramCounterStep::cond(!self.keyboard.is_pressed(self.registers[x] as usize))
            }
            GetDelayTimer { x } => {
                self.registers[x] = self.delay_timer.get_value();
                ProgramCounterStep::Next
            }
            AwaitKeyPress { x } => {
                // don't change the counter until a key was pressed
                self.waiting = Some(x);
                return Ok((ProgramCounterStep::None, Operation::Wait));
            }
            SetDelayTimer { x } => {
                self.delay_timer.set_value(self.registers[x]);
                ProgramCounterStep::Next
            }
            SetSoundTimer { x } => {
                self.sound_timer.set_value(self.registers[x]);
                ProgramCounterStep::Next
            }
            AddVxToI { x } => {
                // VF is not affected
                self.index_register = self
                    .index_register
                    .wrapping_add(self.registers[x] as u16);
                ProgramCounterStep::Next
            }
            SetIToSprite { x } => {
                let glyph = (self.registers[x] & 0xF) as usize;
                self.index_register =
                    (display::fontset::LOCATION + display::fontset::GLYPH_SIZE * glyph) as u16;
                ProgramCounterStep::Next
            }
            StoreBCD { x } => {
                let range = self.writable(3)?;
                let r = self.registers[x];
                // 246u8 => [2, 4, 6]
                self.memory[range].copy_from_slice(&[r / 100, r / 10 % 10, r % 10]);
                ProgramCounterStep::Next
            }
            StoreV0ToVx { x } => {
                // I itself is left unmodified
                let range = self.writable(x + 1)?;
                self.memory[range].copy_from_slice(&self.registers[..=x]);
                ProgramCounterStep::Next
            }
            FillV0ToVx { x } => {
                let range = self.readable(x + 1)?;
                self.registers[..=x].copy_from_slice(&self.memory[range]);
                ProgramCounterStep::Next
            }
            Unknown(opcode) => {
                return Ok((ProgramCounterStep::Next, Operation::Unsupported(opcode)))
            }
        };
        Ok((step, Operation::None))
    }

    /// `8XYN`, the flag is always written before the result.
    fn arithmetic(&mut self, instruction: Instruction) {
        use Instruction::*;

        match instruction {
            Assign { x, y } => self.registers[x] = self.registers[y],
            Or { x, y } => self.registers[x] |= self.registers[y],
            And { x, y } => self.registers[x] &= self.registers[y],
            Xor { x, y } => self.registers[x] ^= self.registers[y],
            AddWithCarry { x, y } => {
                let (res, carry) = self.registers[x].overflowing_add(self.registers[y]);
                self.registers[FLAG] = carry as u8;
                self.registers[x] = res;
            }
            SubWithBorrow { x, y } => {
                let (vx, vy) = (self.registers[x], self.registers[y]);
                self.registers[FLAG] = (vx > vy) as u8;
                self.registers[x] = vx.wrapping_sub(vy);
            }
            ShiftRight { x, y } => {
                let vy = self.registers[y];
                self.registers[FLAG] = vy & 1;
                self.registers[x] = vy >> 1;
            }
            ReverseSubWithBorrow { x, y } => {
                let (vx, vy) = (self.registers[x], self.registers[y]);
                self.registers[FLAG] = (vy > vx) as u8;
                self.registers[x] = vy.wrapping_sub(vx);
            }
            ShiftLeft { x, y } => {
                let vy = self.registers[y];
                self.registers[FLAG] = vy >> 7;
                self.registers[x] = vy << 1;
            }
            _ => unreachable!("{} is not an arithmetic instruction", instruction),
        }
    }

    /// `00E0`
    fn clear_display(&mut self) -> (ProgramCounterStep, Operation) {
        for row in self.display.iter_mut() {
            row.fill(false);
        }
        (ProgramCounterStep::Next, Operation::Draw)
    }

    /// `DXYN`
    /// Draws a sprite at coordinate (VX, VY) that has a width of 8 pixels and a height of N
    /// pixels. Each row of 8 pixels is read as bit-coded starting from memory location I; I
    /// value doesn’t change after the execution of this instruction. VF is set to 1 if any
    /// screen pixels are flipped from set to unset when the sprite is drawn, and to 0 if that
    /// doesn’t happen. Only the starting point wraps, the sprite itself is clipped.
    fn draw(&mut self, x: usize, y: usize, n: usize) -> Outcome {
        const BYTE: usize = 8;

        let range = self.readable(n)?;

        let coorx = self.registers[x] as usize % display::WIDTH;
        let coory = self.registers[y] as usize % display::HEIGHT;

        // Set VF to 0
        self.registers[FLAG] = 0;

        for (i, row) in self.memory[range].iter().enumerate() {
            let y = coory + i;
            if y >= display::HEIGHT {
                break;
            }

            for j in 0..BYTE {
                let x = coorx + j;
                if x >= display::WIDTH {
                    break;
                }

                // most significant bit is the left most pixel
                let mask = 0x80u8 >> j;
                if (*row & mask) == 0 {
                    continue;
                }

                let pixel = &mut self.display[y][x];
                if *pixel {
                    self.registers[FLAG] = 1;
                }
                *pixel = !*pixel;
            }
        }

        Ok((ProgramCounterStep::Next, Operation::Draw))
    }

    /// The memory range `I..I + len`, if it lies in the address space.
    fn readable(&self, len: usize) -> Result<Range<usize>, ProcessError> {
        if len == 0 {
            return Ok(0..0);
        }
        let start = self.index_register as usize;
        let end = start + len;
        if end > memory::SIZE {
            return Err(ProcessError::AddressOutOfBounds {
                address: start.max(memory::SIZE),
            });
        }
        Ok(start..end)
    }

    /// Same as [`readable`](Self::readable), but the font region is off limits.
    fn writable(&self, len: usize) -> Result<Range<usize>, ProcessError> {
        let range = self.readable(len)?;
        if range.start < display::fontset::END {
            return Err(ProcessError::ReservedMemoryWrite {
                address: range.start,
            });
        }
        Ok(range)
    }
}
