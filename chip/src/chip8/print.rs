//! The pretty print implementation of the [`ChipSet`](super::ChipSet), used
//! for dumping the full machine state once something went wrong.
//! This implementation was split up into this file for smaller file sizes and higher
//! cohesion.

use super::*;
use crate::definitions::cpu;
use once_cell::sync::Lazy;
use std::fmt::{self, Write};

/// The length of the pretty print data
/// as a single instruction is u16 the octa
/// size will show how often the block shall
/// be repeated has to be bigger then 2
const HEX_PRINT_STEP: usize = 8;

const END_OF_LINE: char = '\n';
const INDENT_FILLAMENT: char = '\t';
const INDENT_SIZE: usize = 2;

/// Will add an indent post processing
fn indent_helper(text: &mut String, indent: usize) {
    for _ in 0..indent {
        text.push(INDENT_FILLAMENT);
    }
}

macro_rules! intformat {
    () => {
        // The formatted string will be 2 sysbols for the prefix (0x)
        // and 4 for the rest long.
        "{:#06X}"
    };
}

/// The length of a single formatted integer
const INTEGER_LEN: usize = 6;

/// The length of a formatted pointer range
const POINTER_LEN: usize = 2 * INTEGER_LEN + 5;

/// calculate a line lenght (This is a bit bigger then the actual line will be)
const LENLINE: usize = INDENT_SIZE + HEX_PRINT_STEP * (INTEGER_LEN + 1) + 1 + POINTER_LEN;

/// Handles all the printing of the pointer values.
mod pointer_print {
    use std::fmt::{self, Write};

    /// will formatt the pointers according to definition
    pub(super) fn formatter(line: &mut String, from: usize, to: usize) -> fmt::Result {
        write!(line, concat!(intformat!(), " - ", intformat!(), " :"), from, to)
    }
}

/// Handles all the memory prints
mod memory_print {
    use super::{integer_print, pointer_print, Lazy, HEX_PRINT_STEP};
    use crate::{definitions::memory, opcode::Opcode};
    use std::fmt::{self, Write};

    /// The internal length of the given data
    /// as the data is stored as u8 and an opcode
    /// is u16 long
    const POINTER_INCREMENT: usize = HEX_PRINT_STEP * memory::opcodes::SIZE;
    /// The values that are used when there is at least one row of zeros.
    const FILLER_BASE: &str = "...";

    /// Prepares the line that will be used, in the case that there is at least one row of zeros.
    static ZERO_FILLER: Lazy<String> = Lazy::new(|| {
        let mut formatted = String::new();
        // writing into a string can not fail
        let _ = integer_print::formatter(&mut formatted, 0u16);
        let lenght =
            formatted.len() * (HEX_PRINT_STEP - 2) + (HEX_PRINT_STEP - 1) - FILLER_BASE.len();
        let filler = " ".repeat(lenght / 2);

        format!(
            "{}{}{}{}{}",
            formatted, filler, FILLER_BASE, filler, formatted
        )
    });

    /// this struct will simulate a single row of opcodes (only in this context)
    struct Row {
        from: usize,
        to: usize,
        data: [Opcode; HEX_PRINT_STEP],
        only_null: bool,
    }

    /// using the fmt::Display` for simple printing of the data later on
    impl fmt::Display for Row {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let mut res = String::with_capacity(super::LENLINE);
            pointer_print::formatter(&mut res, self.from, self.to)?;
            res.push(' ');

            if self.only_null {
                res.push_str(&ZERO_FILLER);
            } else {
                let mut entries = self.data.iter();
                if let Some(first) = entries.next() {
                    integer_print::formatter(&mut res, *first)?;
                }
                for entry in entries {
                    res.push(' ');
                    integer_print::formatter(&mut res, *entry)?;
                }
            }
            write!(f, "{}", res)
        }
    }

    /// will pretty print the content of the raw memory, rows of zeros
    /// are folded together into a single line
    pub(super) fn printer(memory: &[u8], indent: usize) -> Result<String, fmt::Error> {
        let mut rows: Vec<Row> = Vec::with_capacity(memory.len() / POINTER_INCREMENT);

        for (chunk_index, chunk) in memory.chunks(POINTER_INCREMENT).enumerate() {
            let from = chunk_index * POINTER_INCREMENT;
            let to = from + chunk.len() - 1;

            let mut data = [0; HEX_PRINT_STEP];
            for (entry, pair) in data.iter_mut().zip(chunk.chunks(memory::opcodes::SIZE)) {
                *entry = match *pair {
                    [high, low] => Opcode::from_be_bytes([high, low]),
                    [high] => Opcode::from_be_bytes([high, 0]),
                    _ => 0,
                };
            }
            let only_null = data.iter().all(|entry| *entry == 0);

            let mut row = Row {
                from,
                to,
                data,
                only_null,
            };

            if only_null {
                if let Some(last_row) = rows.last() {
                    if last_row.only_null {
                        row.from = last_row.from;
                        rows.pop();
                    }
                }
            }
            rows.push(row)
        }

        let mut string = String::with_capacity((super::LENLINE + 1) * rows.len());
        for row in rows {
            super::indent_helper(&mut string, indent);
            write!(string, "{}{}", row, super::END_OF_LINE)?;
        }
        if let Some(index) = string.rfind(super::END_OF_LINE) {
            string.truncate(index);
        }
        Ok(string)
    }
}

/// handles printting of any and all of intergers.
mod integer_print {
    use super::{pointer_print, HEX_PRINT_STEP};
    use num_traits::Unsigned;
    use std::fmt::{self, Write};

    /// will format all integer types
    pub(super) fn formatter<T>(line: &mut String, data: T) -> fmt::Result
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        write!(line, intformat!(), data)
    }

    /// will pretty print all the integer data given
    pub(super) fn printer<T>(data: &[T], indent: usize) -> Result<String, fmt::Error>
    where
        T: fmt::UpperHex + Unsigned + Copy,
    {
        let result_size = super::LENLINE * (data.len() / HEX_PRINT_STEP + 1);

        let mut res = String::with_capacity(result_size);
        for (chunk_index, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = chunk_index * HEX_PRINT_STEP;

            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            for entry in chunk {
                res.push(' ');
                formatter(&mut res, *entry)?;
            }
            res.push(super::END_OF_LINE);
        }

        // Remove unneded new line
        if let Some(index) = res.rfind(super::END_OF_LINE) {
            res.truncate(index);
        }

        Ok(res)
    }
}

/// Handles all the boolean data types.
mod bool_print {
    use super::{pointer_print, Lazy, END_OF_LINE, HEX_PRINT_STEP, INTEGER_LEN};
    use std::fmt;

    /// the prepared true string
    static TRUE: Lazy<String> = Lazy::new(|| formatter("true"));
    /// the prepared false string
    static FALSE: Lazy<String> = Lazy::new(|| formatter("false"));

    /// a function to keep the correct format length
    fn formatter(message: &str) -> String {
        format!("{:<width$}", message, width = INTEGER_LEN)
    }

    /// will pretty print all the boolean data given
    /// the offset will be calculated automatically from
    /// the data block
    pub(super) fn printer(data: &[bool], indent: usize) -> Result<String, fmt::Error> {
        let result_size = super::LENLINE * (data.len() / HEX_PRINT_STEP + 1);

        let mut res = String::with_capacity(result_size);

        let check_type = |val: bool| if val { TRUE.as_str() } else { FALSE.as_str() };

        for (chunk_index, chunk) in data.chunks(HEX_PRINT_STEP).enumerate() {
            let from = chunk_index * HEX_PRINT_STEP;
            super::indent_helper(&mut res, indent);
            pointer_print::formatter(&mut res, from, from + chunk.len() - 1)?;

            let mut line = String::with_capacity(super::LENLINE);
            for value in chunk {
                line.push(' ');
                line.push_str(check_type(*value));
            }
            res.push_str(line.trim_end());
            res.push(END_OF_LINE);
        }
        // Remove unneeded new line
        if let Some(index) = res.rfind(END_OF_LINE) {
            res.truncate(index);
        }

        Ok(res)
    }
}

/// Will indent a single value
fn single<F>(value: F) -> Result<String, fmt::Error>
where
    F: FnOnce(&mut String) -> fmt::Result,
{
    let mut res = String::with_capacity(INTEGER_LEN + INDENT_SIZE);
    indent_helper(&mut res, INDENT_SIZE);
    value(&mut res)?;
    Ok(res)
}

impl fmt::Display for ChipSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nam = single(|s| {
            s.push_str(&self.name);
            Ok(())
        })?;
        let prc = single(|s| integer_print::formatter(s, self.program_counter))?;
        let idx = single(|s| integer_print::formatter(s, self.index_register))?;
        let dly = single(|s| integer_print::formatter(s, self.delay_timer.get_value()))?;
        let snd = single(|s| integer_print::formatter(s, self.sound_timer.get_value()))?;
        let wai = single(|s| match self.waiting {
            Some(x) => write!(s, "V{:X}", x),
            None => write!(s, "-"),
        })?;

        let mem = memory_print::printer(&self.memory[..], INDENT_SIZE)?;
        let key = bool_print::printer(self.keyboard.get_keys(), INDENT_SIZE)?;

        // handle stack specially as it needes to be filled up if empty
        let mut stack = [0u16; cpu::stack::SIZE];
        stack[..self.stack.len()].copy_from_slice(&self.stack);
        let sta = integer_print::printer(&stack, INDENT_SIZE)?;

        let reg = integer_print::printer(&self.registers, INDENT_SIZE)?;

        write!(
            f,
            "Chipset {{\n\
                \tProgram Name :\n{}\n\
                \tProgram Counter :\n{}\n\
                \tIndex Register :\n{}\n\
                \tDelay Timer :\n{}\n\
                \tSound Timer :\n{}\n\
                \tWaiting On :\n{}\n\
                \tMemory :\n{}\n\
                \tKeybord :\n{}\n\
                \tStack :\n{}\n\
                \tRegister :\n{}\n\
                }}",
            nam, prc, idx, dly, snd, wai, mem, key, sta, reg
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests;
    use crate::definitions::keyboard;

    const OUTPUT_PRINT: &str = "\
        Chipset {\n\
            \tProgram Name :\n\
                \t\tTESTROM\n\
            \tProgram Counter :\n\
                \t\t0x0202\n\
            \tIndex Register :\n\
                \t\t0x0300\n\
            \tDelay Timer :\n\
                \t\t0x003C\n\
            \tSound Timer :\n\
                \t\t0x0000\n\
            \tWaiting On :\n\
                \t\t-\n\
            \tMemory :\n\
                \t\t0x0000 - 0x000F : 0xF090 0x9090 0xF020 0x6020 0x2070 0xF010 0xF080 0xF0F0\n\
                \t\t0x0010 - 0x001F : 0x10F0 0x10F0 0x9090 0xF010 0x10F0 0x80F0 0x10F0 0xF080\n\
                \t\t0x0020 - 0x002F : 0xF090 0xF0F0 0x1020 0x4040 0xF090 0xF090 0xF0F0 0x90F0\n\
                \t\t0x0030 - 0x003F : 0x10F0 0xF090 0xF090 0x90E0 0x90E0 0x90E0 0xF080 0x8080\n\
                \t\t0x0040 - 0x004F : 0xF0E0 0x9090 0x90E0 0xF080 0xF080 0xF0F0 0x80F0 0x8080\n\
                \t\t0x0050 - 0x01FF : 0x0000                    ...                    0x0000\n\
                \t\t0x0200 - 0x020F : 0x00E0 0x6C00 0x4C00 0x6E0F 0xA203 0x6020 0xF055 0x00E0\n\
                \t\t0x0210 - 0x021F : 0x22BE 0x2276 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
                \t\t0x0220 - 0x0FFF : 0x0000                    ...                    0x0000\n\
            \tKeybord :\n\
                \t\t0x0000 - 0x0007 : false  true   false  true   false  true   false  true\n\
                \t\t0x0008 - 0x000F : false  true   false  true   false  true   false  true\n\
            \tStack :\n\
                \t\t0x0000 - 0x0007 : 0x0400 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
                \t\t0x0008 - 0x000F : 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000 0x0000\n\
            \tRegister :\n\
                \t\t0x0000 - 0x0007 : 0x0000 0x0001 0x0002 0x0003 0x0004 0x0005 0x0006 0x0007\n\
                \t\t0x0008 - 0x000F : 0x0008 0x0009 0x000A 0x000B 0x000C 0x000D 0x000E 0x00FF\n\
        }";

    #[test]
    /// tests if the pretty print output is as expected
    fn test_full_print() {
        let mut chip = tests::get_default_chip();

        for index in 0..keyboard::SIZE {
            if index % 2 != 0 {
                chip.press_key(index);
            }
        }

        // override the chip register as they are generated randomly
        for (index, register) in chip.registers.iter_mut().enumerate() {
            *register = index as u8;
        }
        chip.registers[0xF] = 0xFF;
        chip.program_counter = 0x202;
        chip.index_register = 0x300;
        chip.delay_timer.set_value(60);
        chip.stack.push(0x400);

        let actual_full = format!("{}", chip);
        let actual_split = actual_full.split('\n');
        let expected = OUTPUT_PRINT.split('\n');

        assert_eq!(OUTPUT_PRINT.lines().count(), actual_full.lines().count());
        for (exp, act) in expected.zip(actual_split) {
            assert_eq!(exp, act);
        }
    }

    #[test]
    fn test_waiting_print() {
        let mut chip = tests::get_default_chip();
        assert!(chip.calc(0xF30A).is_ok());
        let dump = chip.to_string();
        assert!(dump.contains("\tWaiting On :\n\t\tV3\n"));
    }
}
