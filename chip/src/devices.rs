use crate::definitions::{display, keyboard};

/// The framebuffer handed to the presentation side, row major.
pub type Pixels = [[bool; display::WIDTH]; display::HEIGHT];

/// A single transition of a logical key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    Down(usize),
    Up(usize),
}

#[cfg_attr(test, mockall::automock)]
/// The traits responsible for the display based code
pub trait DisplayCommands {
    /// Will display all from the pixels
    fn display(&mut self, pixels: &Pixels);
    /// Called on every tick without a changed framebuffer.
    fn refresh(&mut self);
    /// Returns false as soon as the surface was closed.
    fn is_open(&self) -> bool;
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for reading the keyboard data
pub trait KeyboardCommands {
    /// Returns all the key transitions since the last call.
    fn poll(&mut self) -> Vec<KeyEvent>;
}

#[cfg_attr(test, mockall::automock)]
/// The trait responsible for the sound output
pub trait SoundCommands {
    /// Fired once when the sound timer runs out.
    fn beep(&mut self);
}

/// The internal keyboard representation.
///
/// Input is done with a hex keyboard that has 16 keys ranging `0-F`. The `8`, `4`, `6`, and
/// `2` keys are typically used for directional input. Three opcodes are used to detect input.
/// One skips an instruction if a specific key is pressed, while another does the same if a
/// specific key is not pressed. The third waits for a key press, and then stores it in one of
/// the data registers.
#[derive(Default, Debug, Clone)]
pub struct Keyboard {
    keys: [bool; keyboard::SIZE],
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard::default()
    }

    /// Marks the key as down.
    pub fn press(&mut self, key: usize) {
        self.set_key(key, true)
    }

    /// Marks the key as up.
    pub fn release(&mut self, key: usize) {
        self.set_key(key, false)
    }

    fn set_key(&mut self, key: usize, to: bool) {
        match self.keys.get_mut(key) {
            Some(state) => *state = to,
            None => log::warn!("Ignoring the unknown key {:#X}", key),
        }
    }

    /// Applies a single transition.
    pub fn apply(&mut self, event: KeyEvent) {
        match event {
            KeyEvent::Down(key) => self.press(key),
            KeyEvent::Up(key) => self.release(key),
        }
    }

    /// Unknown keys are never pressed.
    pub fn is_pressed(&self, key: usize) -> bool {
        self.keys.get(key).copied().unwrap_or(false)
    }

    /// Reads the key state and clears it.
    ///
    /// # Example
    /// ```rust
    /// # use chip::devices::Keyboard;
    /// let mut keyboard = Keyboard::new();
    /// keyboard.press(0x3);
    /// assert!(keyboard.consume(0x3));
    /// assert!(!keyboard.consume(0x3));
    /// ```
    pub fn consume(&mut self, key: usize) -> bool {
        match self.keys.get_mut(key) {
            Some(state) => std::mem::replace(state, false),
            None => false,
        }
    }

    /// Takes the lowest key that is currently down.
    pub fn take_any(&mut self) -> Option<usize> {
        let key = self.keys.iter().position(|state| *state)?;
        self.keys[key] = false;
        Some(key)
    }

    pub fn get_keys(&self) -> &[bool] {
        &self.keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_release() {
        let mut keyboard = Keyboard::new();
        assert!(keyboard.get_keys().iter().all(|key| !key));

        keyboard.press(0xA);
        assert!(keyboard.is_pressed(0xA));
        assert!(!keyboard.is_pressed(0xB));

        keyboard.release(0xA);
        assert!(!keyboard.is_pressed(0xA));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let mut keyboard = Keyboard::new();
        keyboard.press(keyboard::SIZE);
        keyboard.apply(KeyEvent::Down(0xFF));
        assert!(keyboard.get_keys().iter().all(|key| !key));
        assert!(!keyboard.is_pressed(keyboard::SIZE));
        assert!(!keyboard.consume(keyboard::SIZE));
    }

    #[test]
    fn test_take_any_lowest_first() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.take_any(), None);

        keyboard.apply(KeyEvent::Down(0x9));
        keyboard.apply(KeyEvent::Down(0x4));
        assert_eq!(keyboard.take_any(), Some(0x4));
        assert_eq!(keyboard.take_any(), Some(0x9));
        assert_eq!(keyboard.take_any(), None);
    }

    #[test]
    fn test_apply_up() {
        let mut keyboard = Keyboard::new();
        keyboard.apply(KeyEvent::Down(0x1));
        keyboard.apply(KeyEvent::Up(0x1));
        assert!(!keyboard.is_pressed(0x1));
    }
}
