use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use chip::{
    definitions::keyboard,
    devices::{KeyEvent, KeyboardCommands},
    Shutdown,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// The left hand side of a qwerty keyboard, laid out like the hex keypad.
const GRID: [[char; 4]; 4] = [
    ['1', '2', '3', '4'],
    ['q', 'w', 'e', 'r'],
    ['a', 's', 'd', 'f'],
    ['z', 'x', 'c', 'v'],
];

/// Maps every grid character onto the hex key at the same position.
fn keymap() -> HashMap<char, usize> {
    GRID.iter()
        .flatten()
        .zip(keyboard::LAYOUT.iter().flatten())
        .map(|(c, key)| (*c, *key))
        .collect()
}

/// What a single terminal key press means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Key(usize),
    Quit,
    Ignore,
}

fn action(keymap: &HashMap<char, usize>, event: event::KeyEvent) -> Action {
    // releases are reported by some terminals only, the holds take care of them
    if event.kind == KeyEventKind::Release {
        return Action::Ignore;
    }
    match event.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,
        KeyCode::Char(c) => keymap
            .get(&c.to_ascii_lowercase())
            .map_or(Action::Ignore, |key| Action::Key(*key)),
        _ => Action::Ignore,
    }
}

/// Terminals only report presses, so a key counts as released once
/// it was not repeated for the hold time.
#[derive(Debug)]
struct Holds {
    hold: Duration,
    since: [Option<Instant>; keyboard::SIZE],
}

impl Holds {
    fn new(hold: Duration) -> Self {
        Self {
            hold,
            since: [None; keyboard::SIZE],
        }
    }

    /// A repeated press only refreshes the hold.
    fn press(&mut self, key: usize, now: Instant) -> Option<KeyEvent> {
        let since = self.since.get_mut(key)?;
        let was_down = since.replace(now).is_some();
        if was_down {
            None
        } else {
            Some(KeyEvent::Down(key))
        }
    }

    fn expire(&mut self, now: Instant, events: &mut Vec<KeyEvent>) {
        for (key, since) in self.since.iter_mut().enumerate() {
            if let Some(at) = *since {
                if now.saturating_duration_since(at) >= self.hold {
                    *since = None;
                    events.push(KeyEvent::Up(key));
                }
            }
        }
    }
}

/// Reads the key presses from the terminal.
pub struct TerminalInput {
    keymap: HashMap<char, usize>,
    holds: Holds,
    shutdown: Shutdown,
}

impl TerminalInput {
    pub fn new(hold: Duration, shutdown: Shutdown) -> Self {
        Self {
            keymap: keymap(),
            holds: Holds::new(hold),
            shutdown,
        }
    }

    fn read(&mut self, events: &mut Vec<KeyEvent>) -> crossterm::Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                match action(&self.keymap, key) {
                    Action::Key(key) => events.extend(self.holds.press(key, Instant::now())),
                    Action::Quit => self.shutdown.signal(),
                    Action::Ignore => log::trace!("Ignoring {:?}", key.code),
                }
            }
        }
        Ok(())
    }
}

impl KeyboardCommands for TerminalInput {
    fn poll(&mut self) -> Vec<KeyEvent> {
        let mut events = Vec::new();
        if let Err(err) = self.read(&mut events) {
            log::error!("Unable to read from the terminal: {}", err);
            self.shutdown.signal();
        }
        self.holds.expire(Instant::now(), &mut events);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keymap() {
        let keymap = keymap();
        assert_eq!(keymap.len(), keyboard::SIZE);
        assert_eq!(keymap[&'1'], 0x1);
        assert_eq!(keymap[&'4'], 0xC);
        assert_eq!(keymap[&'x'], 0x0);
        assert_eq!(keymap[&'z'], 0xA);
        assert_eq!(keymap[&'v'], 0xF);
    }

    #[test]
    fn test_actions() {
        let keymap = keymap();
        let key = |code, modifiers| action(&keymap, event::KeyEvent::new(code, modifiers));

        assert_eq!(key(KeyCode::Esc, KeyModifiers::NONE), Action::Quit);
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::CONTROL), Action::Quit);
        assert_eq!(key(KeyCode::Char('c'), KeyModifiers::NONE), Action::Key(0xB));
        assert_eq!(key(KeyCode::Char('W'), KeyModifiers::SHIFT), Action::Key(0x5));
        assert_eq!(key(KeyCode::Char('p'), KeyModifiers::NONE), Action::Ignore);
        assert_eq!(key(KeyCode::Enter, KeyModifiers::NONE), Action::Ignore);
    }

    #[test]
    fn test_only_presses_and_repeats() {
        let keymap = keymap();
        let key = |code, kind| {
            let mut event = event::KeyEvent::new(code, KeyModifiers::NONE);
            event.kind = kind;
            action(&keymap, event)
        };

        assert_eq!(key(KeyCode::Char('w'), KeyEventKind::Press), Action::Key(0x5));
        assert_eq!(key(KeyCode::Char('w'), KeyEventKind::Repeat), Action::Key(0x5));
        assert_eq!(key(KeyCode::Char('w'), KeyEventKind::Release), Action::Ignore);
        assert_eq!(key(KeyCode::Esc, KeyEventKind::Release), Action::Ignore);
    }

    #[test]
    fn test_hold_and_release() {
        let hold = Duration::from_millis(200);
        let mut holds = Holds::new(hold);
        let start = Instant::now();
        let mut events = Vec::new();

        assert_eq!(holds.press(0x5, start), Some(KeyEvent::Down(0x5)));
        // auto repeat keeps the key down
        assert_eq!(holds.press(0x5, start + hold / 2), None);

        holds.expire(start + hold, &mut events);
        assert!(events.is_empty());

        holds.expire(start + hold / 2 + hold, &mut events);
        assert_eq!(events, vec![KeyEvent::Up(0x5)]);

        // and can be pressed again
        assert_eq!(holds.press(0x5, start + 2 * hold), Some(KeyEvent::Down(0x5)));
    }

    #[test]
    fn test_unknown_key_hold() {
        let mut holds = Holds::new(Duration::from_millis(10));
        assert_eq!(holds.press(keyboard::SIZE, Instant::now()), None);
    }
}
