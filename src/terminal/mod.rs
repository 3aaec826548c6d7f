//! The devices backing the chip when it runs inside of a terminal.
mod input;
mod sound;

pub use input::TerminalInput;
pub use sound::TerminalSound;

use std::io::{self, Stdout};

use chip::{
    definitions::display,
    devices::{DisplayCommands, Pixels},
};
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::CrosstermBackend,
    layout::Rect,
    text::Spans,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

/// Two pixel rows share a single line of text.
fn cell(top: bool, bottom: bool) -> char {
    match (top, bottom) {
        (true, true) => '█',
        (true, false) => '▀',
        (false, true) => '▄',
        (false, false) => ' ',
    }
}

/// Will turn the framebuffer into lines of half block characters.
pub(crate) fn render(pixels: &Pixels) -> Vec<String> {
    pixels
        .chunks(2)
        .map(|rows| {
            (0..display::WIDTH)
                .map(|x| cell(rows[0][x], rows.get(1).map_or(false, |row| row[x])))
                .collect()
        })
        .collect()
}

/// Draws the framebuffer with the alternate screen of the terminal.
///
/// The terminal is put into raw mode for as long as this lives.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    last: Vec<String>,
    size: Rect,
    open: bool,
}

impl TerminalDisplay {
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        let size = terminal.size()?;

        Ok(Self {
            terminal,
            last: render(&[[false; display::WIDTH]; display::HEIGHT]),
            size,
            open: true,
        })
    }

    fn draw(&mut self) {
        let lines = &self.last;
        let res = self.terminal.draw(|f| {
            let area = f.size();
            let screen = Rect::new(
                0,
                0,
                (display::WIDTH as u16 + 2).min(area.width),
                (display::HEIGHT as u16 / 2 + 2).min(area.height),
            );
            let text: Vec<Spans> = lines.iter().map(|line| Spans::from(line.as_str())).collect();
            let paragraph = Paragraph::new(text)
                .block(Block::default().title("CHIP-8").borders(Borders::ALL));
            f.render_widget(paragraph, screen);
        });

        if let Err(err) = res {
            log::error!("Unable to draw to the terminal: {}", err);
            self.open = false;
        }
    }
}

impl DisplayCommands for TerminalDisplay {
    fn display(&mut self, pixels: &Pixels) {
        self.last = render(pixels);
        self.draw();
    }

    fn refresh(&mut self) {
        // only redraw if the terminal was resized in the meantime
        match self.terminal.size() {
            Ok(size) if size != self.size => {
                log::debug!("Terminal resized to {}x{}", size.width, size.height);
                self.size = size;
                self.draw();
            }
            Ok(_) => {}
            Err(err) => {
                log::error!("Lost the terminal: {}", err);
                self.open = false;
            }
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        let res = terminal::disable_raw_mode().and_then(|_| {
            execute!(
                self.terminal.backend_mut(),
                LeaveAlternateScreen,
                cursor::Show
            )
        });
        if let Err(err) = res {
            log::error!("Unable to restore the terminal: {}", err);
        }
    }
}
