use std::{
    io::{self, Write},
    sync::mpsc::{self, Receiver, SyncSender, TrySendError},
    thread::{self, JoinHandle},
};

use chip::devices::SoundCommands;

/// The terminal bell
const BELL: &[u8] = b"\x07";

/// Rings the terminal bell from a worker thread, so the
/// interpreter never blocks on the output.
pub struct TerminalSound {
    sender: Option<SyncSender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl TerminalSound {
    pub fn new() -> io::Result<Self> {
        Self::with_output(io::stdout)
    }

    /// Will ring into whatever the factory creates, the output is
    /// created on the worker thread.
    pub(crate) fn with_output<F, W>(output: F) -> io::Result<Self>
    where
        F: FnOnce() -> W + Send + 'static,
        W: Write,
    {
        let (sender, receiver) = mpsc::sync_channel::<()>(1);
        let thread = thread::Builder::new()
            .name("bell".into())
            .spawn(move || ring(receiver, output()))?;

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }
}

fn ring<W: Write>(receiver: Receiver<()>, mut output: W) {
    // ends as soon as the sender is dropped
    for () in receiver {
        if let Err(err) = output.write_all(BELL).and_then(|_| output.flush()) {
            log::warn!("Unable to ring the bell: {}", err);
        }
    }
}

impl SoundCommands for TerminalSound {
    fn beep(&mut self) {
        let sender = match &self.sender {
            Some(sender) => sender,
            None => return,
        };
        match sender.try_send(()) {
            Ok(()) => log::trace!("Beep"),
            Err(TrySendError::Full(())) => log::trace!("Dropping a beep, the bell is busy"),
            Err(TrySendError::Disconnected(())) => {
                log::debug!("The bell is gone");
                self.sender = None;
            }
        }
    }
}

impl Drop for TerminalSound {
    fn drop(&mut self) {
        // Closing the channel stops the worker
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                log::error!("The bell thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Collects everything written into a shared buffer
    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_beeps_reach_the_output() {
        let shared = Shared::default();
        let output = shared.clone();
        let mut sound = TerminalSound::with_output(move || output).unwrap();

        for _ in 0..5 {
            sound.beep();
        }
        // waits for the worker to finish
        drop(sound);

        let written = shared.0.lock().unwrap();
        // some beeps may have been dropped, but never more then sent
        assert!(!written.is_empty());
        assert!(written.len() <= 5);
        assert!(written.iter().all(|b| *b == 0x07));
    }
}
