use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;

use crate::machine::MachineHandle;

/// how long a key stays down after its press event. terminals report
/// presses but not releases, so release is approximated with a hold timeout
const KEY_HOLD: Duration = Duration::from_millis(200);

/// how long to block waiting for the next event before expiring held keys
const POLL_PAUSE: Duration = Duration::from_millis(5);

/// Forwards terminal key events to the machine; Esc stops it.
///
/// Owns the terminal's raw mode for its lifetime.
pub struct TermInput {
    held: Vec<(char, Instant)>,
}

impl TermInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(TermInput { held: Vec::new() })
    }

    /// drain pending key events into the machine, then release any key
    /// past its hold timeout. call repeatedly from the input thread
    pub fn pump(&mut self, machine: &MachineHandle) -> Result<(), io::Error> {
        while poll(POLL_PAUSE)? {
            if let Event::Key(event) = read()? {
                match event.code {
                    KeyCode::Char(key) => {
                        machine.key_down(key);
                        self.held.retain(|(held, _)| *held != key);
                        self.held.push((key, Instant::now()));
                    }
                    KeyCode::Esc => machine.stop(),
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        self.held.retain(|(key, since)| {
            if now.duration_since(*since) >= KEY_HOLD {
                machine.key_up(*key);
                false
            } else {
                true
            }
        });
        Ok(())
    }
}

impl Drop for TermInput {
    fn drop(&mut self) {
        terminal::disable_raw_mode().unwrap();
    }
}
