use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// number of keys on the COSMAC hex keypad
pub const KEY_COUNT: usize = 16;

/// left-hand side of a qwerty keyboard, laid out like the hex keypad:
///   1 2 3 4      1 2 3 C
///   q w e r  =>  4 5 6 D
///   a s d f      7 8 9 E
///   z x c v      A 0 B F
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); KEY_COUNT] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// The key-state capability the interpreter queries while executing
/// Ex9E, ExA1 and Fx0A. The interpreter never reads physical input itself.
pub trait Input {
    /// refresh key state from whatever backs this input; Ok(false) means the
    /// user has asked to quit
    fn poll(&mut self) -> Result<bool, io::Error>;

    /// is hex key `key` held down; anything above 0xf never is
    fn is_key_down(&self, key: u8) -> bool;
}

/// Terminal keyboard input via crossterm. Terminals only report presses (and
/// auto-repeats), never releases, so a key counts as down for `hold` after
/// the last event seen for it.
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    last_pressed: [Option<Instant>; KEY_COUNT],
    hold: Duration,
    raw_mode: bool,
}

impl StdinInput {
    /// puts the terminal into raw mode until dropped
    pub fn new(hold: Duration) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        let mut input = Self::unattached(hold);
        input.raw_mode = true;
        Ok(input)
    }

    fn unattached(hold: Duration) -> Self {
        StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_pressed: [None; KEY_COUNT],
            hold,
            raw_mode: false,
        }
    }

    /// record a key event; returns false if it asks us to quit
    fn handle_key(&mut self, evt: KeyEvent, now: Instant) -> bool {
        match evt.code {
            KeyCode::Esc => return false,
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => return false,
            KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                Some(&mapped_key) => self.last_pressed[mapped_key as usize] = Some(now),
                None => log::trace!("can't map {:?} to a COSMAC key", key),
            },
            other => log::trace!("ignoring key {:?}", other),
        }
        true
    }

    fn is_held_at(&self, key: u8, now: Instant) -> bool {
        match self.last_pressed.get(key as usize) {
            Some(Some(at)) => now.saturating_duration_since(*at) < self.hold,
            _ => false,
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if !self.raw_mode {
            return;
        }
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("couldn't leave raw mode: {}", e);
        }
    }
}

impl Input for StdinInput {
    fn poll(&mut self) -> Result<bool, io::Error> {
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                if !self.handle_key(evt, Instant::now()) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn is_key_down(&self, key: u8) -> bool {
        self.is_held_at(key, Instant::now())
    }
}

/// dummy Input implementation for testing; keys stay down until released
#[derive(Debug, Default, Clone)]
pub struct DummyInput {
    down: [bool; KEY_COUNT],
    pub polls: usize,
    pub quit: bool,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        let mut input = DummyInput::default();
        for &k in keys {
            input.press(k);
        }
        input
    }

    pub fn press(&mut self, key: u8) {
        self.down[(key & 0x0f) as usize] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.down[(key & 0x0f) as usize] = false;
    }
}

impl Input for DummyInput {
    fn poll(&mut self) -> Result<bool, io::Error> {
        self.polls += 1;
        Ok(!self.quit)
    }

    fn is_key_down(&self, key: u8) -> bool {
        self.down.get(key as usize).copied().unwrap_or(false)
    }
}
