use std::sync::atomic::{AtomicBool, Ordering};

/// the hex keypad has 16 keys, 0x0-0xF
pub const CHIP8_KEY_COUNT: usize = 16;

/// host keys mapped onto the keypad, using the left-hand side of a qwerty
/// keyboard:
/// ```text
/// |1|2|3|C|      |1|2|3|4|
/// |4|5|6|D|  ->  |q|w|e|r|
/// |7|8|9|E|      |a|s|d|f|
/// |A|0|B|F|      |z|x|c|v|
/// ```
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); CHIP8_KEY_COUNT] = [
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

/// map a host key to its keypad number; unmapped keys are None and ignored
pub fn translate(host_key: char) -> Option<u8> {
    CHIP8_CONVENTIONAL_KEYMAP
        .iter()
        .find(|(host, _)| *host == host_key)
        .map(|(_, key)| *key)
}

/// The 16 key-down flags.
///
/// Host input callbacks write these from outside the loop thread while the
/// interpreter reads them mid-cycle, so each flag is its own atomic slot
/// and the buffer is shared by reference with no lock.
pub struct KeyBuffer {
    keys: [AtomicBool; CHIP8_KEY_COUNT],
}

impl KeyBuffer {
    pub fn new() -> Self {
        KeyBuffer {
            keys: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }

    /// release every key
    pub fn reset(&self) {
        for key in &self.keys {
            key.store(false, Ordering::Release);
        }
    }

    pub fn set_key(&self, key: u8, down: bool) {
        if let Some(slot) = self.keys.get(key as usize) {
            slot.store(down, Ordering::Release);
        }
    }

    /// keys outside the keypad are never down
    pub fn is_down(&self, key: u8) -> bool {
        self.keys
            .get(key as usize)
            .map(|slot| slot.load(Ordering::Acquire))
            .unwrap_or(false)
    }

    /// scan for a held key; when several are held the highest-numbered wins
    pub fn pressed_key(&self) -> Option<u8> {
        (0..CHIP8_KEY_COUNT as u8).rev().find(|&key| self.is_down(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_query() {
        let k = KeyBuffer::new();
        assert!(!k.is_down(0x5));
        k.set_key(0x5, true);
        assert!(k.is_down(0x5));
        k.set_key(0x5, false);
        assert!(!k.is_down(0x5));
    }

    #[test]
    fn test_out_of_range_key_is_never_down() {
        let k = KeyBuffer::new();
        k.set_key(0x99, true);
        assert!(!k.is_down(0x99));
    }

    #[test]
    fn test_pressed_key_prefers_highest() {
        let k = KeyBuffer::new();
        assert_eq!(k.pressed_key(), None);
        k.set_key(0x2, true);
        k.set_key(0xB, true);
        assert_eq!(k.pressed_key(), Some(0xB));
    }

    #[test]
    fn test_reset_releases_all() {
        let k = KeyBuffer::new();
        k.set_key(0x0, true);
        k.set_key(0xF, true);
        k.reset();
        assert_eq!(k.pressed_key(), None);
    }

    #[test]
    fn test_translate_mapped_keys() {
        assert_eq!(translate('x'), Some(0x0));
        assert_eq!(translate('1'), Some(0x1));
        assert_eq!(translate('v'), Some(0xF));
    }

    #[test]
    fn test_translate_ignores_unmapped() {
        assert_eq!(translate('p'), None);
        assert_eq!(translate(' '), None);
    }
}
