//! Segmented code entry
//!
//! Six single-digit slots plus the focused slot index. This is view state:
//! verification only ever sees [`CodeEntry::joined`].

use super::code::CODE_LENGTH;

const LAST: usize = CODE_LENGTH - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    slots: [Option<char>; CODE_LENGTH],
    focused: usize,
}

impl CodeEntry {
    pub fn new() -> Self {
        Self {
            slots: [None; CODE_LENGTH],
            focused: 0,
        }
    }

    pub fn slots(&self) -> &[Option<char>; CODE_LENGTH] {
        &self.slots
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    /// Set slot `index` from a text field value.
    ///
    /// Accepts the empty string (clears the slot) or a single ASCII digit
    /// (fills the slot and advances focus). Anything else is ignored and
    /// `false` is returned.
    pub fn enter_digit(&mut self, index: usize, value: &str) -> bool {
        if index >= CODE_LENGTH {
            return false;
        }

        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                self.slots[index] = None;
                true
            }
            (Some(c), None) if c.is_ascii_digit() => {
                self.slots[index] = Some(c);
                self.focused = if index < LAST { index + 1 } else { index };
                true
            }
            _ => false,
        }
    }

    /// Backspace pressed while slot `index` has focus.
    pub fn backspace(&mut self, index: usize) {
        if index >= CODE_LENGTH {
            return;
        }

        if self.slots[index].is_some() {
            self.slots[index] = None;
        } else if index > 0 {
            self.slots[index - 1] = None;
            self.focused = index - 1;
        }
    }

    /// Arrow key pressed while slot `index` has focus. Digits are untouched.
    pub fn navigate(&mut self, index: usize, direction: Direction) {
        let target = match direction {
            Direction::Left => index.checked_sub(1),
            Direction::Right => index.checked_add(1),
        };

        if let Some(target) = target.filter(|t| *t < CODE_LENGTH) {
            self.focused = target;
        }
    }

    /// Paste `text` starting at slot `index`.
    ///
    /// Non-digits are skipped, filling stops at the last slot. Returns the
    /// number of slots filled.
    pub fn paste(&mut self, index: usize, text: &str) -> usize {
        if index >= CODE_LENGTH {
            return 0;
        }

        let mut filled = 0;
        for (slot, digit) in (index..CODE_LENGTH).zip(text.chars().filter(char::is_ascii_digit)) {
            self.slots[slot] = Some(digit);
            filled += 1;
        }

        if filled > 0 {
            self.focused = (index + filled).min(LAST);
        }
        filled
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The entered code, only once every slot holds a digit.
    pub fn joined(&self) -> Option<String> {
        self.slots.iter().copied().collect()
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for CodeEntry {
    fn default() -> Self {
        Self::new()
    }
}
