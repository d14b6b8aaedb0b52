use crate::types::key::Key;

/// Physical position of a key in the matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyPos {
    pub row: u8,
    pub col: u8,
}

impl KeyPos {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// A physical key transition, together with the key it is mapped to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyEvent {
    pub pos: KeyPos,
    pub key: Key,
    pub pressed: bool,
}

impl KeyEvent {
    pub const fn new(pos: KeyPos, key: Key, pressed: bool) -> Self {
        Self { pos, key, pressed }
    }
}

/// A key transition injected by a macro.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyAction {
    Press(Key),
    Release(Key),
}
