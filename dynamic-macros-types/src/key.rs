//! Keys as they appear in macro programs and in the host's event pipeline.
//!
//! A key is 16 bits wide: the high byte holds [`KeyFlags`], the low byte holds
//! the keycode. Plain HID keys have no flags set.

use core::ops::BitOr;

use bitfield_struct::bitfield;

/// Raw value of the first dynamic macro key, `DM(0)`.
///
/// Range keys carry the reserved flag bit, so they never collide with a
/// HID keycode that has modifier flags attached.
pub const DYNAMIC_MACRO_FIRST: u16 = 0xD400;

/// Modifier and marker flags attached to a key.
///
/// | bit7 | bit6 | bit5 | bit4 | bit3 | bit2 | bit1 | bit0 |
/// | --- | --- | --- | --- | --- | --- | --- | --- |
/// | RESERVED | SYNTHETIC | - | GUI | SHIFT | RALT | LALT | CTRL |
#[bitfield(u8, order = Lsb, defmt = cfg(feature = "defmt"))]
#[derive(Eq, PartialEq)]
pub struct KeyFlags {
    #[bits(1)]
    pub ctrl: bool,
    #[bits(1)]
    pub left_alt: bool,
    #[bits(1)]
    pub right_alt: bool,
    #[bits(1)]
    pub shift: bool,
    #[bits(1)]
    pub gui: bool,
    #[bits(1)]
    _unused: u8,
    #[bits(1)]
    pub synthetic: bool,
    #[bits(1)]
    pub reserved: bool,
}

impl BitOr for KeyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::from_bits(self.into_bits() | rhs.into_bits())
    }
}

pub const CTRL_HELD: KeyFlags = KeyFlags::new().with_ctrl(true);
pub const LALT_HELD: KeyFlags = KeyFlags::new().with_left_alt(true);
pub const RALT_HELD: KeyFlags = KeyFlags::new().with_right_alt(true);
pub const SHIFT_HELD: KeyFlags = KeyFlags::new().with_shift(true);
pub const GUI_HELD: KeyFlags = KeyFlags::new().with_gui(true);

impl KeyFlags {
    /// True if any of the modifier bits is set.
    pub const fn has_modifiers(self) -> bool {
        self.into_bits() & 0x1F != 0
    }

    pub const fn is_empty(self) -> bool {
        self.into_bits() == 0
    }
}

/// A key with its flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Key {
    pub flags: KeyFlags,
    pub code: u8,
}

impl Key {
    /// The empty key, also used as the terminator of explicit tap sequences.
    pub const NO: Self = Self::from_code(0);

    pub const fn new(flags: KeyFlags, code: u8) -> Self {
        Self { flags, code }
    }

    /// A plain key without any flags.
    pub const fn from_code(code: u8) -> Self {
        Self {
            flags: KeyFlags::new(),
            code,
        }
    }

    pub const fn from_raw(raw: u16) -> Self {
        Self {
            flags: KeyFlags::from_bits((raw >> 8) as u8),
            code: raw as u8,
        }
    }

    pub const fn raw(self) -> u16 {
        ((self.flags.into_bits() as u16) << 8) | self.code as u16
    }

    pub const fn is_no_key(self) -> bool {
        self.raw() == 0
    }

    /// Can this key be stored in the compact, flag-less step form?
    pub const fn is_plain(self) -> bool {
        self.flags.is_empty()
    }
}
