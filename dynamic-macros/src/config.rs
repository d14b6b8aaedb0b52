use embassy_time::Duration;

use crate::MAX_MACROS;
use crate::MACRO_SPACE_SIZE;
use crate::types::key::{DYNAMIC_MACRO_FIRST, Key};

/// The config struct for dynamic macros.
///
/// There are 3 parts:
/// 1. `MacroStorageConfig`: where the macro programs live in persistent memory.
/// 2. `RandomIntervalConfig`: jitter added before every key transition of a macro.
/// 3. `MacroKeyRange`: which keys trigger macros.
#[derive(Clone, Copy, Debug, Default)]
pub struct DynamicMacrosConfig {
    pub storage: MacroStorageConfig,
    pub random_interval: RandomIntervalConfig,
    pub key_range: MacroKeyRange,
}

/// Region of persistent memory reserved for macro programs
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroStorageConfig {
    /// Start address of the region
    pub base: u32,
    /// Size of the region in bytes
    pub size: u16,
}

impl Default for MacroStorageConfig {
    fn default() -> Self {
        Self {
            base: 0,
            size: MACRO_SPACE_SIZE,
        }
    }
}

/// Random delay before every key transition a macro emits.
///
/// The delay is drawn uniformly from `[min, max]`. When `max <= min`, exactly
/// `min` is used. Varying the timing keeps the host OS from spotting macro
/// input by its perfectly regular rhythm.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RandomIntervalConfig {
    pub min: Duration,
    pub max: Duration,
}

impl RandomIntervalConfig {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    /// Bounds in ms, `None` when the jitter is fixed.
    pub(crate) fn range_ms(&self) -> (u32, Option<u32>) {
        let min = self.min.as_millis().min(u32::MAX as u64) as u32;
        let max = self.max.as_millis().min(u32::MAX as u64) as u32;
        if max > min { (min, Some(max)) } else { (min, None) }
    }
}

/// The block of keys assigned to dynamic macros: `DM(0)` is `first`, `DM(n)` is `first + n`.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MacroKeyRange {
    pub first: u16,
}

impl Default for MacroKeyRange {
    fn default() -> Self {
        Self {
            first: DYNAMIC_MACRO_FIRST,
        }
    }
}

impl MacroKeyRange {
    /// Macro id of the key, `None` if the key is not a macro key.
    pub fn macro_id(&self, key: Key) -> Option<u8> {
        let id = key.raw().checked_sub(self.first)?;
        if (id as usize) < MAX_MACROS { Some(id as u8) } else { None }
    }

    /// The key that plays macro `id`.
    pub fn key(&self, id: u8) -> Key {
        Key::from_raw(self.first.wrapping_add(id as u16))
    }
}
