mod ram_storage;

use embedded_storage::{ReadStorage, Storage};
pub use ram_storage::RamStorage;

use crate::config::MacroStorageConfig;
use crate::error::MacroError;

/// The macro region of persistent memory.
///
/// Owns the storage driver and confines every access to `[base, base + size)`.
/// Offsets are relative to the start of the region.
///
/// Any byte-addressable driver works. A NOR flash can be adapted with
/// `embedded_storage::nor_flash::RmwNorFlashStorage`.
pub struct MacroStore<S> {
    storage: S,
    base: u32,
    size: u16,
}

impl<S: ReadStorage> MacroStore<S> {
    /// Reserve the region described by `config`.
    ///
    /// Fails if the region doesn't fit in the storage.
    pub fn reserve(storage: S, config: &MacroStorageConfig) -> Result<Self, MacroError> {
        let capacity = storage.capacity();
        let end = config.base as u64 + config.size as u64;
        if end > capacity as u64 {
            error!(
                "Macro region {}+{} exceeds storage capacity {}",
                config.base, config.size, capacity
            );
            return Err(MacroError::StorageOutOfRange {
                base: config.base,
                size: config.size,
                capacity,
            });
        }
        info!("Reserved {} bytes of macro storage at {}", config.size, config.base);
        Ok(Self {
            storage,
            base: config.base,
            size: config.size,
        })
    }

    /// Size of the region in bytes
    pub fn size(&self) -> u16 {
        self.size
    }

    /// Read one byte, `None` if `offset` is outside of the region or the read failed.
    pub fn read_byte(&mut self, offset: u16) -> Option<u8> {
        let mut buf = [0u8; 1];
        self.read(offset, &mut buf).ok()?;
        Some(buf[0])
    }

    /// Fill `buf` from the region starting at `offset`.
    pub fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), MacroError> {
        self.check_bounds(offset, buf.len())?;
        self.storage
            .read(self.base + offset as u32, buf)
            .map_err(|_| MacroError::Storage)
    }

    /// Give the storage driver back.
    pub fn into_inner(self) -> S {
        self.storage
    }

    fn check_bounds(&self, offset: u16, len: usize) -> Result<(), MacroError> {
        if offset as usize + len > self.size as usize {
            return Err(MacroError::OutOfBounds { offset, len });
        }
        Ok(())
    }
}

impl<S: Storage> MacroStore<S> {
    /// Write `bytes` into the region starting at `offset`.
    pub fn write(&mut self, offset: u16, bytes: &[u8]) -> Result<(), MacroError> {
        self.check_bounds(offset, bytes.len())?;
        self.storage.write(self.base + offset as u32, bytes).map_err(|_| {
            error!("Failed to write {} macro bytes at {}", bytes.len(), offset);
            MacroError::Storage
        })
    }
}
