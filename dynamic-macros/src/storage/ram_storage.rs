use embedded_storage::{ReadStorage, Storage};

/// Error of [`RamStorage`], an access ran past its end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRange;

/// A volatile storage backed by a byte array.
///
/// Can be used when persistent storage is not available: macros written over
/// the configuration channel then live until the next reset. Starts out in
/// the erased state, all `0xFF`.
pub struct RamStorage<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStorage<N> {
    pub fn new() -> Self {
        Self { bytes: [0xFF; N] }
    }

    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    fn range(offset: u32, len: usize) -> Result<core::ops::Range<usize>, OutOfRange> {
        let start = offset as usize;
        let end = start.checked_add(len).ok_or(OutOfRange)?;
        if end > N {
            return Err(OutOfRange);
        }
        Ok(start..end)
    }
}

impl<const N: usize> ReadStorage for RamStorage<N> {
    type Error = OutOfRange;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for RamStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        self.bytes[range].copy_from_slice(bytes);
        Ok(())
    }
}
