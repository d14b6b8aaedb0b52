//! Step decoder.
//!
//! Every read goes through [`MacroStore`], which refuses to read past the end
//! of the macro region. A step that doesn't fit in the region decodes to
//! `None`, and callers treat that as an implicit end of the macro. Partially
//! written storage therefore can't make playback run off the region.

use embedded_storage::ReadStorage;

use crate::storage::MacroStore;
use crate::types::key::{Key, KeyFlags};
use crate::types::step::{MacroStep, MacroStepKind, SequenceEncoding};

/// Decode the step at `cursor`.
///
/// Returns the step and the offset of the step after it, or `None` if the
/// step would overrun the region.
pub fn decode_step<S: ReadStorage>(store: &mut MacroStore<S>, cursor: u16) -> Option<(MacroStep, u16)> {
    let opcode = store.read_byte(cursor)?;
    // A successful read guarantees cursor < size <= u16::MAX
    let payload = cursor + 1;
    let kind = match MacroStepKind::try_from(opcode) {
        Ok(kind) => kind,
        Err(op) => return Some((MacroStep::Unknown(op), payload)),
    };

    let step = match kind {
        MacroStepKind::End => MacroStep::End,
        MacroStepKind::Interval => MacroStep::Interval(store.read_byte(payload)?),
        MacroStepKind::Wait => MacroStep::Wait(store.read_byte(payload)?),
        MacroStepKind::KeyDown => MacroStep::KeyDown(read_explicit_key(store, payload)?),
        MacroStepKind::KeyUp => MacroStep::KeyUp(read_explicit_key(store, payload)?),
        MacroStepKind::Tap => MacroStep::Tap(read_explicit_key(store, payload)?),
        MacroStepKind::KeyCodeDown => MacroStep::KeyDown(read_compact_key(store, payload)?),
        MacroStepKind::KeyCodeUp => MacroStep::KeyUp(read_compact_key(store, payload)?),
        MacroStepKind::TapCode => MacroStep::Tap(read_compact_key(store, payload)?),
        MacroStepKind::ExplicitReport | MacroStepKind::ImplicitReport | MacroStepKind::SendReport => MacroStep::Report,
        MacroStepKind::TapSequence => MacroStep::TapSequence(SequenceEncoding::Explicit),
        MacroStepKind::TapCodeSequence => MacroStep::TapSequence(SequenceEncoding::Compact),
    };
    // The payload was read, so it ends inside the region. Sequence elements
    // are decoded by the caller, starting right after the opcode.
    let next = payload + kind.payload_len().unwrap_or(0) as u16;
    Some((step, next))
}

/// Decode one element of a tap sequence.
///
/// The key is `None` for the element that terminates the sequence.
pub fn decode_sequence_key<S: ReadStorage>(
    store: &mut MacroStore<S>,
    cursor: u16,
    encoding: SequenceEncoding,
) -> Option<(Option<Key>, u16)> {
    let key = match encoding {
        SequenceEncoding::Explicit => read_explicit_key(store, cursor)?,
        SequenceEncoding::Compact => read_compact_key(store, cursor)?,
    };
    let next = cursor + encoding.element_len() as u16;
    Some(((!key.is_no_key()).then_some(key), next))
}

/// Offset right after the terminator of the tap sequence starting at `cursor`.
pub fn skip_sequence<S: ReadStorage>(store: &mut MacroStore<S>, mut cursor: u16, encoding: SequenceEncoding) -> Option<u16> {
    loop {
        let (key, next) = decode_sequence_key(store, cursor, encoding)?;
        cursor = next;
        if key.is_none() {
            return Some(cursor);
        }
    }
}

fn read_explicit_key<S: ReadStorage>(store: &mut MacroStore<S>, cursor: u16) -> Option<Key> {
    let mut buf = [0u8; 2];
    store.read(cursor, &mut buf).ok()?;
    Some(Key::new(KeyFlags::from_bits(buf[0]), buf[1]))
}

fn read_compact_key<S: ReadStorage>(store: &mut MacroStore<S>, cursor: u16) -> Option<Key> {
    store.read_byte(cursor).map(Key::from_code)
}

/// The steps of one macro, starting at a given offset.
///
/// Tap sequences are flattened into one [`MacroStep::Tap`] per element. The
/// iterator ends at the macro's END, at an unknown opcode, or where the next
/// step would overrun the region; it never yields [`MacroStep::End`].
pub struct MacroSteps<'a, S> {
    store: &'a mut MacroStore<S>,
    cursor: u16,
    sequence: Option<SequenceEncoding>,
    done: bool,
}

impl<'a, S: ReadStorage> MacroSteps<'a, S> {
    pub fn new(store: &'a mut MacroStore<S>, offset: u16) -> Self {
        Self {
            store,
            cursor: offset,
            sequence: None,
            done: false,
        }
    }

    /// Offset of the next byte to decode
    pub fn cursor(&self) -> u16 {
        self.cursor
    }

    fn next_in_sequence(&mut self, encoding: SequenceEncoding) -> Option<Option<MacroStep>> {
        let (key, next) = decode_sequence_key(self.store, self.cursor, encoding)?;
        self.cursor = next;
        match key {
            Some(key) => Some(Some(MacroStep::Tap(key))),
            None => {
                self.sequence = None;
                Some(None)
            }
        }
    }

    fn finish(&mut self) -> Option<MacroStep> {
        self.done = true;
        None
    }
}

impl<S: ReadStorage> Iterator for MacroSteps<'_, S> {
    type Item = MacroStep;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some(encoding) = self.sequence {
                match self.next_in_sequence(encoding) {
                    Some(Some(step)) => return Some(step),
                    // Terminator, continue with the step after the sequence
                    Some(None) => continue,
                    None => {
                        warn!("Tap sequence at {} runs past the macro storage", self.cursor);
                        return self.finish();
                    }
                }
            }

            let Some((step, next)) = decode_step(self.store, self.cursor) else {
                warn!("Macro step at {} runs past the macro storage", self.cursor);
                return self.finish();
            };
            self.cursor = next;
            match step {
                MacroStep::End => return self.finish(),
                MacroStep::Unknown(op) => {
                    warn!("Unknown macro step {} at {}", op, self.cursor - 1);
                    return self.finish();
                }
                MacroStep::TapSequence(encoding) => self.sequence = Some(encoding),
                step => return Some(step),
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MacroStorageConfig;
    use crate::storage::RamStorage;
    use crate::types::key::SHIFT_HELD;

    fn store<const N: usize>(bytes: [u8; N]) -> MacroStore<RamStorage<N>> {
        let config = MacroStorageConfig { base: 0, size: N as u16 };
        MacroStore::reserve(RamStorage::from_bytes(bytes), &config).unwrap()
    }

    #[test]
    fn test_decode_step_lengths() {
        let mut store = store([0x01, 10, 0x03, 0x08, 0x04, 0x08, 0x05, 0x0B, 0x00]);
        assert_eq!(decode_step(&mut store, 0), Some((MacroStep::Interval(10), 2)));
        assert_eq!(
            decode_step(&mut store, 2),
            Some((MacroStep::KeyDown(Key::new(SHIFT_HELD, 0x04)), 5))
        );
        assert_eq!(decode_step(&mut store, 5), Some((MacroStep::Tap(Key::from_code(0x05)), 7)));
        assert_eq!(decode_step(&mut store, 7), Some((MacroStep::Report, 8)));
        assert_eq!(decode_step(&mut store, 8), Some((MacroStep::End, 9)));
        assert_eq!(decode_step(&mut store, 9), None);
    }

    #[test]
    fn test_cursor_advances_past_payload() {
        for opcode in 0x00..=0x0Du8 {
            let kind = MacroStepKind::try_from(opcode).unwrap();
            let mut store = store([opcode, 0x08, 0x04, 0x00]);
            let (_, next) = decode_step(&mut store, 0).unwrap();
            assert_eq!(next as usize, 1 + kind.payload_len().unwrap_or(0), "opcode {}", opcode);
        }
    }

    #[test]
    fn test_truncated_payload_is_implicit_end() {
        // Explicit key down missing its keycode
        let mut store = store([0x06, 0x04, 0x03, 0x08]);
        assert_eq!(decode_step(&mut store, 0), Some((MacroStep::KeyDown(Key::from_code(0x04)), 2)));
        assert_eq!(decode_step(&mut store, 2), None);

        let steps: Vec<_> = MacroSteps::new(&mut store, 0).collect();
        assert_eq!(steps, [MacroStep::KeyDown(Key::from_code(0x04))]);
    }

    #[test]
    fn test_unknown_opcode() {
        let mut store = store([0xFF, 0x08, 0x04, 0x00]);
        assert_eq!(decode_step(&mut store, 0), Some((MacroStep::Unknown(0xFF), 1)));
        assert_eq!(MacroSteps::new(&mut store, 0).count(), 0);
    }

    #[test]
    fn test_sequences_are_flattened() {
        let mut store = store([
            0x0D, 0x04, 0x05, 0x00, // compact sequence: tap 0x04, tap 0x05
            0x0C, 0x08, 0x06, 0x00, 0x07, 0x00, 0x00, // explicit sequence: shift+0x06, 0x07
            0x08, 0x09, // tap 0x09
            0x00,
        ]);
        let steps: Vec<_> = MacroSteps::new(&mut store, 0).collect();
        assert_eq!(
            steps,
            [
                MacroStep::Tap(Key::from_code(0x04)),
                MacroStep::Tap(Key::from_code(0x05)),
                MacroStep::Tap(Key::new(SHIFT_HELD, 0x06)),
                MacroStep::Tap(Key::from_code(0x07)),
                MacroStep::Tap(Key::from_code(0x09)),
            ]
        );
        assert_eq!(skip_sequence(&mut store, 1, SequenceEncoding::Compact), Some(4));
        assert_eq!(skip_sequence(&mut store, 5, SequenceEncoding::Explicit), Some(11));
    }

    #[test]
    fn test_unterminated_sequence_stops_at_boundary() {
        let mut store = store([0x0D, 0x04, 0x05]);
        let mut steps = MacroSteps::new(&mut store, 0);
        assert_eq!(steps.next(), Some(MacroStep::Tap(Key::from_code(0x04))));
        assert_eq!(steps.next(), Some(MacroStep::Tap(Key::from_code(0x05))));
        assert_eq!(steps.next(), None);
        assert_eq!(steps.cursor(), 3);
        assert_eq!(steps.next(), None);
        assert_eq!(skip_sequence(&mut store, 1, SequenceEncoding::Compact), None);
    }
}
