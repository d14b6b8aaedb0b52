use embedded_storage::ReadStorage;
use heapless::Vec;

use crate::MAX_MACROS;
use crate::decoder::{decode_step, skip_sequence};
use crate::storage::MacroStore;
use crate::types::step::MacroStep;

/// Map from macro id to the offset of its first step.
///
/// The directory is a cache derived from the macro storage, which stays the
/// source of truth. It must be rebuilt whenever the storage changes.
#[derive(Debug, Default)]
pub struct MacroDirectory {
    /// Start offsets, indexed by macro id
    offsets: Vec<u16, MAX_MACROS>,
}

impl MacroDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the whole macro storage and record where each macro starts.
    ///
    /// Macros are stored back to back in id order, each one closed by an END
    /// step. The scan stops at the end of the region, when all ids are
    /// assigned, or at an END right after another END: an empty macro
    /// following a macro marks the end of the list, which keeps zeroed free
    /// space from turning into a run of empty macros.
    ///
    /// A last macro cut off by the end of the region is still recorded if it
    /// holds at least one known step; playing it stops at the boundary.
    pub fn rebuild<S: ReadStorage>(&mut self, store: &mut MacroStore<S>) {
        self.offsets.clear();

        let mut start = 0u16;
        let mut cursor = 0u16;
        let mut previous_ended = false;
        // Known steps seen since the last END
        let mut pending = false;
        while cursor < store.size() && !self.offsets.is_full() {
            let Some((step, mut next)) = decode_step(store, cursor) else {
                debug!("Macro scan stopped at truncated step at {}", cursor);
                break;
            };
            match step {
                MacroStep::End => {
                    if previous_ended {
                        break;
                    }
                    // Can't fail, the loop condition checks for a free slot
                    let _ = self.offsets.push(start);
                    start = next;
                    previous_ended = true;
                    pending = false;
                }
                MacroStep::TapSequence(encoding) => {
                    previous_ended = false;
                    pending = true;
                    let Some(after) = skip_sequence(store, next, encoding) else {
                        debug!("Macro scan stopped at unterminated tap sequence at {}", cursor);
                        break;
                    };
                    next = after;
                }
                // Unknown bytes are skipped one at a time
                MacroStep::Unknown(_) => (),
                _ => {
                    previous_ended = false;
                    pending = true;
                }
            }
            cursor = next;
        }

        if pending && !self.offsets.is_full() {
            debug!("Last macro at {} runs to the end of the macro storage", start);
            let _ = self.offsets.push(start);
        }

        info!("Macro directory rebuilt, {} macros found", self.offsets.len());
    }

    /// Offset of the first step of macro `id`, `None` if there's no such macro.
    pub fn offset_for(&self, id: u8) -> Option<u16> {
        self.offsets.get(id as usize).copied()
    }

    /// Number of macros found by the last rebuild
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}
