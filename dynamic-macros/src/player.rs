//! Macro playback.
//!
//! Playback is synchronous: [`MacroPlayer::play`] returns only after the
//! macro's last step, including every wait and delay. The injected key
//! events must reach the host before it finalizes the current report, so the
//! whole keyboard blocks while a macro plays.

use embedded_hal::delay::DelayNs;
use embedded_storage::ReadStorage;
use rand_core::RngCore;

use crate::config::RandomIntervalConfig;
use crate::decoder::MacroSteps;
use crate::directory::MacroDirectory;
use crate::event::KeyAction;
use crate::host::MacroHost;
use crate::storage::MacroStore;
use crate::types::key::Key;
use crate::types::step::MacroStep;

/// Plays macros, owning the delay provider and the random source used for jitter.
pub struct MacroPlayer<D, R> {
    delay: D,
    rng: R,
    random_interval: RandomIntervalConfig,
}

impl<D: DelayNs, R: RngCore> MacroPlayer<D, R> {
    pub fn new(delay: D, rng: R, random_interval: RandomIntervalConfig) -> Self {
        Self {
            delay,
            rng,
            random_interval,
        }
    }

    pub fn random_interval(&self) -> &RandomIntervalConfig {
        &self.random_interval
    }

    pub fn random_interval_mut(&mut self) -> &mut RandomIntervalConfig {
        &mut self.random_interval
    }

    /// Play macro `id` to the end.
    ///
    /// An id without a macro is an empty macro, nothing happens.
    pub fn play<S: ReadStorage, H: MacroHost>(
        &mut self,
        store: &mut MacroStore<S>,
        directory: &MacroDirectory,
        id: u8,
        host: &mut H,
    ) {
        let Some(offset) = directory.offset_for(id) else {
            debug!("Macro {} is not defined", id);
            return;
        };
        debug!("Playing macro {} from offset {}", id, offset);

        // The interval set by INTERVAL steps only lasts for one playback
        let mut interval = 0u32;
        for step in MacroSteps::new(store, offset) {
            match step {
                MacroStep::Interval(ms) => interval = ms as u32,
                MacroStep::Wait(ms) => self.pause(ms as u32),
                MacroStep::KeyDown(key) => self.press(key, interval, host),
                MacroStep::KeyUp(key) => self.release(key, interval, host),
                MacroStep::Tap(key) => {
                    self.press(key, interval, host);
                    self.release(key, interval, host);
                }
                MacroStep::Report => (),
                // Already handled by the step iterator
                MacroStep::End | MacroStep::TapSequence(_) | MacroStep::Unknown(_) => (),
            }
        }
    }

    fn press<H: MacroHost>(&mut self, key: Key, interval: u32, host: &mut H) {
        self.before_transition(interval);
        trace!("Macro press {:?}", key);
        host.inject(KeyAction::Press(key));
    }

    fn release<H: MacroHost>(&mut self, key: Key, interval: u32, host: &mut H) {
        self.before_transition(interval);
        trace!("Macro release {:?}", key);
        host.inject(KeyAction::Release(key));
    }

    /// Wait the step interval plus the random interval
    fn before_transition(&mut self, interval: u32) {
        let jitter = self.jitter();
        self.pause(interval.saturating_add(jitter));
    }

    fn jitter(&mut self) -> u32 {
        match self.random_interval.range_ms() {
            (min, Some(max)) => {
                let span = (max - min) as u64 + 1;
                min + (self.rng.next_u32() as u64 % span) as u32
            }
            (fixed, None) => fixed,
        }
    }

    fn pause(&mut self, ms: u32) {
        if ms > 0 {
            self.delay.delay_ms(ms);
        }
    }
}
