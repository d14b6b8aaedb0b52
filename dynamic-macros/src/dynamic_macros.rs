use core::fmt::Write;
use core::str::FromStr;

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_storage::{ReadStorage, Storage};
use heapless::Vec;
use rand_core::RngCore;

use crate::config::{DynamicMacrosConfig, MacroKeyRange};
use crate::directory::MacroDirectory;
use crate::error::MacroError;
use crate::event::{KeyEvent, KeyPos};
use crate::focus::{self, ReplyError};
use crate::host::{EventResult, MacroHost, MacroPlugin};
use crate::player::MacroPlayer;
use crate::storage::MacroStore;
use crate::tracker::{ActiveMacroKeys, Claim};
use crate::types::protocol::{HELP_COMMAND, LINE_END, MacroCommand, PLUGIN_NAME, PLUGINS_COMMAND};

/// Bytes moved per storage access when reading or writing the whole map
const MAP_CHUNK_SIZE: usize = 32;

/// The dynamic macro engine.
///
/// Owns the macro storage, the directory derived from it, the player and the
/// set of held macro keys. Create it with [`DynamicMacros::new`] and drive it
/// through [`MacroPlugin`].
pub struct DynamicMacros<S, D, R> {
    store: MacroStore<S>,
    directory: MacroDirectory,
    player: MacroPlayer<D, R>,
    active: ActiveMacroKeys,
    key_range: MacroKeyRange,
}

impl<S: ReadStorage, D: DelayNs, R: RngCore> DynamicMacros<S, D, R> {
    /// Reserve the macro region and scan it.
    pub fn new(storage: S, config: DynamicMacrosConfig, delay: D, rng: R) -> Result<Self, MacroError> {
        let store = MacroStore::reserve(storage, &config.storage)?;
        let mut macros = Self {
            store,
            directory: MacroDirectory::new(),
            player: MacroPlayer::new(delay, rng, config.random_interval),
            active: ActiveMacroKeys::new(),
            key_range: config.key_range,
        };
        macros.rebuild();
        Ok(macros)
    }

    /// Rescan the storage, call it after the storage was changed behind the engine's back.
    pub fn rebuild(&mut self) {
        self.directory.rebuild(&mut self.store);
    }

    /// Play macro `id` now. Unknown ids are ignored.
    pub fn play<H: MacroHost>(&mut self, id: u8, host: &mut H) {
        self.player.play(&mut self.store, &self.directory, id, host);
    }

    pub fn directory(&self) -> &MacroDirectory {
        &self.directory
    }

    pub fn key_range(&self) -> &MacroKeyRange {
        &self.key_range
    }

    /// Whether the macro key at `pos` is held
    pub fn is_active(&self, pos: KeyPos) -> bool {
        self.active.is_active(pos)
    }

    pub fn min_interval(&self) -> Duration {
        self.player.random_interval().min
    }

    pub fn max_interval(&self) -> Duration {
        self.player.random_interval().max
    }

    pub fn set_min_interval(&mut self, min: Duration) {
        self.player.random_interval_mut().min = min;
    }

    pub fn set_max_interval(&mut self, max: Duration) {
        self.player.random_interval_mut().max = max;
    }

    /// Give the storage driver back.
    pub fn into_storage(self) -> S {
        self.store.into_inner()
    }

    /// Write the whole region as one line of decimal bytes.
    fn read_map<W: Write>(&mut self, out: &mut W) -> Result<(), ReplyError> {
        let size = self.store.size();
        let mut buf = [0u8; MAP_CHUNK_SIZE];
        let mut offset = 0u16;
        while offset < size {
            let len = (size - offset).min(MAP_CHUNK_SIZE as u16);
            let chunk = &mut buf[..len as usize];
            if let Err(e) = self.store.read(offset, chunk) {
                out.write_str(LINE_END)?;
                return Err(e.into());
            }
            for (i, byte) in chunk.iter().enumerate() {
                if offset > 0 || i > 0 {
                    out.write_char(' ')?;
                }
                write!(out, "{}", byte)?;
            }
            offset += len;
        }
        out.write_str(LINE_END)?;
        Ok(())
    }

    fn write_interval<W: Write>(out: &mut W, interval: Duration) -> Result<(), ReplyError> {
        write!(out, "{}{}", interval.as_millis(), LINE_END)?;
        Ok(())
    }

    fn parse_interval(args: &str) -> Result<Option<Duration>, MacroError> {
        let ms = focus::parse_first_arg::<u16>(args)?;
        Ok(ms.map(|ms| Duration::from_millis(ms as u64)))
    }
}

impl<S: Storage, D: DelayNs, R: RngCore> DynamicMacros<S, D, R> {
    /// Replace the whole macro region.
    ///
    /// `args` must hold exactly one decimal byte for every byte of the region.
    /// Nothing is written unless all of them are valid.
    fn write_map(&mut self, args: &str) -> Result<(), MacroError> {
        let mut count = 0usize;
        for (index, token) in args.split_ascii_whitespace().enumerate() {
            focus::parse_arg::<u8>(token, index)?;
            count += 1;
        }
        if count != self.store.size() as usize {
            warn!("Rejected macro map of {} bytes, expected {}", count, self.store.size());
            return Err(MacroError::SizeMismatch {
                expected: self.store.size(),
                actual: count,
            });
        }

        let written = self.write_validated(args);
        // Even a failed write may have changed part of the region
        self.rebuild();
        written
    }

    fn write_validated(&mut self, args: &str) -> Result<(), MacroError> {
        let mut chunk: Vec<u8, MAP_CHUNK_SIZE> = Vec::new();
        let mut offset = 0u16;
        for (index, token) in args.split_ascii_whitespace().enumerate() {
            let byte = focus::parse_arg::<u8>(token, index)?;
            if chunk.push(byte).is_err() {
                self.store.write(offset, &chunk)?;
                offset += chunk.len() as u16;
                chunk.clear();
                // The chunk was just emptied
                let _ = chunk.push(byte);
            }
        }
        if !chunk.is_empty() {
            self.store.write(offset, &chunk)?;
        }
        info!("Macro map updated");
        Ok(())
    }

    fn run_command<W: Write, H: MacroHost>(
        &mut self,
        command: MacroCommand,
        args: &str,
        host: &mut H,
        out: &mut W,
    ) -> Result<(), ReplyError> {
        match command {
            MacroCommand::Map => {
                if args.trim().is_empty() {
                    self.read_map(out)
                } else {
                    Ok(self.write_map(args)?)
                }
            }
            MacroCommand::Trigger => {
                let id = focus::parse_first_arg::<u8>(args)?.ok_or(MacroError::MissingArgument)?;
                self.play(id, host);
                Ok(())
            }
            MacroCommand::MinInterval => match Self::parse_interval(args)? {
                Some(min) => {
                    self.set_min_interval(min);
                    Ok(())
                }
                None => Self::write_interval(out, self.min_interval()),
            },
            MacroCommand::MaxInterval => match Self::parse_interval(args)? {
                Some(max) => {
                    self.set_max_interval(max);
                    Ok(())
                }
                None => Self::write_interval(out, self.max_interval()),
            },
        }
    }
}

impl<S: Storage, D: DelayNs, R: RngCore, H: MacroHost> MacroPlugin<H> for DynamicMacros<S, D, R> {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn on_key_event(&mut self, event: &KeyEvent, host: &mut H) -> EventResult {
        let Some(id) = self.key_range.macro_id(event.key) else {
            return EventResult::Ok;
        };

        if event.pressed {
            match self.active.claim(event.pos) {
                Claim::Claimed => self.play(id, host),
                Claim::AlreadyActive => debug!("Macro key {:?} is already held", event.pos),
                Claim::Full => debug!("Too many macro keys held, dropping macro {}", id),
            }
        } else {
            self.active.release(event.pos);
        }
        EventResult::Consumed
    }

    fn before_report(&mut self, host: &mut H) -> EventResult {
        for pos in self.active.iter() {
            host.mask_key(pos);
        }
        EventResult::Ok
    }

    fn on_config_command<W: Write>(
        &mut self,
        command: &str,
        args: &str,
        host: &mut H,
        out: &mut W,
    ) -> Result<EventResult, core::fmt::Error> {
        let Ok(macro_command) = MacroCommand::from_str(command) else {
            match command {
                HELP_COMMAND => {
                    for command in MacroCommand::all() {
                        write!(out, "{}{}", command.name(), LINE_END)?;
                    }
                }
                PLUGINS_COMMAND => write!(out, "{}{}", PLUGIN_NAME, LINE_END)?,
                _ => (),
            }
            return Ok(EventResult::Ok);
        };

        match self.run_command(macro_command, args, host, out) {
            Ok(()) => (),
            Err(ReplyError::Command(e)) => {
                warn!("{} failed: {:?}", macro_command.name(), e);
                focus::write_error(out, &e)?;
            }
            Err(ReplyError::Write(e)) => return Err(e),
        }
        Ok(EventResult::Consumed)
    }
}
