use std::cell::RefCell;
use std::rc::Rc;

use dynamic_macros::DynamicMacros;
use dynamic_macros::config::{DynamicMacrosConfig, MacroKeyRange, MacroStorageConfig, RandomIntervalConfig};
use dynamic_macros::event::{KeyAction, KeyEvent, KeyPos};
use dynamic_macros::focus;
use dynamic_macros::host::{EventResult, MacroHost, MacroPlugin};
use dynamic_macros::storage::RamStorage;
use dynamic_macros::types::key::Key;
use dynamic_macros::types::step::MacroStep;
use embedded_hal::delay::DelayNs;
use embedded_storage::{ReadStorage, Storage};
use rand_core::{RngCore, impls};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const KC_A: u8 = 0x04;
pub const KC_B: u8 = 0x05;
pub const KC_C: u8 = 0x06;

pub type TestMacros<const N: usize> = DynamicMacros<RamStorage<N>, RecordingDelay, SequenceRng>;

/// Host that records everything the engine hands to it
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub actions: Vec<KeyAction>,
    pub masked: Vec<KeyPos>,
}

impl MacroHost for RecordingHost {
    fn inject(&mut self, action: KeyAction) {
        self.actions.push(action);
    }

    fn mask_key(&mut self, pos: KeyPos) {
        self.masked.push(pos);
    }
}

impl RecordingHost {
    pub fn take_actions(&mut self) -> Vec<KeyAction> {
        std::mem::take(&mut self.actions)
    }
}

/// Delay that doesn't sleep but records every requested delay in ms
#[derive(Clone, Default)]
pub struct RecordingDelay {
    pub delays: Rc<RefCell<Vec<u32>>>,
}

impl RecordingDelay {
    pub fn take(&self) -> Vec<u32> {
        std::mem::take(&mut *self.delays.borrow_mut())
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.delays.borrow_mut().push(ns / 1_000_000);
    }

    fn delay_us(&mut self, us: u32) {
        self.delays.borrow_mut().push(us / 1_000);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.borrow_mut().push(ms);
    }
}

/// Rng that returns the given values in a loop
pub struct SequenceRng {
    values: Vec<u32>,
    index: usize,
}

impl SequenceRng {
    pub fn new(values: &[u32]) -> Self {
        Self {
            values: values.to_vec(),
            index: 0,
        }
    }
}

impl RngCore for SequenceRng {
    fn next_u32(&mut self) -> u32 {
        if self.values.is_empty() {
            return 0;
        }
        let value = self.values[self.index % self.values.len()];
        self.index += 1;
        value
    }

    fn next_u64(&mut self) -> u64 {
        impls::next_u64_via_u32(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// Error of [`FaultyStorage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverFault;

/// Storage whose driver fails every access starting at or after a given address
pub struct FaultyStorage<const N: usize> {
    inner: RamStorage<N>,
    read_limit: u32,
    write_limit: u32,
}

impl<const N: usize> FaultyStorage<N> {
    pub fn new(bytes: [u8; N], read_limit: u32, write_limit: u32) -> Self {
        Self {
            inner: RamStorage::from_bytes(bytes),
            read_limit,
            write_limit,
        }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        self.inner.as_bytes()
    }
}

impl<const N: usize> ReadStorage for FaultyStorage<N> {
    type Error = DriverFault;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        if offset >= self.read_limit {
            return Err(DriverFault);
        }
        self.inner.read(offset, bytes).map_err(|_| DriverFault)
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for FaultyStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if offset >= self.write_limit {
            return Err(DriverFault);
        }
        self.inner.write(offset, bytes).map_err(|_| DriverFault)
    }
}

pub type FaultyMacros<const N: usize> = DynamicMacros<FaultyStorage<N>, RecordingDelay, SequenceRng>;

pub fn create_faulty_macros<const N: usize>(storage: FaultyStorage<N>) -> FaultyMacros<N> {
    let config = DynamicMacrosConfig {
        storage: MacroStorageConfig { base: 0, size: N as u16 },
        ..Default::default()
    };
    DynamicMacros::new(storage, config, RecordingDelay::default(), SequenceRng::new(&[])).unwrap()
}

/// Encode the macros back to back, each closed by an END, and leave the rest erased.
pub fn macro_map<const N: usize>(macros: &[&[MacroStep]]) -> [u8; N] {
    let mut bytes = Vec::new();
    for steps in macros {
        for step in steps.iter().chain(&[MacroStep::End]) {
            bytes.extend_from_slice(&step.encode());
        }
    }
    erased_with(&bytes)
}

/// The given bytes followed by erased storage
pub fn erased_with<const N: usize>(bytes: &[u8]) -> [u8; N] {
    assert!(bytes.len() <= N, "{} bytes don't fit in {}", bytes.len(), N);
    let mut map = [0xFF; N];
    map[..bytes.len()].copy_from_slice(bytes);
    map
}

pub fn create_macros_with_interval<const N: usize>(
    map: [u8; N],
    random_interval: RandomIntervalConfig,
    rng: SequenceRng,
) -> (TestMacros<N>, RecordingDelay) {
    let config = DynamicMacrosConfig {
        storage: MacroStorageConfig { base: 0, size: N as u16 },
        random_interval,
        ..Default::default()
    };
    let delay = RecordingDelay::default();
    let macros = DynamicMacros::new(RamStorage::from_bytes(map), config, delay.clone(), rng).unwrap();
    (macros, delay)
}

pub fn create_macros<const N: usize>(map: [u8; N]) -> (TestMacros<N>, RecordingDelay) {
    create_macros_with_interval(map, RandomIntervalConfig::default(), SequenceRng::new(&[]))
}

/// The key that plays macro `id`
pub fn dm(id: u8) -> Key {
    MacroKeyRange::default().key(id)
}

pub fn press(row: u8, col: u8, key: Key) -> KeyEvent {
    KeyEvent::new(KeyPos::new(row, col), key, true)
}

pub fn release(row: u8, col: u8, key: Key) -> KeyEvent {
    KeyEvent::new(KeyPos::new(row, col), key, false)
}

/// The actions of tapping each key
pub fn taps(codes: &[u8]) -> Vec<KeyAction> {
    codes
        .iter()
        .flat_map(|&code| {
            let key = Key::from_code(code);
            [KeyAction::Press(key), KeyAction::Release(key)]
        })
        .collect()
}

/// Send one line over the configuration channel, returns the reply
pub fn send_line<P: MacroPlugin<RecordingHost>>(macros: &mut P, line: &str, host: &mut RecordingHost) -> (EventResult, String) {
    let mut reply = String::new();
    let result = focus::process_line(macros, line, host, &mut reply).unwrap();
    (result, reply)
}
