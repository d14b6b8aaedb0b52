//! Interface between the macro engine and the keyboard firmware that hosts it.

use core::fmt::Write;

use crate::event::{KeyAction, KeyEvent, KeyPos};

/// What a handler did with an event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventResult {
    /// Not handled, pass the event on
    Ok,
    /// Handled, the host must not process the event any further
    Consumed,
}

/// Services the keyboard firmware provides to the macro engine.
pub trait MacroHost {
    /// Feed a key transition into the keyboard's event pipeline, as if it
    /// came from a physical key.
    fn inject(&mut self, action: KeyAction);

    /// Exclude the physical key at `pos` from repeat and recording handling
    /// in the report being assembled.
    fn mask_key(&mut self, pos: KeyPos);
}

/// Event hooks the keyboard firmware calls into.
///
/// All hooks run on the keyboard's main loop and may block while a macro plays.
pub trait MacroPlugin<H: MacroHost> {
    /// Name reported to the configuration channel's `plugins` query
    fn name(&self) -> &'static str;

    /// Called for every physical key transition
    fn on_key_event(&mut self, event: &KeyEvent, host: &mut H) -> EventResult;

    /// Called once per scan cycle, before the report is finalized
    fn before_report(&mut self, host: &mut H) -> EventResult;

    /// Called for every request received on the configuration channel.
    ///
    /// `command` is the first word of the request, `args` the remainder of
    /// the line. A consumed request has its reply body written to `out`; the
    /// framing is left to the caller, see [`crate::focus::process_line`].
    fn on_config_command<W: Write>(
        &mut self,
        command: &str,
        args: &str,
        host: &mut H,
        out: &mut W,
    ) -> Result<EventResult, core::fmt::Error>;
}
