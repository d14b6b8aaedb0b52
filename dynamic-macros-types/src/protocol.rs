//! Configuration channel protocol.
//!
//! The configuration channel is line oriented: a request is a command name
//! optionally followed by space separated arguments. A reply is zero or more
//! lines followed by a line containing a single `.`.

use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Name reported for the `plugins` query.
pub const PLUGIN_NAME: &str = "DynamicMacros";

/// Line terminator used in replies.
pub const LINE_END: &str = "\r\n";

/// Line that marks the end of a reply.
pub const REPLY_END: &str = ".";

/// Lists the commands of every plugin.
pub const HELP_COMMAND: &str = "help";

/// Lists the names of every plugin.
pub const PLUGINS_COMMAND: &str = "plugins";

/// Commands served by the dynamic macro engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, EnumString, IntoStaticStr, EnumIter)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MacroCommand {
    /// Read or replace the whole macro storage
    #[strum(serialize = "macros.map")]
    Map,
    /// Play a macro by id
    #[strum(serialize = "macros.trigger")]
    Trigger,
    /// Lower bound of the random delay before each key transition, in ms
    #[strum(serialize = "macros.interval.min")]
    MinInterval,
    /// Upper bound of the random delay before each key transition, in ms
    #[strum(serialize = "macros.interval.max")]
    MaxInterval,
}

impl MacroCommand {
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Every command, in the order `help` lists them
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}
