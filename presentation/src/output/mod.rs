//! Output formatting for turns and rosters

pub mod console;
pub mod formatter;
