//! Output formatter trait

use crate::cli::commands::OutputFormat;
use crate::output::console::{ConsoleFormatter, JsonFormatter};
use playpen_application::{ActOutput, Roster};

/// Formats turn results and rosters for the terminal
pub trait OutputFormatter {
    /// Format one agent turn
    fn format_turn(&self, agent: &str, output: &ActOutput) -> String;

    /// Format the roster built for a game
    fn format_roster(&self, roster: &Roster) -> String;
}

pub fn formatter_for(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::Text => Box::new(ConsoleFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}
