//! Console output formatters for turns and rosters

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use playpen_application::{ActOutput, Agent, Roster};
use serde_json::{Value, json};

/// Turn colored output off (e.g. `--no-color`); otherwise `colored`
/// decides from the terminal and `NO_COLOR`.
pub fn disable_color() {
    colored::control::set_override(false);
}

/// Human-readable, colored output
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    pub fn turn(agent: &str, output: &ActOutput) -> String {
        format!("{} {}", format!("{agent}:").yellow().bold(), output.text)
    }

    pub fn roster(roster: &Roster) -> String {
        let mut out = Self::section_header(&format!("Roster ({} slots)", roster.len()));
        for (slot, agent) in roster.agents().iter().enumerate() {
            let config = agent.generation_config();
            let model = agent
                .engine()
                .map(|e| format!("{} (context {})", e.model_name(), e.context_size()))
                .unwrap_or_else(|| "shut down".to_string());
            out.push_str(&format!(
                "  {} {} {} {}\n",
                format!("[{slot}]").cyan(),
                agent.name().bold(),
                model.dimmed(),
                format!(
                    "temperature={} max_new_tokens={}",
                    config.temperature(),
                    config.max_new_tokens()
                )
                .dimmed()
            ));
            if let Some(origin) = shared_with(roster.agents(), slot) {
                out.push_str(&format!(
                    "      {}\n",
                    format!("duplicate of slot {origin}").yellow()
                ));
            }
        }
        out
    }

    pub fn error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_turn(&self, agent: &str, output: &ActOutput) -> String {
        Self::turn(agent, output)
    }

    fn format_roster(&self, roster: &Roster) -> String {
        Self::roster(roster)
    }
}

/// One JSON object per line, for piping into other tools
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn turn_value(agent: &str, output: &ActOutput) -> Value {
        json!({
            "agent": agent,
            "prompt": output.prompt,
            "raw_response": output.raw_response,
            "text": output.text,
        })
    }

    pub fn roster_value(roster: &Roster) -> Value {
        let slots: Vec<Value> = roster
            .agents()
            .iter()
            .enumerate()
            .map(|(slot, agent)| {
                json!({
                    "slot": slot,
                    "name": agent.name(),
                    "model_name": agent.engine().map(|e| e.model_name()),
                    "context_size": agent.engine().map(|e| e.context_size()),
                    "generation": agent.generation_config(),
                    "duplicate_of": shared_with(roster.agents(), slot),
                })
            })
            .collect();
        json!({ "players": roster.len(), "agents": slots })
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_turn(&self, agent: &str, output: &ActOutput) -> String {
        Self::turn_value(agent, output).to_string()
    }

    fn format_roster(&self, roster: &Roster) -> String {
        Self::roster_value(roster).to_string()
    }
}

/// First earlier slot whose agent drives the same engine as `slot`.
fn shared_with(agents: &[Agent], slot: usize) -> Option<usize> {
    let agent = &agents[slot];
    agents[..slot]
        .iter()
        .position(|other| other.shares_engine_with(agent))
}
