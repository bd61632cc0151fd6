//! REPL (Read-Eval-Print Loop) for chatting with one agent

use crate::output::console::ConsoleFormatter;
use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use playpen_application::{Agent, AgentError};
use playpen_domain::Message;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::io;
use std::path::PathBuf;
use tracing::warn;

const HISTORY_CAPACITY: usize = 1000;

/// What the REPL should do with one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Empty,
    Quit,
    Help,
    History,
    Unknown(String),
    Say(String),
}

impl ReplInput {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return ReplInput::Empty;
        }
        if !line.starts_with('/') {
            return ReplInput::Say(line.to_string());
        }
        match line {
            "/quit" | "/exit" | "/q" => ReplInput::Quit,
            "/help" | "/h" | "/?" => ReplInput::Help,
            "/history" => ReplInput::History,
            other => ReplInput::Unknown(other.to_string()),
        }
    }
}

/// Interactive chat REPL
///
/// Every user line is observed as a user message; the agent's reply is
/// printed and observed back as an assistant message so the next turn sees
/// the whole dialogue. A refused turn (context exhausted) is reported and
/// leaves memory unchanged.
pub struct ChatRepl {
    agent: Agent,
    formatter: Box<dyn OutputFormatter>,
    history_file: Option<PathBuf>,
}

impl ChatRepl {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            formatter: Box::new(ConsoleFormatter),
            history_file: None,
        }
    }

    pub fn with_formatter(mut self, formatter: Box<dyn OutputFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }

    /// Run until `/quit` or Ctrl-D, then shut the agent down.
    pub fn run(mut self) -> io::Result<()> {
        let mut line_editor = Reedline::create();
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone()) {
                Ok(history) => line_editor = line_editor.with_history(Box::new(history)),
                Err(e) => warn!("Could not open history file {}: {}", path.display(), e),
            }
        }
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic(format!("{} ", self.agent.name())),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match line_editor.read_line(&prompt)? {
                Signal::Success(line) => match ReplInput::parse(&line) {
                    ReplInput::Empty => continue,
                    ReplInput::Quit => {
                        println!("Bye!");
                        break;
                    }
                    ReplInput::Help => Self::print_help(),
                    ReplInput::History => self.print_history(),
                    ReplInput::Unknown(cmd) => {
                        println!("Unknown command: {}", cmd);
                        println!("Type /help for available commands");
                    }
                    ReplInput::Say(text) => self.turn(text),
                },
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
                #[allow(unreachable_patterns)]
                _ => break,
            }
        }

        if let Err(e) = self.agent.shutdown() {
            warn!("{}", e);
        }
        Ok(())
    }

    fn turn(&mut self, text: String) {
        if let Err(e) = self.agent.observe(Message::user(text)) {
            eprintln!("{}", ConsoleFormatter::error(&e.to_string()));
            return;
        }
        match self.agent.act() {
            Ok(output) => {
                println!("{}", self.formatter.format_turn(self.agent.name(), &output));
                if let Err(e) = self.agent.observe(Message::assistant(output.text)) {
                    eprintln!("{}", ConsoleFormatter::error(&e.to_string()));
                }
            }
            Err(e @ AgentError::ContextExceeded(_)) => {
                eprintln!("{}", ConsoleFormatter::error(&e.to_string()));
                eprintln!(
                    "{}",
                    "The conversation no longer fits the model context; start a new chat."
                        .yellow()
                );
            }
            Err(e) => eprintln!("{}", ConsoleFormatter::error(&e.to_string())),
        }
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Playpen - Chat Mode".cyan().bold());
        if let Some(engine) = self.agent.engine() {
            println!(
                "{} {} (context {})",
                "Model:".dimmed(),
                engine.model_name(),
                engine.context_size()
            );
        }
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  {}         - Show this help", "/help".cyan());
        println!("  {}      - Show observed messages", "/history".cyan());
        println!("  {}         - Exit chat", "/quit".cyan());
        println!();
    }

    fn print_history(&self) {
        println!();
        for message in self.agent.memory() {
            println!(
                "{}\n{}",
                format!("[{}]", message.role).dimmed(),
                ConsoleFormatter::indent(&message.content, "  ")
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(ReplInput::parse("   "), ReplInput::Empty);
        assert_eq!(ReplInput::parse("/q"), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/exit"), ReplInput::Quit);
        assert_eq!(ReplInput::parse("/?"), ReplInput::Help);
        assert_eq!(ReplInput::parse("/history"), ReplInput::History);
        assert_eq!(
            ReplInput::parse("/reset"),
            ReplInput::Unknown("/reset".to_string())
        );
        assert_eq!(
            ReplInput::parse("  guess: apple "),
            ReplInput::Say("guess: apple".to_string())
        );
    }
}
