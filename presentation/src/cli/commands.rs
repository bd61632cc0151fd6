//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for turn results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    Text,
    /// One JSON object per result (prompt, raw response, cleaned text)
    Json,
}

/// CLI arguments for playpen
#[derive(Parser, Debug)]
#[command(name = "playpen")]
#[command(author, version, about = "Run language-model agents through turn-based games")]
#[command(long_about = r#"
Playpen builds agents from comma-separated key=value specifications and drives
them turn by turn: each agent observes messages, then acts by generating a
continuation from everything it has seen.

Agent specification keys (--agent_kwargs):
  model_name (required), name, backend, context_size, chat_template,
  eos_to_cull, output_split_prefix, log_messages, endpoint, timeout_secs

Generation keys (--gen_kwargs):
  temperature (0.0 = greedy), max_new_tokens, return_full_text, seed

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. PLAYPEN_* environment variables
3. ./playpen.toml      Project-level config
4. ~/.config/playpen/config.toml   Global config

Example:
  playpen --agent_kwargs model_name=Qwen/Qwen2-7B-Instruct ask "Name a color."
  playpen --agent_kwargs model_name=meta-llama/Meta-Llama-3-8B-Instruct chat
  playpen --agent_kwargs model_name=org/m --gen_kwargs temperature=0.7,seed=3 self-play --turns 6 "Let's play"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Agent specification (repeat for multiple agents)
    #[arg(long = "agent_kwargs", visible_alias = "agent-kwargs", value_name = "SPEC", global = true)]
    pub agent_kwargs: Vec<String>,

    /// Generation specification shared by every agent
    #[arg(long = "gen_kwargs", visible_alias = "gen-kwargs", value_name = "SPEC", global = true)]
    pub gen_kwargs: Option<String>,

    /// Record raw and normalized messages in the transcript
    #[arg(long, global = true)]
    pub log_messages: bool,

    /// Directory for JSONL conversation transcripts
    #[arg(long, value_name = "DIR", global = true)]
    pub transcript_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Single turn: observe the prompt, act once, print the result
    Ask {
        /// User message
        prompt: String,

        /// System message observed before the prompt
        #[arg(long, value_name = "TEXT")]
        system: Option<String>,
    },

    /// Interactive chat with one agent
    Chat {
        /// System message observed before the first turn
        #[arg(long, value_name = "TEXT")]
        system: Option<String>,
    },

    /// Two agents take turns answering each other
    SelfPlay {
        /// Message that opens the dialogue (observed by the first agent)
        opening: String,

        /// Number of turns to play in total
        #[arg(long, default_value_t = 4)]
        turns: usize,

        /// System message observed by both agents
        #[arg(long, value_name = "TEXT")]
        system: Option<String>,
    },

    /// Build the roster for a game and describe it
    Roster {
        /// Player slots the game requires
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=2))]
        players: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_ask_with_kwargs() {
        let cli = Cli::try_parse_from([
            "playpen",
            "--agent_kwargs",
            "model_name=org/m",
            "--gen_kwargs",
            "temperature=0.0,max_new_tokens=20",
            "ask",
            "hello",
        ])
        .unwrap();
        assert_eq!(cli.agent_kwargs, vec!["model_name=org/m"]);
        assert_eq!(
            cli.gen_kwargs.as_deref(),
            Some("temperature=0.0,max_new_tokens=20")
        );
        assert_eq!(
            cli.command,
            Some(Command::Ask {
                prompt: "hello".to_string(),
                system: None
            })
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "playpen",
            "self-play",
            "Let's play",
            "--turns",
            "6",
            "--agent-kwargs",
            "model_name=a",
            "--agent-kwargs",
            "model_name=b",
            "-vv",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.agent_kwargs.len(), 2);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(matches!(cli.command, Some(Command::SelfPlay { turns: 6, .. })));
    }

    #[test]
    fn test_roster_default_players() {
        let cli = Cli::try_parse_from(["playpen", "roster"]).unwrap();
        assert_eq!(cli.command, Some(Command::Roster { players: 2 }));
    }

    #[test]
    fn test_roster_players_out_of_range() {
        assert!(Cli::try_parse_from(["playpen", "roster", "--players", "3"]).is_err());
        assert!(Cli::try_parse_from(["playpen", "roster", "--players", "0"]).is_err());
    }
}
