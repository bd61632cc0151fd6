//! CLI entrypoint for playpen
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use playpen_application::{
    ConversationLogger, FixedPlayers, NoConversationLogger, RosterBuilder, SelfPlay,
};
use playpen_domain::{KwargSpec, Message};
use playpen_infrastructure::{
    BackendRegistry, ConfigLoader, FileConfig, FileOutputFormat, JsonlConversationLogger, Severity,
};
use playpen_presentation::{ChatRepl, Cli, Command, OutputFormat, disable_color, formatter_for};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::config_sources(cli.config.as_deref()) {
            println!("{line}");
        }
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {e}"))?
    };

    let _log_guard = init_logging(cli.verbose, config.log_file().as_deref())?;
    info!("Starting playpen");

    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            Severity::Warning => warn!("config {}", issue),
            Severity::Error => error!("config {}", issue),
        }
    }
    if FileConfig::has_errors(&issues) {
        bail!("Invalid configuration; see errors above");
    }

    if cli.no_color || !config.output.color {
        disable_color();
    }
    let format = cli.output.unwrap_or(match config.output.format {
        Some(FileOutputFormat::Json) => OutputFormat::Json,
        Some(FileOutputFormat::Text) | None => OutputFormat::Text,
    });
    let formatter = formatter_for(format);

    let Some(command) = cli.command.clone() else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let agent_specs = agent_specs(&cli, &config)?;
    let gen_spec = cli
        .gen_kwargs
        .clone()
        .unwrap_or_else(|| config.generation.spec.clone());

    // === Dependency Injection ===
    let transcript_dir = cli.transcript_dir.clone().or_else(|| config.transcript_dir());
    let conversation_logger: Arc<dyn ConversationLogger> = match transcript_dir
        .and_then(|dir| JsonlConversationLogger::in_dir(dir, command_label(&command)))
    {
        Some(logger) => {
            info!("Writing transcript to {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoConversationLogger),
    };
    let backend = Arc::new(BackendRegistry::from_config(&config.backend));
    let builder = RosterBuilder::new(backend).with_conversation_logger(conversation_logger);

    match command {
        Command::Ask { prompt, system } => {
            let mut roster =
                builder.build(agent_specs.as_slice(), &gen_spec, &FixedPlayers::single())?;
            let agent = roster.get_mut(0).context("roster has no player slot")?;
            if let Some(system) = system {
                agent.observe(Message::system(system))?;
            }
            agent.observe(Message::user(prompt))?;
            let output = agent.act()?;
            println!("{}", formatter.format_turn(agent.name(), &output));
            roster.shutdown();
        }
        Command::Chat { system } => {
            let roster =
                builder.build(agent_specs.as_slice(), &gen_spec, &FixedPlayers::single())?;
            let mut agent = roster
                .into_agents()
                .into_iter()
                .next()
                .context("roster has no player slot")?;
            if let Some(system) = system {
                agent.observe(Message::system(system))?;
            }
            ChatRepl::new(agent)
                .with_formatter(formatter)
                .with_history_file(config.history_file())
                .run()?;
        }
        Command::SelfPlay {
            opening,
            turns,
            system,
        } => {
            let mut roster =
                builder.build(agent_specs.as_slice(), &gen_spec, &FixedPlayers::two())?;
            let mut game = SelfPlay::new(turns);
            if let Some(system) = system {
                game = game.with_system(system);
            }
            let played = game.run(&mut roster, opening, |turn| {
                println!("{}", formatter.format_turn(&turn.agent, &turn.output));
            });
            roster.shutdown();
            played?;
        }
        Command::Roster { players } => {
            let game = if players == 1 {
                FixedPlayers::single()
            } else {
                FixedPlayers::two()
            };
            let mut roster = builder.build(agent_specs.as_slice(), &gen_spec, &game)?;
            println!("{}", formatter.format_roster(&roster));
            roster.shutdown();
        }
    }

    Ok(())
}

/// Agent specs from the command line, else the configured default, with
/// `log_messages=true` added when transcript message logging is requested.
fn agent_specs(cli: &Cli, config: &FileConfig) -> Result<Vec<String>> {
    let raw: Vec<String> = if !cli.agent_kwargs.is_empty() {
        cli.agent_kwargs.clone()
    } else if let Some(spec) = &config.agent.spec {
        vec![spec.clone()]
    } else {
        bail!("No agent specified. Pass --agent_kwargs model_name=<model> or set [agent] spec.");
    };

    if !(cli.log_messages || config.logging.log_messages) {
        return Ok(raw);
    }
    raw.iter()
        .map(|spec| -> Result<String> {
            let mut kwargs = KwargSpec::parse(spec)?;
            if !kwargs.contains_key("log_messages") {
                kwargs.insert("log_messages", "true");
            }
            Ok(kwargs.to_string())
        })
        .collect()
}

fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Ask { .. } => "ask",
        Command::Chat { .. } => "chat",
        Command::SelfPlay { .. } => "self-play",
        Command::Roster { .. } => "roster",
    }
}

/// Console logs go to stderr so `--output json` stays machine-readable.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("log file path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Could not create log directory {}", dir.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
