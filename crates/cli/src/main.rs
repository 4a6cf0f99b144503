//! chatrelay CLI: the main entry point.
//!
//! Commands:
//! - `serve`    Start the HTTP gateway
//! - `chat`     Send one message through a provider and print the reply
//! - `config`   Print the effective configuration (keys redacted)

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use chatrelay_config::AppConfig;
use chatrelay_core::ChatMode;

mod commands;

#[derive(Parser)]
#[command(
    name = "chatrelay",
    about = "chatrelay: one chat endpoint in front of OpenAI, Anthropic and DeepSeek",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the config file (default: ~/.chatrelay/config.toml)
    #[arg(long, global = true, env = "CHATRELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send a single chat message
    Chat {
        /// Provider to use: openai, anthropic or deepseek
        #[arg(short, long)]
        provider: String,

        /// Chat mode (defaults to predefined when a template is given)
        #[arg(short, long, value_enum)]
        mode: Option<ModeArg>,

        /// Template id: coding, storytelling, image
        #[arg(short, long)]
        template: Option<String>,

        /// Project whose knowledge is used
        #[arg(long, default_value = "default")]
        project: String,

        /// Skip knowledge context
        #[arg(long)]
        no_knowledge: bool,

        /// The message to send
        message: String,
    },

    /// Print the effective configuration with API keys redacted
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        default: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Free,
    Predefined,
}

impl From<ModeArg> for ChatMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Free => ChatMode::Free,
            ModeArg::Predefined => ChatMode::Predefined,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config comes first since it selects the log format.
    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = load_config(&config_path)?;
    init_tracing(cli.verbose, &config.logging.format);
    if config_path.exists() {
        debug!(path = %config_path.display(), "Loaded config file");
    } else {
        info!("No config file found at {}, using defaults", config_path.display());
    }

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config, port).await?,
        Commands::Chat {
            provider,
            mode,
            template,
            project,
            no_knowledge,
            message,
        } => {
            let options = commands::chat::ChatOptions {
                provider,
                mode: mode.map(ChatMode::from),
                template,
                project,
                use_knowledge: !no_knowledge,
                message,
            };
            commands::chat::run(config, options).await?
        }
        Commands::Config { default } => commands::config_cmd::show(&config, default),
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_path(path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// Initialize tracing. Logs go to stderr so `chat` output stays clean.
fn init_tracing(verbose: bool, format: &str) {
    let filter = if verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_chat_command() {
        let cli = Cli::try_parse_from([
            "chatrelay",
            "chat",
            "--provider",
            "deepseek",
            "--template",
            "storytelling",
            "--no-knowledge",
            "a dragon",
        ])
        .unwrap();

        match cli.command {
            Commands::Chat {
                provider,
                mode,
                template,
                project,
                no_knowledge,
                message,
            } => {
                assert_eq!(provider, "deepseek");
                assert_eq!(mode, None);
                assert_eq!(template.as_deref(), Some("storytelling"));
                assert_eq!(project, "default");
                assert!(no_knowledge);
                assert_eq!(message, "a dragon");
            }
            _ => panic!("expected chat command"),
        }
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["chatrelay", "serve", "--port", "8081", "-v", "--config", "/tmp/c.toml"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        assert!(matches!(cli.command, Commands::Serve { port: Some(8081) }));
    }

    #[test]
    fn parse_config_default_flag() {
        let cli = Cli::try_parse_from(["chatrelay", "config", "--default"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { default: true }));

        let cli = Cli::try_parse_from(["chatrelay", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { default: false }));
    }

    #[test]
    fn load_config_rejects_bad_log_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nformat = \"jsno\"\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn mode_must_be_known() {
        let result = Cli::try_parse_from([
            "chatrelay", "chat", "--provider", "openai", "--mode", "freestyle", "hi",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn load_config_from_missing_path_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.gateway.port, 3000);
    }

    #[test]
    fn load_config_reports_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[upstream]\ntimeout_secs = 0\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load config"));
    }
}
