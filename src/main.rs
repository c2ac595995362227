//! dbweb CLI - serve the catalogue and administer users

use clap::{CommandFactory, Parser, Subcommand};
use dbweb::config::expand_path;
use dbweb::{Config, Core};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "dbweb")]
#[command(version)]
#[command(about = "dbweb - web catalogue of Dreamblade miniatures", long_about = None)]
struct Args {
    /// Path to configuration file [default: ~/.dbweb/config.toml]
    #[arg(short, long, global = true, env = "DBWEB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server
    Start {
        /// Override server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override server host
        #[arg(long)]
        host: Option<String>,
    },

    /// Manage users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Initialize a new config file with defaults
    Init,
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Add a user who may log in
    Add {
        /// Username to add
        username: Option<String>,

        /// Ignored
        #[arg(hide = true)]
        extra: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dbweb={},tower_http={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(command) = args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let config_path = expand_path(&args.config.unwrap_or_else(Config::default_path));

    match command {
        Commands::Init => {
            if config_path.exists() {
                tracing::warn!("Config file already exists: {}", config_path.display());
                return Ok(());
            }
            Config::create_default(&config_path)?;
            tracing::info!("Created default config at: {}", config_path.display());
        }

        Commands::Start { port, host } => {
            let mut config = load_config(&config_path)?;

            // CLI flags win over the file and the environment
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }

            let core = Core::new(config)?;
            core.start_server().await?;
        }

        Commands::Users {
            command: UsersCommand::Add { username, extra },
        } => {
            if !extra.is_empty() {
                tracing::debug!("Ignoring extra arguments: {:?}", extra);
            }

            let core = Core::new(load_config(&config_path)?)?;
            // A missing name is empty and fails validation
            let username = username.unwrap_or_default();
            match core.add_user(&username).await {
                Ok(user) => println!("Added user {}", user.username),
                Err(e) => {
                    eprintln!("Unable to add user: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

/// Load the config file, or defaults if it is missing, then apply environment overrides
fn load_config(path: &Path) -> anyhow::Result<Config> {
    let mut config = if path.exists() {
        Config::from_file(path)?
    } else {
        tracing::warn!("Config file not found at {}, using defaults", path.display());
        Config::default()
    };
    config.apply_env_overrides();
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_users_add_ignores_extra_arguments() {
        let args = Args::try_parse_from(["dbweb", "users", "add", "alice", "bob", "carol"]).unwrap();
        match args.command {
            Some(Commands::Users {
                command: UsersCommand::Add { username, extra },
            }) => {
                assert_eq!(username.as_deref(), Some("alice"));
                assert_eq!(extra, vec!["bob", "carol"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_users_add_without_username_is_empty() {
        let args = Args::try_parse_from(["dbweb", "users", "add"]).unwrap();
        assert!(matches!(
            args.command,
            Some(Commands::Users {
                command: UsersCommand::Add { username: None, .. }
            })
        ));
    }

    #[test]
    fn test_unknown_commands_are_errors() {
        assert!(Args::try_parse_from(["dbweb", "serve"]).is_err());
        assert!(Args::try_parse_from(["dbweb", "users", "remove", "alice"]).is_err());
        assert!(Args::try_parse_from(["dbweb", "users"]).is_err());
    }

    #[test]
    fn test_no_command() {
        let args = Args::try_parse_from(["dbweb"]).unwrap();
        assert!(args.command.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_start_overrides() {
        let args =
            Args::try_parse_from(["dbweb", "start", "--port", "9000", "-c", "/tmp/dbweb.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/dbweb.toml")));
        assert!(matches!(
            args.command,
            Some(Commands::Start { port: Some(9000), host: None })
        ));
    }
}
