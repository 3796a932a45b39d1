use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;

use voice_onboard::commands;
use voice_onboard::config::AppConfig;
use voice_onboard::models::PageQuery;
use voice_onboard::utils::logger;
use voice_onboard::{gateway, AppContext};

const PORT_ENV: &str = "FILE_SERVER_PORT";
const DEFAULT_PORT: u16 = 3001;

#[derive(Debug, Parser)]
#[command(
    name = "voice-onboard",
    about = "Onboard avatar models and clone their voices",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the file gateway
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Onboard a model from a video file
    AddModel { name: String, video: PathBuf },
    /// List models page by page
    Models {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        page_size: u32,
        /// Substring filter on the model name
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Show one model
    Model { id: i64 },
    /// Count models
    Count {
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Remove a model and its local files
    Remove { id: i64 },
    /// Train a voice from audio relative to the TTS root
    Train {
        audio: String,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Synthesize a preview with a trained voice
    Audition { voice_id: i64, text: String },
    /// Synthesize speech into the product directory
    MakeAudio { voice_id: i64, text: String },
    /// List trained voices
    Voices,
    /// Copy an audio file into the product directory
    CopyAudio { file: PathBuf },
    /// Read or update the remote server configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Get,
    /// Merge a JSON object into the configuration
    Set { patch: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::init_logger();
    let cli = Cli::parse();

    let ctx = AppContext::initialize(AppConfig::from_env())?;

    match cli.command {
        Command::Serve { port } => {
            let addr = SocketAddr::from(([0, 0, 0, 0], resolve_port(port)));
            gateway::serve(addr, ctx.paths.clone(), shutdown_signal()).await?;
        }
        Command::AddModel { name, video } => {
            let id = commands::add_model(&ctx, &name, &video).await?;
            print_json(&serde_json::json!({ "id": id }))?;
        }
        Command::Models {
            page,
            page_size,
            name,
        } => {
            let query = PageQuery {
                page,
                page_size,
                name,
            };
            print_json(&commands::page_models(&ctx, query).await?)?;
        }
        Command::Model { id } => print_json(&commands::find_model(&ctx, id).await?)?,
        Command::Count { name } => println!("{}", commands::count_models(&ctx, &name).await?),
        Command::Remove { id } => {
            commands::remove_model(&ctx, id).await?;
            log::info!("Model {} removed", id);
        }
        Command::Train { audio, lang } => {
            let voice_id = commands::train_voice(&ctx, &audio, lang.as_deref()).await?;
            print_json(&serde_json::json!({ "voiceId": voice_id }))?;
        }
        Command::Audition { voice_id, text } => {
            let path = commands::audition(&ctx, voice_id, &text).await?;
            println!("{}", path.display());
        }
        Command::MakeAudio { voice_id, text } => {
            println!("{}", commands::make_audio_for_video(&ctx, voice_id, &text).await?);
        }
        Command::Voices => print_json(&commands::list_voices(&ctx).await?)?,
        Command::CopyAudio { file } => {
            println!("{}", commands::copy_audio_for_video(&ctx, &file).await?);
            // detached mirror uploads die with the runtime
            ctx.mirror.flush().await;
        }
        Command::Config { action } => match action {
            ConfigAction::Get => print_json(&commands::get_server_config(&ctx).await?)?,
            ConfigAction::Set { patch } => {
                let patch: serde_json::Value = serde_json::from_str(&patch)?;
                print_json(&commands::set_server_config(&ctx, patch).await?)?;
            }
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn resolve_port(flag: Option<u16>) -> u16 {
    flag.unwrap_or_else(port_from_env_or_default)
}

fn port_from_env_or_default() -> u16 {
    match std::env::var(PORT_ENV) {
        Ok(raw) => match raw.trim().parse::<u16>() {
            Ok(parsed) => parsed,
            Err(_) => {
                log::warn!("Invalid {}='{}', falling back to {}", PORT_ENV, raw, DEFAULT_PORT);
                DEFAULT_PORT
            }
        },
        Err(_) => DEFAULT_PORT,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => log::info!("Received SIGTERM, shutting down..."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .expect("environment lock poisoned")
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("arguments should parse")
    }

    fn serve_port(cli: Cli) -> Option<u16> {
        match cli.command {
            Command::Serve { port } => port,
            other => panic!("expected serve, got {:?}", other),
        }
    }

    #[test]
    fn cli_port_overrides_environment() {
        let _guard = env_lock();
        std::env::set_var(PORT_ENV, "4000");

        let port = serve_port(parse(&["voice-onboard", "serve", "--port", "9000"]));
        assert_eq!(resolve_port(port), 9000);
        std::env::remove_var(PORT_ENV);
    }

    #[test]
    fn uses_environment_when_flag_missing() {
        let _guard = env_lock();
        std::env::set_var(PORT_ENV, "4000");

        let port = serve_port(parse(&["voice-onboard", "serve"]));
        assert_eq!(resolve_port(port), 4000);
        std::env::remove_var(PORT_ENV);
    }

    #[test]
    fn invalid_environment_port_falls_back() {
        let _guard = env_lock();
        std::env::set_var(PORT_ENV, "not-a-port");

        assert_eq!(resolve_port(None), DEFAULT_PORT);
        std::env::remove_var(PORT_ENV);
        assert_eq!(resolve_port(None), DEFAULT_PORT);
    }

    #[test]
    fn parses_model_listing_flags() {
        let cli = parse(&["voice-onboard", "models", "--page", "2", "--page-size", "5", "--name", "an"]);
        match cli.command {
            Command::Models {
                page,
                page_size,
                name,
            } => {
                assert_eq!((page, page_size, name.as_str()), (2, 5, "an"));
            }
            other => panic!("expected models, got {:?}", other),
        }
    }

    #[test]
    fn parses_make_audio() {
        let cli = parse(&["voice-onboard", "make-audio", "7", "hello there"]);
        match cli.command {
            Command::MakeAudio { voice_id, text } => {
                assert_eq!((voice_id, text.as_str()), (7, "hello there"));
            }
            other => panic!("expected make-audio, got {:?}", other),
        }
    }

    #[test]
    fn parses_config_set() {
        let cli = parse(&["voice-onboard", "config", "set", r#"{"enabled":true}"#]);
        assert!(matches!(
            cli.command,
            Command::Config {
                action: ConfigAction::Set { .. }
            }
        ));
    }
}
