mod render;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use transito::api::Responder;
use transito::config::{Config, ResponderMode};
use transito::conversation::{Conversation, TurnError, View};
use transito::fallback::LocalResponder;
use transito::session::SessionStorage;
use transito::suggestions::SUGGESTIONS;

#[derive(Parser)]
#[command(name = "transito")]
#[command(about = "TránsitoBot CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: TRANSITO_CONFIG_PATH or ~/.transito/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },

    /// Chat with the assistant (interactive).
    Chat {
        /// Config file path (default: TRANSITO_CONFIG_PATH or ~/.transito/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Answer from the built-in topics without contacting the server.
        #[arg(long)]
        offline: bool,
    },

    /// Ask a single question and print the answer.
    Ask {
        /// Config file path (default: TRANSITO_CONFIG_PATH or ~/.transito/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,

        /// Answer from the built-in topics without contacting the server.
        #[arg(long)]
        offline: bool,

        /// The question to ask.
        question: String,
    },

    /// Check that the chat server is reachable (GET /api/v1/health).
    Health {
        /// Config file path (default: TRANSITO_CONFIG_PATH or ~/.transito/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("transito {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, offline }) => {
            if let Err(e) = run_chat(config, offline).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Ask {
            config,
            offline,
            question,
        }) => {
            if let Err(e) = run_ask(config, offline, question).await {
                log::error!("ask failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Health { config }) => {
            if let Err(e) = run_health(config).await {
                log::error!("health check failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(transito::config::default_config_path);
    let dir = transito::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Responder for this run: offline flag or config mode picks the keyword table.
fn build_responder(config: &Config, offline: bool, session: SessionStorage) -> Box<dyn Responder> {
    if offline || config.mode == ResponderMode::Offline {
        log::info!("using offline responder");
        Box::new(LocalResponder)
    } else {
        let client = transito::config::build_client(config, session);
        log::info!("using chat server at {}", client.base_url());
        Box::new(client)
    }
}

/// Fresh session storage; cleared so no sender id survives from an earlier run.
fn start_session() -> SessionStorage {
    let session = SessionStorage::new();
    session.clear();
    session
}

const HELP: &str = "comandos:\n\n\
/b N   - pulsar el botón N del último mensaje con botones\n\
/help  - mostrar esta ayuda\n\
/exit  - salir";

async fn run_chat(config_path: Option<PathBuf>, offline: bool) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let (config, _) = transito::config::load_config(config_path)?;
    let responder = build_responder(&config, offline, start_session());
    let mut conversation = Conversation::new();

    println!("{}\n", render::header());
    println!("{}", render::welcome());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        write!(stdout, "\n> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("/exit") || input.eq_ignore_ascii_case("/quit") {
            break;
        }
        if input.eq_ignore_ascii_case("/help") {
            println!("{}", HELP);
            continue;
        }

        let outgoing = match resolve_input(&conversation, input) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        let before = conversation.messages().len();
        println!("{}", render::typing());
        if let Err(e) = conversation.send(responder.as_ref(), &outgoing).await {
            eprintln!("{}", e);
            continue;
        }
        for m in &conversation.messages()[before..] {
            println!("{}", render::message(m));
        }
    }

    Ok(())
}

/// Map a REPL line to the text to send: `/b N` presses a button, a bare suggestion
/// number on the welcome view picks that suggestion, anything else is sent as typed.
fn resolve_input(conversation: &Conversation, input: &str) -> Result<String, TurnError> {
    if let Some(rest) = input.strip_prefix("/b ") {
        let index = parse_choice(rest).ok_or(TurnError::NoSuchButton)?;
        let message = conversation
            .transcript()
            .last_with_buttons()
            .ok_or(TurnError::NoSuchButton)?;
        return conversation.button_payload(&message.id, index);
    }
    if conversation.view() == View::Welcome {
        if let Some(index) = parse_choice(input).filter(|i| *i < SUGGESTIONS.len()) {
            return conversation.suggestion_question(index);
        }
    }
    Ok(input.to_string())
}

/// 1-based menu number to 0-based index.
fn parse_choice(s: &str) -> Option<usize> {
    s.trim().parse::<usize>().ok().filter(|n| *n >= 1).map(|n| n - 1)
}

async fn run_ask(
    config_path: Option<PathBuf>,
    offline: bool,
    question: String,
) -> anyhow::Result<()> {
    let (config, _) = transito::config::load_config(config_path)?;
    let responder = build_responder(&config, offline, start_session());
    let mut conversation = Conversation::new();
    conversation.send(responder.as_ref(), &question).await?;
    for m in conversation.messages().iter().filter(|m| m.is_bot) {
        println!("{}", render::message(m));
    }
    Ok(())
}

async fn run_health(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let (config, _) = transito::config::load_config(config_path)?;
    let client = transito::config::build_client(&config, start_session());
    let health = client.check_health().await?;
    println!("server:   {}", client.base_url());
    println!("status:   {}", health.status);
    println!("version:  {}", health.version);
    println!("database: {}", health.database_status);
    Ok(())
}
