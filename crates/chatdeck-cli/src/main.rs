// Chatdeck CLI — dashboard client for the terminal.
// Subcommands map onto the dashboard's pages: `chat` is the chatbot widget,
// `templates` is the template library, `ping` is the API connection test.

mod chat;
mod templates;

use chatdeck::{EngineConfig, EngineResult};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Parser)]
#[command(
    name = "chatdeck",
    version,
    about = "Dashboard client — chatbot, templates, and API tools from the terminal."
)]
struct Cli {
    /// Dashboard API base URL.
    #[arg(long, global = true, env = "CHATDECK_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chatbot session.
    Chat(chat::ChatArgs),
    /// Browse the saved template catalog.
    Templates {
        #[command(subcommand)]
        command: templates::TemplatesCommand,
    },
    /// Probe the dashboard API and print the raw response.
    Ping,
    /// Generate shell completions.
    Completions { shell: Shell },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> EngineResult<()> {
    match cli.command {
        Command::Templates { command } => {
            templates::run(command);
            Ok(())
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "chatdeck", &mut std::io::stdout());
            Ok(())
        }
        Command::Ping => {
            let config = api_config(cli.api_url)?;
            let auth = chatdeck::AuthSession::new(config);
            let body = auth.ping().await?;
            println!("{body}");
            Ok(())
        }
        Command::Chat(args) => {
            let config = api_config(cli.api_url)?;
            chat::run(config, args).await
        }
    }
}

/// Resolve the API base URL from the flag or the environment.
fn api_config(api_url: Option<String>) -> EngineResult<EngineConfig> {
    match api_url {
        Some(url) => EngineConfig::new(&url),
        None => EngineConfig::from_env(),
    }
}
