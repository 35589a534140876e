// Chatdeck CLI — interactive chatbot session.
//
// Mirrors the dashboard's chat widget: connect/disconnect are explicit user
// actions, everything the session appends (including lifecycle advisories)
// is printed as it happens, and template suggestions are answered with
// /select.

use chatdeck::{AuthSession, BridgeEvent, ChatbotBridge, EngineConfig, EngineResult};
use chatdeck_core::{Identity, Message, MessageId, Sender};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

#[derive(Args)]
pub struct ChatArgs {
    /// Sign in locally with this subject id (skips the login endpoint).
    #[arg(long, conflicts_with_all = ["email", "password"])]
    subject: Option<String>,
    /// Display name for a local sign-in.
    #[arg(long, requires = "subject")]
    name: Option<String>,
    /// Sign in against the dashboard login endpoint.
    #[arg(long, requires = "password")]
    email: Option<String>,
    #[arg(long, requires = "email")]
    password: Option<String>,
}

pub async fn run(config: EngineConfig, args: ChatArgs) -> EngineResult<()> {
    let auth = AuthSession::new(config.clone());

    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        let identity = auth.login(email, password).await?;
        println!("Signed in as {}", identity.display_name);
    } else if let Some(subject) = &args.subject {
        let name = args.name.clone().unwrap_or_else(|| subject.clone());
        auth.sign_in(Identity::new(subject.clone(), name));
    }

    let bridge = ChatbotBridge::new(&config, &auth)?;

    let mut events = bridge.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => print_event(&event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    eprintln!("(skipped {n} updates)");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("Commands: /connect /disconnect /select <message-id> <template-id> /status /quit");
    println!("Anything else is sent to the bot.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        match trimmed.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["/quit"] | ["/exit"] => break,
            ["/connect"] => bridge.connect(),
            ["/disconnect"] => bridge.disconnect(),
            ["/status"] => match serde_json::to_string_pretty(&bridge.status()) {
                Ok(status) => println!("{status}"),
                Err(e) => eprintln!("status unavailable: {e}"),
            },
            ["/select", message_id, template_id] => match message_id.parse::<u64>() {
                Ok(id) => bridge.select_template(MessageId(id), template_id),
                Err(_) => println!("Message ids are numeric — shown in the hint under each suggestion."),
            },
            [command, ..] if command.starts_with('/') => {
                println!("Unknown command {command}. Try /connect, /disconnect, /select, /status, /quit.");
            }
            [] => {}
            _ if bridge.phase() != chatdeck_core::ConnectionPhase::Connected => {
                println!("Not connected — /connect first.");
            }
            _ => bridge.send_text(&line),
        }
    }

    // Dropping the bridge releases the connection and the auth subscription.
    drop(bridge);
    printer.abort();
    Ok(())
}

fn print_event(event: &BridgeEvent) {
    match event {
        BridgeEvent::Message(message) => print_message(message),
        BridgeEvent::Phase(phase) => println!("── {} ──", phase.as_str()),
        BridgeEvent::Loading(Some(caption)) => println!("… {caption}"),
        BridgeEvent::Loading(None) => {}
    }
}

fn print_message(message: &Message) {
    let who = match message.sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    println!(
        "[{} {}] {}",
        message.timestamp.format("%H:%M:%S"),
        who,
        message.text
    );

    if let Some(templates) = &message.templates {
        for t in templates {
            if t.description.is_empty() {
                println!("    ({}) {}", t.id, t.title);
            } else {
                println!("    ({}) {} — {}", t.id, t.title, t.description);
            }
        }
        println!("    choose with: /select {} <template-id>", message.id);
    }
}
