use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rsvp::app::App;
use rsvp::config::Config;
use rsvp::http::ClientError;
use rsvp::models::EventResource;
use rsvp::routing::LOGIN_PATH;

#[derive(Parser)]
#[command(name = "rsvp")]
#[command(about = "Browse events and manage your registrations")]
struct Cli {
    /// Base URL of the API (overrides RSVP_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory for the saved session (overrides RSVP_STORAGE_DIR)
    #[arg(long, global = true)]
    storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show who is logged in
    Whoami,
    /// Browse and register for events
    #[command(subcommand)]
    Events(EventCommands),
    /// Manage waitlist registrations
    #[command(subcommand)]
    Waitlist(WaitlistCommands),
}

#[derive(Subcommand)]
enum EventCommands {
    /// List all events
    List,
    /// Show one event
    Show { id: u64 },
    /// Register as a participant
    Join { id: u64 },
    /// Cancel a participant registration
    Leave { id: u64 },
}

#[derive(Subcommand)]
enum WaitlistCommands {
    /// Join an event's waitlist
    Join { id: u64 },
    /// Leave an event's waitlist
    Leave { id: u64 },
}

/// Logs go to stderr so command output on stdout stays clean.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "rsvp=info,rsvp_core=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url).context("Invalid --api-url")?;
    }
    if let Some(dir) = cli.storage_dir {
        config = config.with_storage_dir(dir);
    }

    let app = App::bootstrap(&config)?;
    let ok = run(&app, cli.command).await;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn run(app: &App, command: Commands) -> bool {
    match command {
        Commands::Login { email, password } => {
            app.router.push(LOGIN_PATH);
            match app.client.login(&email, &password).await {
                Ok(user) => {
                    app.notifier
                        .show_success(&format!("Logged in as {}", user.display_name()));
                    true
                }
                Err(ClientError::Unauthorized) => {
                    app.notifier.show_error("Invalid email or password");
                    false
                }
                Err(e) => report(app, &e),
            }
        }
        Commands::Logout => {
            app.client.logout();
            app.notifier.show_success("Logged out");
            true
        }
        Commands::Whoami => match app.session.user() {
            Some(user) if app.session.is_authenticated() => {
                println!("{}", user.display_name());
                true
            }
            _ => {
                app.notifier.show_error("Not logged in");
                false
            }
        },
        Commands::Events(command) => {
            if !require_login(app) {
                return false;
            }
            run_events(app, command).await
        }
        Commands::Waitlist(command) => {
            if !require_login(app) {
                return false;
            }
            let result = match command {
                WaitlistCommands::Join { id } => app
                    .client
                    .join_waitlist(id)
                    .await
                    .map(|()| format!("Joined the waitlist for event {id}")),
                WaitlistCommands::Leave { id } => app
                    .client
                    .leave_waitlist(id)
                    .await
                    .map(|()| format!("Left the waitlist for event {id}")),
            };
            notify(app, result)
        }
    }
}

async fn run_events(app: &App, command: EventCommands) -> bool {
    match command {
        EventCommands::List => match app.client.list_events().await {
            Ok(events) if events.is_empty() => {
                println!("No events.");
                true
            }
            Ok(events) => {
                for event in &events {
                    println!("{}", summary_line(event));
                }
                true
            }
            Err(e) => report(app, &e),
        },
        EventCommands::Show { id } => match app.client.get_event(id).await {
            Ok(event) => {
                print_event(&event);
                true
            }
            Err(e) => report(app, &e),
        },
        EventCommands::Join { id } => {
            let result = app
                .client
                .join_event(id)
                .await
                .map(|()| format!("Registered for event {id}"));
            notify(app, result)
        }
        EventCommands::Leave { id } => {
            let result = app
                .client
                .leave_event(id)
                .await
                .map(|()| format!("Registration for event {id} cancelled"));
            notify(app, result)
        }
    }
}

/// Enter the protected home route, or explain why we cannot.
fn require_login(app: &App) -> bool {
    if app.enter_home() {
        return true;
    }
    app.notifier
        .show_error("Not logged in. Run `rsvp login --email <email> --password <password>` first.");
    false
}

fn notify(app: &App, result: Result<String, ClientError>) -> bool {
    match result {
        Ok(message) => {
            app.notifier.show_success(&message);
            true
        }
        Err(e) => report(app, &e),
    }
}

fn report(app: &App, error: &ClientError) -> bool {
    let expired = matches!(error, ClientError::Unauthorized)
        && app.router.current().as_deref() == Some(LOGIN_PATH);
    if expired {
        app.notifier
            .show_error("Not authorized. Your session was cleared, please log in again.");
    } else {
        app.notifier.show_error(&error.to_string());
    }
    false
}

fn summary_line(event: &EventResource) -> String {
    let mut line = format!(
        "#{:<4} {}  {}  {}  {}/{}",
        event.id,
        event.starts_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
        event.name,
        event.location,
        event.seats_taken(),
        event.capacity,
    );
    if event.is_participant {
        line.push_str("  [registered]");
    }
    if event.is_waiting {
        line.push_str("  [waitlisted]");
    }
    if event.is_past {
        line.push_str("  [past]");
    } else if event.is_happening {
        line.push_str("  [happening now]");
    }
    line
}

fn print_event(event: &EventResource) {
    let local = |ts: &chrono::DateTime<chrono::Utc>| {
        ts.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M")
            .to_string()
    };

    println!("{} (#{})", event.name, event.id);
    println!("  Status:    {}", event.status);
    println!("  Where:     {}", event.location);
    println!("  When:      {} - {}", local(&event.starts_at), local(&event.ends_at));
    println!(
        "  Seats:     {} taken, {} left (waitlist capacity {})",
        event.seats_taken(),
        event.seats_left(),
        event.wait_list_capacity
    );
    if let Some(description) = &event.description {
        println!();
        println!("{description}");
    }
    println!();
    if event.is_participant {
        println!("You are registered.");
    } else if event.is_waiting {
        println!("You are on the waitlist.");
    } else if event.can_add_new_participant {
        println!("Seats available: `rsvp events join {}`", event.id);
    } else if event.can_add_in_wait_list {
        println!("Event is full; join the waitlist: `rsvp waitlist join {}`", event.id);
    }
}
