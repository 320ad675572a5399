//! Frete - headless driver for the booking core
//!
//! Reads one command per line from stdin and runs them against a booking
//! session, printing opened links, Fretor positions and auth changes.
//!
//! Module structure:
//! - `domain/` - Catalog, quantities, booking confirmations
//! - `io/` - Deep links, link opener, map surface, identity providers, console
//! - `services/` - Selection flow, quantity prompt, tracker, contact, auth, session
//! - `infra/` - Config, key bus, metrics

use clap::Parser;
use frete::infra::{Config, Key, Metrics};
use frete::io::console::{Command, CommandError, QuantityInput, HELP};
use frete::io::{HeadlessMap, LocalIdentityProvider, LogOpener, RestIdentityProvider};
use frete::services::{AuthBridge, AuthModal, AuthMode, BookingSession, Credentials, IdentityProvider};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Frete - custom apparel booking core
#[derive(Parser, Debug)]
#[command(name = "frete", version, about)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, env = "CONFIG_FILE", default_value = "config/dev.toml")]
    config: String,
}

type SharedModal = Arc<Mutex<AuthModal>>;

fn print_modal(modal: &AuthModal) {
    if let Some(message) = modal.error() {
        println!("auth error: {}", message);
    }
    if let Some(notice) = modal.notice() {
        println!("{}", notice);
    }
}

/// Run an auth modal action off the input loop
fn spawn_modal<F>(modal: &SharedModal, auth: &Arc<AuthBridge>, federated: Option<Credentials>, prepare: F)
where
    F: FnOnce(&mut AuthModal) -> bool + Send + 'static,
{
    let modal = modal.clone();
    let auth = auth.clone();
    tokio::spawn(async move {
        let mut modal = modal.lock().await;
        if !prepare(&mut *modal) {
            return;
        }
        match &federated {
            Some(credentials) => modal.sign_in_federated(&auth, credentials).await,
            None => modal.submit(&auth).await,
        };
        print_modal(&modal);
    });
}

/// Returns false when the driver should exit
fn handle_line(line: &str, session: &mut BookingSession, auth: &Arc<AuthBridge>, modal: &SharedModal) -> bool {
    let command = match line.parse::<Command>() {
        Ok(command) => command,
        Err(CommandError::Empty) => return true,
        Err(e) => {
            println!("{}", e);
            return true;
        }
    };
    debug!(command = ?command, "command_received");

    let outcome = match command {
        Command::Pick(key) => session.pick_category(&key).map(|c| println!("category: {}", c.title)),
        Command::Clear => {
            session.clear_category();
            Ok(())
        }
        Command::Gender(gender) => session.pick_gender(gender).map(|_| {
            if let Some(quantity) = session.prompt_quantity() {
                println!("How many pieces do you need? [{}]", quantity);
            }
        }),
        Command::Quantity(input) => {
            let quantity = match input {
                QuantityInput::Up => session.increment_quantity(),
                QuantityInput::Down => session.decrement_quantity(),
                QuantityInput::Raw(raw) => session.set_quantity_raw(&raw),
            };
            quantity.map(|q| println!("quantity: {}", q))
        }
        Command::Confirm => session.confirm_quantity().map(|_| {
            if let Some(booking) = session.last_booking() {
                println!("booking {} confirmed", booking.booking_id);
            }
        }),
        Command::Cancel => {
            session.cancel_quantity_prompt();
            Ok(())
        }
        Command::Escape => {
            if session.handle_key(Key::Escape) {
                println!("quantity prompt closed");
            }
            Ok(())
        }
        Command::Continue => {
            if session.continue_on_messaging().is_none() {
                println!("pick a category first");
            }
            Ok(())
        }
        Command::Chat => {
            session.open_chat();
            Ok(())
        }
        Command::Contact { name, phone, message } => {
            let form = session.contact_mut();
            form.name = name;
            form.phone = phone;
            form.message = message;
            if let Err(errors) = session.submit_contact() {
                for message in [errors.name, errors.phone].into_iter().flatten() {
                    println!("contact: {}", message);
                }
            }
            Ok(())
        }
        Command::Gallery(filter) => {
            println!("gallery [{}]", filter.label());
            for item in session.set_gallery_filter(filter) {
                println!("  {} {} ({})", item.id, item.title, item.kind.as_str());
            }
            Ok(())
        }
        Command::SignIn { email, password } => {
            spawn_modal(modal, auth, None, move |m| {
                m.open(AuthMode::SignIn);
                m.email = email;
                m.password = password;
                true
            });
            Ok(())
        }
        Command::SignUp { email, password } => {
            spawn_modal(modal, auth, None, move |m| {
                m.open(AuthMode::SignUp);
                m.email = email;
                m.password = password;
                true
            });
            Ok(())
        }
        Command::Google(token) => {
            spawn_modal(modal, auth, Some(Credentials::google(&token)), |m| {
                m.open(AuthMode::SignIn);
                true
            });
            Ok(())
        }
        Command::Reset(email) => {
            spawn_modal(modal, auth, None, move |m| {
                m.open(AuthMode::ResetPassword);
                m.email = email;
                true
            });
            Ok(())
        }
        Command::Otp(phone) => {
            spawn_modal(modal, auth, None, move |m| {
                m.close();
                m.open(AuthMode::Phone);
                m.phone = phone;
                true
            });
            Ok(())
        }
        Command::Verify(code) => {
            spawn_modal(modal, auth, None, move |m| {
                if m.mode() != AuthMode::Phone || !m.awaiting_code() {
                    println!("request a code first with 'otp <phone>'");
                    return false;
                }
                m.code = code;
                true
            });
            Ok(())
        }
        Command::SignOut => {
            let auth = auth.clone();
            tokio::spawn(async move {
                if let Err(e) = auth.sign_out().await {
                    println!("auth error: {}", e);
                }
            });
            Ok(())
        }
        Command::Status => {
            match serde_json::to_string_pretty(&session.snapshot()) {
                Ok(json) => println!("{}", json),
                Err(e) => error!(error = %e, "status_encode_failed"),
            }
            match auth.current_user() {
                Some(user) => println!("signed in as {}", user.label()),
                None => println!("not signed in"),
            }
            Ok(())
        }
        Command::Help => {
            println!("{}", HELP);
            Ok(())
        }
        Command::Quit => return false,
    };

    if let Err(e) = outcome {
        warn!(error = %e, "command_rejected");
        println!("error: {}", e);
    }
    true
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!(git_hash = env!("FRETE_GIT_HASH"), "frete starting");

    let args = Args::parse();
    let config = Config::load_from_path(&args.config);

    info!(
        config_file = %config.config_file(),
        brand = %config.brand_name(),
        messaging_host = %config.messaging_host(),
        destination = %config.messaging_destination(),
        default_quantity = %config.default_quantity(),
        quantity_step = %config.quantity_step(),
        identity_enabled = %config.identity_enabled(),
        "config_loaded"
    );

    let metrics = Arc::new(Metrics::new());

    let provider: Arc<dyn IdentityProvider> = if config.identity_enabled() {
        Arc::new(RestIdentityProvider::new(config.identity())?)
    } else {
        info!("identity_provider_local");
        Arc::new(LocalIdentityProvider::new())
    };
    let auth = AuthBridge::init(provider, metrics.clone());
    let modal: SharedModal = Arc::new(Mutex::new(AuthModal::new()));

    let mut session = BookingSession::new(&config, Box::new(HeadlessMap::new()), Arc::new(LogOpener), metrics.clone());
    let mut positions = session.positions();
    let mut auth_changes = auth.subscribe();

    let mut metrics_interval = tokio::time::interval(Duration::from_secs(config.metrics_interval_secs().max(1)));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", HELP);

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(&line, &mut session, &auth, &modal) {
                        break;
                    }
                }
                Ok(None) => {
                    info!("stdin_closed");
                    break;
                }
                Err(e) => {
                    error!(error = %e, "stdin_read_failed");
                    break;
                }
            },
            Ok(()) = positions.changed() => {
                let position = *positions.borrow_and_update();
                println!("fretor: {}", position);
            }
            Ok(()) = auth_changes.changed() => {
                match auth_changes.borrow_and_update().as_ref() {
                    Some(user) => println!("signed in as {}", user.label()),
                    None => println!("signed out"),
                }
            }
            _ = metrics_interval.tick() => {
                metrics.report(session.tracker().is_running()).log();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown_signal_received");
                break;
            }
        }
    }

    session.shutdown().await;
    auth.shutdown();
    metrics.report(false).log();

    info!("frete shutdown complete");
    Ok(())
}
