//! Peer Transfer - scripted demo run
//!
//! Walks one transfer end to end against the simulated backend:
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────┐    ┌──────────┐    ┌──────────┐
//! │  Amount  │───▶│ Recipient │───▶│ Confirm  │───▶│   Auth   │───▶│ Receipt  │
//! │ (digits) │    │ (list/ab) │    │ (funds)  │    │(bio/PIN) │    │ (status) │
//! └──────────┘    └───────────┘    └──────────┘    └──────────┘    └──────────┘
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use peer_transfer::auth::{AuthState, BiometricDevice, SimulatedBiometrics};
use peer_transfer::config::AppConfig;
use peer_transfer::contacts::{PermissionStatus, StaticContacts};
use peer_transfer::money::format_currency;
use peer_transfer::store::SessionContext;
use peer_transfer::transfer::{
    ConfirmOutcome, FlowSettings, SimulatedTransferService, TransferError, TransferFlow,
};

/// Success rate used by `--random`
const RANDOM_SUCCESS_RATE: f64 = 0.8;

/// Upper bound on auth prompts before the demo gives up
const MAX_AUTH_ROUNDS: usize = 4;

#[derive(Parser)]
#[command(name = "peer_transfer")]
#[command(version, long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Peer-to-peer transfer demo against a simulated backend", long_about = None)]
struct Cli {
    /// Config profile under config/ (dev, demo, test)
    #[arg(short, long, default_value = "dev")]
    env: String,

    /// Amount as typed into the cents field: 20000 = RM200.00
    #[arg(short, long, default_value = "20000", value_name = "DIGITS")]
    amount: String,

    /// Optional note attached to the transfer
    #[arg(short, long)]
    note: Option<String>,

    /// Recipient id; defaults to the first entry of the list
    #[arg(short, long, value_name = "ID")]
    recipient: Option<String>,

    /// Pick the recipient from the device address book
    #[arg(long)]
    contacts: bool,

    /// Refuse the contacts permission
    #[arg(long)]
    deny_contacts: bool,

    /// PIN typed at the fallback prompt; defaults to the configured code
    #[arg(long, value_name = "CODE")]
    pin: Option<String>,

    /// Device has no biometric sensor
    #[arg(long)]
    no_biometrics: bool,

    /// Let simulated calls and settlement fail at random
    #[arg(long)]
    random: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(&cli.env)
        .with_context(|| format!("loading config profile '{}'", cli.env))?;
    if cli.random {
        config.simulation.network_success_rate = RANDOM_SUCCESS_RATE;
        config.simulation.settlement_success_rate = RANDOM_SUCCESS_RATE;
    }
    let _log_guard = peer_transfer::logging::init_logging(&config);

    tracing::info!(
        env = %cli.env,
        delay_min_ms = config.simulation.min_delay_ms,
        delay_max_ms = config.simulation.max_delay_ms,
        "Starting peer_transfer demo"
    );

    let biometrics: Arc<dyn BiometricDevice> = if cli.no_biometrics {
        Arc::new(SimulatedBiometrics::unavailable())
    } else {
        Arc::new(SimulatedBiometrics::available())
    };
    let permission = if cli.deny_contacts {
        PermissionStatus::Denied
    } else {
        PermissionStatus::Granted
    };

    let mut flow = TransferFlow::new(
        Arc::new(SimulatedTransferService::from_config(&config.simulation)),
        biometrics,
        Arc::new(StaticContacts::demo(permission)?),
        SessionContext::new(),
        FlowSettings::from_config(&config.auth)?,
    );

    // ============================================================
    // AMOUNT
    // ============================================================

    let user = flow.load_user().await.context("loading user")?;
    println!("{} | balance {}", user.name, format_currency(user.balance));

    let shown = flow.enter_amount(&cli.amount)?;
    println!("Amount: {}", shown);
    if let Some(note) = &cli.note {
        flow.set_note(note)?;
    }
    flow.continue_to_recipients()?;

    // ============================================================
    // RECIPIENT
    // ============================================================

    let mut from_contacts = false;
    if cli.contacts {
        match flow.open_contacts().await {
            Ok(list) => {
                println!("{} contacts available", list.len());
                from_contacts = true;
            }
            Err(TransferError::PermissionDenied) => {
                println!("Contacts permission denied, using recent recipients");
            }
            Err(e) => return Err(e.into()),
        }
    }
    if !from_contacts {
        flow.load_recipients().await.context("loading recipients")?;
    }

    let recipient_id = match &cli.recipient {
        Some(id) => id.clone(),
        None => {
            let first = flow.search("").first().map(|r| r.id.clone());
            first.context("no recipients to choose from")?
        }
    };
    let confirm = flow.select_recipient_by_id(&recipient_id)?;

    // ============================================================
    // CONFIRM
    // ============================================================

    println!(
        "Send {} to {}{}",
        format_currency(confirm.amount),
        confirm.recipient.name,
        confirm
            .recipient
            .phone_number
            .as_deref()
            .map(|p| format!(" ({})", p))
            .unwrap_or_default()
    );
    if let Some(after) = flow.balance_after_transfer() {
        println!("Balance after transfer: {}", format_currency(after));
    }

    let pin = cli.pin.clone().unwrap_or_else(|| config.auth.pin_code.clone());
    let mut outcome = flow.confirm().await?;
    let mut rounds = 0;
    let transaction = loop {
        rounds += 1;
        if rounds > MAX_AUTH_ROUNDS {
            flow.cancel_authentication()?;
            return Err(TransferError::AuthenticationFailed)
                .with_context(|| format!("no authorization after {} prompts", MAX_AUTH_ROUNDS));
        }
        outcome = match outcome {
            ConfirmOutcome::Submitted(tx) => break tx,
            ConfirmOutcome::AwaitingAuth(AuthState::BiometricFailed) => {
                println!("Biometric check failed, switching to PIN");
                flow.use_pin()?;
                flow.submit_pin(&pin).await?
            }
            ConfirmOutcome::AwaitingAuth(state) => {
                println!("Authentication: {}", state);
                flow.submit_pin(&pin).await?
            }
            ConfirmOutcome::PinMismatch | ConfirmOutcome::PinIncomplete => {
                flow.cancel_authentication()?;
                return Err(TransferError::AuthenticationFailed).context("Incorrect PIN");
            }
        };
    };

    // ============================================================
    // RECEIPT
    // ============================================================

    if let Some(receipt) = flow.receipt() {
        println!();
        for line in receipt.to_lines() {
            println!("{}", line);
        }
    }
    if let Some(balance) = flow.session().balance() {
        println!();
        println!("Balance: {}", format_currency(balance));
    }

    tracing::info!(id = %transaction.id, status = %transaction.status(), "Demo finished");
    flow.finish()?;
    Ok(())
}
