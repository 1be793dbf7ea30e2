use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use otp_login::{
    DeliveredCode, LoginConfig, LoginEvent, LoginFlow, SimulatedGateway, Stage, Submission,
};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Interactive demo of the KYC mobile number + one-time code login
#[derive(Parser, Debug)]
#[command(name = "kyc-login")]
struct Args {
    /// Fixed RNG seed for reproducible codes and delays
    #[arg(long)]
    seed: Option<u64>,

    /// Resend cooldown in seconds (overrides OTP_RESEND_COOLDOWN_SECS)
    #[arg(long)]
    cooldown: Option<u32>,

    /// Do not print the simulated text message with the code
    #[arg(long)]
    no_reveal: bool,

    /// Print login events as JSON
    #[arg(long)]
    events: bool,
}

enum Step {
    Continue,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so prompts stay readable)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,otp_login=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut config = LoginConfig::from_env().context("Failed to load configuration")?;
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }
    if let Some(cooldown) = args.cooldown {
        config.resend_cooldown_secs = cooldown;
    }
    tracing::debug!(?config, "configuration loaded");

    let (outbox_tx, mut outbox) = mpsc::unbounded_channel();
    let gateway = match config.rng_seed {
        Some(seed) => SimulatedGateway::with_seed(config.latency, seed),
        None => SimulatedGateway::new(config.latency),
    }
    .with_outbox(outbox_tx);

    let mut flow = LoginFlow::new(&config, Arc::new(gateway));
    let mut events = flow.subscribe();

    let term = Term::stdout();
    print_banner(&term)?;

    loop {
        let step = match flow.session().stage() {
            Stage::AwaitingMobile => mobile_step(&mut flow, &term).await?,
            Stage::AwaitingCode => {
                show_messages(&mut outbox, !args.no_reveal);
                code_step(&mut flow, &term).await?
            }
            Stage::Verified => Step::Quit,
        };

        drain_events(&mut events, args.events)?;

        if let Step::Quit = step {
            break;
        }
    }

    if !flow.session().is_verified() {
        println!("{}", "👋 Login cancelled".bright_blue());
    }
    Ok(())
}

fn print_banner(term: &Term) -> Result<()> {
    term.clear_screen()?;
    println!(
        "{}",
        "╔════════════════════════════════════════╗".bright_red()
    );
    println!(
        "{}",
        "║        KYC Demo - Mobile Login         ║".bright_red()
    );
    println!(
        "{}",
        "╚════════════════════════════════════════╝".bright_red()
    );
    println!();
    Ok(())
}

async fn mobile_step(flow: &mut LoginFlow, term: &Term) -> Result<Step> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Mobile number (leave empty to quit)")
        .with_initial_text(flow.session().mobile_input())
        .allow_empty(true)
        .interact_text_on(term)?;

    let input = input.trim();
    if input.is_empty() {
        return Ok(Step::Quit);
    }

    println!("{}", "Sending verification code...".dimmed());
    match flow.request_code(input).await {
        Ok(_) => {}
        Err(e) => println!("{}", e.to_string().red()),
    }
    Ok(Step::Continue)
}

async fn code_step(flow: &mut LoginFlow, term: &Term) -> Result<Step> {
    let masked = flow
        .session()
        .mobile()
        .map(|m| m.masked())
        .unwrap_or_default();
    println!();
    println!("Enter the verification code sent to {}", masked.bold());
    println!("  {}", render_slots(flow));

    let cooldown = flow.session().cooldown_seconds_remaining();
    let resend = if cooldown > 0 {
        format!("🔁 Resend code (available in {}s)", cooldown)
    } else {
        "🔁 Resend code".to_string()
    };
    let options = vec![
        "🔢 Type digits".to_string(),
        resend,
        "📱 Change mobile number".to_string(),
        "🛑 Quit".to_string(),
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("What would you like to do?")
        .items(&options)
        .default(0)
        .interact_on(term)?;

    match selection {
        0 => {
            type_digits(flow, term)?;
            println!("  {}", render_slots(flow));
            println!("{}", "Verifying...".dimmed());
            match flow.verify_code().await {
                Ok(_) => {}
                Err(e) => println!("{}", e.to_string().red()),
            }
        }
        1 => match flow.resend_code().await {
            Ok(Submission::Completed) => println!("{}", "A new code is on its way".green()),
            Ok(Submission::Ignored) => println!(
                "{}",
                format!(
                    "Please wait {}s before requesting a new code",
                    flow.session().cooldown_seconds_remaining()
                )
                .yellow()
            ),
            Err(e) => println!("{}", e.to_string().red()),
        },
        2 => flow.change_mobile_number(),
        3 => return Ok(Step::Quit),
        _ => unreachable!(),
    }
    Ok(Step::Continue)
}

/// Feed typed characters into the focused slot: digits fill, `<` deletes.
fn type_digits(flow: &mut LoginFlow, term: &Term) -> Result<()> {
    let typed: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Digits (`<` = backspace)")
        .allow_empty(true)
        .interact_text_on(term)?;

    for c in typed.chars() {
        let index = flow.session().entry().focused();
        if c == '<' {
            flow.backspace(index);
        } else {
            flow.enter_digit(index, &c.to_string());
        }
    }
    Ok(())
}

fn render_slots(flow: &LoginFlow) -> String {
    let entry = flow.session().entry();
    entry
        .slots()
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            let cell = format!("[{}]", slot.unwrap_or(' '));
            if i == entry.focused() {
                cell.bright_yellow().bold().to_string()
            } else {
                cell
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn show_messages(outbox: &mut mpsc::UnboundedReceiver<DeliveredCode>, reveal: bool) {
    while let Ok(delivered) = outbox.try_recv() {
        if reveal {
            println!(
                "{} {}: your KYC demo code is {}",
                "📩 SMS to".cyan(),
                delivered.mobile.masked(),
                delivered.code.as_str().bold()
            );
        }
    }
}

fn drain_events(events: &mut broadcast::Receiver<LoginEvent>, print_json: bool) -> Result<()> {
    while let Ok(event) = events.try_recv() {
        if print_json {
            println!("{}", serde_json::to_string(&event)?.dimmed());
        }
        if let LoginEvent::Verified { landing_route, .. } = &event {
            println!();
            println!("{}", "✅ Mobile number verified".bright_green().bold());
            println!("Continuing to {}", landing_route.bold());
        }
    }
    Ok(())
}
