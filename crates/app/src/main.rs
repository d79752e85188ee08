//! Streampool administrative CLI.
//!
//! Runs a self-contained demo pool and prints the reconciliation report, so
//! operators can see the allocation, swap and drift machinery end to end.

use std::{process, sync::Arc};

use clap::{Args, Parser, Subcommand};
use jiff::{Span, Zoned, civil::Date};
use tracing_subscriber::EnvFilter;

use streampool_app::{
    context::AppContext,
    domain::{
        inventory::{
            InventoryService,
            data::{NewAccount, NewSlot},
        },
        reconciliation::ReconciliationService,
        sales::{
            AllocationService,
            data::NewSale,
            records::{PaymentMethod, SaleTarget},
        },
        swaps::SwapService,
    },
    ids::Phone,
    ledger::Ledger,
    notify::{BotConfig, BotNotifier, NoopNotifier, Notifier},
};

#[derive(Debug, Parser)]
#[command(name = "streampool", about = "Streampool admin CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Seed a demo pool and print the reconciliation report.
    Demo(DemoArgs),
}

#[derive(Debug, Args)]
struct DemoArgs {
    /// Day to reconcile against; defaults to today.
    #[arg(long)]
    today: Option<Date>,

    /// Messaging bot base URL; welcome messages are dropped when unset.
    #[arg(long, env = "BOT_URL")]
    bot_url: Option<String>,

    /// Messaging bot API key.
    #[arg(long, env = "BOT_API_KEY", default_value = "")]
    bot_api_key: String,
}

#[tokio::main]
pub async fn main() {
    let _env = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(error) = run(cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Demo(args) => demo(args).await,
    }
}

async fn demo(args: DemoArgs) -> Result<(), String> {
    let notifier: Arc<dyn Notifier> = match args.bot_url {
        Some(url) => Arc::new(BotNotifier::new(BotConfig {
            url,
            api_key: args.bot_api_key,
        })),
        None => Arc::new(NoopNotifier),
    };

    let ctx = AppContext::new(Ledger::new(), notifier);

    let now = Zoned::now().datetime();
    let today = args.today.unwrap_or_else(|| now.date());

    seed(&ctx, today, now).await?;

    let alerts = ctx
        .reconciliation
        .compute_alerts(today)
        .await
        .map_err(|error| format!("failed to reconcile: {error}"))?;

    println!("reconciliation report for {today}:");

    if alerts.is_empty() {
        println!("  nothing actionable");
    }

    for alert in &alerts {
        println!(
            "  [{:?}] {:<18} {} ({}) | {} | billing {} | technical {} | gap {}d",
            alert.priority,
            alert.action.label(),
            alert.client_name,
            alert.client_phone,
            alert.service,
            alert.billing_end,
            alert.technical_end,
            alert.gap_days,
        );
    }

    let cards = ctx
        .reconciliation
        .grouped_alerts(today)
        .await
        .map_err(|error| format!("failed to group alerts: {error}"))?;

    println!("{} alerts across {} cards", alerts.len(), cards.len());

    Ok(())
}

/// Builds a small pool whose drift is visible relative to `today`: one
/// disposable account about to die under a paid period, one renewable
/// account coming up for collection, and a rotation with live stock.
async fn seed(ctx: &AppContext, today: Date, now: jiff::civil::DateTime) -> Result<(), String> {
    let fail = |error: &dyn std::fmt::Display| format!("failed to seed demo pool: {error}");

    let dying_activation = today
        .checked_sub(Span::new().months(1))
        .and_then(|d| d.checked_add(Span::new().days(2)))
        .map_err(|e| fail(&e))?;

    let dying = ctx
        .inventory
        .create_account(NewAccount {
            service: "Netflix".to_owned(),
            email: "netflix-03@pool.example.com".to_owned(),
            password: "hunter2".to_owned(),
            activation_date: dying_activation,
            duration_months: 1,
            disposable: true,
            provider_due_day: None,
            supplier: Some("MegaCuentas".to_owned()),
            slots: profile_slots(2),
        })
        .await
        .map_err(|e| fail(&e))?;

    let renewable = ctx
        .inventory
        .create_account(NewAccount {
            service: "Disney".to_owned(),
            email: "disney-01@pool.example.com".to_owned(),
            password: "hunter2".to_owned(),
            activation_date: today.checked_sub(Span::new().months(6)).map_err(|e| fail(&e))?,
            duration_months: 12,
            disposable: false,
            provider_due_day: Some(today.day()),
            supplier: Some("MegaCuentas".to_owned()),
            slots: profile_slots(4),
        })
        .await
        .map_err(|e| fail(&e))?;

    let _spare = ctx
        .inventory
        .create_account(NewAccount {
            service: "Netflix".to_owned(),
            email: "netflix-04@pool.example.com".to_owned(),
            password: "hunter2".to_owned(),
            activation_date: today,
            duration_months: 1,
            disposable: true,
            provider_due_day: None,
            supplier: None,
            slots: profile_slots(2),
        })
        .await
        .map_err(|e| fail(&e))?;

    // Ana and Marta paid part-way through the dying account's cycle: their
    // paid windows outlive the credential.
    let ana_start = today.checked_sub(Span::new().days(15)).map_err(|e| fail(&e))?;
    let marta_start = today.checked_sub(Span::new().days(20)).map_err(|e| fail(&e))?;

    ctx.allocation
        .allocate(
            NewSale {
                client_phone: Phone::new("3001234567"),
                client_name: "Ana".to_owned(),
                target: SaleTarget::Slot(dying.slots[0].uuid),
                price: 15_000,
                payment_method: PaymentMethod::Nequi,
                start_date: ana_start,
                months: 1,
                description: None,
            },
            now,
        )
        .await
        .map_err(|e| fail(&e))?;

    ctx.allocation
        .allocate(
            NewSale {
                client_phone: Phone::new("3029998877"),
                client_name: "Marta".to_owned(),
                target: SaleTarget::Slot(dying.slots[1].uuid),
                price: 15_000,
                payment_method: PaymentMethod::Bancolombia,
                start_date: marta_start,
                months: 1,
                description: None,
            },
            now,
        )
        .await
        .map_err(|e| fail(&e))?;

    // Luis comes due in three days on the renewable account.
    let luis_start = today
        .checked_add(Span::new().days(3))
        .and_then(|d| d.checked_sub(Span::new().months(1)))
        .map_err(|e| fail(&e))?;

    ctx.allocation
        .allocate(
            NewSale {
                client_phone: Phone::new("3017654321"),
                client_name: "Luis".to_owned(),
                target: SaleTarget::Slot(renewable.slots[0].uuid),
                price: 12_000,
                payment_method: PaymentMethod::Efectivo,
                start_date: luis_start,
                months: 1,
                description: None,
            },
            now,
        )
        .await
        .map_err(|e| fail(&e))?;

    // Ana reported her PIN compromised; the spare account covers the swap.
    // Marta stays on the dying account and surfaces as the critical alert.
    ctx.swaps
        .rotate(dying.slots[0].uuid)
        .await
        .map_err(|e| fail(&e))?;

    Ok(())
}

fn profile_slots(count: usize) -> Vec<NewSlot> {
    (1..=count)
        .map(|i| NewSlot {
            label: format!("Per {i}"),
            pin: Some(format!("{i}{i}{i}{i}")),
        })
        .collect()
}
