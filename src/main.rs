// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::EnvFilter;

use garrison_gate::cnic;
use garrison_gate::config::{Command, GateConfig, USAGE};
use garrison_gate::HttpGateApi;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config = GateConfig::from_env()?;
    match config.apply_args(&args)? {
        Command::Help => print!("{}", USAGE),
        Command::Status => run_status(&config)?,
        Command::Dashboard => run_ui_mode(&config)?,
    }

    Ok(())
}

/// The terminal belongs to the dashboard, so logs go to a file
#[cfg(feature = "tui")]
fn init_file_logging(config: &GateConfig) -> Result<()> {
    let file = std::fs::File::create(&config.log_file)
        .with_context(|| format!("Failed to create log file {}", config.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

fn run_status(config: &GateConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    config.log_summary();

    println!("🛡️  Garrison Gate - status");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🌐 Backend: {}", config.base_url);

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let api = HttpGateApi::from_config(config)?;

    let (guests, entries) = runtime.block_on(async {
        tokio::try_join!(api.checked_in_guests(), api.checked_in_master_entries())
    })?;

    println!("\n👥 Checked-in guests: {}", guests.len());
    for guest in &guests {
        println!(
            "   • {} ({}) visiting {} since {}",
            guest.guest_name,
            cnic::display(&guest.guest_cnic),
            guest.host_name,
            guest.check_in_time
        );
    }

    let people: i64 = entries.iter().map(|e| e.people_count).sum();
    println!("\n🚌 Master entries: {} ({} people)", entries.len(), people);
    for entry in &entries {
        println!(
            "   • {} x{} since {}",
            entry.description, entry.people_count, entry.check_in_time
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Inside the gate: {}", guests.len() as i64 + people);

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &GateConfig) -> Result<()> {
    use garrison_gate::Dispatcher;
    use std::sync::Arc;

    println!("🖥️  Loading Garrison Gate dashboard...\n");
    init_file_logging(config)?;
    tracing::info!("dashboard starting");
    config.log_summary();

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let api = Arc::new(HttpGateApi::from_config(config)?);
    let (dispatcher, mut completions) = Dispatcher::new(runtime.handle().clone(), api);

    let mut app = ui::App::new(config);
    ui::run_ui(&mut app, &dispatcher, &mut completions)?;

    println!("\n✅ Dashboard closed (log: {})", config.log_file.display());

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &GateConfig) -> Result<()> {
    eprintln!("❌ Dashboard not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or print a summary: garrison-gate status");
    std::process::exit(1);
}
