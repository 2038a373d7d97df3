// Garrison Gate - Development Server
// Serves the gate JSON contract from memory so the dashboard can run
// without the production backend.

use anyhow::{Context, Result};
use garrison_gate::dev_server::{router, DevState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    println!("🧪 Garrison Gate - Development Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let addr = std::env::var("GATE_DEV_ADDR").unwrap_or_else(|_| {
        info!("GATE_DEV_ADDR not set, using default: 0.0.0.0:3000");
        "0.0.0.0:3000".to_string()
    });

    let app = router(DevState::seeded());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    println!("\n🚀 Server running on http://{}", addr);
    println!("   Guests:   GET  /api/guests/checked-in");
    println!("   Entries:  GET  /api/master-entries/checked-in");
    println!("   People:   GET  /api/people");
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
