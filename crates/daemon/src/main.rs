// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for the `quaerod` binary: starts a [`qo_daemon::Daemon`] and
//! blocks until it's signalled to stop. No CLI flags — configuration comes
//! entirely from the environment (§6).

use qo_daemon::{Daemon, DaemonConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "qo_daemon=info,qo_engine=info".into()))
        .init();

    let config = DaemonConfig::from_env()?;
    let daemon = Daemon::start(config)?;

    tracing::info!("quaerod started");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    daemon.stop().await;
    Ok(())
}
