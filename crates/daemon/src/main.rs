// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! burrowd: declarative tunnel control-plane daemon.

use std::path::PathBuf;
use std::sync::Arc;

use burrow_adapters::{
    ContainerInspector, DockerInspector, NetProtocolDetector, NoopTunnelFactory, ProtocolDetector,
    TunnelFactory,
};
use burrow_core::SystemClock;
use burrow_daemon::{env, http, lifecycle};
use burrow_engine::{Reconciler, ReconcilerConfig};
use burrow_store::{FileStore, Store};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "burrowd", version, about = "Tunnel control-plane daemon")]
struct Args {
    /// Unix domain socket to listen on
    #[arg(long, default_value = env::DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Persisted state file (defaults to state.json under the state dir)
    #[arg(long)]
    state_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), lifecycle::LifecycleError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = lifecycle::Config::load(args.socket, args.state_file)?;
    info!(
        socket = %config.socket_path.display(),
        state = %config.state_path.display(),
        "starting burrowd"
    );

    let store = Arc::new(FileStore::new(&config.state_path));
    // The tunnel backend is the single integration seam; builds without a
    // vendor SDK run with the noop factory and report the agent offline.
    let tunnels: Arc<dyn TunnelFactory> = Arc::new(NoopTunnelFactory);
    let detector: Arc<dyn ProtocolDetector> = Arc::new(NetProtocolDetector::new());
    let inspector: Arc<dyn ContainerInspector> = Arc::new(DockerInspector::default());

    let reconciler = Reconciler::spawn(
        Arc::clone(&store) as Arc<dyn Store>,
        tunnels,
        detector,
        SystemClock,
        ReconcilerConfig {
            client_name: "burrow-docker-extension".to_string(),
            client_version: env::extension_version(),
            bridge_host: env::bridge_host(),
            converge_interval: Some(env::converge_interval()),
        },
    );

    // Resurrect whatever the persisted state wants before accepting requests.
    if let Err(e) = reconciler.converge().await {
        warn!(error = %e, "initial convergence failed");
    }

    let listener = lifecycle::bind_socket(&config.socket_path)?;
    let shutdown = CancellationToken::new();
    let app = http::AppState {
        store: Arc::clone(&store) as Arc<dyn Store>,
        reconciler: Arc::clone(&reconciler),
        inspector,
    };
    let server = tokio::spawn(http::serve(listener, http::router(app), shutdown.clone()));

    wait_for_signal().await;
    info!("shutting down");

    shutdown.cancel();
    reconciler.shutdown().await;
    let _ = server.await;
    lifecycle::remove_socket(&config.socket_path);
    Ok(())
}

async fn wait_for_signal() {
    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
    {
        Ok(signal) => signal,
        Err(e) => {
            warn!(error = %e, "failed to install SIGTERM handler");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}
