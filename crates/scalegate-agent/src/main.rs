//! Scalegate gateway binary.
//!
//! # Usage
//!
//! ```bash
//! # Backend lifecycle only (no scales attached)
//! scalegate --base-url http://backend:8000
//!
//! # One weighing station per serial port
//! scalegate --base-url http://backend:8000 --port /dev/ttyUSB0 --port /dev/ttyUSB1
//! ```

use clap::Parser;
use scalegate_agent::{AgentConfig, ApiClient, GatewayAgent, GatewayStore, HostIdentity};
use scalegate_station::{
    ChannelSink, SerialPortOpener, WeighingWorker, WorkerConfig,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Headless gateway agent for Suwol1000 weighing stations
#[derive(Parser, Debug)]
#[command(name = "scalegate")]
#[command(about = "Headless gateway agent for Suwol1000 weighing stations")]
#[command(version)]
struct Args {
    /// Backend base URL
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// Path to the local gateway database
    #[arg(long, default_value = "scalegate.redb")]
    db: std::path::PathBuf,

    /// Serial port of an attached weighing station (repeatable)
    #[arg(short, long = "port")]
    ports: Vec<String>,

    /// Device id echoed into every indicator request
    #[arg(long, default_value = "0")]
    device_id: u8,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("scalegate starting");
    tracing::info!("Backend {}", args.base_url);

    // A database that cannot open is the one unrecoverable startup error.
    let store = GatewayStore::open(&args.db)?;

    let identity = HostIdentity::detect();
    tracing::info!(
        mac = %identity.mac_address,
        host = %identity.hostname,
        ip = %identity.ip_address,
        "host identity"
    );

    let api = ApiClient::new(&args.base_url)?;

    let (sink, mut events) = ChannelSink::new();

    let mut stop_flags = Vec::new();
    let mut workers = Vec::new();
    for port in &args.ports {
        let config = WorkerConfig { device_id: args.device_id, ..WorkerConfig::default() };
        let mut worker =
            WeighingWorker::new(SerialPortOpener::new(port.as_str()), sink.clone(), config);
        stop_flags.push(worker.stop_flag());

        let thread = std::thread::Builder::new()
            .name(format!("station-{port}"))
            .spawn(move || worker.run())?;
        workers.push(thread);
        tracing::info!(%port, "weighing worker spawned");
    }
    if args.ports.is_empty() {
        tracing::warn!("no serial ports configured; running the backend lifecycle only");
    }

    let consumer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    tracing::info!(id = %event.id, kind = ?event.kind, "station event");
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(dropped)) => {
                    tracing::warn!(dropped, "station events dropped");
                },
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let mut agent = GatewayAgent::new(api, store, identity, AgentConfig::default());

    tokio::select! {
        () = agent.run() => {},
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("shutdown requested"),
            Err(err) => tracing::error!(%err, "signal handler failed"),
        },
    }

    for flag in &stop_flags {
        flag.request_stop();
    }
    for worker in workers {
        if worker.join().is_err() {
            tracing::error!("weighing worker thread panicked");
        }
    }
    consumer.abort();

    tracing::info!("scalegate stopped");
    Ok(())
}
