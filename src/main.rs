// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `lighthouse-bridge` - switch Lighthouse V2 base stations from the command
//! line or over MQTT.
//!
//! # Usage
//!
//! ```bash
//! # Switch two base stations on, then keep serving the command topic
//! lighthouse-bridge ON AA:BB:CC:DD:EE:FF 11:22:33:44:55:66
//!
//! # Put one in standby and exit
//! lighthouse-bridge --no-subscribe OFF AA:BB:CC:DD:EE:FF
//!
//! # Only serve the command topic, on a different broker
//! lighthouse-bridge --broker 10.0.0.5 --username lh --password secret
//! ```
//!
//! Logging is controlled with `RUST_LOG` (default `info`).

use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use lighthouse_bridge::config::{DEFAULT_COMMAND_TOPIC, DEFAULT_STATUS_TOPIC};
use lighthouse_bridge::protocol::DEFAULT_COMMAND_QUEUE_CAPACITY;
use lighthouse_bridge::{
    BleConfig, BleConnector, Bridge, Command, CommandDispatcher, MqttBridge, PowerController,
    RetryPolicy, TopicConfig, UnconfirmedPolicy,
};

/// Default broker address.
const DEFAULT_BROKER: &str = "192.168.14.12";

/// Switch Lighthouse V2 base stations over Bluetooth LE, driven by MQTT.
#[derive(Debug, Parser)]
#[command(name = "lighthouse-bridge", version, about)]
struct Cli {
    /// `ON` or `OFF`; when given, applied once at startup to ADDRESSES
    command: Option<String>,

    /// Base station MAC addresses (AA:BB:CC:DD:EE:FF)
    addresses: Vec<String>,

    /// MQTT broker host, optionally as mqtt://host:port
    #[arg(long, env = "LIGHTHOUSE_BROKER", default_value = DEFAULT_BROKER)]
    broker: String,

    /// MQTT broker port, used when --broker carries none
    #[arg(long, env = "LIGHTHOUSE_BROKER_PORT", default_value_t = 1883)]
    port: u16,

    /// MQTT username
    #[arg(long, env = "LIGHTHOUSE_MQTT_USERNAME", requires = "password")]
    username: Option<String>,

    /// MQTT password
    #[arg(long, env = "LIGHTHOUSE_MQTT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Topic to receive commands on
    #[arg(long, default_value = DEFAULT_COMMAND_TOPIC)]
    command_topic: String,

    /// Topic to publish status events on
    #[arg(long, default_value = DEFAULT_STATUS_TOPIC)]
    status_topic: String,

    /// Write/read cycles per base station
    #[arg(long, default_value_t = 3)]
    attempts: u32,

    /// Pause between a write and its confirmation read, in milliseconds
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,

    /// How long to scan for a base station, in seconds
    #[arg(long, default_value_t = 10)]
    scan_timeout_secs: u64,

    /// What to publish when a base station never confirms the new state
    #[arg(long, value_enum, default_value_t = ReportUnconfirmed::Nothing)]
    report_unconfirmed: ReportUnconfirmed,

    /// Commands that may wait while one is being applied; more are dropped
    #[arg(long, default_value_t = DEFAULT_COMMAND_QUEUE_CAPACITY)]
    queue_capacity: usize,

    /// Exit after the startup command instead of serving the command topic
    #[arg(long)]
    no_subscribe: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReportUnconfirmed {
    /// Publish nothing
    Nothing,
    /// Publish the requested state
    Target,
    /// Publish the state last read from the device
    Observed,
}

impl From<ReportUnconfirmed> for UnconfirmedPolicy {
    fn from(value: ReportUnconfirmed) -> Self {
        match value {
            ReportUnconfirmed::Nothing => Self::Suppress,
            ReportUnconfirmed::Target => Self::ReportTarget,
            ReportUnconfirmed::Observed => Self::ReportObserved,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Bridge stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> lighthouse_bridge::Result<()> {
    tracing::info!("=== LightHouse V2 Manager ===");

    let batch = match cli.command.as_deref() {
        None => None,
        Some(word) => {
            let args = std::iter::once(word.to_string()).chain(cli.addresses.iter().cloned());
            match Command::from_args(args) {
                Ok(command) => Some(command),
                Err(e) => {
                    tracing::error!(error = %e, "Expected ON or OFF, no base stations switched");
                    None
                }
            }
        }
    };

    if cli.no_subscribe && batch.is_none() {
        return Ok(());
    }

    let ble = BleConfig::new().with_scan_timeout(Duration::from_secs(cli.scan_timeout_secs));
    let policy = RetryPolicy::new()
        .with_max_attempts(cli.attempts)
        .with_settle_delay(Duration::from_millis(cli.settle_ms));

    let connector = BleConnector::new(ble).await?;
    let dispatcher = CommandDispatcher::new(PowerController::with_policy(connector, policy))
        .with_unconfirmed_policy(cli.report_unconfirmed.into());

    let mut builder = MqttBridge::builder()
        .port(cli.port)
        .broker_url(&cli.broker)?
        .topics(TopicConfig::new(cli.command_topic, cli.status_topic))
        .command_queue_capacity(cli.queue_capacity);
    if let (Some(username), Some(password)) = (cli.username, cli.password) {
        builder = builder.credentials(username, password);
    }
    let (broker, inbound) = builder.build().await?;

    let bridge = Bridge::new(dispatcher, broker.clone());
    let shutdown = shutdown_signal();

    if let Some(command) = batch {
        bridge.run_batch(command).await;
    }

    if !cli.no_subscribe {
        bridge.serve_until(inbound, shutdown).await;
    }

    broker.disconnect().await?;
    Ok(())
}

/// Listens for Ctrl-C from now on and resolves once it is received.
///
/// While a command is being applied the signal is only recorded, so the
/// command still finishes and closes its sessions.
fn shutdown_signal() -> impl Future<Output = ()> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutting down");
                let _ = tx.send(());
            }
            Err(e) => tracing::warn!(error = %e, "Failed to listen for Ctrl-C"),
        }
    });

    async move {
        if rx.await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
