// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! bt-syspopup entry point.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use bt_syspopup::bus::{DbusSink, Endpoints};
use bt_syspopup::config::{BusKind, Config};
use bt_syspopup::events::{self, EventLoop, MediatorEvent};
use bt_syspopup::presentation::{HeadlessPresenter, JsonLinesPresenter, PresentationPort};
use bt_syspopup::request::{parse_key_value, Bundle};
use bt_syspopup::session::SessionController;

/// Relay Bluetooth pairing and authorization prompts between the daemon and a UI.
#[derive(Debug, Parser)]
#[command(name = "bt-syspopup", version, about)]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/bt-syspopup/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use the session bus instead of the system bus
    #[arg(long)]
    session_bus: bool,

    /// Keep running after the first request has been answered
    #[arg(long)]
    resident: bool,

    /// Read further requests and decisions as JSON lines from stdin
    #[arg(long)]
    stdin: bool,

    /// Log requests instead of presenting them to a host UI
    #[arg(long)]
    headless: bool,

    /// Initial request as key=value pairs, e.g. event-type=pin-request
    #[arg(value_name = "KEY=VALUE", value_parser = parse_key_value)]
    fields: Vec<(String, String)>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout belongs to the host protocol.
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("Tracing already initialised: {}", e);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if cli.session_bus {
        config.bus = BusKind::Session;
    }
    if cli.resident {
        config.one_shot = false;
    }

    init_logging(&config.log_level);

    let initial: Bundle = cli.fields.into_iter().collect();
    if initial.is_empty() && !cli.stdin {
        anyhow::bail!("No request given: pass KEY=VALUE fields or --stdin");
    }

    info!("bt-syspopup {} starting", env!("CARGO_PKG_VERSION"));

    let endpoints = Endpoints::from_config(&config).context("Invalid bus names in config")?;

    let sink = match DbusSink::connect(config.bus) {
        Ok(sink) => sink,
        Err(e) => {
            error!("{}", e);
            return Err(e.into());
        }
    };

    let presenter: Box<dyn PresentationPort> = if cli.headless {
        Box::new(HeadlessPresenter::new())
    } else {
        Box::new(JsonLinesPresenter::new(std::io::stdout()))
    };

    let controller = SessionController::new(Box::new(sink), presenter, endpoints, config.one_shot);

    let (tx, rx) = mpsc::unbounded_channel();
    events::spawn_signal_handler(tx.clone());

    if !initial.is_empty() {
        info!("Initial request with {} field(s)", initial.len());
        tx.send(MediatorEvent::Bundle(initial))
            .context("Event loop is gone")?;
    }

    if cli.stdin {
        events::spawn_host_reader(BufReader::new(tokio::io::stdin()), tx.clone());
    }
    drop(tx);

    let mut event_loop = EventLoop::new(controller, rx);
    event_loop.run().await;

    info!("bt-syspopup exiting");
    Ok(())
}
