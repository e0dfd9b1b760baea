//! MQTT bridge for the Actiontec C3000A DSL modem.

use anyhow::{Context, Result};
use clap::Parser;
use dslsight_bridge_framework::BridgeRunner;

use mqtt_bridge_c3000a::adapter::C3000aAdapter;
use mqtt_bridge_c3000a::config::Cli;
use mqtt_bridge_c3000a::poller::{PollLoop, PollSchedule, TokioSleeper};
use mqtt_bridge_c3000a::source::HttpStatusSource;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // File, then CLI and environment overrides
    let config = cli.resolve().context("Invalid configuration")?;

    let mut runner = BridgeRunner::new_with_args("c3000a", config, Some(&cli.bridge))
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    let modem = runner.config().modem.clone();
    let publish = runner.config().publish.clone();

    let source = HttpStatusSource::new(&modem)?;
    let adapter = C3000aAdapter::new(&modem.address);
    let bus = runner
        .connect_bus()
        .map_err(|e| anyhow::anyhow!("Failed to connect to MQTT: {}", e))?;

    tracing::info!(
        modem = %modem.address,
        login = !modem.password.is_empty(),
        interval_secs = modem.poll_interval_secs,
        "C3000A bridge configured"
    );

    let poller = PollLoop::new(
        source,
        adapter,
        bus,
        TokioSleeper,
        PollSchedule::new(modem.poll_interval()),
        &publish,
    );

    runner.spawn(poller.run());

    // Run until Ctrl+C
    runner.run().await.map_err(|e| anyhow::anyhow!("{}", e))
}
