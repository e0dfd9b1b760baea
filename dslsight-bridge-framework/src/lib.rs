//! DSLSight Bridge Framework
//!
//! Common abstractions for building bridges that poll devices and publish to MQTT.
//!
//! # Overview
//!
//! This framework provides:
//! - [`BridgeConfig`] trait for configuration loading and validation
//! - [`BridgeRunner`] for managing bridge lifecycle (startup, shutdown, signal handling)
//! - [`MessageBus`] as the seam between bridge logic and the broker
//! - [`MqttBus`] for publishing to MQTT with last-will management
//! - [`BridgeArgs`] for common CLI/environment argument parsing
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use dslsight_bridge_framework::{BridgeArgs, BridgeConfig, BridgeRunner};
//!
//! #[derive(Parser)]
//! struct Cli {
//!     #[command(flatten)]
//!     bridge: BridgeArgs,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cli = Cli::parse();
//!     let config = MyBridgeConfig::load("mybridge.json5")?;
//!
//!     let mut runner = BridgeRunner::new_with_args("mybridge", config, Some(&cli.bridge))?;
//!
//!     // Spawn protocol-specific workers
//!     let bus = runner.connect_bus()?;
//!     runner.spawn(my_worker(bus));
//!
//!     // Run until Ctrl+C
//!     runner.run().await?;
//!     Ok(())
//! }
//! ```

mod args;
mod config;
mod error;
mod mqtt;
mod publisher;
mod runner;

pub use args::BridgeArgs;
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use mqtt::MqttBus;
pub use publisher::{MessageBus, PublishStats};
pub use runner::BridgeRunner;

// Re-export commonly used types from dslsight-common
pub use dslsight_common::{BusMessage, LoggingConfig, MqttConfig, Payload, QoS};
