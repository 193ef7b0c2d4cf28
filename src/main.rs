// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{crate_version, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use saberhum::{audio, config, controller};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A motion-reactive lightsaber hum engine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start will run the hum engine until its driver closes.
    Start {
        /// The path to the engine config.
        config_path: PathBuf,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Verifies that the config parses and every sound decodes.
    Verify {
        /// The path to the engine config.
        config_path: PathBuf,
    },
    /// Runs the hum engine against a recorded sensor trace.
    Replay {
        /// The path to the engine config.
        config_path: PathBuf,
        /// The path to the trace.
        trace_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config_path } => {
            let mut controller = config::init_controller(&config_path, None)?;
            let playback = controller.join().await?;
            println!("Engine stopped ({}).", playback.state());
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Verify { config_path } => {
            let engine = config::parse_engine(&config_path)?;
            println!("Audio device: {}", engine.audio().device());

            let mut failed = false;
            for (label, path) in engine.sounds().all() {
                match audio::decode::decode_file(path) {
                    Ok(decoded) => println!(
                        "- {}: {} ({} channels, {} Hz, {:.2}s)",
                        label,
                        path.display(),
                        decoded.channel_count(),
                        decoded.sample_rate(),
                        decoded.duration().as_secs_f32(),
                    ),
                    Err(e) => {
                        failed = true;
                        println!("- {}: {} FAILED: {}", label, path.display(), e);
                    }
                }
            }

            if failed {
                return Err("one or more sounds failed to decode".into());
            }
        }
        Commands::Replay {
            config_path,
            trace_path,
        } => {
            let driver: Arc<dyn controller::Driver> =
                Arc::new(controller::trace::Driver::from_file(&trace_path)?);
            let mut controller = config::init_controller(&config_path, Some(driver))?;
            let playback = controller.join().await?;
            println!("Replay finished ({}).", playback.state());
        }
    }

    Ok(())
}
