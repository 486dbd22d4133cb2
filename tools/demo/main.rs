//! Demo tool for the ANC300 driver.
//!
//! Runs the canonical usage sequence against the simulated controller:
//! open, read and change the step frequency, switch the axis into step
//! mode, set the drive amplitude, step forward and back with a blocking
//! wait in between, then close the session.
//!
//! ```text
//! cargo run --bin anc300_demo -- --axis 1 --steps 10
//! RUST_LOG=debug cargo run --bin anc300_demo -- --config anc300.toml
//! ```

use anc300::{Anc300, AxisMode, SimController};
use anc300::config::Settings;
use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "anc300_demo", about = "Drive a simulated ANC300 through the usual session")]
struct Args {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Axis slot to drive
    #[arg(long, default_value_t = 1)]
    axis: u8,

    /// Number of steps per move (sign is reversed for the return move)
    #[arg(long, default_value_t = 10)]
    steps: i32,

    /// Step frequency to set, in Hz
    #[arg(long, default_value_t = 200)]
    frequency: u32,

    /// Drive amplitude to set, in volts
    #[arg(long, default_value_t = 25)]
    amplitude: u32,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let settings = Settings::new(args.config.as_deref()).context("Failed to load settings")?;

    let backend = Box::new(SimController::new());
    let controller = Anc300::open_with_wait_timeout(
        &settings.instrument.name,
        &settings.instrument.address,
        backend,
        settings.wait_move_timeout(),
    )
    .await
    .context("Failed to open controller")?;

    for (id, module) in controller.axes() {
        info!("Detected {} (serial {})", id, module.serial);
    }

    settings
        .apply_axis_defaults(&controller)
        .await
        .context("Failed to apply configured axis defaults")?;

    let axis = controller.axis(args.axis)?;

    println!("{} frequency: {} Hz", axis.id(), axis.frequency().await?);
    axis.set_frequency(args.frequency).await?;
    println!("{} frequency: {} Hz", axis.id(), axis.frequency().await?);

    axis.set_mode(AxisMode::Step).await?;
    axis.set_amplitude(args.amplitude).await?;

    println!("Stepping {} by {}...", axis.id(), args.steps);
    axis.step_by(args.steps).await?;
    axis.wait_move().await?;

    println!("Stepping {} back by {}...", axis.id(), -args.steps);
    axis.step_by(-args.steps).await?;
    axis.wait_move().await?;

    controller.close().await?;
    println!("Session closed.");
    Ok(())
}
