//! MIDI Commander
//!
//! Listens to every MIDI input, turns controller messages into semantic
//! commands and logs them through the console listener.

use anyhow::Result;
use clap::Parser;
use colored::*;
use std::rc::Rc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midi_commander::components::{ConsoleListener, ListNavigator};
use midi_commander::config::AppConfig;
use midi_commander::devices::{enable_all, DeviceManager, MidirDeviceManager};
use midi_commander::{relay, BindingTable, CommandDispatcher};

/// MIDI Commander - semantic commands from hardware encoders and buttons
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long)]
    log_file: Option<String>,

    /// List available MIDI input ports
    #[arg(long)]
    list_ports: bool,

    /// Print the active controller bindings
    #[arg(long)]
    show_bindings: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Keep the guard alive so the file writer flushes on exit
    let _log_guard = init_logging(&args.log_level, args.log_file.as_deref())?;

    info!("Starting MIDI Commander...");
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_or_default(&args.config).await?;
    let table = config.binding_table()?;

    if args.list_ports {
        list_ports(&config.midi.client_name)?;
        return Ok(());
    }

    if args.show_bindings {
        print_bindings(&table);
        return Ok(());
    }

    run_app(config, table).await
}

async fn run_app(config: AppConfig, table: BindingTable) -> Result<()> {
    let dispatcher = CommandDispatcher::new(table);
    dispatcher.add_listener(Rc::new(ConsoleListener::new()));

    // A focused list so encoder 1 has something to drive out of the box
    let tracks = Rc::new(ListNavigator::new(
        dispatcher.focus(),
        "Tracks",
        (1..=8).map(|i| format!("Track {}", i)).collect(),
    ));
    tracks.set_on_open(Box::new(|list, index| {
        info!(
            "Opening {} #{} ({})",
            list.title(),
            index,
            list.selected_item().unwrap_or("?")
        );
    }));
    dispatcher.add_listener(tracks.clone());
    tracks.grab_focus();

    let (sink, receiver) = relay::channel(config.midi.queue_capacity);
    let devices = MidirDeviceManager::new(config.midi.client_name.clone());
    let enabled = enable_all(&devices, &sink, &config.midi.devices);
    if enabled == 0 {
        warn!("No MIDI input enabled; waiting for Ctrl+C");
    }
    // Device callbacks own their senders; with none enabled, ours keeps the
    // relay open so the loop waits for Ctrl+C instead of ending at once
    let idle_sink = (enabled == 0).then_some(sink);

    info!("Ready to process MIDI events!");
    dispatcher.run(receiver, shutdown_signal()).await;
    drop(idle_sink);

    devices.disconnect_all();
    info!("MIDI Commander shutdown complete");
    Ok(())
}

fn init_logging(
    level: &str,
    log_dir: Option<&str>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false);

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "midi-commander.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C ({}), running until inputs close", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn list_ports(client_name: &str) -> Result<()> {
    let devices = MidirDeviceManager::new(client_name).available_devices()?;

    println!("\n{}", "=== MIDI Input Ports ===".bold().cyan());
    if devices.is_empty() {
        println!("  {}", "(none)".yellow());
    }
    for (index, device) in devices.iter().enumerate() {
        println!("  [{}] {} {}", index, device.name.green(), device.id.dimmed());
    }
    println!();
    Ok(())
}

fn print_bindings(table: &BindingTable) {
    println!("\n{}", "=== Controller Bindings ===".bold().cyan());
    for binding in table.iter() {
        println!(
            "  CC {:>3}  value {:<8} -> {}",
            binding.cc.to_string().yellow(),
            binding.value.to_string(),
            binding.command.to_string().green()
        );
    }
    println!("\n  {} binding(s)", table.len().to_string().green());
}
