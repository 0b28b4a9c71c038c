//! Disha - interactive IMU axis calibration
//!
//! Reads `IMU,...` lines from the robot's IMU board (or a simulator), lets
//! the operator collect gravity readings in six poses from the console, and
//! writes the firmware `setAxisMapping` call once every pose has data.

use clap::Parser;
use crossbeam_channel::{RecvTimeoutError, unbounded};
use disha::config::AppConfig;
use disha::control::commands::{self, Command, Console};
use disha::control::CalibrationService;
use disha::error::{Error, Result};
use disha::imu::{SampleIngestor, SampleSlot};
use disha::transport::{SerialTransport, SimulatedImu, Transport};
use log::{error, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port override
    #[arg(short, long)]
    port: Option<String>,

    /// Use the simulated IMU instead of the serial port
    #[arg(long)]
    simulate: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = args.port {
        config.hardware.port = port;
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    info!("Disha v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        info!("Using config: {}", path.display());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    spawn_signal_handler(Arc::clone(&shutdown))?;

    let slot = SampleSlot::new();
    let (transport, simulation): (Box<dyn Transport>, _) = if args.simulate {
        let imu = SimulatedImu::new(&config.simulation)?;
        let handle = imu.handle();
        info!(
            "Simulated IMU at {} Hz, mount {:?} invert {:?}",
            config.simulation.rate_hz,
            config.simulation.mount_permutation,
            config.simulation.mount_invert
        );
        (Box::new(imu), Some(handle))
    } else {
        let serial = SerialTransport::open(
            &config.hardware.port,
            config.hardware.baud_rate,
            config.hardware.read_timeout(),
        )?;
        info!(
            "IMU serial port {} at {} baud",
            serial.path(),
            config.hardware.baud_rate
        );
        (Box::new(serial), None)
    };

    let mut ingestor = SampleIngestor::start(
        transport,
        slot.clone(),
        config.hardware.retry_interval(),
        Arc::clone(&shutdown),
    )?;

    let service = Arc::new(CalibrationService::new(slot, &config));
    let console = Console::new(service, simulation);

    // Console input on its own thread; commands run here one at a time
    let (line_tx, line_rx) = unbounded::<String>();
    thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(|e| Error::Other(format!("Failed to spawn console thread: {}", e)))?;

    println!("{}", commands::help_text());

    while !shutdown.load(Ordering::Relaxed) {
        let line = match line_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(line) => line,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                info!("Console input closed");
                break;
            }
        };

        let command = match Command::parse(&line) {
            None => continue,
            Some(Ok(command)) => command,
            Some(Err(reason)) => {
                println!("{}", commands::error_reply(reason));
                continue;
            }
        };

        let reply = console.execute(&command);
        println!("{}", reply);
        if command == Command::Quit {
            break;
        }
    }

    info!("Shutting down...");
    if let Err(e) = ingestor.stop() {
        warn!("Ingestor shutdown: {}", e);
    }
    info!("Disha stopped");
    Ok(())
}

/// Raise `shutdown` on SIGINT or SIGTERM
fn spawn_signal_handler(shutdown: Arc<AtomicBool>) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            if let Some(sig) = signals.forever().next() {
                info!("Received signal {:?}, initiating shutdown...", sig);
                shutdown.store(true, Ordering::Relaxed);
            }
        })
        .map_err(|e| Error::Other(format!("Failed to spawn signal handler thread: {}", e)))?;
    Ok(())
}
