//! GSN Simulator daemon
//!
//! Stands in for a GPRS Support Node on the GTP-C port: answers every
//! Echo Request with the matching Echo Response, optionally duplicating,
//! dropping or delaying replies to exercise peers under imperfect
//! delivery. One positional argument picks the delivery mode for the
//! whole session.

use std::io;
use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use gsn_core::{DeliveryPolicy, Scheduler};
use gsn_gtp::GTPC_UDP_PORT;

pub mod gtp_path;

/// Receive buffer for one datagram; echo headers are at most 12 bytes,
/// anything larger is dropped by the codec after truncation
const RECV_BUF_LEN: usize = 1024;

/// Receive timeout so the main loop keeps re-checking the running flag
const SOCKET_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// GSN Simulator - GTP-C echo responder
#[derive(Parser, Debug)]
#[command(name = "gsnsimd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "GTP-C Echo Request responder with lossy delivery modes")]
struct Args {
    /// Delivery mode: normal, dup, random or jitter
    mode: Option<String>,

    /// UDP port to listen on
    #[arg(short, long, default_value_t = GTPC_UDP_PORT)]
    port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Map the mode argument onto a session delivery policy
fn select_policy(mode: Option<&str>) -> DeliveryPolicy {
    match mode {
        None | Some("normal") => DeliveryPolicy::Immediate,
        Some("dup") => DeliveryPolicy::FixedCount(2),
        Some("random") => DeliveryPolicy::RandomCount { min: 0, max: 2 },
        Some("jitter") => DeliveryPolicy::Jittered {
            min_delay: Duration::ZERO,
            max_delay: Duration::from_secs(1),
        },
        Some(other) => {
            log::warn!("Unknown mode '{}', using normal", other);
            DeliveryPolicy::Immediate
        }
    }
}

/// Simulator application state
pub struct GsnSimApp {
    /// Running flag
    running: Arc<AtomicBool>,
}

impl GsnSimApp {
    /// Create a new simulator application
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Run the receive loop until a shutdown signal arrives
    ///
    /// Malformed or non-echo datagrams are dropped inside the path
    /// handler; only transport failures end the loop.
    pub fn run(
        &self,
        socket: &UdpSocket,
        sched: &Scheduler,
        policy: DeliveryPolicy,
    ) -> Result<()> {
        log::info!("GSN Simulator running...");

        let mut rng = rand::rng();
        let mut buf = [0u8; RECV_BUF_LEN];
        while self.running.load(Ordering::SeqCst) {
            let (len, from) = match socket.recv_from(&mut buf) {
                Ok(v) => v,
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    continue
                }
                Err(e) => return Err(e).context("Socket receive failed"),
            };
            gtp_path::handle_datagram(socket, sched, policy, &mut rng, &buf[..len], from)
                .context("Echo Response transmission failed")?;
        }

        log::info!("GSN Simulator main loop exited");
        Ok(())
    }

    /// Signal the application to stop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Get the running flag for signal handlers and worker threads
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }
}

impl Default for GsnSimApp {
    fn default() -> Self {
        Self::new()
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    log::info!("GSN Simulator v{}", env!("CARGO_PKG_VERSION"));

    let policy = select_policy(args.mode.as_deref());
    log::info!("Delivery policy: {:?}", policy);

    // Create simulator application
    let app = GsnSimApp::new();

    // Setup signal handlers
    let running = app.running_flag();
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    // IPv6 family; dual-stack reachability depends on the environment
    let bind = format!("[::]:{}", args.port);
    let socket = Arc::new(
        UdpSocket::bind(&bind).with_context(|| format!("Failed to bind UDP socket on {bind}"))?,
    );
    socket.set_read_timeout(Some(SOCKET_READ_TIMEOUT))?;
    log::info!("Listening on [{}]", socket.local_addr()?);

    // Dispatcher thread transmits delayed replies when they fall due
    let sched = Arc::new(Scheduler::new());
    let dispatcher = {
        let sched = Arc::clone(&sched);
        let socket = Arc::clone(&socket);
        let running = app.running_flag();
        thread::spawn(move || {
            if let Err(e) = sched.run(&socket, &running) {
                log::error!("Dispatcher send failed: {e}");
                std::process::exit(1);
            }
        })
    };

    // Run main loop
    app.run(&socket, &sched, policy)?;

    // Shutdown
    app.stop();
    if dispatcher.join().is_err() {
        log::error!("Dispatcher thread panicked");
    }

    log::info!("GSN Simulator terminated");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
