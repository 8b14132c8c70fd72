//! Unix signal handling.
//!
//! SIGINT, SIGTERM and SIGHUP stop the control loop; SIGUSR2 asks it to
//! reload the configuration file. The config watcher feeds the same channel.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::{
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    sync::mpsc::{Receiver, Sender, channel},
    thread,
};

/// Messages delivered to the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalMessage {
    /// Reload the configuration file (SIGUSR2 or a file change).
    Reload,
    /// Stop the loop (SIGTERM, SIGINT, SIGHUP).
    Shutdown,
}

/// Signal handling state shared between threads.
pub struct SignalState {
    /// Cleared when the application should stop.
    pub running: Arc<AtomicBool>,
    pub signal_receiver: Receiver<SignalMessage>,
    /// Cloned into the config watcher.
    pub signal_sender: Sender<SignalMessage>,
}

impl SignalState {
    /// Channel and running flag with no OS handlers attached.
    pub fn new() -> Self {
        let (signal_sender, signal_receiver) = channel();
        Self {
            running: Arc::new(AtomicBool::new(true)),
            signal_receiver,
            signal_sender,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for SignalState {
    fn default() -> Self {
        Self::new()
    }
}

/// Register OS signal handlers on a background thread.
pub fn setup_signal_handler(debug_enabled: bool) -> Result<SignalState> {
    let state = SignalState::new();
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running = state.running.clone();
    let sender = state.signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGUSR2 => {
                    log_pipe!();
                    log_info!("Received configuration reload signal");
                    if sender.send(SignalMessage::Reload).is_err() {
                        break;
                    }
                }
                _ => {
                    log_pipe!();
                    if debug_enabled {
                        log_info!("Received signal {sig}, initiating graceful shutdown...");
                    } else {
                        log_info!("Received termination request, initiating graceful shutdown...");
                    }
                    if let Err(e) = sender.send(SignalMessage::Shutdown) {
                        log_warning!("Failed to send shutdown message: {e}");
                    }
                    running.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
    });

    Ok(state)
}
