//! File watching for hot config reloading.
//!
//! Watches the directory holding `plugtimer.toml` and sends a reload message
//! to the control loop whenever the file is written, replaced or removed.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use super::get_config_path;
use crate::constants::CONFIG_WATCH_DEBOUNCE_MS;
use crate::io::signals::SignalMessage;

/// Whether a filesystem event touches the watched config file.
///
/// Editors often save through a temporary sibling (`plugtimer.toml~`,
/// `.plugtimer.toml.swp`), so names containing the file name also count.
fn affects_config(event: &Event, config_path: &Path) -> bool {
    let Some(config_name) = config_path.file_name().and_then(OsStr::to_str) else {
        return false;
    };
    event.paths.iter().any(|path| {
        path.parent() == config_path.parent()
            && path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|name| name.contains(config_name))
    })
}

/// Start watching the configuration file for changes.
///
/// Spawns a background thread owning the watcher. Events arriving within the
/// debounce window of the last reload are ignored. The thread exits once the
/// control loop drops its receiver.
pub fn start_config_watcher(signal_sender: Sender<SignalMessage>, debug_enabled: bool) -> Result<()> {
    let config_path: PathBuf = get_config_path()?;
    let Some(config_dir) = config_path.parent().map(Path::to_path_buf) else {
        return Ok(());
    };
    if !config_dir.is_dir() {
        if debug_enabled {
            log_pipe!();
            log_debug!("Config directory missing, hot reload disabled");
        }
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| {
            if let Ok(event) = res
                && matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                )
            {
                let _ = tx.send(event);
            }
        },
        NotifyConfig::default(),
    )
    .context("Failed to create file watcher")?;

    // Watching the directory survives editors that replace the file
    watcher
        .watch(&config_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch directory: {}", config_dir.display()))?;

    if debug_enabled {
        log_pipe!();
        log_debug!("Watching {} for changes", config_path.display());
    }

    thread::spawn(move || {
        let _watcher = watcher;
        let debounce = Duration::from_millis(CONFIG_WATCH_DEBOUNCE_MS);
        let mut last_reload: Option<Instant> = None;

        for event in rx {
            if !affects_config(&event, &config_path) {
                continue;
            }
            if last_reload.is_some_and(|at| at.elapsed() < debounce) {
                continue;
            }

            if debug_enabled {
                log_pipe!();
                log_info!("Configuration file change detected");
            }
            if signal_sender.send(SignalMessage::Reload).is_err() {
                break;
            }
            last_reload = Some(Instant::now());
        }
    });

    Ok(())
}
