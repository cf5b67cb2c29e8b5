//! Termination-signal handling for long-running bulk commands.
//!
//! The listener runs on its own task and only cancels a token; the
//! submission loop notices the cancellation, stops, and the command then
//! reports what was done and logs what was not.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::scanner::ScannedFile;

/// A running signal listener. Releasing it reports whether a signal was
/// ever received, independently of who else cancelled the work token.
#[derive(Debug)]
pub struct InterruptListener {
    handle: JoinHandle<()>,
    release: CancellationToken,
    signalled: Arc<AtomicBool>,
}

impl InterruptListener {
    /// Stops listening and returns whether a signal arrived at any point.
    /// Signals already delivered to the runtime are handled before release.
    pub async fn release(self) -> bool {
        // let the driver deliver a pending signal before we stop listening
        tokio::task::yield_now().await;
        self.release.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Interrupt listener did not shut down cleanly");
        }
        self.signalled.load(Ordering::Acquire)
    }
}

/// Listens for SIGINT/SIGTERM (Ctrl+C only on non-unix) until released.
/// On a signal, prints its name to stderr, records it and cancels `cancel`.
pub fn spawn_listener(cancel: CancellationToken) -> InterruptListener {
    let release = CancellationToken::new();
    let signalled = Arc::new(AtomicBool::new(false));
    let handle = {
        let release = release.clone();
        let signalled = Arc::clone(&signalled);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                signal = wait_for_signal() => {
                    warn!(signal, "Received termination signal, stopping submission");
                    eprintln!("{signal}");
                    signalled.store(true, Ordering::Release);
                    cancel.cancel();
                }
                _ = release.cancelled() => {
                    info!("Interrupt listener released");
                }
            }
        })
    };
    InterruptListener {
        handle,
        release,
        signalled,
    }
}

async fn wait_for_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "interrupt",
        _ = terminate => "terminated",
    }
}

/// Files whose submission has not succeeded, in scan order.
pub fn not_uploaded(files: &[ScannedFile]) -> Vec<&ScannedFile> {
    files.iter().filter(|f| !f.is_uploaded()).collect()
}

/// Writes `"<N> files weren't uploaded:"` followed by one path per line.
/// Writes nothing when every file was uploaded. Returns N.
pub fn write_not_uploaded<W: Write>(files: &[ScannedFile], mut out: W) -> io::Result<usize> {
    let pending = not_uploaded(files);
    if pending.is_empty() {
        return Ok(0);
    }
    writeln!(out, "{} files weren't uploaded:", pending.len())?;
    for file in &pending {
        writeln!(out, "{}", file.path.display())?;
    }
    out.flush()?;
    Ok(pending.len())
}

/// Opens the log destination: `logfile` when set (truncated), else stderr.
pub fn open_log_writer(logfile: Option<&Path>) -> io::Result<Box<dyn Write + Send>> {
    match logfile {
        Some(path) => Ok(Box::new(File::create(path)?)),
        None => Ok(Box::new(io::stderr())),
    }
}

/// Writes the not-uploaded log to `logfile` or stderr. Returns the count.
pub fn log_not_uploaded(files: &[ScannedFile], logfile: Option<&Path>) -> io::Result<usize> {
    if not_uploaded(files).is_empty() {
        return Ok(0);
    }
    let writer = open_log_writer(logfile)?;
    let count = write_not_uploaded(files, writer)?;
    info!(count, logfile = ?logfile, "Logged files that were not uploaded");
    Ok(count)
}
