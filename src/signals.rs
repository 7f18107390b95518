//! Run flags and the signal listeners that set them.
//!
//! Asynchronous events never touch loop state directly. They store one of
//! three atomic flags and wake the loop, which reads and clears the flags at
//! fixed checkpoints. A burst of resize signals therefore costs a single
//! layout recomputation.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;

/// Flags shared between asynchronous event sources and the run loop.
#[derive(Debug)]
pub struct RunFlags {
    shutdown: AtomicBool,
    resize: AtomicBool,
    input_failed: AtomicBool,
    wake: Notify,
}

impl RunFlags {
    /// New flags with a resize already pending, so the first frame
    /// measures the terminal.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shutdown: AtomicBool::new(false),
            resize: AtomicBool::new(true),
            input_failed: AtomicBool::new(false),
            wake: Notify::new(),
        })
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    /// Shut down and report failure: the input channel broke.
    pub fn fail_input(&self) {
        self.input_failed.store(true, Ordering::SeqCst);
        self.request_shutdown();
    }

    pub fn request_resize(&self) {
        self.resize.store(true, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn input_failed(&self) -> bool {
        self.input_failed.load(Ordering::SeqCst)
    }

    /// Consume a pending resize. Returns `true` at most once per burst.
    pub fn take_resize(&self) -> bool {
        self.resize.swap(false, Ordering::SeqCst)
    }

    /// Wait until any flag is set. A notification that arrived while nobody
    /// was waiting completes the next call immediately.
    pub async fn woken(&self) {
        self.wake.notified().await;
    }

    /// Exit status for a clean shutdown.
    pub fn exit_code(&self) -> i32 {
        if self.input_failed() {
            1
        } else {
            0
        }
    }
}

/// Install listeners: SIGWINCH requests a resize, SIGINT/SIGTERM/SIGQUIT
/// request shutdown.
///
/// Must be called from inside a tokio runtime.
pub fn listen(flags: &Arc<RunFlags>) -> io::Result<()> {
    let mut winch = signal(SignalKind::window_change())?;
    let resize_flags = Arc::clone(flags);
    tokio::spawn(async move {
        while winch.recv().await.is_some() {
            resize_flags.request_resize();
        }
    });

    for (kind, name) in [
        (SignalKind::interrupt(), "SIGINT"),
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::quit(), "SIGQUIT"),
    ] {
        let mut stream = signal(kind)?;
        let quit_flags = Arc::clone(flags);
        tokio::spawn(async move {
            if stream.recv().await.is_some() {
                log::info!("received {name}, shutting down");
                quit_flags.request_shutdown();
            }
        });
    }

    Ok(())
}
