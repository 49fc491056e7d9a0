//! Channel-fed collector.
//!
//! Motion events are pushed through a bounded channel instead of being read
//! from the OS. Used on platforms without a native capture backend, for
//! replaying recorded motion, and in tests.

use crate::collector::types::RawMotionEvent;
use crate::collector::CollectorError;
use crate::core::MotionEngine;
use crossbeam_channel::{bounded, select, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A collector whose events come from [`ChannelCollector::sender`].
pub struct ChannelCollector {
    sender: Sender<RawMotionEvent>,
    receiver: Receiver<RawMotionEvent>,
    stop_tx: Option<Sender<()>>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl ChannelCollector {
    pub fn new() -> Self {
        // Use a bounded channel to prevent unbounded memory growth
        let (sender, receiver) = bounded(10_000);
        Self {
            sender,
            receiver,
            stop_tx: None,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }

    /// Handle for feeding events to the capture thread.
    pub fn sender(&self) -> Sender<RawMotionEvent> {
        self.sender.clone()
    }

    /// Move `engine` onto a capture thread and start draining events.
    pub fn start(&mut self, mut engine: MotionEngine) -> Result<(), CollectorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        let (stop_tx, stop_rx) = bounded::<()>(1);
        let receiver = self.receiver.clone();
        let running = self.running.clone();
        running.store(true, Ordering::SeqCst);

        let handle = thread::Builder::new()
            .name("gyrogravity-capture".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(receiver) -> msg => match msg {
                            Ok(event) => {
                                if event.is_synthetic() {
                                    engine.stats().record_echo_filtered();
                                    continue;
                                }
                                engine.handle(event);
                            }
                            Err(_) => break,
                        },
                        recv(stop_rx) -> _ => break,
                    }
                }
                engine.shutdown();
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CollectorError::Thread(e.to_string())
            })?;

        self.stop_tx = Some(stop_tx);
        self.thread_handle = Some(handle);
        tracing::info!("Channel collector started");
        Ok(())
    }

    /// Stop the capture thread and wait for it to drop the engine.
    pub fn stop(&mut self) {
        // Dropping the stop sender wakes the select loop
        self.stop_tx.take();
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                tracing::error!("Capture thread panicked");
            }
            self.running.store(false, Ordering::SeqCst);
            tracing::info!("Channel collector stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for ChannelCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChannelCollector {
    fn drop(&mut self) {
        self.stop();
    }
}
