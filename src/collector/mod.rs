//! Motion capture and injection.
//!
//! Collectors own the capture thread. Starting one moves a
//! [`MotionEngine`](crate::core::MotionEngine) onto that thread; stopping it
//! joins the thread, which drops the engine and every capture resource.

pub mod channel;
pub mod inject;
pub mod types;

#[cfg(windows)]
pub mod win32;

use thiserror::Error;

// Re-export commonly used types
pub use channel::ChannelCollector;
pub use inject::{InjectedMove, InjectionError, MotionInjector, NullInjector, RecordingInjector};
pub use types::{
    decode_raw_mouse, InputDecodeError, RawMotionEvent, ScratchBuffer, SCRATCH_CAPACITY,
    SYNTHETIC_ORIGIN,
};

/// Errors that can occur while starting or running a collector.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("Collector is already running")]
    AlreadyRunning,
    #[error("Failed to install low-level mouse hook: {0}")]
    HookInstallationFailed(String),
    #[error("Failed to set up raw input capture: {0}")]
    Setup(String),
    #[error("Capture thread error: {0}")]
    Thread(String),
}

#[cfg(windows)]
pub use win32::{SendInputInjector, WindowsCollector};

/// Platform-agnostic collector type alias
#[cfg(windows)]
pub type Collector = WindowsCollector;

/// Platform-agnostic collector type alias
#[cfg(not(windows))]
pub type Collector = ChannelCollector;

/// Whether this platform captures device motion natively.
pub const NATIVE_CAPTURE: bool = cfg!(windows);

/// The injector matching [`Collector`].
pub fn platform_injector() -> Box<dyn MotionInjector> {
    #[cfg(windows)]
    {
        Box::new(SendInputInjector)
    }
    #[cfg(not(windows))]
    {
        Box::new(NullInjector)
    }
}
