use crate::model::WindowHandle;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a single call into the windowing subsystem.
#[derive(Debug, Error)]
pub enum DesktopError {
    #[error("window {0} no longer exists")]
    WindowGone(WindowHandle),
    #[error("{call} failed for window {handle}: {message}")]
    Os {
        call: &'static str,
        handle: WindowHandle,
        message: String,
    },
}

#[derive(Debug, Error)]
pub enum CaptureError {
    /// The window was listed during enumeration but its placement could not
    /// be read. Aborts the capture.
    #[error("could not read placement of window {handle}")]
    PlacementUnavailable {
        handle: WindowHandle,
        #[source]
        source: DesktopError,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid record: {0}")]
    Validation(String),
    #[error("record {0} has already been added to the store")]
    DuplicateKey(Uuid),
    #[error("record {0} is not in the store")]
    NotFound(Uuid),
    #[error("failed to persist records: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode records: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("record store is closed")]
    Closed,
}
