pub mod capture;
pub mod desktop;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod model;
pub mod restore;
pub mod settings;
pub mod store;

pub use capture::WindowSurveyor;
pub use error::{CaptureError, DesktopError, StoreError};
pub use model::{LayoutRecord, WindowEntry, WindowHandle, WindowPlacement};
pub use restore::{LayoutRestorer, RestoreSummary};
pub use store::{PersistCompletion, RecordStore, StoreOptions};
