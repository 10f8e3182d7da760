pub mod batch;
pub mod dispatcher;
pub mod export;
pub mod preview;

pub use batch::{refresh, Fingerprint, MergeOutcome, RefreshSummary, Slot, SlotBatch, SlotJob, SlotKey};
pub use dispatcher::{DispatchError, Dispatcher, JobId, JobRequest, JobResponse};
pub use export::{ExportError, ExportService};
pub use preview::{PreviewSession, PreviewState};
