//! Collection scanning and the bounded fan-out across collections.

mod coordinator;
mod scanner;

pub use coordinator::{CollectionOutcome, ScanCoordinator, SyncError, SyncReport};
pub use scanner::{build_record, CollectionScanner, ScanError, ScanStats};
