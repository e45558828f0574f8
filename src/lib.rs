pub mod adapter;
pub mod attach;
pub mod composer;
pub mod core;
pub mod fetch;
pub mod geometry;
pub mod models;
pub mod pdf;
pub mod render;

// Re-export commonly used types
pub use adapter::FolderRequest;
pub use composer::assemble;
pub use crate::core::{AssemblyError, AssemblyResult, AttachmentError, EngineConfig, FetchError};
pub use fetch::{FileFetcher, HttpFetcher};
pub use models::{
    Counterpart, FileReference, InvoiceLineRef, PackageRequest, PaymentRecord,
    PendingInvoiceRecord, UnitInfo,
};
