//! Content upload for the Work Verifier.
//!
//! Files are pinned to IPFS through an upload proxy that keeps the pinning
//! service credentials server-side. The proxy answers with the content id.

pub mod error;
pub mod file;
pub mod proxy;

pub use error::{UploadError, UploadResult, FALLBACK_MESSAGE};
pub use file::FileUpload;
pub use proxy::{ContentUploader, ProxyUploader};
