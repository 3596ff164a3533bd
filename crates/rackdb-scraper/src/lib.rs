//! Vendor adapters: per-retailer fetch + parse producing canonical product
//! batches for the staging ledger.

pub mod adapter;
pub mod error;
mod retry;
pub mod types;
pub mod uniqlo;

pub use adapter::{AdapterRegistry, FetchOptions, RawBatch, RawCatalog, VendorAdapter};
pub use error::AdapterError;
pub use uniqlo::UniqloAdapter;
