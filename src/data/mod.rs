//! Provider data access.
//!
//! - [`transport`]: the I/O seam (HTTP or fixtures)
//! - [`bulk`]: yearly delimited files from the object store
//! - [`catalog`]: metadata search and resource sampling
//! - [`fixture`]: file-backed transport for deterministic runs

pub mod bulk;
pub mod catalog;
pub mod fixture;
pub mod transport;

pub use bulk::{BulkClient, decode_records, dataset_path};
pub use catalog::{CatalogClient, DatasetDescriptor, ResourceDescriptor, SampleScan};
pub use fixture::FixtureTransport;
pub use transport::{BulkRequest, HttpTransport, Transport};
