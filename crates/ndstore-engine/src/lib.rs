//! Storage service for ndstore.
//!
//! [`StorageService`] accepts puts of array regions and answers gets for
//! arbitrary boxes by assembling them from the stored chunks that overlap
//! them. A get succeeds only if those chunks cover the whole box.
//!
//! Requests either call the typed API (`put`, `get`, `get_into`) or go
//! through the flat [`command`] records a transport would deliver, which
//! reply with an [`NdStatus`] code.
//!
//! # Concurrency
//!
//! All methods take `&self`. One mutex guards the object index; copies
//! run outside it against leased chunks, so gets of large regions do not
//! block puts for longer than the index update.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;
pub mod status;

pub use command::{CommandReply, GetCommand, PutCommand};
pub use config::{ConfigError, StoreConfig};
pub use error::StoreError;
pub use metrics::StoreMetrics;
pub use service::StorageService;
pub use status::NdStatus;
