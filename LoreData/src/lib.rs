//! # LoreData
//!
//! Record store for denormalized, ID-keyed game configuration data.
//!
//! Source data is a tree of JSON rows whose relationships exist only as
//! numeric references. This crate owns the mechanical half of the problem:
//! loading and caching records by logical path, the hash → text localization
//! table, the talk-file path map, and the typed raw record shapes validated
//! at the store boundary. Interpreting the references into navigable graphs
//! is the `loreweave` crate's job.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loredata::store::{FileStore, RecordSource};
//!
//! let store = FileStore::open("data/")?;
//! let quest = store.get_record("quest/1001")?;
//! let title = store.get_text(500)?;
//! # Ok::<(), loredata::Error>(())
//! ```

pub mod error;
pub mod records;
pub mod store;

pub use error::{Error, Result};
pub use store::{FileStore, MemoryStore, RecordSource};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
