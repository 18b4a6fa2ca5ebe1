//! Design documents on the file system.
//! Mirrors a CouchDB design document as a directory tree, where nested objects become
//! directories and string values become `.js` files, and reads such a tree back.
//!
//! # Example
//! ```no_run
//! use std::path::Path;
//!
//! let doc = couch_fs::from_fs(Path::new("db/indexes"), Path::new(""), couch_fs::CONTENT_FILTER)?;
//! couch_fs::to_fs(&doc, Path::new("backup"), Path::new(""))?;
//! # Ok::<(), couch_fs::Error>(())
//! ```

mod de;
mod error;
mod node;
mod observe;
pub mod path;
mod remote;
mod ser;
mod sync;

pub use de::{from_fs, put, Deserializer};
pub use error::{Error, Result};
pub use node::{Node, Object};
pub use observe::{Observer, TracingObserver};
pub use remote::{CouchClient, CouchConfig, DocumentStore, StoreReceipt};
pub use ser::{to_fs, Serializer};
pub use sync::{download, upload};

/// Suffix carried by every leaf file.
pub const CONTENT_SUFFIX: &str = ".js";

/// Default deserializer filter, selecting the files written by the serializer.
pub const CONTENT_FILTER: &str = "*.js";

/// Key holding the document revision.
pub const REV_KEY: &str = "_rev";

/// Key holding the document id.
pub const ID_KEY: &str = "_id";
