//! # Directory Listing
//!
//! Request-side view of one served root. A [`DirectoryService`] answers
//! directory listings from the live filesystem, search listings from the
//! current snapshot, and attaches the caller's effective policy to both.
//!
//! ```no_run
//! use dirview_listing::{DirectoryService, ServiceConfig};
//!
//! fn main() -> dirview_listing::Result<()> {
//!     let service = DirectoryService::new(ServiceConfig::new("/srv/files").with_env_overrides())?;
//!     service.indexer().rebuild();
//!
//!     let listing = service.list("releases", Some("apk -beta"), None)?;
//!     for entry in &listing.entries {
//!         println!("{} {}", entry.name, entry.size);
//!     }
//!     Ok(())
//! }
//! ```

mod collapse;
mod config;
mod error;
mod service;

pub use collapse::collapse;
pub use config::{ServiceConfig, DEFAULT_COLLAPSE_DEPTH, DEFAULT_SEARCH_LIMIT};
pub use error::{ListingError, Result};
pub use service::{DirectoryService, Listing};
