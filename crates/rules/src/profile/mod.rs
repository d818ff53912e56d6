//! Environment profiles: named sets of values that parameterize templates.
//!
//! One YAML file per profile, loaded from a flat directory in filename
//! order. That order is also the output order of generated rules.

mod error;
mod store;
mod types;


pub use self::error::{ConfigError, Result};
pub use self::store::ProfileStore;
pub use self::types::{Profile, ProfileValue};
