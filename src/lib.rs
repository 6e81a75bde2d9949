#![deny(unused_must_use)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate async_trait;

pub mod config;
pub mod error;
pub mod format;

pub mod join;
pub mod store;
pub mod stream;


pub use config::Config;
pub use error::{ConfigurationError, FormatError, StoreError};
pub use join::{joiner, JoinPolicy, Joiner, Retention};
pub use store::KVStore;
pub use stream::{Joined, JoinStreamExt, JoinedStreamExt};
