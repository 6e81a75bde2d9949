mod engine;
mod lock;
pub mod policy;

pub use engine::{joiner, Joiner};
pub use policy::{JoinPolicy, Retention};
