pub mod config;
pub mod dict;
pub mod error;
pub mod id;
pub mod namespace;
pub mod value;

pub use config::{PoolConfig, WorkerSpec};
pub use dict::MessageDict;
pub use error::GridError;
pub use id::{HostName, WorkerId};
pub use namespace::Namespace;
pub use value::Value;
