pub mod blacklist;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod transport;

pub use blacklist::BlacklistStore;
pub use dispatcher::{DispatchConfig, Dispatcher};
pub use error::DispatchError;
pub use registry::{Replica, ReplicaRegistry};
pub use transport::{Transport, TransportError};
