pub mod backend;
pub mod channel;

pub use backend::{Backend, BackendError};
pub use channel::{ChannelSource, channel};
