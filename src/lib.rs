#[cfg(feature = "tokio")]
mod channel;
mod config;
mod connection;
mod element_store;
mod event_multiplexer;
mod job_phase;
mod link;
mod model;
#[cfg(feature = "tokio")]
mod poller;
mod property_tree;
mod reconciler;
#[cfg(feature = "tokio")]
mod session;
mod sink;
#[cfg(feature = "tcp")]
mod tcp_link;

#[doc(hidden)]
pub use log;
pub use paste;

#[cfg(feature = "tokio")]
pub use channel::*;
pub use config::*;
pub use connection::*;
pub use element_store::*;
pub use job_phase::*;
pub use link::*;
pub use model::*;
#[cfg(feature = "tokio")]
pub use poller::*;
pub use property_tree::*;
pub use reconciler::*;
#[cfg(feature = "tokio")]
pub use session::*;
pub use sink::*;
#[cfg(feature = "tcp")]
pub use tcp_link::*;
