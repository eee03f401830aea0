//! # Duolog Stream
//!
//! In-memory broker relaying live debate output to any number of
//! subscribers. Each session keeps an append-only backlog of every
//! message published, so a subscriber joining late still receives the
//! full history before following live updates — the HTTP round trip
//! returning a debate id races with the first turns being produced, and
//! that race must never lose messages.
//!
//! One writer (the debate driver) per session, many readers; readers
//! never mutate. Sessions live only for the process lifetime and are
//! swept after they finish and their subscribers disconnect.

pub mod broker;
pub mod session;
pub mod subscription;

pub use broker::{BrokerError, StreamBroker, StreamConfig};
pub use session::{SessionSnapshot, SessionStatus};
pub use subscription::{StreamEvent, Subscription};
