//! # ramkv
//!
//! An in-memory key/value server that speaks RESP2, so any Redis client can
//! talk to it.
//!
//! It holds string, list and set values with per-key deadlines, queues
//! MULTI/EXEC transactions per connection, and delivers SUBSCRIBE/PUBLISH
//! messages. Expired keys are announced on `__keyevent@0__:expired`. The
//! keyspace is written to a JSON snapshot periodically and loaded at startup.

pub mod command;
pub mod config;
pub mod connection;
pub mod engine;
pub mod error;
pub mod expire;
pub mod persistence;
pub mod pubsub;
pub mod resp;
pub mod server;
pub mod store;
pub mod types;
