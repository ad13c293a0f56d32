//! # avproc
//!
//! Async TCP control client for zone-based A/V processors.
//!
//! This crate maintains a persistent TCP session with an audio/video
//! processor speaking a line-oriented ASCII protocol, sends typed command
//! intents, parses solicited and unsolicited responses, and republishes
//! them as typed state and property events.
//!
//! ## Features
//!
//! - **Event-driven**: decoded updates and status transitions arrive on a
//!   channel, in frame-arrival order
//! - **Supervised session**: one reader and one writer task per live
//!   connection, cancelled together on teardown
//! - **Self-healing**: automatic reconnect after transient failures, with
//!   the in-flight command restored to the head of the queue
//! - **Keep-alive**: a periodic power poll doubles as liveness heartbeat
//!   and external-power-change detector
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use avproc::{AvpClient, AvpEvent, ClientConfig, Zone};
//!
//! #[tokio::main]
//! async fn main() -> avproc::Result<()> {
//!     let config = ClientConfig::new("192.168.1.30");
//!     let mut client = AvpClient::new(config);
//!
//!     let mut events = client.subscribe().expect("first subscriber");
//!     client.connect().await?;
//!
//!     client.set_power(Zone::Main, true)?;
//!     client.set_volume(Zone::Main, -25)?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("Event: {:?}", event);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Protocol Overview
//!
//! Frames are printable single-byte characters (ISO-8859-1, not UTF-8)
//! closed by a `;` terminator, in both directions:
//!
//! ```text
//! Z1POW1;      zone 1 power on        Z1POW?;   query
//! Z1VOL-25;    zone 1 volume -25 dB   Z1VOL?;   query
//! Z1MUT0;      zone 1 unmute          Z1MUT?;   query
//! Z1INP02;     zone 1 select input 2  Z1INP?;   query
//! ICN?; ISN01?; ILN01?;               input metadata queries
//! IDM?; IDR?; IDS?; IDB?; IDH?; IDN?; device info queries
//! !...;                               device-reported error
//! ```
//!
//! The device answers queries with the value form of the same grammar and
//! pushes unsolicited frames whenever state changes at the device itself.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod client;
pub mod codec;
pub mod command;
pub mod error;
pub mod parser;
pub mod types;

// Re-export main types
pub use client::{AvpClient, AvpEvent, ClientConfig, DEFAULT_COMMAND_DELAY_MS, DEFAULT_PORT};
pub use codec::AsciiCodec;
pub use command::Command;
pub use error::{AvpError, Result};
pub use parser::{parse_frame, Decoded, ZoneState};
pub use types::*;
