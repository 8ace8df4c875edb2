//! radiko client library for PMOMusic
//!
//! This crate provides a Rust client for radiko, the Japanese radio
//! streaming service: authorization, station metadata, program listings and
//! stream URLs.
//!
//! # Features
//!
//! - **Authorization**: the two-stage `auth1`/`auth2` handshake, keeping the
//!   resulting token for later calls
//! - **Request pipeline**: versioned API paths (`v2`, `v3`), per-request
//!   [`Params`], auth token injection, cancellation and deadlines through
//!   [`RequestContext`]
//! - **Stations and programs**: area detection, station lists, daily, current
//!   and weekly program listings
//! - **Streams**: live playlist endpoints and timeshift (timefree) playlists
//! - **Time formatting**: `YYYYMMDD` / `YYYYMMDDhhmmss` in Asia/Tokyo
//! - **Configuration**: embedded YAML defaults, external file, environment
//!
//! # Example
//!
//! ```no_run
//! use pmoradiko::{RadikoClient, RequestContext};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = RadikoClient::new("")?;
//!     let ctx = RequestContext::with_timeout(Duration::from_secs(30));
//!
//!     // Enables the auth token for every authenticated request
//!     client.authorize_token(&ctx).await?;
//!
//!     let area = client.area_id(&ctx).await?;
//!     let stations = client.get_stations(&ctx, &area).await?;
//!     for station in &stations.stations {
//!         println!("{} ({})", station.name, station.id);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Transport
//!
//! Clients built without an explicit [`Transport`] use a clone of the
//! process-wide default ([`set_default_transport`]). Tests replacing it must
//! call [`restore_default_transport`] afterwards.
//!
//! # Concurrency
//!
//! Building and executing requests take `&self`. Authorizing and changing the
//! token take `&mut self`: a client shared between tasks needs a lock around
//! re-authorization.

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod models;
pub mod programs;
pub mod stations;
pub mod stream;
pub mod time;
pub mod transport;

// Re-exports
pub use auth::{Stage1Result, Stage2Result};
pub use client::{api_path, ApiRequest, ApiVersion, ClientBuilder, Params, RadikoClient};
pub use config::{AppIdentity, RadikoConfig};
pub use context::RequestContext;
pub use error::{AuthStage, ContextError, Error, Result};
pub use models::{
    Logo, Program, ProgramDay, ProgramSchedule, Station, StationSchedule, Stations, StreamUrl,
};
pub use transport::{
    default_transport, restore_default_transport, set_default_transport, Transport,
    TransportBuilder,
};
