//! AOtD Network Library
//!
//! TCP request/response transport for the Album of the Day scheduler.
//!
//! # Architecture
//!
//! - **Server**: Accepts connections and hands each request to a `RequestHandler`
//! - **Client**: Sends requests and matches responses by id
//! - **Protocol**: Length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! let server = Server::start(DEFAULT_PORT, Arc::new(handler)).await?;
//!
//! let client = Client::connect(addr, Some(identity)).await?;
//! let percent = client.selection_chance("b", None).await?;
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod protocol;
pub mod server;

pub use client::{Client, ConnectionState};
pub use error::{Error, Result};
pub use frame::MAX_FRAME_SIZE;
pub use protocol::{
    ErrorBody, ErrorKind, NetBlockType, NetBlocked, NetCandidate, NetEligibility, NetIdentity,
    NetOutage, NetSelection, NetSubmission, Op, Outcome, Reply, Request, Response,
};
pub use server::{RequestHandler, Server};

/// Default port for AOtD servers
pub const DEFAULT_PORT: u16 = 7341;
