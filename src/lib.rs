//! Streams a chat-completions answer over SSE and types it onto a small
//! fixed-resolution panel.
//!
//! Data flows one way: [`source::ByteSource`] → [`sse::SseDecoder`] →
//! [`queue::CharQueue`] → [`pager::Pager`] → [`display::DisplaySurface`].
//! [`session::Session`] wires the pieces together for one prompt at a time.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod pager;
pub mod queue;
pub mod session;
pub mod shutdown;
pub mod source;
pub mod sse;
pub mod stream;

pub use error::{DecodeError, DrawError, SessionError};
pub use queue::{CharQueue, OverflowPolicy};
pub use session::{Session, SessionOutcome};
pub use stream::EndReason;
