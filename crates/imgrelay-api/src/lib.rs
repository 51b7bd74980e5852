//! The relay server.
//!
//! A thin HTTP layer between browsers/CLIs and the remote image host. It
//! holds the host credential server-side, forwards multipart uploads as
//! base64, proxies image fetches for hosts that refuse cross-origin reads,
//! and renders every failure as the `{success, error, details}` envelope.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;
pub mod upstream;
