//! HTTP surface for code search: `/search`, `/status`, `/repositories` and `/health`.

mod error;
mod handlers;
mod router;
mod server;

pub use error::GatewayError;
pub use server::GatewayServer;
