// In-process order-book service speaking the same HTTP API as the real one.
pub mod book;    // resting orders and auction quotes
pub mod server;  // axum routes, auth middleware, ephemeral-port spawn

pub use book::{BookError, MockBook};
pub use server::{router, spawn, MockServer, MockState, SeenCredential};
