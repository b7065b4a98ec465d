pub mod book;          // depth types and liquidity aggregation
pub mod client;        // OrderbookApi seam and its HTTP client
pub mod config;        // HarnessConfig from .env / environment
pub mod error;
pub mod market_maker;  // seeds the deterministic ladder
pub mod mock;          // in-process order-book service
pub mod telemetry;
pub mod verifier;      // the four auction scenarios
