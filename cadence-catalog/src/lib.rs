//! Cadence Catalog - Streaming provider integrations
//!
//! Implementations of the core catalog traits against real provider APIs
//! (Spotify-style and YouTube-style), plus an in-memory catalog for demo
//! mode and tests.

pub mod http;
pub mod memory;
pub mod spotify;
pub mod youtube;

pub use memory::MemoryCatalog;
pub use spotify::SpotifyCatalog;
pub use youtube::YouTubeCatalog;
