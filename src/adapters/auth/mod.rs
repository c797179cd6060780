//! Authentication adapters.
//!
//! Implementations of the `ConnectionAuthenticator` port:
//!
//! - `AllowAllAuthenticator` - No API keys configured; every client is accepted
//! - `StaticApiKeyAuthenticator` - Clients must present a configured API key

mod api_key;

pub use api_key::{AllowAllAuthenticator, StaticApiKeyAuthenticator};
