//! Shopper-side cart synchronisation against the REST API.

pub mod api;
pub mod notify;
pub mod sync;

pub use api::{CartApi, ClientError, HttpCartApi, FALLBACK_MESSAGE};
pub use notify::{LogNotifier, Notifier};
pub use sync::{CartOperation, CartSync, InFlightKey, SyncOutcome};
