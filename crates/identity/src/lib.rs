//! Multi-tenant auth, quota, rate-limiting, and usage metering for
//! SentinelDF (spec §4.G/§4.H), plus the durable identity/usage store
//! (spec §6 "Persistent store (identity & usage)").
//!
//! [`AuthGate`] does everything spec §4.G asks of a single authenticated
//! request except the document-count-dependent quota check, which is
//! exposed separately as [`AuthGate::check_quota`] so the HTTP layer can run
//! it once the request body (and its batch size) is known. [`UsageRecorder`]
//! is the non-blocking metering sink handed to request handlers; a single
//! background task drains it into the durable [`Store`].

mod auth;
mod error;
mod models;
mod store;
mod usage;

pub use auth::{display_prefix, generate_api_key, hash_api_key, AuthContext, AuthGate, API_KEY_PREFIX};
pub use error::IdentityError;
pub use models::{ApiKeyRecord, TierLimits, UsageRecord, UserRecord};
pub use store::Store;
pub use usage::UsageRecorder;
