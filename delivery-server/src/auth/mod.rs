//! Identity and role routing
//!
//! Authentication happens upstream. The identity provider forwards the
//! caller as two headers, which this service trusts:
//!
//! - `x-actor-id`: user ID
//! - `x-actor-role`: `customer` | `driver` | `owner`
//!
//! [`require_auth`] turns them into a [`CurrentActor`] request extension;
//! [`require_role`] guards a whole role router.

pub mod extractor;
pub mod middleware;

pub use extractor::{ACTOR_ID_HEADER, ACTOR_ROLE_HEADER, CurrentActor};
pub use middleware::{require_auth, require_role};
