//! Engine adapters.
//!
//! | Engine | Native router | `:param` | `*catch_all` | `:optional?` |
//! |---|---|---|---|---|
//! | [`ExpressEngine`] | radix tree, canonical syntax | yes | yes | no |
//! | [`HapiEngine`] | `axum`, brace syntax | yes | no | no |

pub mod express;
pub mod hapi;

pub use express::{ExpressApp, ExpressEngine, ExpressReply, ExpressRequest, NativeHandler};
pub use hapi::{HapiApp, HapiEngine};
