//! Authentication and progressive-setup gate.
//!
//! Every request is classified, checked against the caller's session and
//! setup progress, and either forwarded or redirected to the one page the
//! caller is allowed to be on.

mod config;
mod decision;
pub mod finalize;
mod middleware;
mod path;
mod zone;

pub use config::{GateConfig, RedirectStatus};
pub use decision::{GateDecision, RedirectTarget, decide};
pub use middleware::{GateContext, GateState, gate_middleware};
pub use zone::{AUTH_PREFIX, HOME_PATH, LOGIN_PATH, PathZone, SIGNUP_PATH, classify};
