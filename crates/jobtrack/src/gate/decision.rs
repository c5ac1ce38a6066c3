//! Gate decision engine.
//!
//! A pure function of (session, zone, provisioning state). No I/O happens
//! here; the middleware gathers the inputs and applies the result.

use serde::Serialize;

use super::zone::{HOME_PATH, LOGIN_PATH, PathZone};
use crate::auth::Session;
use crate::provisioning::{ProvisioningState, WizardStep};

/// Where a gated request may be sent instead of its requested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectTarget {
    Login,
    Home,
    Wizard(WizardStep),
}

impl RedirectTarget {
    pub fn path(self) -> &'static str {
        match self {
            RedirectTarget::Login => LOGIN_PATH,
            RedirectTarget::Home => HOME_PATH,
            RedirectTarget::Wizard(step) => step.path(),
        }
    }
}

impl From<WizardStep> for RedirectTarget {
    fn from(step: WizardStep) -> Self {
        RedirectTarget::Wizard(step)
    }
}

/// Outcome of gating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "decision", content = "target", rename_all = "snake_case")]
pub enum GateDecision {
    Allow,
    RedirectTo(RedirectTarget),
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateDecision::Allow => write!(f, "allow"),
            GateDecision::RedirectTo(target) => write!(f, "redirect {}", target.path()),
        }
    }
}

/// Decide whether a request proceeds or is redirected.
///
/// `state` is only consulted for authenticated callers; pass the default
/// (fresh) state otherwise. Every redirect target re-evaluates to
/// [`GateDecision::Allow`] under the same session and state.
pub fn decide(session: &Session, zone: PathZone, state: &ProvisioningState) -> GateDecision {
    match session {
        Session::Anonymous => match zone {
            PathZone::PublicAuthPage | PathZone::AuthCallback => GateDecision::Allow,
            PathZone::WizardPage(_) | PathZone::ProtectedPage => {
                GateDecision::RedirectTo(RedirectTarget::Login)
            }
        },
        Session::Authenticated { .. } => decide_authenticated(zone, state),
    }
}

fn decide_authenticated(zone: PathZone, state: &ProvisioningState) -> GateDecision {
    match zone {
        // The callback finishes its own session exchange; the next request is gated.
        PathZone::AuthCallback => GateDecision::Allow,
        PathZone::PublicAuthPage => GateDecision::RedirectTo(landing(state)),
        PathZone::ProtectedPage if state.setup_completed => GateDecision::Allow,
        PathZone::ProtectedPage => GateDecision::RedirectTo(landing(state)),
        // setup_completed overrides the individual stage flags.
        PathZone::WizardPage(_) if state.setup_completed => {
            GateDecision::RedirectTo(RedirectTarget::Home)
        }
        PathZone::WizardPage(step) => {
            let required = state.required_step();
            if step == required {
                GateDecision::Allow
            } else {
                GateDecision::RedirectTo(required.into())
            }
        }
    }
}

/// Where an authenticated user belongs: home once set up, else their current wizard step.
fn landing(state: &ProvisioningState) -> RedirectTarget {
    if state.setup_completed {
        RedirectTarget::Home
    } else {
        state.required_step().into()
    }
}
