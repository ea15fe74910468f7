//! Protected-route decisions.
//!
//! A screen asks for an optional capability; the guard combines that with the
//! current session state and tells the caller whether to render, wait, or
//! redirect.

use super::permissions::{Capability, PermissionContext, Role};

/// Authentication progress for the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Auth session lookup still in flight.
    Resolving,
    /// No authenticated user.
    SignedOut,
    /// Authenticated, profile row not yet loaded.
    ProfilePending,
    /// Authenticated with a loaded profile.
    ///
    /// `role` is `None` when the profile carries no ranked role.
    Ready { role: Option<Role> },
}

/// What the caller should do with a protected route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Show a loading indicator and ask again later.
    Loading,
    /// Send the user to the login screen.
    RedirectToLogin,
    /// Authenticated but not allowed; send the user to the dashboard.
    RedirectToDashboard,
    /// Render the route.
    Allow,
}

/// Decide access to a route gated by `required`.
///
/// # Examples
/// ```
/// use backoffice::domain::{Capability, Role, RouteDecision, SessionState, evaluate_route_access};
///
/// let staff = SessionState::Ready { role: Some(Role::Staff) };
/// assert_eq!(
///     evaluate_route_access(&staff, Some(Capability::ManageStaff)),
///     RouteDecision::RedirectToDashboard,
/// );
/// assert_eq!(evaluate_route_access(&staff, None), RouteDecision::Allow);
/// ```
#[must_use]
pub fn evaluate_route_access(
    session: &SessionState,
    required: Option<Capability>,
) -> RouteDecision {
    match *session {
        SessionState::Resolving | SessionState::ProfilePending => RouteDecision::Loading,
        SessionState::SignedOut => RouteDecision::RedirectToLogin,
        SessionState::Ready { role } => match required {
            Some(capability) if !PermissionContext::new(role).can(capability) => {
                tracing::debug!(%capability, ?role, "route denied");
                RouteDecision::RedirectToDashboard
            }
            _ => RouteDecision::Allow,
        },
    }
}
