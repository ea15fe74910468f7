//! Role hierarchy and capability table for back-office authorisation.
//!
//! Roles form a total order, most privileged first. Each capability names the
//! *minimum* role allowed to perform it, so a user may act when their role
//! ranks at or above that minimum. Adding a role means inserting it at the
//! right position in [`Role`]; adding a capability means pointing it at an
//! existing role. The evaluation functions never change.
//!
//! Authorisation is a boolean answer, not an error: absent or unrecognised
//! inputs fail closed and return `false`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Staff role, declared from most to least privileged.
///
/// The declaration order *is* the ranking: [`Role::rank`] reads the
/// discriminant and the derived `Ord` follows the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Role {
    /// Owns staff management and system settings.
    SuperAdmin,
    /// Manages clients and reads reports.
    Admin,
    /// Day-to-day operations on candidates, jobs and lineups.
    Staff,
    /// Read-only access.
    Viewer,
}

/// Every role in ranking order, most privileged first.
pub const ROLE_HIERARCHY: [Role; 4] = [Role::SuperAdmin, Role::Admin, Role::Staff, Role::Viewer];

impl Role {
    /// Position in the hierarchy; lower is more privileged.
    #[must_use]
    pub const fn rank(self) -> usize {
        self as usize
    }

    /// Stable identifier stored in the `user_roles` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Viewer => "viewer",
        }
    }

    /// True when this role ranks at or above `required`.
    #[must_use]
    pub const fn satisfies(self, required: Self) -> bool {
        self.rank() <= required.rank()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a role or capability name is not part of the static tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionLookupError {
    /// The role string does not name a ranked role.
    #[error("unknown role: {0}")]
    UnknownRole(String),
    /// The capability string does not name a known capability.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),
}

impl FromStr for Role {
    type Err = PermissionLookupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "viewer" => Ok(Self::Viewer),
            other => Err(PermissionLookupError::UnknownRole(other.to_owned())),
        }
    }
}

/// Named back-office action gated by a minimum role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Capability {
    ViewDashboard,
    ViewCandidate,
    ManageCandidate,
    /// Staff need to see clients when working on jobs.
    ViewClient,
    ManageClient,
    ViewJob,
    ManageJob,
    ViewProject,
    ManageProject,
    ManageLineup,
    ManageReferrer,
    ManageStaff,
    ViewReports,
    ManageSettings,
}

impl Capability {
    /// Every capability, in table order.
    pub const ALL: [Self; 14] = [
        Self::ViewDashboard,
        Self::ViewCandidate,
        Self::ManageCandidate,
        Self::ViewClient,
        Self::ManageClient,
        Self::ViewJob,
        Self::ManageJob,
        Self::ViewProject,
        Self::ManageProject,
        Self::ManageLineup,
        Self::ManageReferrer,
        Self::ManageStaff,
        Self::ViewReports,
        Self::ManageSettings,
    ];

    /// Minimum role required for this capability.
    #[must_use]
    pub const fn min_role(self) -> Role {
        match self {
            Self::ViewDashboard | Self::ViewCandidate => Role::Viewer,
            Self::ManageCandidate
            | Self::ViewClient
            | Self::ViewJob
            | Self::ManageJob
            | Self::ViewProject
            | Self::ManageProject
            | Self::ManageLineup
            | Self::ManageReferrer => Role::Staff,
            Self::ManageClient | Self::ViewReports => Role::Admin,
            Self::ManageStaff | Self::ManageSettings => Role::SuperAdmin,
        }
    }

    /// Stable capability name used by route tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ViewDashboard => "VIEW_DASHBOARD",
            Self::ViewCandidate => "VIEW_CANDIDATE",
            Self::ManageCandidate => "MANAGE_CANDIDATE",
            Self::ViewClient => "VIEW_CLIENT",
            Self::ManageClient => "MANAGE_CLIENT",
            Self::ViewJob => "VIEW_JOB",
            Self::ManageJob => "MANAGE_JOB",
            Self::ViewProject => "VIEW_PROJECT",
            Self::ManageProject => "MANAGE_PROJECT",
            Self::ManageLineup => "MANAGE_LINEUP",
            Self::ManageReferrer => "MANAGE_REFERRER",
            Self::ManageStaff => "MANAGE_STAFF",
            Self::ViewReports => "VIEW_REPORTS",
            Self::ManageSettings => "MANAGE_SETTINGS",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = PermissionLookupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| PermissionLookupError::UnknownCapability(value.to_owned()))
    }
}

/// Decide whether `user_role` meets the `required` minimum role.
///
/// Returns `false` when either role is absent.
///
/// # Examples
/// ```
/// use backoffice::domain::{Role, has_permission};
///
/// assert!(has_permission(Some(Role::Admin), Some(Role::Staff)));
/// assert!(!has_permission(Some(Role::Staff), Some(Role::Admin)));
/// assert!(!has_permission(None, Some(Role::Viewer)));
/// ```
#[must_use]
pub const fn has_permission(user_role: Option<Role>, required: Option<Role>) -> bool {
    match (user_role, required) {
        (Some(user), Some(required)) => user.satisfies(required),
        _ => false,
    }
}

/// Decide whether `user_role` may perform `capability`.
#[must_use]
pub const fn can_perform(user_role: Option<Role>, capability: Capability) -> bool {
    has_permission(user_role, Some(capability.min_role()))
}

/// Authorisation query for callers holding raw strings (profile rows, route
/// tables).
///
/// Unknown roles and unknown capability names both deny.
///
/// # Examples
/// ```
/// use backoffice::domain::can_perform_named;
///
/// assert!(can_perform_named(Some("admin"), "MANAGE_CLIENT"));
/// assert!(!can_perform_named(Some("staff"), "MANAGE_CLIENT"));
/// assert!(!can_perform_named(Some("admin"), "LAUNCH_ROCKETS"));
/// assert!(!can_perform_named(None, "VIEW_DASHBOARD"));
/// ```
#[must_use]
pub fn can_perform_named(user_role: Option<&str>, capability: &str) -> bool {
    let Some(role) = user_role.and_then(|raw| raw.parse::<Role>().ok()) else {
        return false;
    };
    capability
        .parse::<Capability>()
        .is_ok_and(|capability| can_perform(Some(role), capability))
}

/// Capability checks bound to the signed-in user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionContext {
    role: Option<Role>,
}

impl PermissionContext {
    /// Bind checks to an already parsed role.
    #[must_use]
    pub const fn new(role: Option<Role>) -> Self {
        Self { role }
    }

    /// Bind checks to the role string stored on a profile row.
    ///
    /// An unrecognised role string yields a context that denies everything.
    #[must_use]
    pub fn from_profile_role(raw: Option<&str>) -> Self {
        let role = raw.and_then(|value| match value.parse::<Role>() {
            Ok(role) => Some(role),
            Err(error) => {
                tracing::debug!(%error, "profile role is not ranked; denying all capabilities");
                None
            }
        });
        Self { role }
    }

    /// The bound role, if any.
    #[must_use]
    pub const fn role(&self) -> Option<Role> {
        self.role
    }

    /// Whether the bound role may perform `capability`.
    #[must_use]
    pub const fn can(&self, capability: Capability) -> bool {
        can_perform(self.role, capability)
    }
}
