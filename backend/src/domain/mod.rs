//! Domain primitives, reconciliation and authorisation.
//!
//! Purpose: keep a local, observable copy of the back-office tables
//! consistent with the hosted backend's change feed, and answer
//! role-based authorisation queries. Adapters live in `crate::outbound`.
//!
//! Public surface:
//! - Role, Capability, has_permission, can_perform, can_perform_named,
//!   PermissionContext: role-hierarchy authorisation.
//! - SessionState, RouteDecision, evaluate_route_access: protected routes.
//! - RecordId, EntityRecord and the entity rows.
//! - RawChangeEvent, ParsedChange: change-feed events.
//! - EntityCollection, CollectionStore, BackOfficeStore: list state.
//! - RealtimeSync, RealtimeSubscription: feed reconciliation.
//! - load_page: paged fetches through the `PageQuery` port.

pub mod access;
pub mod change_event;
pub mod collection;
pub mod list_loader;
pub mod permissions;
pub mod ports;
pub mod realtime;
pub mod records;
pub mod store;

pub use self::access::{RouteDecision, SessionState, evaluate_route_access};
pub use self::change_event::{ChangeKind, MalformedEvent, ParsedChange, RawChangeEvent};
pub use self::collection::{EntityCollection, EventTicket, LoadStatus, MergeOutcome};
pub use self::list_loader::{load_page, load_record};
pub use self::permissions::{
    Capability, PermissionContext, PermissionLookupError, ROLE_HIERARCHY, Role, can_perform,
    can_perform_named, has_permission,
};
pub use self::realtime::{
    DropReason, HandleOutcome, RealtimeSubscription, RealtimeSync, SubscriptionState,
};
pub use self::records::{
    Candidate, Client, EntityRecord, Job, JobClient, RecordId, RecordIdError, Referrer,
    StaffMember, StaffName, StaffRole, Visitor,
};
pub use self::store::{BackOfficeStore, CollectionStore};
