//! Behavioural tests for role-gated routes and capability checks.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use backoffice::domain::{
    Capability, Role, RouteDecision, SessionState, can_perform_named, evaluate_route_access,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

/// Test world holding the session and the last route decision.
#[derive(Default, ScenarioState)]
struct AccessWorld {
    raw_role: Slot<String>,
    session: Slot<SessionState>,
    decision: Slot<RouteDecision>,
}

impl AccessWorld {
    fn raw_role(&self) -> Option<String> {
        self.raw_role.get()
    }
}

#[fixture]
fn world() -> AccessWorld {
    AccessWorld::default()
}

#[given("a signed-in user with role {role}")]
fn a_signed_in_user_with_role(world: &AccessWorld, role: String) {
    let parsed = role.parse::<Role>().ok();
    world.session.set(SessionState::Ready { role: parsed });
    world.raw_role.set(role);
}

#[given("nobody is signed in")]
fn nobody_is_signed_in(world: &AccessWorld) {
    world.session.set(SessionState::SignedOut);
}

#[given("the profile is still loading")]
fn the_profile_is_still_loading(world: &AccessWorld) {
    world.session.set(SessionState::ProfilePending);
}

#[when("the user opens a route requiring {capability}")]
fn the_user_opens_a_route_requiring(world: &AccessWorld, capability: String) {
    let session = world.session.get().expect("session should be set");
    let capability = capability
        .parse::<Capability>()
        .expect("route capability should be known");
    world
        .decision
        .set(evaluate_route_access(&session, Some(capability)));
}

#[then("the user may perform {capability}")]
fn the_user_may_perform(world: &AccessWorld, capability: String) {
    assert!(can_perform_named(world.raw_role().as_deref(), &capability));
}

#[then("the user may not perform {capability}")]
fn the_user_may_not_perform(world: &AccessWorld, capability: String) {
    assert!(!can_perform_named(world.raw_role().as_deref(), &capability));
}

#[then("the route decision is {expected}")]
fn the_route_decision_is(world: &AccessWorld, expected: String) {
    let decision = world.decision.get().expect("route should be evaluated");
    let expected = match expected.as_str() {
        "allow" => RouteDecision::Allow,
        "loading" => RouteDecision::Loading,
        "redirect to login" => RouteDecision::RedirectToLogin,
        "redirect to dashboard" => RouteDecision::RedirectToDashboard,
        other => panic!("unknown route decision: {other}"),
    };
    assert_eq!(decision, expected);
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Admins manage clients but not staff"
)]
fn admins_manage_clients_but_not_staff(world: AccessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Staff are sent to the dashboard from admin-only routes"
)]
fn staff_are_sent_to_the_dashboard(world: AccessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Super admins reach settings"
)]
fn super_admins_reach_settings(world: AccessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Unknown roles are denied everything"
)]
fn unknown_roles_are_denied_everything(world: AccessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Unknown capabilities are denied"
)]
fn unknown_capabilities_are_denied(world: AccessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Signed-out visitors are sent to login"
)]
fn signed_out_visitors_are_sent_to_login(world: AccessWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/route_access.feature",
    name = "Routes wait while the profile loads"
)]
fn routes_wait_while_the_profile_loads(world: AccessWorld) {
    let _ = world;
}
