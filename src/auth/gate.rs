use crate::http::{HOME_PATH, LOGIN_PATH};
use crate::session::Session;

/// Role strings accepted for admin-only screens. The backend reports the bare
/// enum name while tokens carry the `ROLE_` prefix, so both are listed.
pub const ADMIN_ROLES: &[&str] = &["ADMIN", "ROLE_ADMIN"];

/// Outcome of checking a session against a screen's access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectToLogin,
    RedirectToDefault,
}

impl GateDecision {
    pub fn redirect_path(self) -> Option<&'static str> {
        match self {
            GateDecision::Allow => None,
            GateDecision::RedirectToLogin => Some(LOGIN_PATH),
            GateDecision::RedirectToDefault => Some(HOME_PATH),
        }
    }
}

/// Allows iff the session has a token and `required` is empty or contains the
/// user's role (exact, case-sensitive).
pub fn evaluate<R: AsRef<str>>(required: &[R], session: Option<&Session>) -> GateDecision {
    let Some(session) = session.filter(|s| s.has_token()) else {
        return GateDecision::RedirectToLogin;
    };
    if required.is_empty() {
        return GateDecision::Allow;
    }
    match session.role() {
        Some(role) if required.iter().any(|r| r.as_ref() == role) => GateDecision::Allow,
        _ => GateDecision::RedirectToDefault,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Authenticated,
    Roles(&'static [&'static str]),
}

/// Access rule for each screen of the application.
pub fn route_access(path: &str) -> RouteAccess {
    let path = path.split('?').next().unwrap_or(path);
    match path {
        "/login" | "/signup" | "/admin/login" | "/admin/signup" => RouteAccess::Public,
        "/admin/users" | "/admin/suppliers" => RouteAccess::Roles(ADMIN_ROLES),
        _ => RouteAccess::Authenticated,
    }
}

pub fn check_route(path: &str, session: Option<&Session>) -> GateDecision {
    match route_access(path) {
        RouteAccess::Public => GateDecision::Allow,
        RouteAccess::Authenticated => evaluate::<&str>(&[], session),
        RouteAccess::Roles(roles) => evaluate(roles, session),
    }
}
