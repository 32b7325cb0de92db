//! Route guard: which page tree a location may enter, given the session.
//!
//! Pure functions over [`SessionPhase`]; applying the decision is left to the caller.

use crate::models::Role;
use crate::session::SessionPhase;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";

/// The page trees of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTree {
    /// Login and registration pages, reachable by anyone.
    Auth,
    Student,
    Admin,
}

impl PageTree {
    /// Map a location onto its tree. `None` for anything no tree claims.
    pub fn for_path(path: &str) -> Option<PageTree> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_end_matches('/');
        if path == LOGIN_PATH || path == REGISTER_PATH {
            Some(PageTree::Auth)
        } else if within(path, "/student") {
            Some(PageTree::Student)
        } else if within(path, "/admin") {
            Some(PageTree::Admin)
        } else {
            None
        }
    }

    /// The role a guarded tree demands.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            PageTree::Auth => None,
            PageTree::Student => Some(Role::Student),
            PageTree::Admin => Some(Role::Admin),
        }
    }
}

fn within(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still being resolved; show a neutral loading state.
    Loading,
    Redirect(String),
    Render(PageTree),
}

/// Decide what happens when the client asks for `path`.
pub fn check(phase: &SessionPhase, path: &str) -> GuardDecision {
    let Some(tree) = PageTree::for_path(path) else {
        return GuardDecision::Redirect(LOGIN_PATH.to_string());
    };
    let Some(required) = tree.required_role() else {
        return GuardDecision::Render(tree);
    };

    match phase {
        SessionPhase::Unresolved | SessionPhase::Resolving => GuardDecision::Loading,
        SessionPhase::Anonymous => GuardDecision::Redirect(LOGIN_PATH.to_string()),
        SessionPhase::Authenticated(identity) if identity.role != required => {
            GuardDecision::Redirect(identity.role.home_path().to_string())
        }
        SessionPhase::Authenticated(_) => GuardDecision::Render(tree),
    }
}
