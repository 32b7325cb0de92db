use crate::models::Identity;

/// Where the session is in its lifecycle.
///
/// `Unresolved` only exists until `restore()` starts; `Resolving` is entered
/// once. After that the session moves between `Authenticated` and `Anonymous`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Unresolved,
    Resolving,
    Authenticated(Identity),
    Anonymous,
}

impl SessionPhase {
    /// True until the persisted session has been resolved one way or the other.
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionPhase::Unresolved | SessionPhase::Resolving)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionPhase::Authenticated(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionPhase::Unresolved => "unresolved",
            SessionPhase::Resolving => "resolving",
            SessionPhase::Authenticated(_) => "authenticated",
            SessionPhase::Anonymous => "anonymous",
        }
    }
}
