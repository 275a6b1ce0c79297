use std::fmt;

/// Explicit session phase for one TO0 handshake.
///
/// The storage lifecycle callbacks (`starting`/`started`/`continuing`/
/// `completed`/`failed`) encode an implicit ordering contract; this enum makes
/// that state machine explicit. Every handler checks the phase on entry and
/// fails loudly when invoked out of order.
///
/// ```text
/// Init ── hello_message ──▶ HelloSent ── HELLO_ACK ──▶ OwnerSignSent
///                                                          │
///                                         ACCEPT_OWNER ────▶ Done
/// (any non-terminal) ── ERROR / handler fault ──▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Session created; no message produced yet.
    Init,
    /// HELLO emitted; expecting HELLO_ACK.
    HelloSent,
    /// OWNER_SIGN emitted; expecting ACCEPT_OWNER.
    OwnerSignSent,
    /// Registration accepted. Terminal success.
    Done,
    /// Peer error or handler fault. Terminal failure.
    Failed,
}

impl SessionPhase {
    /// True once the session has reached a terminal outcome.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Done | SessionPhase::Failed)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionPhase::Init => "init",
            SessionPhase::HelloSent => "hello-sent",
            SessionPhase::OwnerSignSent => "owner-sign-sent",
            SessionPhase::Done => "done",
            SessionPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminality() {
        assert!(!SessionPhase::Init.is_terminal());
        assert!(!SessionPhase::HelloSent.is_terminal());
        assert!(!SessionPhase::OwnerSignSent.is_terminal());
        assert!(SessionPhase::Done.is_terminal());
        assert!(SessionPhase::Failed.is_terminal());
    }
}
