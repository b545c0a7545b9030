/// Session/identity reconciler
///
/// A request can carry two independent proofs of identity: a local bearer
/// token (password login) and a federated session cookie (OAuth sign-in).
/// [`Reconciler`] is the state machine that waits for both probes, settles on
/// one of four resolved states, and then answers two separate questions via
/// [`SessionPolicy`]:
///
/// - **display**: whose name/email to show
/// - **authority**: whose role and ownership key gate data access
///
/// # States
///
/// ```text
/// Unresolved ──start──> Checking{local?, federated?}
///     Checking ──both probes settled──> ResolvedNone | ResolvedLocal
///                                     | ResolvedFederated | ResolvedBoth
///     Checking ──LocalCorrupted──> ResolvedNone   (clear local)
///     any      ──SignOut─────────> ResolvedNone   (clear local + federated)
/// ```
///
/// A failed federated probe counts as "no federated identity" and asks for
/// the federated session to be cleared. Resolved states ignore every event
/// except `SignOut`.
///
/// # Example
///
/// ```
/// use planora_shared::auth::session::{Reconciler, Resolution, SessionEvent, SessionPolicy};
///
/// let mut session = Reconciler::new(SessionPolicy::default());
/// session.apply(SessionEvent::LocalLoaded(None));
/// session.apply(SessionEvent::FederatedLoaded(None));
///
/// assert_eq!(session.resolution(), Some(Resolution::None));
/// assert!(session.view().is_none());
/// ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::identity::AuthenticatedIdentity;

/// Which source wins when both are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precedence {
    PreferLocal,
    PreferFederated,
}

impl fmt::Display for Precedence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Precedence::PreferLocal => f.write_str("local"),
            Precedence::PreferFederated => f.write_str("federated"),
        }
    }
}

impl FromStr for Precedence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "prefer_local" => Ok(Precedence::PreferLocal),
            "federated" | "prefer_federated" => Ok(Precedence::PreferFederated),
            other => Err(format!(
                "unknown precedence '{}' (expected 'local' or 'federated')",
                other
            )),
        }
    }
}

/// Precedence rules applied once both identities are known
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Identity shown to the user (name, email)
    pub display: Precedence,

    /// Identity whose role and email gate data access
    pub authority: Precedence,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            display: Precedence::PreferFederated,
            authority: Precedence::PreferLocal,
        }
    }
}

/// Input to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Local credential read finished (None = no credential)
    LocalLoaded(Option<AuthenticatedIdentity>),

    /// Local credential was present but unreadable
    LocalCorrupted,

    /// Federated session fetch finished (None = no session)
    FederatedLoaded(Option<AuthenticatedIdentity>),

    /// Federated session fetch errored
    FederatedFailed,

    /// Explicit sign-out
    SignOut,
}

/// Stored credential the caller should discard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    Local,
    Federated,
}

/// Probe slot while checking: `None` = still pending
type Slot = Option<Option<AuthenticatedIdentity>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unresolved,
    Checking { local: Slot, federated: Slot },
    ResolvedNone,
    ResolvedLocal(AuthenticatedIdentity),
    ResolvedFederated(AuthenticatedIdentity),
    ResolvedBoth {
        local: AuthenticatedIdentity,
        federated: AuthenticatedIdentity,
    },
}

impl SessionState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, SessionState::Unresolved | SessionState::Checking { .. })
    }
}

/// Which resolved state was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    None,
    Local,
    Federated,
    Both,
}

/// Outcome of a resolved session with at least one identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub resolution: Resolution,

    /// Identity to present
    pub display: AuthenticatedIdentity,

    /// Identity used for role and ownership checks
    pub acting: AuthenticatedIdentity,
}

/// Per-request reconciler
#[derive(Debug, Clone)]
pub struct Reconciler {
    policy: SessionPolicy,
    state: SessionState,
    clears: Vec<ClearTarget>,
}

impl Reconciler {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            state: SessionState::Unresolved,
            clears: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Credentials the caller must discard, in the order they were requested
    pub fn clears(&self) -> &[ClearTarget] {
        &self.clears
    }

    /// Moves `Unresolved` to `Checking`; no-op otherwise
    pub fn start(&mut self) {
        if self.state == SessionState::Unresolved {
            self.state = SessionState::Checking {
                local: None,
                federated: None,
            };
        }
    }

    fn request_clear(&mut self, target: ClearTarget) {
        if !self.clears.contains(&target) {
            self.clears.push(target);
        }
    }

    /// Feeds one event into the machine and returns the new state
    pub fn apply(&mut self, event: SessionEvent) -> &SessionState {
        if event == SessionEvent::SignOut {
            self.request_clear(ClearTarget::Local);
            self.request_clear(ClearTarget::Federated);
            self.state = SessionState::ResolvedNone;
            return &self.state;
        }

        if self.state.is_resolved() {
            return &self.state;
        }
        self.start();

        let (mut local, mut federated) = match std::mem::replace(
            &mut self.state,
            SessionState::Unresolved,
        ) {
            SessionState::Checking { local, federated } => (local, federated),
            _ => (None, None),
        };

        match event {
            SessionEvent::LocalLoaded(identity) => {
                local.get_or_insert(identity);
            }
            SessionEvent::LocalCorrupted => {
                self.request_clear(ClearTarget::Local);
                self.state = SessionState::ResolvedNone;
                return &self.state;
            }
            SessionEvent::FederatedLoaded(identity) => {
                federated.get_or_insert(identity);
            }
            SessionEvent::FederatedFailed => {
                if federated.is_none() {
                    self.request_clear(ClearTarget::Federated);
                    federated = Some(None);
                }
            }
            SessionEvent::SignOut => {}
        }

        self.state = match (local, federated) {
            (Some(local), Some(federated)) => match (local, federated) {
                (None, None) => SessionState::ResolvedNone,
                (Some(local), None) => SessionState::ResolvedLocal(local),
                (None, Some(federated)) => SessionState::ResolvedFederated(federated),
                (Some(local), Some(federated)) => SessionState::ResolvedBoth { local, federated },
            },
            (local, federated) => SessionState::Checking { local, federated },
        };

        &self.state
    }

    /// Resolution kind, once resolved
    pub fn resolution(&self) -> Option<Resolution> {
        match &self.state {
            SessionState::Unresolved | SessionState::Checking { .. } => None,
            SessionState::ResolvedNone => Some(Resolution::None),
            SessionState::ResolvedLocal(_) => Some(Resolution::Local),
            SessionState::ResolvedFederated(_) => Some(Resolution::Federated),
            SessionState::ResolvedBoth { .. } => Some(Resolution::Both),
        }
    }

    /// Display/acting identities per policy; None unless resolved with an identity
    pub fn view(&self) -> Option<SessionView> {
        let pick = |precedence: Precedence,
                    local: &AuthenticatedIdentity,
                    federated: &AuthenticatedIdentity| match precedence {
            Precedence::PreferLocal => local.clone(),
            Precedence::PreferFederated => federated.clone(),
        };

        match &self.state {
            SessionState::ResolvedLocal(identity) => Some(SessionView {
                resolution: Resolution::Local,
                display: identity.clone(),
                acting: identity.clone(),
            }),
            SessionState::ResolvedFederated(identity) => Some(SessionView {
                resolution: Resolution::Federated,
                display: identity.clone(),
                acting: identity.clone(),
            }),
            SessionState::ResolvedBoth { local, federated } => Some(SessionView {
                resolution: Resolution::Both,
                display: pick(self.policy.display, local, federated),
                acting: pick(self.policy.authority, local, federated),
            }),
            _ => None,
        }
    }
}
