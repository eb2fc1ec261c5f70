//! Session state published to the UI layer.

use practicum_domain::User;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user logged out.
    UserRequested,
    /// The refresh call failed.
    RefreshFailed,
    /// A 401 arrived and no refresh token was stored.
    MissingRefreshToken,
    /// A request was rejected again after a successful refresh.
    RejectedAfterRefresh,
}

impl LogoutReason {
    /// Returns true if the session ended without the user asking for it.
    #[must_use]
    pub const fn is_forced(self) -> bool {
        !matches!(self, Self::UserRequested)
    }
}

/// Observable session state.
///
/// The UI subscribes to this through [`crate::AuthenticatedHttpClient::subscribe`]
/// and navigates to its login view on `Ended`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    /// No credentials are held.
    #[default]
    SignedOut,
    /// A session ended; carries the reason.
    Ended {
        /// Why the session ended
        reason: LogoutReason,
    },
    /// Credentials are held.
    SignedIn {
        /// Profile from the login response; `None` after a restored session.
        user: Option<User>,
    },
}

impl SessionState {
    /// Returns true if credentials are held.
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    /// Returns the signed-in user profile, if known.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        match self {
            Self::SignedIn { user } => user.as_ref(),
            _ => None,
        }
    }
}
