use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Uid used when running without a backend
pub const LOCAL_UID: &str = "local";

/// A signed-in user and the tokens that authorize their requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(
        uid: impl Into<String>,
        email: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            id_token: id_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// Session for offline mode; never expires
    pub fn local() -> Self {
        Self::new(LOCAL_UID, "offline", LOCAL_UID, "", DateTime::<Utc>::MAX_UTC)
    }

    /// True when the id token expires within a minute of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(60) <= now
    }
}

/// Broadcasts sign-in and sign-out. Receivers see the current session right
/// away and every change after it.
#[derive(Debug, Clone)]
pub struct SessionWatch {
    sender: watch::Sender<Option<AuthSession>>,
}

impl SessionWatch {
    pub fn new(initial: Option<AuthSession>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    pub fn current(&self) -> Option<AuthSession> {
        self.sender.borrow().clone()
    }

    #[cfg(test)]
    pub fn is_signed_in(&self) -> bool {
        self.sender.borrow().is_some()
    }

    pub fn publish(&self, session: Option<AuthSession>) {
        self.sender.send_replace(session);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AuthSession>> {
        self.sender.subscribe()
    }
}

impl Default for SessionWatch {
    fn default() -> Self {
        Self::new(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_has_a_minute_of_slack() {
        let now = Utc::now();
        let session = AuthSession::new("u1", "a@b.c", "t", "r", now + Duration::seconds(30));
        assert!(session.is_expired(now));

        let session = AuthSession::new("u1", "a@b.c", "t", "r", now + Duration::minutes(30));
        assert!(!session.is_expired(now));
        assert!(!AuthSession::local().is_expired(now));
    }

    #[test]
    fn test_watch_notifies_subscribers() {
        let watch = SessionWatch::default();
        let mut receiver = watch.subscribe();
        assert!(!watch.is_signed_in());

        watch.publish(Some(AuthSession::local()));
        assert!(receiver.has_changed().unwrap());
        assert_eq!(receiver.borrow_and_update().as_ref().map(|s| s.uid.as_str()), Some(LOCAL_UID));

        watch.publish(None);
        assert!(receiver.has_changed().unwrap());
        assert!(receiver.borrow_and_update().is_none());
        assert!(watch.current().is_none());
    }
}
