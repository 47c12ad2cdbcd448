//! Session gate for the admin and uploader realms.
//!
//! Each realm is a two-state machine:
//!
//! ```text
//!              login (password verified)
//!   Locked ─────────────────────────────────▶ Unlocked
//!     ▲                                          │
//!     └──── logout │ now > expiry │ corrupt ─────┘
//! ```
//!
//! The session record lives in the store under the realm's key. Reading it is
//! the only way to learn the state, so an unparsable record is the same as no
//! record. Expired and corrupt records are removed when they are read.
//!
//! Activity extends an unlocked session to `now + duration`, at most once per
//! idle window, so a burst of commands costs one write.
//!
//! Every operation takes the current time explicitly.

use crate::auth::{self, AuthError, Realm};
use crate::config::{AuthConfig, SessionConfig};
use crate::storage::{self, KeyValueStore, StoreError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("The {0} area is locked. Log in first.")]
    Locked(Realm),
    #[error("Failed to save session: {0}")]
    Save(#[from] StoreError),
}

/// Persisted session. Times are epoch milliseconds on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub authenticated: bool,
    /// When the session was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expiry: DateTime<Utc>,
    /// Last activity extension, if any.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    pub extended_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    /// Expired strictly after the expiry instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expiry
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> TimeDelta {
        (self.expiry - now).max(TimeDelta::zero())
    }

    fn last_extension(&self) -> DateTime<Utc> {
        self.extended_at.unwrap_or(self.timestamp)
    }
}

/// Session timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub duration: TimeDelta,
    pub idle_window: TimeDelta,
}

impl SessionPolicy {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            duration: TimeDelta::hours(i64::from(config.duration_hours)),
            idle_window: TimeDelta::minutes(i64::from(config.idle_window_minutes)),
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Locked,
    Unlocked(SessionRecord),
}

impl GateState {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, GateState::Unlocked(_))
    }
}

/// The gate for one realm.
#[derive(Debug, Clone, Copy)]
pub struct SessionGate {
    realm: Realm,
    policy: SessionPolicy,
}

impl SessionGate {
    pub fn new(realm: Realm, policy: SessionPolicy) -> Self {
        Self { realm, policy }
    }

    pub fn realm(&self) -> Realm {
        self.realm
    }

    /// Current state. Drops expired or corrupt records from the store.
    pub fn state<S: KeyValueStore + ?Sized>(&self, store: &mut S, now: DateTime<Utc>) -> GateState {
        let key = self.realm.storage_key();
        if store.get(key).is_none() {
            return GateState::Locked;
        }
        match storage::load_json::<SessionRecord, _>(store, key) {
            Some(record) if record.authenticated && !record.is_expired(now) => {
                GateState::Unlocked(record)
            }
            Some(record) if record.authenticated => {
                info!(realm = %self.realm, expiry = %record.expiry, "session expired");
                self.discard(store);
                GateState::Locked
            }
            _ => {
                warn!(realm = %self.realm, "session record is unusable, locking");
                self.discard(store);
                GateState::Locked
            }
        }
    }

    /// Verify `password` and start a new session.
    pub fn login<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        auth_config: &AuthConfig,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, SessionError> {
        auth::verify(auth_config, self.realm, password)?;
        let record = SessionRecord {
            authenticated: true,
            timestamp: now,
            expiry: now + self.policy.duration,
            extended_at: None,
        };
        storage::save_json(store, self.realm.storage_key(), &record)?;
        info!(realm = %self.realm, expiry = %record.expiry, "logged in");
        Ok(record)
    }

    pub fn logout<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> Result<(), SessionError> {
        store.remove(self.realm.storage_key())?;
        info!(realm = %self.realm, "logged out");
        Ok(())
    }

    /// Record activity. Extends an unlocked session when the idle window has
    /// passed since the last extension.
    pub fn touch<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<GateState, SessionError> {
        let GateState::Unlocked(mut record) = self.state(store, now) else {
            return Ok(GateState::Locked);
        };
        if now - record.last_extension() >= self.policy.idle_window {
            record.expiry = now + self.policy.duration;
            record.extended_at = Some(now);
            storage::save_json(store, self.realm.storage_key(), &record)?;
            debug!(realm = %self.realm, expiry = %record.expiry, "session extended");
        }
        Ok(GateState::Unlocked(record))
    }

    /// Unlocked record with activity recorded, or [`SessionError::Locked`].
    pub fn require<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, SessionError> {
        match self.touch(store, now)? {
            GateState::Unlocked(record) => Ok(record),
            GateState::Locked => Err(SessionError::Locked(self.realm)),
        }
    }

    fn discard<S: KeyValueStore + ?Sized>(&self, store: &mut S) {
        if let Err(e) = store.remove(self.realm.storage_key()) {
            warn!(realm = %self.realm, error = %e, "failed to remove session record");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    const T0: i64 = 1_760_000_000_000;
    const HOUR: i64 = 60 * 60 * 1000;
    const MINUTE: i64 = 60 * 1000;

    fn auth_config() -> AuthConfig {
        AuthConfig {
            salt: "s".into(),
            admin: vec![auth::digest("s", "admin123")],
            uploader: vec![auth::digest("s", "upload123")],
        }
    }

    fn gate() -> SessionGate {
        SessionGate::new(Realm::Admin, SessionPolicy::default())
    }

    fn record_expiring_at(expiry: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            authenticated: true,
            timestamp: expiry - TimeDelta::hours(24),
            expiry,
            extended_at: None,
        }
    }

    fn store_with(record: &SessionRecord) -> MemoryStore {
        let mut store = MemoryStore::new();
        storage::save_json(&mut store, Realm::Admin.storage_key(), record).unwrap();
        store
    }

    // =========================================================================
    // Expiry boundary
    // =========================================================================

    #[test]
    fn expiry_one_ms_ago_is_expired() {
        let now = at(T0);
        let mut store = store_with(&record_expiring_at(now - TimeDelta::milliseconds(1)));
        assert_eq!(gate().state(&mut store, now), GateState::Locked);
        assert!(store.get(Realm::Admin.storage_key()).is_none());
    }

    #[test]
    fn expiry_one_ms_ahead_is_valid() {
        let now = at(T0);
        let mut store = store_with(&record_expiring_at(now + TimeDelta::milliseconds(1)));
        assert!(gate().state(&mut store, now).is_unlocked());
    }

    #[test]
    fn expiry_exactly_now_is_valid() {
        let now = at(T0);
        assert!(!record_expiring_at(now).is_expired(now));
    }

    // =========================================================================
    // Login / logout
    // =========================================================================

    #[test]
    fn login_creates_24h_session() {
        let mut store = MemoryStore::new();
        let record = gate()
            .login(&mut store, &auth_config(), "admin123", at(T0))
            .unwrap();
        assert_eq!(record.timestamp, at(T0));
        assert_eq!(record.expiry, at(T0 + 24 * HOUR));
        assert!(gate().state(&mut store, at(T0 + 24 * HOUR)).is_unlocked());
        assert_eq!(gate().state(&mut store, at(T0 + 24 * HOUR + 1)), GateState::Locked);
    }

    #[test]
    fn login_with_wrong_password_stays_locked() {
        let mut store = MemoryStore::new();
        let result = gate().login(&mut store, &auth_config(), "upload123", at(T0));
        assert!(matches!(
            result,
            Err(SessionError::Auth(AuthError::Invalid(Realm::Admin)))
        ));
        assert_eq!(gate().state(&mut store, at(T0)), GateState::Locked);
    }

    #[test]
    fn logout_locks() {
        let mut store = MemoryStore::new();
        gate()
            .login(&mut store, &auth_config(), "admin123", at(T0))
            .unwrap();
        gate().logout(&mut store).unwrap();
        assert_eq!(gate().state(&mut store, at(T0)), GateState::Locked);
    }

    #[test]
    fn realms_do_not_share_sessions() {
        let mut store = MemoryStore::new();
        let uploader = SessionGate::new(Realm::Uploader, SessionPolicy::default());
        uploader
            .login(&mut store, &auth_config(), "upload123", at(T0))
            .unwrap();
        assert!(uploader.state(&mut store, at(T0)).is_unlocked());
        assert_eq!(gate().state(&mut store, at(T0)), GateState::Locked);
    }

    // =========================================================================
    // Corruption
    // =========================================================================

    #[test]
    fn corrupt_record_is_locked_and_removed() {
        let mut store = MemoryStore::new();
        store
            .set(Realm::Admin.storage_key(), "{\"authenticated\":tru".into())
            .unwrap();
        assert_eq!(gate().state(&mut store, at(T0)), GateState::Locked);
        assert!(store.get(Realm::Admin.storage_key()).is_none());
    }

    #[test]
    fn unauthenticated_record_is_locked() {
        let mut record = record_expiring_at(at(T0 + HOUR));
        record.authenticated = false;
        let mut store = store_with(&record);
        assert_eq!(gate().state(&mut store, at(T0)), GateState::Locked);
    }

    #[test]
    fn record_uses_epoch_millis_on_disk() {
        let record = record_expiring_at(at(T0));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["expiry"], T0);
        assert_eq!(json["authenticated"], true);
        assert!(json.get("extendedAt").is_none());
    }

    // =========================================================================
    // Activity extension
    // =========================================================================

    #[test]
    fn touch_within_idle_window_does_not_extend() {
        let mut store = MemoryStore::new();
        let login = gate()
            .login(&mut store, &auth_config(), "admin123", at(T0))
            .unwrap();
        let state = gate().touch(&mut store, at(T0 + 4 * MINUTE)).unwrap();
        assert_eq!(state, GateState::Unlocked(login));
    }

    #[test]
    fn touch_after_idle_window_extends() {
        let mut store = MemoryStore::new();
        gate()
            .login(&mut store, &auth_config(), "admin123", at(T0))
            .unwrap();
        let now = at(T0 + 5 * MINUTE);
        let GateState::Unlocked(record) = gate().touch(&mut store, now).unwrap() else {
            panic!("expected unlocked");
        };
        assert_eq!(record.expiry, now + TimeDelta::hours(24));
        assert_eq!(record.extended_at, Some(now));

        // Next extension is measured from the last one.
        let again = gate().touch(&mut store, at(T0 + 9 * MINUTE)).unwrap();
        assert_eq!(again, GateState::Unlocked(record));
    }

    #[test]
    fn touch_does_not_revive_expired_session() {
        let now = at(T0);
        let mut store = store_with(&record_expiring_at(now - TimeDelta::milliseconds(1)));
        assert_eq!(gate().touch(&mut store, now).unwrap(), GateState::Locked);
    }

    #[test]
    fn require_reports_locked_realm() {
        let mut store = MemoryStore::new();
        let err = gate().require(&mut store, at(T0)).unwrap_err();
        assert!(matches!(err, SessionError::Locked(Realm::Admin)));
    }
}
