//! Core types for the message view.

use crate::source::NoticeUid;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Counter backing process-local message ids.
static NEXT_LOCAL_ID: AtomicU64 = AtomicU64::new(1);

/// Seconds since Unix epoch, as received.
///
/// Compared with IEEE total ordering, so every value (NaN included) has a
/// stable place in the sort.
#[derive(Clone, Copy, Serialize, Deserialize, Default)]
pub struct Timestamp(pub f64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp(secs)
    }

    /// Convert a wall-clock time. Times before the epoch become negative.
    pub fn from_system_time(time: SystemTime) -> Self {
        match time.duration_since(UNIX_EPOCH) {
            Ok(d) => Timestamp(d.as_secs_f64()),
            Err(e) => Timestamp(-e.duration().as_secs_f64()),
        }
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Opaque, globally unique message identity.
///
/// Only used to break ties between equal timestamps; the ordering of ids
/// carries no meaning beyond being total and stable.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        MessageId(id.into())
    }

    /// Allocate an id unique within this process.
    pub fn local() -> Self {
        let n = NEXT_LOCAL_ID.fetch_add(1, AtomicOrdering::Relaxed);
        MessageId(format!("local:{:016x}", n))
    }

    /// Derive the id from a notice's unique address and sequence data.
    pub fn from_uid(uid: &NoticeUid) -> Self {
        MessageId(format!("{}/{}.{:06}", uid.address, uid.secs, uid.micros))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        MessageId::new(s)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        MessageId(s)
    }
}

/// Sort key imposing a strict total order on messages.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct MessageKey<'a> {
    pub timestamp: Timestamp,
    pub id: &'a MessageId,
}

/// A single received message.
///
/// Equality and hashing go through `id` only; two messages sharing a
/// timestamp are still distinct.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,

    /// When the message was sent.
    pub timestamp: Timestamp,

    pub class: String,
    pub instance: String,
    pub sender: String,
    pub recipient: String,

    /// Free-form signature line supplied by the sender.
    pub signature: String,

    pub body: String,

    /// Whether the source vouched for `sender`.
    pub authenticated: bool,

    /// Address the message originated from.
    pub host: Option<IpAddr>,

    /// Protocol-specific fields with no dedicated slot.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Message {
    /// Create an empty message with a fresh process-local id.
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            id: MessageId::local(),
            timestamp,
            class: String::new(),
            instance: String::new(),
            sender: String::new(),
            recipient: String::new(),
            signature: String::new(),
            body: String::new(),
            authenticated: false,
            host: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<MessageId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set an extension field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn key(&self) -> MessageKey<'_> {
        MessageKey {
            timestamp: self.timestamp,
            id: &self.id,
        }
    }

    /// Look up a field by name, known fields first, then `extra`.
    pub fn get(&self, field: &str) -> Option<Cow<'_, str>> {
        let known = match field {
            "id" => Cow::Borrowed(self.id.as_str()),
            "time" => Cow::Owned(self.timestamp.to_string()),
            "class" => Cow::Borrowed(self.class.as_str()),
            "instance" => Cow::Borrowed(self.instance.as_str()),
            "sender" => Cow::Borrowed(self.sender.as_str()),
            "recipient" => Cow::Borrowed(self.recipient.as_str()),
            "signature" => Cow::Borrowed(self.signature.as_str()),
            "body" => Cow::Borrowed(self.body.as_str()),
            "auth" => Cow::Borrowed(if self.authenticated { "true" } else { "false" }),
            "host" => return self.host.map(|h| Cow::Owned(h.to_string())),
            _ => return self.extra.get(field).map(|v| Cow::Borrowed(v.as_str())),
        };
        Some(known)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Which way to step through the view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn msg(ts: f64, id: &str) -> Message {
        Message::new(Timestamp(ts)).with_id(id)
    }

    #[test]
    fn test_key_tie_break_on_id() {
        assert!(msg(10.0, "a") < msg(10.0, "c"));
        assert!(msg(5.0, "z") < msg(10.0, "a"));
    }

    #[test]
    fn test_equality_is_identity() {
        assert_eq!(msg(1.0, "x"), msg(2.0, "x"));
        assert_ne!(msg(1.0, "x"), msg(1.0, "y"));
    }

    #[test]
    fn test_local_ids_unique() {
        let a = Message::new(Timestamp(1.0));
        let b = Message::new(Timestamp(1.0));
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_constructors() {
        assert_eq!(Timestamp::from_secs_f64(1.5).as_secs_f64(), 1.5);
        assert!(Timestamp::now() > Timestamp::from_secs_f64(1_600_000_000.0));

        let before_epoch = UNIX_EPOCH - std::time::Duration::from_secs(2);
        assert_eq!(Timestamp::from_system_time(before_epoch), Timestamp(-2.0));
    }

    #[test]
    fn test_nan_timestamp_is_ordered() {
        let nan = Timestamp(f64::NAN);
        assert_eq!(nan, nan);
        assert!(Timestamp(1.0) < nan);
    }

    #[test]
    fn test_from_uid_ignores_timestamp_only_collisions() {
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let a = MessageId::from_uid(&NoticeUid { address: addr, secs: 100, micros: 1 });
        let b = MessageId::from_uid(&NoticeUid { address: addr, secs: 100, micros: 2 });
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "10.0.0.1/100.000001");
    }

    #[test]
    fn test_field_lookup() {
        let m = msg(1.0, "x")
            .with_sender("alice")
            .with_body("hi")
            .with_field("opcode", "auto");
        assert_eq!(m.get("sender").as_deref(), Some("alice"));
        assert_eq!(m.get("body").as_deref(), Some("hi"));
        assert_eq!(m.get("opcode").as_deref(), Some("auto"));
        assert_eq!(m.get("auth").as_deref(), Some("false"));
        assert!(m.get("host").is_none());
        assert!(m.get("missing").is_none());
    }
}
