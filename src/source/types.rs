//! Raw notices and subscription types at the source boundary.

use crate::types::{Message, MessageId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;

/// Unique address and sequence data the protocol stamps on every notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoticeUid {
    pub address: IpAddr,
    pub secs: i64,
    pub micros: u32,
}

/// A notice as handed over by the protocol library.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Notice {
    pub uid: NoticeUid,
    pub time: Timestamp,
    pub class: String,
    pub instance: String,
    pub sender: String,
    pub recipient: String,
    pub authenticated: bool,

    /// Positional payload fields: signature, body, then anything else.
    pub fields: Vec<String>,
}

impl From<Notice> for Message {
    fn from(notice: Notice) -> Self {
        let mut fields = notice.fields.into_iter();
        let signature = fields.next().unwrap_or_default();
        let body = fields
            .next()
            .map(|b| b.trim_matches('\n').to_string())
            .unwrap_or_default();
        let extra: BTreeMap<String, String> = fields
            .enumerate()
            .map(|(i, v)| (format!("field{}", i + 2), v))
            .collect();

        Message {
            id: MessageId::from_uid(&notice.uid),
            timestamp: notice.time,
            class: notice.class,
            instance: notice.instance,
            sender: notice.sender,
            recipient: notice.recipient,
            signature,
            body,
            authenticated: notice.authenticated,
            host: Some(notice.uid.address),
            extra,
        }
    }
}

/// One `(class, instance, recipient)` subscription triple.
///
/// Wildcards such as `*` are passed through untouched; matching is up to
/// the source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    pub class: String,
    pub instance: String,
    pub recipient: String,
}

impl Topic {
    pub fn new(
        class: impl Into<String>,
        instance: impl Into<String>,
        recipient: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            instance: instance.into(),
            recipient: recipient.into(),
        }
    }

    /// Every instance of `class`, addressed to anyone.
    pub fn class(class: impl Into<String>) -> Self {
        Self::new(class, "*", "*")
    }
}

/// Topics a source has accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Subscription {
    pub topics: Vec<Topic>,
}
