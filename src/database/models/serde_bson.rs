//! Serde adapters between BSON storage types and the JSON wire format.
//!
//! Read models decode native BSON (`ObjectId`, BSON datetimes) but serialize
//! to JSON as hex strings and RFC 3339 timestamps. They are never written back
//! to the store through serde; writes build their own documents.

use bson::oid::ObjectId;
use chrono::{DateTime, Utc};
use serde::{ser::SerializeSeq, Deserialize, Deserializer, Serializer};

pub use bson::serde_helpers::serialize_object_id_as_hex_string as object_id_hex;

pub fn object_ids_hex<S>(ids: &[ObjectId], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut seq = serializer.serialize_seq(Some(ids.len()))?;
    for id in ids {
        seq.serialize_element(&id.to_hex())?;
    }
    seq.end()
}

/// BSON datetime in, RFC 3339 out
pub mod datetime {
    use super::*;
    use serde::Serialize;

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        bson::DateTime::deserialize(deserializer).map(|dt| dt.to_chrono())
    }
}

/// Current time truncated to the millisecond precision BSON stores
pub fn now() -> DateTime<Utc> {
    bson::DateTime::now().to_chrono()
}
