//! Typed UUID wrappers.
//!
//! `Id<T, V>` tags a `Uuid` with the record it points at, so a `DriveId` can
//! never stand in for an `EventId`. `V` says how fresh ids are minted:
//! [`V7`] ids come from `new()`, [`V5`] ids only from `derived()`.
//!
//! ```rust
//! use drive_core::common::{DriveId, EventId};
//!
//! let drive_id = DriveId::new();
//! let event_id = EventId::derived(drive_id.as_uuid(), "ana@mail.io:BPS");
//! assert_eq!(event_id, EventId::derived(drive_id.as_uuid(), "ana@mail.io:BPS"));
//! // let wrong: EventId = drive_id; // compile error
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// Time-ordered ids minted by `new()`.
pub struct V7;

/// Name-based ids, minted only by `derived()`.
pub struct V5;

#[repr(transparent)]
pub struct Id<T, V = V7>(Uuid, PhantomData<fn() -> (T, V)>);

impl<T> Id<T, V7> {
    pub fn new() -> Self {
        Self(Uuid::now_v7(), PhantomData)
    }
}

impl<T> Default for Id<T, V7> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Id<T, V5> {
    /// Same namespace and name always give the same id.
    pub fn derived(namespace: &Uuid, name: &str) -> Self {
        Self(Uuid::new_v5(namespace, name.as_bytes()), PhantomData)
    }
}

impl<T, V> Id<T, V> {
    fn wrap(uuid: Uuid) -> Self {
        Self(uuid, PhantomData)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

// ============================================================================
// Standard traits (manual, so markers need no bounds)
// ============================================================================

impl<T, V> Clone for Id<T, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, V> Copy for Id<T, V> {}

impl<T, V> PartialEq for Id<T, V> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<T, V> Eq for Id<T, V> {}

impl<T, V> Hash for Id<T, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl<T, V> fmt::Debug for Id<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = std::any::type_name::<T>().rsplit("::").next().unwrap_or("Id");
        write!(f, "{}({})", marker, self.0)
    }
}

impl<T, V> fmt::Display for Id<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<T, V> FromStr for Id<T, V> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::wrap)
    }
}

// ============================================================================
// Serde and sqlx: stored as a plain UUID
// ============================================================================

impl<T, V> Serialize for Id<T, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T, V> Deserialize<'de> for Id<T, V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Uuid::deserialize(deserializer).map(Self::wrap)
    }
}

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

impl<T, V> Type<Postgres> for Id<T, V> {
    fn type_info() -> PgTypeInfo {
        <Uuid as Type<Postgres>>::type_info()
    }
}

impl<T, V> Encode<'_, Postgres> for Id<T, V> {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <Uuid as Encode<Postgres>>::encode_by_ref(&self.0, buf)
    }
}

impl<T, V> Decode<'_, Postgres> for Id<T, V> {
    fn decode(value: PgValueRef<'_>) -> Result<Self, BoxDynError> {
        <Uuid as Decode<Postgres>>::decode(value).map(Self::wrap)
    }
}
