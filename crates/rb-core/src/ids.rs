//! # Identifiers
//!
//! Documents are keyed by 12-byte [`ObjectId`]s rendered as lowercase hex.
//!
//! Users are keyed by an opaque [`UserId`] supplied by the authentication
//! collaborator. It is only ever compared for equality.

use bson::oid;
use serde::{
    de::{Error as _, Unexpected},
    Deserialize, Deserializer, Serialize, Serializer,
};
use std::{
    fmt::{self, Debug, Display},
    marker::PhantomData,
    str::FromStr,
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("{input:?} is not a valid {kind} identifier")]
pub struct InvalidIdError {
    pub kind: &'static str,
    pub input: String,
}

/// A 12-byte document identifier.
///
/// Wraps the BSON ObjectId so document adapters can store it natively, but
/// serializes as a plain hex string everywhere else.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ObjectId(oid::ObjectId);

impl ObjectId {
    /// Generates a fresh, time-ordered identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(oid::ObjectId::new())
    }

    #[must_use]
    pub const fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(oid::ObjectId::from_bytes(bytes))
    }

    #[must_use]
    pub const fn bytes(self) -> [u8; 12] {
        self.0.bytes()
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        self.0.to_hex()
    }

    fn parse(kind: &'static str, input: &str) -> Result<Self, InvalidIdError> {
        oid::ObjectId::parse_str(input)
            .map(Self)
            .map_err(|_| InvalidIdError {
                kind,
                input: input.to_owned(),
            })
    }
}

impl From<oid::ObjectId> for ObjectId {
    fn from(value: oid::ObjectId) -> Self {
        Self(value)
    }
}

impl From<ObjectId> for oid::ObjectId {
    fn from(value: ObjectId) -> Self {
        value.0
    }
}

impl FromStr for ObjectId {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("object", s)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let inner = String::deserialize(deserializer)?;
        inner
            .parse()
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&inner), &"24 hex characters"))
    }
}

/// Names the entity an [`Id`] belongs to.
pub trait Marker {
    const KIND: &'static str;
}

/// An [`ObjectId`] tagged with the entity it identifies, so a comment id
/// cannot be passed where a post id is expected.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id<M>(ObjectId, #[serde(skip)] PhantomData<M>);

impl<M> Id<M> {
    #[must_use]
    pub fn new(object_id: ObjectId) -> Self {
        Self(object_id, PhantomData)
    }

    #[must_use]
    pub fn generate() -> Self {
        Self::new(ObjectId::generate())
    }

    #[must_use]
    pub fn object_id(self) -> ObjectId {
        self.0
    }
}

impl<M: Marker> FromStr for Id<M> {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse(M::KIND, s).map(Self::new)
    }
}

impl<M> Display for Id<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<M> From<ObjectId> for Id<M> {
    fn from(value: ObjectId) -> Self {
        Self::new(value)
    }
}

impl<M> From<Id<M>> for ObjectId {
    fn from(value: Id<M>) -> Self {
        value.0
    }
}

/// Opaque user identifier, canonically lowercase hex.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct UserId(Box<[u8]>);

impl UserId {
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Box<[u8]>>) -> Self {
        Self(bytes.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl FromStr for UserId {
    type Err = InvalidIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match hex::decode(s) {
            Ok(bytes) if !bytes.is_empty() => Ok(Self(bytes.into_boxed_slice())),
            _ => Err(InvalidIdError {
                kind: "user",
                input: s.to_owned(),
            }),
        }
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserId").field(&self.to_hex()).finish()
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let inner = String::deserialize(deserializer)?;
        inner
            .parse()
            .map_err(|_| D::Error::invalid_value(Unexpected::Str(&inner), &"non-empty hex"))
    }
}
