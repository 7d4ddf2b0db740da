//! Entity trait: persisted records addressed by a stable identifier.

/// A record with identity.
///
/// Two entities with the same id are the same record, whatever their other
/// attributes say.
pub trait Entity {
    /// Strongly-typed identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    /// Short lowercase name used in log fields and error messages (e.g. "user").
    const KIND: &'static str;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}
