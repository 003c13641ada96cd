use crate::expression::Field;
use crate::id_map::IdKind;

/// Result type for our error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while turning mapping expressions into a [`MappingPlan`].
///
/// [`MappingPlan`]: crate::MappingPlan
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The expression does not have the `uid[:gid][=uid[:gid]]` shape.
    #[error("invalid mapping format: '{expr}'")]
    Syntax { expr: String },

    /// A numeric field parsed, but falls outside `[min, max]`.
    #[error("{field}: value '{value}' is not in range {min}-{max}")]
    Range {
        field: Field,
        value: String,
        min: u32,
        max: u32,
    },

    /// Two expressions remap the same container ID.
    #[error("container {kind} {id} is mapped more than once")]
    DuplicateId { kind: IdKind, id: u32 },

    #[error("no IDs provided")]
    NoMappings,
}
