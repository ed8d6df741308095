use thiserror::Error;
use uuid::Uuid;

/// Storage-layer errors surfaced by `ClinicDatabase`.
///
/// Every variant carries enough detail (entity, field, conflicting row) for
/// the caller to act on; nothing is swallowed at this layer.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("{entity}.{field} must be unique: {value} already exists")]
    UniqueViolation {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{entity}.{field} references missing row {id}")]
    MissingReference {
        entity: &'static str,
        field: &'static str,
        id: Uuid,
    },

    #[error("cannot delete {entity} {id}: {dependents} dependent rows exist")]
    ReferentialConflict {
        entity: &'static str,
        id: Uuid,
        dependents: usize,
    },
}
