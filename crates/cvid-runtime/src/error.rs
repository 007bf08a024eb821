use cvid_types::ObjId;

/// Errors from object space operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The handle does not name a live arena slot.
    #[error("dangling object reference: {0}")]
    DanglingObject(ObjId),

    /// Attribute lookup found nothing.
    #[error("{object} has no attribute {name:?}")]
    AttributeMissing { object: ObjId, name: String },

    /// The object exists but is of the wrong kind for the operation.
    #[error("{object} is not a {expected}")]
    WrongKind {
        object: ObjId,
        expected: &'static str,
    },
}

/// Result alias for object space operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
