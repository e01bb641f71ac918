use shared::{ChoreStatus, Role};

/// Every way a core operation can fail. The set is closed: the REST
/// shell maps each kind to a status code and surfaces the reason
/// verbatim, so no variant carries internal detail.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// An entity or relation is absent.
    #[error("{0}")]
    NotFound(String),
    /// Role or ownership violation. Checked before any state machine
    /// rule, so a child poking at a parent-only action never learns
    /// whether the transition would have been legal.
    #[error("{0}")]
    Forbidden(String),
    /// The (role, current status, target status) triple is not in the
    /// transition table.
    #[error("{0}")]
    InvalidTransition(String),
    #[error("{0}")]
    InvalidAmount(String),
    #[error("insufficient points: you have {available} points but need {required} points")]
    InsufficientPoints { available: i64, required: i64 },
    /// One of the entries in a claim batch is not claimable. The whole
    /// batch is refused.
    #[error("{0}")]
    AlreadyClaimed(String),
    #[error("no points available to claim")]
    NothingToClaim,
    /// The ledger store failed. Retryable by the caller; the core never
    /// retries on its own.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl DomainError {
    /// Wrap a storage-layer failure. Only the message crosses the
    /// boundary.
    pub fn storage(err: anyhow::Error) -> Self {
        DomainError::StorageUnavailable(err.to_string())
    }

    pub fn invalid_transition(role: Role, current: ChoreStatus, target: ChoreStatus) -> Self {
        DomainError::InvalidTransition(format!(
            "a {} cannot move a {} chore to {}",
            role.as_str(),
            current.as_str(),
            target.as_str()
        ))
    }
}
