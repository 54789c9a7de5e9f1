#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Authority,
    Replica,
}

impl Role {
    pub fn is_authority(self) -> bool {
        matches!(self, Self::Authority)
    }

    /// Guard placed at the top of every authoritative handler. Replicas never
    /// write shared state, so a failed guard aborts before anything changes.
    pub fn require_authority(self, operation: &'static str) -> Result<(), AuthorityError> {
        match self {
            Self::Authority => Ok(()),
            Self::Replica => {
                log::warn!("{} rejected: this process is not the authority", operation);
                Err(AuthorityError { operation })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{operation} requires authority")]
pub struct AuthorityError {
    pub operation: &'static str,
}
