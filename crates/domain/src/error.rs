use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid pitch identifier {id:?}: {reason}")]
    InvalidPitch { id: String, reason: &'static str },
}

impl DomainError {
    pub fn invalid_pitch(id: &str, reason: &'static str) -> Self {
        Self::InvalidPitch {
            id: id.to_string(),
            reason,
        }
    }
}
