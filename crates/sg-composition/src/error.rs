use thiserror::Error;

pub type CompositionResult<T> = Result<T, CompositionError>;

#[derive(Debug, Error)]
pub enum CompositionError {
    #[error("missing {what} for slot {slot}")]
    MissingSlotAsset { slot: String, what: &'static str },
}
