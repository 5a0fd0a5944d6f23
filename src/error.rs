use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlacementError {
    #[error("chat room capacity must be at least 1, got {0}")]
    InvalidCapacity(usize),
}
