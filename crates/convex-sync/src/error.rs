use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("format error: {0}")]
    Format(#[from] convex_data::FormatError),

    #[error("store error: {0}")]
    Store(#[from] convex_store::StoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;
