use thiserror::Error;

use crate::geometry::detid::DetId;

/// Fatal failures of the conversion core.
///
/// Filtering decisions (quality cuts, processor windows, unmapped layers)
/// are not errors and never show up here.
#[derive(Debug, Error)]
pub enum OmtfError {
    /// The geometry has no entry for a detector id delivered by the event
    /// source. This is a detector inconsistency and aborts the event.
    #[error("no geometry for detector id {0}")]
    Geometry(DetId),
}

pub type Result<T> = std::result::Result<T, OmtfError>;
