//! Run status enum mapping to a SMALLINT column.
//!
//! Variant discriminants match the seed order (1-based) of the
//! `run_statuses` lookup table.

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

/// Lifecycle status of a generation run.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued = 1,
    InProgress = 2,
    Success = 3,
    Error = 4,
    Cancelled = 5,
}

impl RunStatus {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Self::Queued),
            2 => Some(Self::InProgress),
            3 => Some(Self::Success),
            4 => Some(Self::Error),
            5 => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error | Self::Cancelled)
    }
}

impl From<RunStatus> for StatusId {
    fn from(value: RunStatus) -> Self {
        value as StatusId
    }
}
