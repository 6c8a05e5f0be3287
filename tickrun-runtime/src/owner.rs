use std::fmt;

use crate::error::SchedulerError;

/// Opaque, stable handle identifying the plugin that owns a task.
///
/// The scheduler never manages plugin lifetime; it only compares handles
/// and asks the host's [`OwnerLiveness`] whether an owner is still enabled.
/// The raw value `0` is reserved as "no owner" and is rejected on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

impl OwnerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub(crate) fn validate(self) -> Result<Self, SchedulerError> {
        if self.0 == 0 {
            return Err(SchedulerError::InvalidArgument(
                "owner id 0 is reserved".to_string(),
            ));
        }
        Ok(self)
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

/// Host-answered query telling the scheduler whether an owner is still enabled.
///
/// Tasks of a disabled owner are cancelled instead of executed.
pub trait OwnerLiveness: Send + Sync {
    fn is_enabled(&self, owner: OwnerId) -> bool;
}

/// Liveness policy that treats every owner as enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysEnabled;

impl OwnerLiveness for AlwaysEnabled {
    fn is_enabled(&self, _owner: OwnerId) -> bool {
        true
    }
}

impl<F> OwnerLiveness for F
where
    F: Fn(OwnerId) -> bool + Send + Sync,
{
    fn is_enabled(&self, owner: OwnerId) -> bool {
        self(owner)
    }
}
