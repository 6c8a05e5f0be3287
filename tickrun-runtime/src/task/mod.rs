mod record;
mod types;

pub(crate) use record::{Completion, TaskRecord};
pub use types::{Placement, TaskId, TaskKind, TaskState};
