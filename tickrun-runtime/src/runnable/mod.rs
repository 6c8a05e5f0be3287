mod r#trait;
mod body;

pub use r#trait::Runnable;
pub(crate) use body::{CallableBody, TaskBody};
