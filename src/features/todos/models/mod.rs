mod todo;

pub use todo::{TodoChanges, TodoItem};
