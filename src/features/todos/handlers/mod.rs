pub mod todo_handler;

pub use todo_handler::{
    __path_create_attachment, __path_create_todo, __path_delete_todo, __path_get_todo,
    __path_list_todos, __path_remove_attachment, __path_update_todo, create_attachment,
    create_todo, delete_todo, get_todo, list_todos, remove_attachment, update_todo, TodoState,
};
