pub mod todo_dto;

pub use todo_dto::{
    CreateTodoDto, TodoItemDto, TodoListResponseDto, TodoResponseDto, UpdateTodoDto,
    UploadUrlResponseDto,
};
