//! Personal to-do list: prioritised tasks with optional due dates, grouped by per-owner
//! categories.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    NewTask, NewTodoCategory, Priority, StatusFilter, Task, TaskId, TodoCategory, TodoCategoryId,
};
pub use repository::TodoRepository;
pub use router::todo_router;
pub use service::{
    TaskBoard, TaskCounts, TaskEntry, TaskForm, TaskQuery, TodoCategoryForm, TodoCategorySummary,
    TodoError, TodoService,
};
