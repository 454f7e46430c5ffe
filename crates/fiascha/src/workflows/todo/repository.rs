use super::domain::{NewTask, NewTodoCategory, Task, TaskId, TodoCategory, TodoCategoryId};
use crate::accounts::AccountId;
use crate::store::RepositoryError;

/// Storage abstraction for to-do tasks and their categories.
pub trait TodoRepository: Send + Sync {
    fn insert_task(&self, draft: NewTask) -> Result<Task, RepositoryError>;
    fn update_task(&self, task: &Task) -> Result<(), RepositoryError>;
    fn fetch_task(&self, id: TaskId) -> Result<Option<Task>, RepositoryError>;
    /// Every task owned by `owner`, in id order.
    fn tasks_for(&self, owner: AccountId) -> Result<Vec<Task>, RepositoryError>;
    fn delete_task(&self, id: TaskId) -> Result<Task, RepositoryError>;

    /// Category names are unique per owner.
    fn insert_todo_category(&self, draft: NewTodoCategory)
        -> Result<TodoCategory, RepositoryError>;
    fn update_todo_category(&self, category: &TodoCategory) -> Result<(), RepositoryError>;
    fn fetch_todo_category(
        &self,
        id: TodoCategoryId,
    ) -> Result<Option<TodoCategory>, RepositoryError>;
    /// The owner's categories ordered by name.
    fn todo_categories_for(&self, owner: AccountId)
        -> Result<Vec<TodoCategory>, RepositoryError>;
    fn todo_category_task_count(&self, id: TodoCategoryId) -> Result<usize, RepositoryError>;
    /// Refused with `Conflict` while any task references the category.
    fn delete_todo_category(&self, id: TodoCategoryId) -> Result<TodoCategory, RepositoryError>;
}
