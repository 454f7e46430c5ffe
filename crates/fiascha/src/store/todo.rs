use super::{InMemoryStore, RepositoryError, Tables};
use crate::accounts::AccountId;
use crate::workflows::todo::{
    NewTask, NewTodoCategory, Task, TaskId, TodoCategory, TodoCategoryId, TodoRepository,
};

impl Tables {
    fn todo_name_taken(&self, owner: AccountId, name: &str, except: Option<TodoCategoryId>) -> bool {
        self.todo_categories.values().any(|category| {
            category.owner == owner
                && category.name.eq_ignore_ascii_case(name)
                && Some(category.id) != except
        })
    }
}

impl TodoRepository for InMemoryStore {
    fn insert_task(&self, draft: NewTask) -> Result<Task, RepositoryError> {
        let mut tables = self.tables()?;
        let id = TaskId(tables.task_ids.next());
        let task = draft.into_task(id);
        tables.tasks.insert(id, task.clone());
        Ok(task)
    }

    fn update_task(&self, task: &Task) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        match tables.tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_task(&self, id: TaskId) -> Result<Option<Task>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.tasks.get(&id).cloned())
    }

    fn tasks_for(&self, owner: AccountId) -> Result<Vec<Task>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .tasks
            .values()
            .filter(|task| task.owner == owner)
            .cloned()
            .collect())
    }

    fn delete_task(&self, id: TaskId) -> Result<Task, RepositoryError> {
        let mut tables = self.tables()?;
        tables.tasks.remove(&id).ok_or(RepositoryError::NotFound)
    }

    fn insert_todo_category(
        &self,
        draft: NewTodoCategory,
    ) -> Result<TodoCategory, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.todo_name_taken(draft.owner, &draft.name, None) {
            return Err(RepositoryError::Conflict("todo_category_name"));
        }
        let id = TodoCategoryId(tables.todo_category_ids.next());
        let category = draft.into_category(id);
        tables.todo_categories.insert(id, category.clone());
        Ok(category)
    }

    fn update_todo_category(&self, category: &TodoCategory) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.todo_categories.contains_key(&category.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.todo_name_taken(category.owner, &category.name, Some(category.id)) {
            return Err(RepositoryError::Conflict("todo_category_name"));
        }
        tables
            .todo_categories
            .insert(category.id, category.clone());
        Ok(())
    }

    fn fetch_todo_category(
        &self,
        id: TodoCategoryId,
    ) -> Result<Option<TodoCategory>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables.todo_categories.get(&id).cloned())
    }

    fn todo_categories_for(
        &self,
        owner: AccountId,
    ) -> Result<Vec<TodoCategory>, RepositoryError> {
        let tables = self.tables()?;
        let mut categories: Vec<TodoCategory> = tables
            .todo_categories
            .values()
            .filter(|category| category.owner == owner)
            .cloned()
            .collect();
        categories.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(categories)
    }

    fn todo_category_task_count(&self, id: TodoCategoryId) -> Result<usize, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .tasks
            .values()
            .filter(|task| task.category == Some(id))
            .count())
    }

    fn delete_todo_category(&self, id: TodoCategoryId) -> Result<TodoCategory, RepositoryError> {
        let mut tables = self.tables()?;
        if !tables.todo_categories.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.tasks.values().any(|task| task.category == Some(id)) {
            return Err(RepositoryError::Conflict("todo_category_tasks"));
        }
        tables
            .todo_categories
            .remove(&id)
            .ok_or(RepositoryError::NotFound)
    }
}
