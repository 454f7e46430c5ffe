use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::domain::{
    NewTask, NewTodoCategory, Priority, StatusFilter, Task, TaskId, TodoCategory, TodoCategoryId,
};
use super::repository::TodoRepository;
use crate::accounts::access::load_actor;
use crate::accounts::{AccessError, Account, AccountId, AccountRepository};
use crate::clock::Clock;
use crate::store::RepositoryError;
use crate::validation::{optional_text, FieldErrors};

const DEFAULT_COLOR: &str = "#3498db";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TaskQuery {
    #[serde(default)]
    pub filter: StatusFilter,
    #[serde(default)]
    pub category: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub category_id: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TodoCategoryForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEntry {
    #[serde(flatten)]
    pub task: Task,
    pub priority_label: &'static str,
    pub category_name: Option<String>,
    pub is_overdue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodoCategorySummary {
    #[serde(flatten)]
    pub category: TodoCategory,
    pub task_count: usize,
}

/// The owner's filtered task list with counts over every task they own.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskBoard {
    pub tasks: Vec<TaskEntry>,
    pub counts: TaskCounts,
    pub filter: StatusFilter,
    pub categories: Vec<TodoCategorySummary>,
}

pub struct TodoService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> TodoService<S>
where
    S: AccountRepository + TodoRepository + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn board(&self, owner: AccountId, query: TaskQuery) -> Result<TaskBoard, TodoError> {
        let owner = self.actor(owner)?;
        let now = self.clock.now();
        let all = self.store.tasks_for(owner.id)?;

        let counts = TaskCounts {
            total: all.len(),
            active: all.iter().filter(|task| !task.completed).count(),
            completed: all.iter().filter(|task| task.completed).count(),
        };

        let categories = self.categories(owner.id)?;
        let names: HashMap<TodoCategoryId, String> = categories
            .iter()
            .map(|summary| (summary.category.id, summary.category.name.clone()))
            .collect();

        let category = query.category.map(TodoCategoryId);
        let mut tasks: Vec<Task> = all
            .into_iter()
            .filter(|task| query.filter.matches(task))
            .filter(|task| category.is_none() || task.category == category)
            .collect();
        tasks.sort_by(Task::board_order);

        Ok(TaskBoard {
            tasks: tasks
                .into_iter()
                .map(|task| entry(task, &names, now))
                .collect(),
            counts,
            filter: query.filter,
            categories,
        })
    }

    pub fn create_task(&self, owner: AccountId, form: TaskForm) -> Result<Task, TodoError> {
        let owner = self.actor(owner)?;
        let valid = self.validate_task(&owner, form)?;
        let task = self.store.insert_task(NewTask {
            owner: owner.id,
            title: valid.title,
            description: valid.description,
            priority: valid.priority,
            due_date: valid.due_date,
            category: valid.category,
            created_at: self.clock.now(),
        })?;
        info!(task = %task.id, owner = %owner.id, "task created");
        Ok(task)
    }

    pub fn update_task(
        &self,
        owner: AccountId,
        id: TaskId,
        form: TaskForm,
    ) -> Result<Task, TodoError> {
        let owner = self.actor(owner)?;
        let mut task = self.owned_task(&owner, id)?;
        let valid = self.validate_task(&owner, form)?;

        task.title = valid.title;
        task.description = valid.description;
        task.priority = valid.priority;
        task.due_date = valid.due_date;
        task.category = valid.category;
        task.updated_at = self.clock.now();
        self.store.update_task(&task)?;
        Ok(task)
    }

    /// Flip completion.
    pub fn toggle_task(&self, owner: AccountId, id: TaskId) -> Result<Task, TodoError> {
        let owner = self.actor(owner)?;
        let mut task = self.owned_task(&owner, id)?;
        task.completed = !task.completed;
        task.updated_at = self.clock.now();
        self.store.update_task(&task)?;
        Ok(task)
    }

    pub fn delete_task(&self, owner: AccountId, id: TaskId) -> Result<Task, TodoError> {
        let owner = self.actor(owner)?;
        self.owned_task(&owner, id)?;
        Ok(self.store.delete_task(id)?)
    }

    pub fn list_categories(&self, owner: AccountId) -> Result<Vec<TodoCategorySummary>, TodoError> {
        let owner = self.actor(owner)?;
        self.categories(owner.id)
    }

    pub fn create_category(
        &self,
        owner: AccountId,
        form: TodoCategoryForm,
    ) -> Result<TodoCategory, TodoError> {
        let owner = self.actor(owner)?;
        let (name, color) = validate_category(form)?;
        let category = self
            .store
            .insert_todo_category(NewTodoCategory {
                owner: owner.id,
                name,
                color,
                created_at: self.clock.now(),
            })
            .map_err(category_conflict)?;
        Ok(category)
    }

    pub fn update_category(
        &self,
        owner: AccountId,
        id: TodoCategoryId,
        form: TodoCategoryForm,
    ) -> Result<TodoCategory, TodoError> {
        let owner = self.actor(owner)?;
        let mut category = self.owned_category(&owner, id)?;
        let (name, color) = validate_category(form)?;
        category.name = name;
        category.color = color;
        self.store
            .update_todo_category(&category)
            .map_err(category_conflict)?;
        Ok(category)
    }

    pub fn delete_category(
        &self,
        owner: AccountId,
        id: TodoCategoryId,
    ) -> Result<TodoCategory, TodoError> {
        let owner = self.actor(owner)?;
        self.owned_category(&owner, id)?;
        let tasks = self.store.todo_category_task_count(id)?;
        if tasks > 0 {
            return Err(TodoError::CategoryInUse { id, tasks });
        }
        self.store.delete_todo_category(id).map_err(|error| match error {
            RepositoryError::Conflict(_) => TodoError::CategoryInUse { id, tasks: 1 },
            other => other.into(),
        })
    }

    fn actor(&self, id: AccountId) -> Result<Account, TodoError> {
        load_actor::<_, TodoError>(self.store.as_ref(), id)
    }

    /// Another owner's task reads as missing.
    fn owned_task(&self, owner: &Account, id: TaskId) -> Result<Task, TodoError> {
        self.store
            .fetch_task(id)?
            .filter(|task| task.owner == owner.id)
            .ok_or(TodoError::TaskNotFound(id))
    }

    fn owned_category(
        &self,
        owner: &Account,
        id: TodoCategoryId,
    ) -> Result<TodoCategory, TodoError> {
        self.store
            .fetch_todo_category(id)?
            .filter(|category| category.owner == owner.id)
            .ok_or(TodoError::CategoryNotFound(id))
    }

    fn categories(&self, owner: AccountId) -> Result<Vec<TodoCategorySummary>, TodoError> {
        let mut summaries = Vec::new();
        for category in self.store.todo_categories_for(owner)? {
            let task_count = self.store.todo_category_task_count(category.id)?;
            summaries.push(TodoCategorySummary {
                category,
                task_count,
            });
        }
        Ok(summaries)
    }

    fn validate_task(&self, owner: &Account, form: TaskForm) -> Result<ValidTask, TodoError> {
        let mut errors = FieldErrors::new();
        let title = form.title.trim().to_string();
        if errors.require("title", &title, "Title is required") {
            errors.check_length(
                "title",
                &title,
                1,
                Some(200),
                "Title must be between 1 and 200 characters",
            );
        }
        let description = optional_text(form.description);
        if let Some(description) = &description {
            errors.check_length(
                "description",
                description,
                0,
                Some(1000),
                "Description must be less than 1000 characters",
            );
        }
        let category = match form.category_id.map(TodoCategoryId) {
            Some(id) => {
                let owned = self
                    .store
                    .fetch_todo_category(id)?
                    .is_some_and(|category| category.owner == owner.id);
                if !owned {
                    errors.push("category_id", "Not a valid choice");
                }
                Some(id)
            }
            None => None,
        };
        errors.into_result()?;

        Ok(ValidTask {
            title,
            description,
            priority: form.priority.unwrap_or_default(),
            due_date: form.due_date,
            category,
        })
    }
}

struct ValidTask {
    title: String,
    description: Option<String>,
    priority: Priority,
    due_date: Option<DateTime<Utc>>,
    category: Option<TodoCategoryId>,
}

fn entry(task: Task, names: &HashMap<TodoCategoryId, String>, now: DateTime<Utc>) -> TaskEntry {
    TaskEntry {
        priority_label: task.priority.label(),
        category_name: task.category.and_then(|id| names.get(&id).cloned()),
        is_overdue: task.is_overdue(now),
        task,
    }
}

fn validate_category(form: TodoCategoryForm) -> Result<(String, String), FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = form.name.trim().to_string();
    if errors.require("name", &name, "Category name is required") {
        errors.check_length(
            "name",
            &name,
            1,
            Some(50),
            "Category name must be between 1 and 50 characters",
        );
    }
    let color = optional_text(form.color).unwrap_or_else(|| DEFAULT_COLOR.to_string());
    errors.check_hex_color("color", &color);
    errors.into_result()?;
    Ok((name, color))
}

fn category_conflict(error: RepositoryError) -> TodoError {
    match error {
        RepositoryError::Conflict(_) => {
            FieldErrors::single("name", "A category with this name already exists").into()
        }
        other => other.into(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error(transparent)]
    Validation(#[from] FieldErrors),
    #[error("task {0} not found")]
    TaskNotFound(TaskId),
    #[error("category {0} not found")]
    CategoryNotFound(TodoCategoryId),
    #[error("Cannot delete category with {tasks} task(s). Please reassign or delete tasks first.")]
    CategoryInUse { id: TodoCategoryId, tasks: usize },
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::accounts::{NewAccount, Role};
    use crate::clock::ManualClock;
    use crate::store::InMemoryStore;

    struct Fixture {
        service: TodoService<InMemoryStore>,
        clock: Arc<ManualClock>,
        ada: AccountId,
        bo: AccountId,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap(),
        ));
        let add = |username: &str| {
            store
                .insert_account(NewAccount {
                    username: username.to_string(),
                    email: format!("{username}@fiascha.gov"),
                    credential_hash: "sha256$1$00$00".to_string(),
                    full_name: None,
                    role: Role::Citizen,
                    is_admin: false,
                    created_at: clock.now(),
                })
                .unwrap()
                .id
        };
        let ada = add("ada");
        let bo = add("bo");
        Fixture {
            service: TodoService::new(store, clock.clone()),
            clock,
            ada,
            bo,
        }
    }

    fn form(title: &str, priority: Priority) -> TaskForm {
        TaskForm {
            title: title.to_string(),
            priority: Some(priority),
            ..TaskForm::default()
        }
    }

    #[test]
    fn board_filters_orders_and_counts() {
        let fx = fixture();
        let low = fx.service.create_task(fx.ada, form("Sweep", Priority::Low)).unwrap();
        let high = fx.service.create_task(fx.ada, form("File taxes", Priority::High)).unwrap();
        let done = fx.service.create_task(fx.ada, form("Vote", Priority::High)).unwrap();
        fx.service.toggle_task(fx.ada, done.id).unwrap();
        fx.service.create_task(fx.bo, form("Not mine", Priority::High)).unwrap();

        let board = fx.service.board(fx.ada, TaskQuery::default()).unwrap();
        let order: Vec<TaskId> = board.tasks.iter().map(|entry| entry.task.id).collect();
        assert_eq!(order, vec![high.id, low.id, done.id]);
        assert_eq!(
            board.counts,
            TaskCounts {
                total: 3,
                active: 2,
                completed: 1
            }
        );

        let active = fx
            .service
            .board(
                fx.ada,
                TaskQuery {
                    filter: StatusFilter::Active,
                    category: None,
                },
            )
            .unwrap();
        assert_eq!(active.tasks.len(), 2);
        assert_eq!(active.counts.total, 3);
    }

    #[test]
    fn toggle_flips_and_overdue_follows_the_clock() {
        let fx = fixture();
        let task = fx
            .service
            .create_task(
                fx.ada,
                TaskForm {
                    due_date: Some(fx.clock.now() + Duration::days(1)),
                    ..form("Renew permit", Priority::Medium)
                },
            )
            .unwrap();

        fx.clock.advance(Duration::days(2));
        let board = fx.service.board(fx.ada, TaskQuery::default()).unwrap();
        assert!(board.tasks[0].is_overdue);

        let toggled = fx.service.toggle_task(fx.ada, task.id).unwrap();
        assert!(toggled.completed);
        let board = fx.service.board(fx.ada, TaskQuery::default()).unwrap();
        assert!(!board.tasks[0].is_overdue);
        assert!(!fx.service.toggle_task(fx.ada, task.id).unwrap().completed);
    }

    #[test]
    fn other_owners_tasks_read_as_missing() {
        let fx = fixture();
        let task = fx.service.create_task(fx.ada, form("Private", Priority::Low)).unwrap();
        assert!(matches!(
            fx.service.delete_task(fx.bo, task.id),
            Err(TodoError::TaskNotFound(_))
        ));
        fx.service.delete_task(fx.ada, task.id).unwrap();
    }

    #[test]
    fn tasks_only_take_the_owners_categories() {
        let fx = fixture();
        let theirs = fx
            .service
            .create_category(
                fx.bo,
                TodoCategoryForm {
                    name: "Home".into(),
                    color: None,
                },
            )
            .unwrap();
        let result = fx.service.create_task(
            fx.ada,
            TaskForm {
                category_id: Some(theirs.id.0),
                ..form("Borrowed", Priority::Low)
            },
        );
        match result {
            Err(TodoError::Validation(errors)) => assert!(errors.has("category_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn categories_with_tasks_cannot_be_deleted() {
        let fx = fixture();
        let home = fx
            .service
            .create_category(
                fx.ada,
                TodoCategoryForm {
                    name: "Home".into(),
                    color: Some("#A1B2C3".into()),
                },
            )
            .unwrap();
        let task = fx
            .service
            .create_task(
                fx.ada,
                TaskForm {
                    category_id: Some(home.id.0),
                    ..form("Fix roof", Priority::High)
                },
            )
            .unwrap();

        match fx.service.delete_category(fx.ada, home.id) {
            Err(error @ TodoError::CategoryInUse { tasks: 1, .. }) => assert_eq!(
                error.to_string(),
                "Cannot delete category with 1 task(s). Please reassign or delete tasks first."
            ),
            other => panic!("expected category in use, got {other:?}"),
        }
        let summaries = fx.service.list_categories(fx.ada).unwrap();
        assert_eq!(summaries[0].task_count, 1);

        fx.service.delete_task(fx.ada, task.id).unwrap();
        fx.service.delete_category(fx.ada, home.id).unwrap();
    }

    #[test]
    fn category_names_are_unique_per_owner_and_colours_checked() {
        let fx = fixture();
        let named = |name: &str, color: Option<&str>| TodoCategoryForm {
            name: name.to_string(),
            color: color.map(str::to_string),
        };
        fx.service.create_category(fx.ada, named("Work", None)).unwrap();
        fx.service.create_category(fx.bo, named("Work", None)).unwrap();

        assert!(matches!(
            fx.service.create_category(fx.ada, named("work", None)),
            Err(TodoError::Validation(_))
        ));
        assert!(matches!(
            fx.service.create_category(fx.ada, named("Errands", Some("blue"))),
            Err(TodoError::Validation(_))
        ));
    }
}
