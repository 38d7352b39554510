//! Owner-scoped task collection kept in step with the authority.
//!
//! Every mutation waits for the authority's answer before touching the local
//! collection; a failed call leaves it exactly as it was.

use std::fmt;
use std::str::FromStr;

use taskdeck_api::{ApiError, Gateway, Task, TaskChanges, TaskDraft, TaskQuery};

use crate::error::{SyncError, UnknownFilter};

pub const EMPTY_TITLE_MESSAGE: &str = "task title must not be empty";

/// Completion filter, applied server-side on load and locally by
/// [`TaskSync::derive_view`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TaskFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 3] = [TaskFilter::All, TaskFilter::Pending, TaskFilter::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Value of the `completed` query parameter; `None` means unfiltered.
    pub fn completed_param(self) -> Option<bool> {
        match self {
            Self::All => None,
            Self::Pending => Some(false),
            Self::Completed => Some(true),
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        match self.completed_param() {
            Some(completed) => task.completed == completed,
            None => true,
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = UnknownFilter;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            _ => Err(UnknownFilter(value.to_owned())),
        }
    }
}

/// Task collection for one owner, newest creations first.
///
/// Callers serialize mutations per task id; overlapping writes to the same
/// task resolve as last response wins unless the authority enforces
/// revisions, in which case the loser sees [`SyncError::Conflict`].
#[derive(Debug, Clone)]
pub struct TaskSync {
    gateway: Gateway,
    collection: Vec<Task>,
    active_filter: TaskFilter,
}

impl TaskSync {
    pub fn new(gateway: Gateway) -> Self {
        Self {
            gateway,
            collection: Vec::new(),
            active_filter: TaskFilter::All,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.collection
    }

    /// Filter of the last successful load.
    pub fn active_filter(&self) -> TaskFilter {
        self.active_filter
    }

    pub fn get(&self, task_id: i64) -> Option<&Task> {
        self.collection.iter().find(|task| task.id == task_id)
    }

    /// Replace the whole collection with the authority's view for `filter`.
    pub async fn load(&mut self, owner_id: i64, filter: TaskFilter) -> Result<&[Task], SyncError> {
        self.load_matching(owner_id, filter, None).await
    }

    /// [`TaskSync::load`] narrowed by a server-side text search.
    pub async fn load_matching(
        &mut self,
        owner_id: i64,
        filter: TaskFilter,
        search: Option<&str>,
    ) -> Result<&[Task], SyncError> {
        let mut query = TaskQuery::completed(filter.completed_param());
        if let Some(search) = search {
            query = query.with_search(search);
        }

        let tasks = self.gateway.list_tasks(owner_id, &query).await?;
        for task in &tasks {
            ensure_owned(owner_id, task)?;
        }

        tracing::debug!(owner_id, %filter, count = tasks.len(), "tasks loaded");
        self.collection = tasks;
        self.active_filter = filter;
        Ok(&self.collection)
    }

    pub async fn create(
        &mut self,
        owner_id: i64,
        title: &str,
        description: &str,
    ) -> Result<Task, SyncError> {
        self.create_draft(owner_id, TaskDraft::new(title, description))
            .await
    }

    /// Create with optional priority, due date and category.
    pub async fn create_draft(&mut self, owner_id: i64, draft: TaskDraft) -> Result<Task, SyncError> {
        if draft.title.trim().is_empty() {
            return Err(SyncError::Validation(EMPTY_TITLE_MESSAGE.to_owned()));
        }

        let task = self.gateway.create_task(owner_id, &draft).await?;
        ensure_owned(owner_id, &task)?;

        tracing::debug!(owner_id, task_id = task.id, "task created");
        self.collection.insert(0, task.clone());
        Ok(task)
    }

    /// Missing fields resolve from the local copy; an absent local
    /// description is sent as `""`.
    pub async fn update(
        &mut self,
        owner_id: i64,
        task_id: i64,
        title: Option<&str>,
        description: Option<&str>,
    ) -> Result<Task, SyncError> {
        let existing = self.get(task_id).ok_or(SyncError::NotFound { task_id })?;
        let changes = TaskChanges {
            title: title.map_or_else(|| existing.title.clone(), str::to_owned),
            description: description.map_or_else(
                || existing.description.clone().unwrap_or_default(),
                str::to_owned,
            ),
        };
        if changes.title.trim().is_empty() {
            return Err(SyncError::Validation(EMPTY_TITLE_MESSAGE.to_owned()));
        }
        let revision = existing.revision;

        let task = self
            .gateway
            .update_task(owner_id, task_id, &changes, revision)
            .await
            .map_err(|error| mutation_error(task_id, error))?;
        ensure_owned(owner_id, &task)?;

        tracing::debug!(owner_id, task_id, "task updated");
        self.replace(task.clone());
        Ok(task)
    }

    /// The authority decides the resulting completion state.
    pub async fn toggle_complete(&mut self, owner_id: i64, task_id: i64) -> Result<Task, SyncError> {
        let revision = self.get(task_id).and_then(|task| task.revision);
        let task = self
            .gateway
            .toggle_task(owner_id, task_id, revision)
            .await
            .map_err(|error| mutation_error(task_id, error))?;
        ensure_owned(owner_id, &task)?;

        tracing::debug!(owner_id, task_id, completed = task.completed, "task toggled");
        self.replace(task.clone());
        Ok(task)
    }

    pub async fn delete(&mut self, owner_id: i64, task_id: i64) -> Result<(), SyncError> {
        let revision = self.get(task_id).and_then(|task| task.revision);
        self.gateway
            .delete_task(owner_id, task_id, revision)
            .await
            .map_err(|error| mutation_error(task_id, error))?;

        tracing::debug!(owner_id, task_id, "task deleted");
        self.collection.retain(|task| task.id != task_id);
        Ok(())
    }

    /// Re-fetch one task, replacing the local copy or appending it.
    pub async fn refresh(&mut self, owner_id: i64, task_id: i64) -> Result<Task, SyncError> {
        let task = self.gateway.get_task(owner_id, task_id).await?;
        ensure_owned(owner_id, &task)?;

        if !self.replace(task.clone()) {
            self.collection.push(task.clone());
        }
        Ok(task)
    }

    /// Pure view over the current collection; never touches the network.
    pub fn derive_view(&self, filter: TaskFilter) -> Vec<&Task> {
        self.collection
            .iter()
            .filter(|task| filter.matches(task))
            .collect()
    }

    /// [`TaskSync::derive_view`] for the active filter.
    pub fn visible(&self) -> Vec<&Task> {
        self.derive_view(self.active_filter)
    }

    fn replace(&mut self, task: Task) -> bool {
        match self.collection.iter_mut().find(|slot| slot.id == task.id) {
            Some(slot) => {
                *slot = task;
                true
            }
            None => false,
        }
    }
}

fn ensure_owned(owner_id: i64, task: &Task) -> Result<(), SyncError> {
    if task.owner_id == owner_id {
        return Ok(());
    }
    tracing::warn!(
        task_id = task.id,
        expected = owner_id,
        found = task.owner_id,
        "authority returned a task for another owner"
    );
    Err(SyncError::OwnerMismatch {
        task_id: task.id,
        expected: owner_id,
        found: task.owner_id,
    })
}

fn mutation_error(task_id: i64, error: ApiError) -> SyncError {
    if error.is_status(409) {
        tracing::warn!(task_id, "stale revision rejected");
        return SyncError::Conflict {
            task_id,
            message: error.message(),
        };
    }
    SyncError::Api(error)
}
