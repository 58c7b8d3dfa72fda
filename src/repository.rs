//! Cached view of the stored task list
//!
//! The repository never patches its cache in place: every successful
//! mutation is followed by a full re-read from the store. A mutation's
//! result reflects the write only; if the re-read fails afterwards it is
//! logged and the cache stays as it was until the next refresh.

use crate::db::TaskStore;
use crate::models::{Task, TaskEdit};
use crate::query::ViewFilter;
use crate::{Error, Result};

pub struct TaskRepository<S: TaskStore> {
    store: S,
    tasks: Vec<Task>,
}

impl<S: TaskStore> TaskRepository<S> {
    /// Repository with an empty cache; call [`load`](Self::load) or
    /// [`refresh`](Self::refresh) before reading.
    pub fn new(store: S) -> Self {
        Self {
            store,
            tasks: Vec::new(),
        }
    }

    /// Repository with the cache already filled
    pub fn open(store: S) -> Result<Self> {
        let mut repo = Self::new(store);
        repo.refresh()?;
        Ok(repo)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Replace the cache with the store's current contents.
    /// On failure the previous cache is kept.
    pub fn refresh(&mut self) -> Result<()> {
        self.tasks = self.store.fetch_all()?;
        Ok(())
    }

    /// Re-read the store and return the open tasks (`Some(true)`), the
    /// completed ones (`Some(false)`) or everything (`None`).
    pub fn load(&mut self, filter_active: Option<bool>) -> Result<Vec<&Task>> {
        self.refresh()?;
        Ok(self.view(ViewFilter::from(filter_active)))
    }

    pub fn view(&self, filter: ViewFilter) -> Vec<&Task> {
        self.tasks.iter().filter(|t| filter.matches(t)).collect()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn active_tasks(&self) -> Vec<&Task> {
        self.view(ViewFilter::Active)
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.view(ViewFilter::Completed)
    }

    pub fn find(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == Some(id))
    }

    /// Re-read after a committed write
    fn reload_after(&mut self, operation: &str) {
        if let Err(err) = self.refresh() {
            tracing::warn!(operation, error = %err, "Write committed but reloading tasks failed");
        }
    }

    pub fn insert(&mut self, task: &Task) -> Result<i64> {
        let id = self.store.insert(task)?;
        self.reload_after("insert");
        Ok(id)
    }

    pub fn update(&mut self, task: &Task) -> Result<()> {
        self.store.update(task)?;
        self.reload_after("update");
        Ok(())
    }

    /// Insert unsaved tasks, update saved ones. Returns the task's id.
    pub fn save(&mut self, task: &Task) -> Result<i64> {
        match task.id {
            None => self.insert(task),
            Some(id) => {
                self.update(task)?;
                Ok(id)
            }
        }
    }

    pub fn delete(&mut self, id: i64) -> Result<()> {
        self.store.delete(id)?;
        self.reload_after("delete");
        Ok(())
    }

    /// Apply an edit form to the cached task and store the result.
    pub fn edit(&mut self, id: i64, edit: TaskEdit) -> Result<Task> {
        let mut task = self.find(id).cloned().ok_or(Error::TaskNotFound(id))?;
        task.apply(edit);
        self.update(&task)?;
        Ok(task)
    }

    /// Complete the cached task and store it
    pub fn mark_done(&mut self, id: i64) -> Result<Task> {
        let task = self
            .find(id)
            .map(Task::completed)
            .ok_or(Error::TaskNotFound(id))?;
        self.update(&task)?;
        Ok(task)
    }
}
