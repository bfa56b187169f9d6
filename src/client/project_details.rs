//! Client-side project page state with optimistic mutations.
//!
//! Every mutation follows the same protocol: snapshot the state, patch it
//! locally before any network I/O, call the server, and on failure put the
//! snapshot back and record a [`Notice`]. Rollback restores the whole
//! snapshot, so when two operations overlap the later restore wins and can
//! discard the other operation's change even if that one succeeded.

use std::collections::BTreeMap;
use std::iter;
use std::sync::Arc;

use chrono::Utc;
use log::{error, info};
use parking_lot::Mutex;

use super::{ApiClient, ClientError, ClientResult};
use crate::models::details::ProjectDetails;
use crate::models::status::Status;
use crate::models::tag::Tag;
use crate::models::task::{Task, UpdateTask};
use crate::routes::projects::projects_models::UpdateProjectRequest;
use crate::routes::shared::IdResponse;
use crate::routes::status::status_models::{CreateStatusRequest, UpdateStatusRequest};
use crate::routes::tag::tag_models::{CreateTagRequest, UpdateTagRequest};
use crate::routes::tasks::tasks_models::{CreateTaskRequest, UpdateTaskRequest};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectDetailsState {
    pub details: Option<ProjectDetails>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// A user-facing failure report (a toast).
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    fn from_error(title: &str, err: &ClientError) -> Self {
        Notice {
            title: title.to_string(),
            message: err.to_string(),
        }
    }
}

/// One more than the largest id, or 1 for an empty set.
fn temp_id(ids: impl Iterator<Item = i32>) -> i32 {
    ids.max().map_or(1, |max| max + 1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    Task,
    Status,
    Tag,
}

fn entity_ids(details: &ProjectDetails, kind: Entity) -> Vec<i32> {
    match kind {
        Entity::Task => details.tasks.iter().map(|task| task.id).collect(),
        Entity::Status => details.status_map.keys().copied().collect(),
        Entity::Tag => details.tag_map.keys().copied().collect(),
    }
}

/// Re-keys the entry at `from` to `to`, replacing whatever sat at `to`.
fn move_entity(details: &mut ProjectDetails, kind: Entity, from: i32, to: i32) {
    if from == to {
        return;
    }
    match kind {
        Entity::Task => {
            if details.task_mut(from).is_some() {
                details.tasks.retain(|task| task.id != to);
            }
            if let Some(task) = details.task_mut(from) {
                task.id = to;
            }
        }
        Entity::Status => {
            if let Some(mut status) = details.status_map.remove(&from) {
                status.id = to;
                details.status_map.insert(to, status);
            }
        }
        Entity::Tag => {
            if let Some(mut tag) = details.tag_map.remove(&from) {
                tag.id = to;
                details.tag_map.insert(to, tag);
            }
        }
    }
}

/// Temporary ids held by creates that have not settled, keyed by operation.
#[derive(Debug, Default)]
struct PendingCreates {
    next_op: u64,
    temps: BTreeMap<u64, (Entity, i32)>,
}

impl PendingCreates {
    fn temps_of(&self, kind: Entity) -> impl Iterator<Item = i32> + '_ {
        self.temps
            .values()
            .filter(move |(entity, _)| *entity == kind)
            .map(|(_, id)| *id)
    }

    /// Picks an id above every loaded and pending one and records it.
    fn reserve(&mut self, details: &ProjectDetails, kind: Entity) -> (u64, i32) {
        let id = temp_id(entity_ids(details, kind).into_iter().chain(self.temps_of(kind)));
        let op = self.next_op;
        self.next_op += 1;
        self.temps.insert(op, (kind, id));
        (op, id)
    }

    /// Moves another pending create off `id` so a server id can take it.
    fn vacate(&mut self, details: &mut ProjectDetails, kind: Entity, id: i32) {
        let Some(op) = self
            .temps
            .iter()
            .find(|(_, (entity, temp))| *entity == kind && *temp == id)
            .map(|(op, _)| *op)
        else {
            return;
        };
        let fresh = temp_id(
            entity_ids(details, kind)
                .into_iter()
                .chain(self.temps_of(kind))
                .chain(iter::once(id)),
        );
        move_entity(details, kind, id, fresh);
        self.temps.insert(op, (kind, fresh));
    }
}

fn local_task_patch(req: &UpdateTaskRequest) -> UpdateTask {
    UpdateTask {
        name: req.name.clone(),
        content: req.content.clone(),
        start_time: req.start_time,
        end_time: req.end_time,
        status_id: req.status_id,
        priority: req.priority,
        tag_ids: req.tag_ids.clone(),
        assigned_to: req.assigned_to.clone(),
    }
}

pub struct ProjectDetailsStore<C: ApiClient + ?Sized> {
    client: Arc<C>,
    state: Mutex<ProjectDetailsState>,
    pending: Mutex<PendingCreates>,
    notices: Mutex<Vec<Notice>>,
}

impl<C: ApiClient + ?Sized> ProjectDetailsStore<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Mutex::new(ProjectDetailsState {
                is_loading: true,
                ..Default::default()
            }),
            pending: Mutex::new(PendingCreates::default()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> ProjectDetailsState {
        self.state.lock().clone()
    }

    /// Takes every notice recorded since the last call.
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock())
    }

    /// Applies `patch` to the loaded details, returning the prior state.
    fn optimistic(&self, patch: impl FnOnce(&mut ProjectDetails)) -> ProjectDetailsState {
        let mut state = self.state.lock();
        let previous = state.clone();
        if let Some(details) = state.details.as_mut() {
            patch(details);
        }
        previous
    }

    fn rollback(&self, previous: ProjectDetailsState, title: &str, err: &ClientError) {
        error!("{}: {}", title, err);
        *self.state.lock() = previous;
        self.notices.lock().push(Notice::from_error(title, err));
    }

    fn settle<T>(
        &self,
        result: ClientResult<T>,
        previous: ProjectDetailsState,
        title: &str,
    ) -> ClientResult<T> {
        if let Err(err) = &result {
            self.rollback(previous, title, err);
        }
        result
    }

    /// Inserts a new entry under a reserved temporary id. Returns the prior
    /// state and the operation holding the reservation.
    fn begin_create(
        &self,
        kind: Entity,
        insert: impl FnOnce(&mut ProjectDetails, i32),
    ) -> (ProjectDetailsState, Option<u64>) {
        let mut state = self.state.lock();
        let previous = state.clone();
        let Some(details) = state.details.as_mut() else {
            return (previous, None);
        };
        let (op, id) = self.pending.lock().reserve(details, kind);
        insert(details, id);
        (previous, Some(op))
    }

    /// Re-keys the operation's temporary entry to the server id, or rolls
    /// back on failure.
    fn finish_create(
        &self,
        kind: Entity,
        op: Option<u64>,
        result: ClientResult<IdResponse>,
        previous: ProjectDetailsState,
        title: &str,
    ) -> ClientResult<i32> {
        let created = match result {
            Ok(created) => created,
            Err(err) => {
                if let Some(op) = op {
                    self.pending.lock().temps.remove(&op);
                }
                self.rollback(previous, title, &err);
                return Err(err);
            }
        };

        let mut state = self.state.lock();
        let mut pending = self.pending.lock();
        let temp = op.and_then(|op| pending.temps.remove(&op)).map(|(_, id)| id);
        if let (Some(details), Some(temp)) = (state.details.as_mut(), temp) {
            pending.vacate(details, kind, created.id);
            move_entity(details, kind, temp, created.id);
        }
        Ok(created.id)
    }

    pub async fn load(&self, project_id: i32) -> ClientResult<()> {
        {
            let mut state = self.state.lock();
            state.is_loading = true;
            state.error = None;
        }
        info!("Loading details of project {}", project_id);

        let result = self.client.get_project_details(project_id).await;
        let mut state = self.state.lock();
        state.is_loading = false;
        match result {
            Ok(details) => {
                state.details = Some(details);
                // Fresh server data; outstanding temporary entries are gone.
                self.pending.lock().temps.clear();
                Ok(())
            }
            Err(err) => {
                error!("Failed to load project {}: {}", project_id, err);
                state.error = Some(err.to_string());
                self.notices
                    .lock()
                    .push(Notice::from_error("Failed to load project", &err));
                Err(err)
            }
        }
    }

    pub async fn update_task(&self, task_id: i32, req: UpdateTaskRequest) -> ClientResult<()> {
        let patch = local_task_patch(&req);
        let previous = self.optimistic(|details| {
            if let Some(task) = details.task_mut(task_id) {
                patch.apply_to(task);
            }
        });

        let result = self.client.update_task(task_id, &req).await;
        self.settle(result, previous, "Failed to update task").map(|_| ())
    }

    /// Adds the task under a temporary id and re-keys it to the server id.
    /// Returns the server id.
    pub async fn create_task(&self, req: CreateTaskRequest, created_by: i32) -> ClientResult<i32> {
        let (previous, op) = self.begin_create(Entity::Task, |details, id| {
            let now = Utc::now();
            details.tasks.push(Task {
                id,
                created_by,
                name: req.name.clone(),
                content: req.content.clone(),
                start_time: req.start_time,
                end_time: req.end_time,
                created_at: now,
                updated_at: now,
                status_id: req.status_id,
                priority: req.priority,
                tag_ids: req.tag_ids.clone(),
                assigned_to: req.assigned_to.clone(),
            });
        });

        let result = self.client.create_task(&req).await;
        self.finish_create(Entity::Task, op, result, previous, "Failed to create task")
    }

    pub async fn delete_task(&self, task_id: i32) -> ClientResult<()> {
        let previous = self.optimistic(|details| details.tasks.retain(|task| task.id != task_id));
        let result = self.client.delete_task(task_id).await;
        self.settle(result, previous, "Failed to delete task").map(|_| ())
    }

    pub async fn update_project(&self, project_id: i32, req: UpdateProjectRequest) -> ClientResult<()> {
        let previous = self.optimistic(|details| {
            let project = &mut details.project;
            if project.id != project_id {
                return;
            }
            if let Some(name) = &req.name {
                project.name = name.clone();
            }
            if let Some(description) = &req.description {
                project.description = description.clone();
            }
            if let Some(members) = &req.members {
                project.members = Some(members.clone());
            }
        });

        let result = self.client.update_project(project_id, &req).await;
        self.settle(result, previous, "Failed to update project").map(|_| ())
    }

    pub async fn create_status(&self, req: CreateStatusRequest) -> ClientResult<i32> {
        let (previous, op) = self.begin_create(Entity::Status, |details, id| {
            details.status_map.insert(
                id,
                Status {
                    id,
                    name: req.name.clone(),
                    description: req.description.clone(),
                    color: req.color.clone(),
                },
            );
        });

        let result = self.client.create_status(&req).await;
        self.finish_create(Entity::Status, op, result, previous, "Failed to create status")
    }

    pub async fn update_status(&self, status_id: i32, req: UpdateStatusRequest) -> ClientResult<()> {
        let previous = self.optimistic(|details| {
            if let Some(status) = details.status_map.get_mut(&status_id) {
                if let Some(name) = &req.name {
                    status.name = name.clone();
                }
                if req.description.is_some() {
                    status.description = req.description.clone();
                }
                if let Some(color) = &req.color {
                    status.color = color.clone();
                }
            }
        });

        let result = self.client.update_status(status_id, &req).await;
        self.settle(result, previous, "Failed to update status").map(|_| ())
    }

    /// Tasks still pointing at the status are left as they are.
    pub async fn delete_status(&self, status_id: i32) -> ClientResult<()> {
        let previous = self.optimistic(|details| {
            details.status_map.remove(&status_id);
        });
        let result = self.client.delete_status(status_id).await;
        self.settle(result, previous, "Failed to delete status").map(|_| ())
    }

    pub async fn create_tag(&self, req: CreateTagRequest) -> ClientResult<i32> {
        let (previous, op) = self.begin_create(Entity::Tag, |details, id| {
            details.tag_map.insert(
                id,
                Tag {
                    id,
                    name: req.name.clone(),
                    color: req.color.clone(),
                },
            );
        });

        let result = self.client.create_tag(&req).await;
        self.finish_create(Entity::Tag, op, result, previous, "Failed to create tag")
    }

    pub async fn update_tag(&self, tag_id: i32, req: UpdateTagRequest) -> ClientResult<()> {
        let previous = self.optimistic(|details| {
            if let Some(tag) = details.tag_map.get_mut(&tag_id) {
                if let Some(name) = &req.name {
                    tag.name = name.clone();
                }
                if let Some(color) = &req.color {
                    tag.color = color.clone();
                }
            }
        });

        let result = self.client.update_tag(tag_id, &req).await;
        self.settle(result, previous, "Failed to update tag").map(|_| ())
    }

    /// Tasks keep the tag id; only the map entry goes.
    pub async fn delete_tag(&self, tag_id: i32) -> ClientResult<()> {
        let previous = self.optimistic(|details| {
            details.tag_map.remove(&tag_id);
        });
        let result = self.client.delete_tag(tag_id).await;
        self.settle(result, previous, "Failed to delete tag").map(|_| ())
    }
}
