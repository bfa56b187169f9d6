use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use super::{Store, StoreError, StoreResult};
use crate::auth::password::hash_password_with_cost;
use crate::models::details::ProjectDetails;
use crate::models::project::{CreateProject, Project, ProjectOverview, ProjectScope, UpdateProject};
use crate::models::status::{default_statuses, CreateStatus, Status, UpdateStatus};
use crate::models::tag::{CreateTag, Tag, UpdateTag};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User, UserCredentials};

pub const DEMO_PASSWORD: &str = "password123";

struct StoredUser {
    user: User,
    password_hash: String,
}

struct Scoped<T> {
    project_id: i32,
    value: T,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<i32, StoredUser>,
    projects: BTreeMap<i32, Project>,
    statuses: BTreeMap<i32, Scoped<Status>>,
    tags: BTreeMap<i32, Scoped<Tag>>,
    tasks: BTreeMap<i32, Scoped<Task>>,
    user_seq: i32,
    project_seq: i32,
    status_seq: i32,
    tag_seq: i32,
    task_seq: i32,
}

fn next_id(seq: &mut i32) -> i32 {
    *seq += 1;
    *seq
}

impl Inner {
    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users.values().any(|stored| {
            stored.user.email.eq_ignore_ascii_case(email) && Some(stored.user.id) != except
        })
    }

    /// Existing user ids from `ids`, deduplicated, in request order.
    fn existing_users(&self, ids: &[i32]) -> Vec<i32> {
        let mut kept = Vec::new();
        for id in ids {
            if self.users.contains_key(id) && !kept.contains(id) {
                kept.push(*id);
            }
        }
        kept
    }

    fn project_tasks(&self, project_id: i32) -> impl Iterator<Item = &Task> + '_ {
        self.tasks
            .values()
            .filter(move |scoped| scoped.project_id == project_id)
            .map(|scoped| &scoped.value)
    }

    fn insert_status(&mut self, project_id: i32, input: CreateStatus) -> i32 {
        let id = next_id(&mut self.status_seq);
        self.statuses.insert(
            id,
            Scoped {
                project_id,
                value: Status {
                    id,
                    name: input.name,
                    description: input.description,
                    color: input.color,
                },
            },
        );
        id
    }

    fn insert_tag(&mut self, project_id: i32, input: CreateTag) -> i32 {
        let id = next_id(&mut self.tag_seq);
        self.tags.insert(
            id,
            Scoped {
                project_id,
                value: Tag {
                    id,
                    name: input.name,
                    color: input.color,
                },
            },
        );
        id
    }

    fn insert_project(
        &mut self,
        input: CreateProject,
        statuses: Vec<CreateStatus>,
        now: DateTime<Utc>,
    ) -> i32 {
        let id = next_id(&mut self.project_seq);
        let mut requested = vec![input.created_by];
        requested.extend_from_slice(&input.members);
        let members = self.existing_users(&requested);

        self.projects.insert(
            id,
            Project {
                id,
                name: input.name,
                description: input.description,
                created_by: input.created_by,
                created_at: now,
                updated_at: now,
                members,
            },
        );
        for status in statuses {
            self.insert_status(id, status);
        }
        id
    }

    fn insert_task(&mut self, input: CreateTask, now: DateTime<Utc>) -> i32 {
        let id = next_id(&mut self.task_seq);
        self.tasks.insert(
            id,
            Scoped {
                project_id: input.project_id,
                value: Task {
                    id,
                    created_by: input.created_by,
                    name: input.name,
                    content: input.content,
                    start_time: input.start_time,
                    end_time: input.end_time,
                    created_at: now,
                    updated_at: now,
                    status_id: input.status_id,
                    priority: input.priority,
                    tag_ids: input.tag_ids,
                    assigned_to: input.assigned_to,
                },
            },
        );
        id
    }
}

/// In-process [`Store`]. Data lives as long as the process.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with ten users (all using [`DEMO_PASSWORD`]) and one sample project.
    pub fn with_demo_data() -> Result<Self, bcrypt::BcryptError> {
        let store = Self::new();
        let password_hash = hash_password_with_cost(DEMO_PASSWORD, 4)?;
        let now = Utc::now();

        let users = [
            ("Sarah Chen", "sarah.chen@company.com", Some("https://avatars.githubusercontent.com/u/105874019?s=400&v=4")),
            ("Michael Rodriguez", "michael.r@company.com", Some("https://avatars.githubusercontent.com/u/181493963?v=4")),
            ("Emma Thompson", "emma.t@company.com", Some("https://avatars.githubusercontent.com/t/12936275?s=116&v=4")),
            ("John Doe", "john.doe@company.com", None),
            ("Will Smith", "will@example.com", None),
            ("John Doe", "john@example.com", None),
            ("Jane Smith", "jane@example.com", None),
            ("Bob Johnson", "bob@example.com", None),
            ("Alice Brown", "alice@example.com", None),
            ("Charlie Wilson", "charlie@example.com", None),
        ];

        {
            let mut inner = store.inner.write();
            for (name, email, picture) in users {
                let id = next_id(&mut inner.user_seq);
                inner.users.insert(
                    id,
                    StoredUser {
                        user: User {
                            id,
                            name: name.to_string(),
                            email: email.to_string(),
                            profile_picture: picture.map(str::to_string),
                        },
                        password_hash: password_hash.clone(),
                    },
                );
            }

            let project_id = inner.insert_project(
                CreateProject {
                    name: "Website Redesign".to_string(),
                    description: "Refresh the marketing site and move it to the new design system".to_string(),
                    created_by: 1,
                    members: vec![2, 3, 4, 5],
                },
                default_statuses(),
                now,
            );
            let status_ids: Vec<i32> = inner
                .statuses
                .values()
                .filter(|scoped| scoped.project_id == project_id)
                .map(|scoped| scoped.value.id)
                .collect();

            let frontend = inner.insert_tag(project_id, CreateTag { name: "frontend".into(), color: "#3B82F6".into() });
            let backend = inner.insert_tag(project_id, CreateTag { name: "backend".into(), color: "#10B981".into() });
            let bug = inner.insert_tag(project_id, CreateTag { name: "bug".into(), color: "#EF4444".into() });

            let tasks = [
                ("Audit current pages", "List every page and its owner", 0, 1, vec![frontend], vec![2]),
                ("Build component library", "Buttons, inputs, cards", 1, 2, vec![frontend], vec![3, 4]),
                ("Fix broken contact form", "Submissions are dropped on Safari", 2, 3, vec![backend, bug], vec![5]),
            ];
            for (offset, (name, content, status_index, priority, tag_ids, assigned_to)) in
                tasks.into_iter().enumerate()
            {
                let start_time = now + Duration::days(offset as i64);
                inner.insert_task(
                    CreateTask {
                        project_id,
                        created_by: 1,
                        name: name.to_string(),
                        content: content.to_string(),
                        start_time,
                        end_time: start_time + Duration::days(3),
                        status_id: status_ids[status_index],
                        priority,
                        tag_ids,
                        assigned_to,
                    },
                    now,
                );
            }
        }

        Ok(store)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let inner = self.inner.read();
        Ok(inner.users.values().map(|stored| stored.user.clone()).collect())
    }

    async fn find_user(&self, user_id: i32) -> StoreResult<Option<User>> {
        let inner = self.inner.read();
        Ok(inner.users.get(&user_id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials_by_email(&self, email: &str) -> StoreResult<Option<UserCredentials>> {
        let inner = self.inner.read();
        Ok(inner
            .users
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| UserCredentials {
                id: stored.user.id,
                password_hash: stored.password_hash.clone(),
            }))
    }

    async fn create_user(&self, input: CreateUser) -> StoreResult<i32> {
        let mut inner = self.inner.write();
        if inner.email_taken(&input.email, None) {
            return Err(StoreError::Conflict("User already exists".into()));
        }
        let id = next_id(&mut inner.user_seq);
        inner.users.insert(
            id,
            StoredUser {
                user: User {
                    id,
                    name: input.name,
                    email: input.email,
                    profile_picture: input.profile_picture,
                },
                password_hash: input.password_hash,
            },
        );
        Ok(id)
    }

    async fn update_user(&self, user_id: i32, input: UpdateUser) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if let Some(email) = &input.email {
            if inner.email_taken(email, Some(user_id)) {
                return Err(StoreError::Conflict("Email is already in use".into()));
            }
        }
        let stored = inner
            .users
            .get_mut(&user_id)
            .ok_or(StoreError::NotFound { entity: "User", id: user_id })?;
        if let Some(name) = input.name {
            stored.user.name = name;
        }
        if let Some(email) = input.email {
            stored.user.email = email;
        }
        if let Some(password_hash) = input.password_hash {
            stored.password_hash = password_hash;
        }
        Ok(())
    }

    async fn projects_for_member(&self, user_id: i32) -> StoreResult<Vec<ProjectOverview>> {
        let inner = self.inner.read();
        Ok(inner
            .projects
            .values()
            .filter(|project| project.members.contains(&user_id))
            .map(|project| ProjectOverview {
                num_members: Some(project.members.len() as i64),
                num_tasks: Some(inner.project_tasks(project.id).count() as i64),
                members: None,
                ..project.overview()
            })
            .collect())
    }

    async fn project_details(&self, project_id: i32) -> StoreResult<Option<ProjectDetails>> {
        let inner = self.inner.read();
        let Some(project) = inner.projects.get(&project_id) else {
            return Ok(None);
        };

        Ok(Some(ProjectDetails {
            project: project.overview(),
            tasks: inner.project_tasks(project_id).cloned().collect(),
            tag_map: inner
                .tags
                .iter()
                .filter(|(_, scoped)| scoped.project_id == project_id)
                .map(|(id, scoped)| (*id, scoped.value.clone()))
                .collect(),
            status_map: inner
                .statuses
                .iter()
                .filter(|(_, scoped)| scoped.project_id == project_id)
                .map(|(id, scoped)| (*id, scoped.value.clone()))
                .collect(),
        }))
    }

    async fn find_project(&self, project_id: i32) -> StoreResult<Option<Project>> {
        Ok(self.inner.read().projects.get(&project_id).cloned())
    }

    async fn project_scope(&self, project_id: i32) -> StoreResult<Option<ProjectScope>> {
        let inner = self.inner.read();
        let Some(project) = inner.projects.get(&project_id) else {
            return Ok(None);
        };

        Ok(Some(ProjectScope {
            project_id,
            members: project.members.clone(),
            status_ids: inner
                .statuses
                .values()
                .filter(|scoped| scoped.project_id == project_id)
                .map(|scoped| scoped.value.id)
                .collect(),
            tag_ids: inner
                .tags
                .values()
                .filter(|scoped| scoped.project_id == project_id)
                .map(|scoped| scoped.value.id)
                .collect(),
        }))
    }

    async fn create_project(
        &self,
        input: CreateProject,
        initial_statuses: Vec<CreateStatus>,
    ) -> StoreResult<i32> {
        let mut inner = self.inner.write();
        if !inner.users.contains_key(&input.created_by) {
            return Err(StoreError::NotFound { entity: "User", id: input.created_by });
        }
        Ok(inner.insert_project(input, initial_statuses, Utc::now()))
    }

    async fn update_project(&self, project_id: i32, input: UpdateProject) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let members = input.members.as_deref().map(|ids| inner.existing_users(ids));
        let project = inner
            .projects
            .get_mut(&project_id)
            .ok_or(StoreError::NotFound { entity: "Project", id: project_id })?;

        if let Some(name) = input.name {
            project.name = name;
        }
        if let Some(description) = input.description {
            project.description = description;
        }
        if let Some(members) = members {
            project.members = members;
        }
        project.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_project(&self, project_id: i32) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if inner.projects.remove(&project_id).is_none() {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }
        inner.tasks.retain(|_, scoped| scoped.project_id != project_id);
        inner.statuses.retain(|_, scoped| scoped.project_id != project_id);
        inner.tags.retain(|_, scoped| scoped.project_id != project_id);
        Ok(())
    }

    async fn status_project(&self, status_id: i32) -> StoreResult<Option<i32>> {
        Ok(self.inner.read().statuses.get(&status_id).map(|scoped| scoped.project_id))
    }

    async fn create_status(&self, project_id: i32, input: CreateStatus) -> StoreResult<i32> {
        let mut inner = self.inner.write();
        if !inner.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }
        Ok(inner.insert_status(project_id, input))
    }

    async fn update_status(&self, status_id: i32, input: UpdateStatus) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let scoped = inner
            .statuses
            .get_mut(&status_id)
            .ok_or(StoreError::NotFound { entity: "Status", id: status_id })?;
        input.apply_to(&mut scoped.value);
        Ok(())
    }

    async fn delete_status(&self, status_id: i32) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if !inner.statuses.contains_key(&status_id) {
            return Err(StoreError::NotFound { entity: "Status", id: status_id });
        }
        let in_use = inner
            .tasks
            .values()
            .filter(|scoped| scoped.value.status_id == status_id)
            .count();
        if in_use > 0 {
            return Err(StoreError::Conflict(format!(
                "Status {status_id} is still used by {in_use} task(s)"
            )));
        }
        inner.statuses.remove(&status_id);
        Ok(())
    }

    async fn tag_project(&self, tag_id: i32) -> StoreResult<Option<i32>> {
        Ok(self.inner.read().tags.get(&tag_id).map(|scoped| scoped.project_id))
    }

    async fn create_tag(&self, project_id: i32, input: CreateTag) -> StoreResult<i32> {
        let mut inner = self.inner.write();
        if !inner.projects.contains_key(&project_id) {
            return Err(StoreError::NotFound { entity: "Project", id: project_id });
        }
        Ok(inner.insert_tag(project_id, input))
    }

    async fn update_tag(&self, tag_id: i32, input: UpdateTag) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let scoped = inner
            .tags
            .get_mut(&tag_id)
            .ok_or(StoreError::NotFound { entity: "Tag", id: tag_id })?;
        input.apply_to(&mut scoped.value);
        Ok(())
    }

    async fn delete_tag(&self, tag_id: i32) -> StoreResult<()> {
        let mut inner = self.inner.write();
        if inner.tags.remove(&tag_id).is_none() {
            return Err(StoreError::NotFound { entity: "Tag", id: tag_id });
        }
        for scoped in inner.tasks.values_mut() {
            scoped.value.tag_ids.retain(|id| *id != tag_id);
        }
        Ok(())
    }

    async fn task_project(&self, task_id: i32) -> StoreResult<Option<i32>> {
        Ok(self.inner.read().tasks.get(&task_id).map(|scoped| scoped.project_id))
    }

    async fn create_task(&self, input: CreateTask) -> StoreResult<i32> {
        let mut inner = self.inner.write();
        if !inner.projects.contains_key(&input.project_id) {
            return Err(StoreError::NotFound { entity: "Project", id: input.project_id });
        }
        Ok(inner.insert_task(input, Utc::now()))
    }

    async fn update_task(&self, task_id: i32, input: UpdateTask) -> StoreResult<()> {
        let mut inner = self.inner.write();
        let scoped = inner
            .tasks
            .get_mut(&task_id)
            .ok_or(StoreError::NotFound { entity: "Task", id: task_id })?;
        input.apply_to(&mut scoped.value);
        scoped.value.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_task(&self, task_id: i32) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner
            .tasks
            .remove(&task_id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { entity: "Task", id: task_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_project(members: Vec<i32>) -> CreateProject {
        CreateProject {
            name: "Launch".into(),
            description: "Q3 launch".into(),
            created_by: 1,
            members,
        }
    }

    #[tokio::test]
    async fn demo_data_is_consistent() {
        let store = MemoryStore::with_demo_data().unwrap();

        assert_eq!(store.list_users().await.unwrap().len(), 10);
        let details = store.project_details(1).await.unwrap().unwrap();
        assert_eq!(details.status_map.len(), 3);
        assert_eq!(details.tag_map.len(), 3);
        assert_eq!(details.tasks.len(), 3);
        for task in &details.tasks {
            assert!(details.status_map.contains_key(&task.status_id));
            assert!(task.tag_ids.iter().all(|id| details.tag_map.contains_key(id)));
        }
    }

    #[tokio::test]
    async fn create_project_adds_creator_and_drops_unknown_members() {
        let store = MemoryStore::with_demo_data().unwrap();
        let id = store
            .create_project(create_project(vec![3, 1, 99, 3]), default_statuses())
            .await
            .unwrap();

        let project = store.find_project(id).await.unwrap().unwrap();
        assert_eq!(project.members, vec![1, 3]);
        let scope = store.project_scope(id).await.unwrap().unwrap();
        assert_eq!(scope.status_ids.len(), 3);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::with_demo_data().unwrap();
        let err = store
            .create_user(CreateUser {
                name: "Sarah".into(),
                email: "SARAH.CHEN@company.com".into(),
                password_hash: "x".into(),
                profile_picture: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_a_used_status_conflicts() {
        let store = MemoryStore::with_demo_data().unwrap();
        let details = store.project_details(1).await.unwrap().unwrap();
        let used = details.tasks[0].status_id;

        let err = store.delete_status(used).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let unused = store
            .create_status(1, CreateStatus { name: "Blocked".into(), description: None, color: "#000".into() })
            .await
            .unwrap();
        store.delete_status(unused).await.unwrap();
        assert_eq!(store.status_project(unused).await.unwrap(), None);
    }

    #[tokio::test]
    async fn deleting_a_tag_detaches_it_from_tasks() {
        let store = MemoryStore::with_demo_data().unwrap();
        let details = store.project_details(1).await.unwrap().unwrap();
        let tag_id = details.tasks[2].tag_ids[0];

        store.delete_tag(tag_id).await.unwrap();

        let details = store.project_details(1).await.unwrap().unwrap();
        assert!(details.tasks.iter().all(|task| !task.tag_ids.contains(&tag_id)));
        assert!(!details.tag_map.contains_key(&tag_id));
    }

    #[tokio::test]
    async fn deleting_a_project_cascades() {
        let store = MemoryStore::with_demo_data().unwrap();
        let details = store.project_details(1).await.unwrap().unwrap();
        let task_id = details.tasks[0].id;

        store.delete_project(1).await.unwrap();

        assert!(store.project_details(1).await.unwrap().is_none());
        assert_eq!(store.task_project(task_id).await.unwrap(), None);
        assert!(store.projects_for_member(1).await.unwrap().is_empty());
        assert!(matches!(
            store.delete_project(1).await.unwrap_err(),
            StoreError::NotFound { entity: "Project", id: 1 }
        ));
    }

    #[tokio::test]
    async fn workspace_listing_counts_members_and_tasks() {
        let store = MemoryStore::with_demo_data().unwrap();
        let projects = store.projects_for_member(2).await.unwrap();

        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].num_members, Some(5));
        assert_eq!(projects[0].num_tasks, Some(3));
        assert!(store.projects_for_member(9).await.unwrap().is_empty());
    }
}
