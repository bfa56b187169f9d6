//! `MySqlStore` against a throwaway database per test.
//!
//! Run with a MySQL `DATABASE_URL` and `cargo test -- --ignored`.

use chrono::{TimeZone, Utc};
use sqlx::MySqlPool;

use tma_backend::models::project::{CreateProject, UpdateProject};
use tma_backend::models::status::{default_statuses, CreateStatus, UpdateStatus};
use tma_backend::models::tag::CreateTag;
use tma_backend::models::task::{CreateTask, UpdateTask};
use tma_backend::models::user::CreateUser;
use tma_backend::store::mysql::MySqlStore;
use tma_backend::store::{Store, StoreError};

async fn create_user(store: &MySqlStore, name: &str) -> i32 {
    store
        .create_user(CreateUser {
            name: name.into(),
            email: format!("{}@company.com", name.to_lowercase()),
            password_hash: "hash".into(),
            profile_picture: None,
        })
        .await
        .unwrap()
}

/// A project by a fresh creator with one extra member, plus one task.
async fn seed(store: &MySqlStore) -> (i32, i32, i32) {
    let creator = create_user(store, "Sarah").await;
    let member = create_user(store, "Mike").await;
    let project_id = store
        .create_project(
            CreateProject {
                name: "Launch".into(),
                description: "Q3 launch".into(),
                created_by: creator,
                members: vec![member, 9999, member],
            },
            default_statuses(),
        )
        .await
        .unwrap();
    let scope = store.project_scope(project_id).await.unwrap().unwrap();
    let tag_id = store
        .create_tag(project_id, CreateTag { name: "bug".into(), color: "#F00".into() })
        .await
        .unwrap();
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let task_id = store
        .create_task(CreateTask {
            project_id,
            created_by: creator,
            name: "Draft".into(),
            content: "first pass".into(),
            start_time: at,
            end_time: at,
            status_id: scope.status_ids[0],
            priority: 2,
            tag_ids: vec![tag_id],
            assigned_to: vec![member],
        })
        .await
        .unwrap();
    (project_id, tag_id, task_id)
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn create_project_adds_creator_and_default_statuses(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, _, _) = seed(&store).await;

    let project = store.find_project(project_id).await.unwrap().unwrap();
    assert_eq!(project.members.len(), 2);
    assert_eq!(project.members[0], project.created_by);

    let details = store.project_details(project_id).await.unwrap().unwrap();
    let names: Vec<_> = details.status_map.values().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["To Do", "In Progress", "Done"]);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn duplicate_email_conflicts(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    create_user(&store, "Sarah").await;

    let err = store
        .create_user(CreateUser {
            name: "Other Sarah".into(),
            email: "sarah@company.com".into(),
            password_hash: "hash".into(),
            profile_picture: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn partial_updates_keep_unset_columns(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, _, task_id) = seed(&store).await;
    let status_id = store.project_scope(project_id).await.unwrap().unwrap().status_ids[1];

    store
        .update_status(status_id, UpdateStatus { color: Some("#000000".into()), ..Default::default() })
        .await
        .unwrap();
    store
        .update_task(task_id, UpdateTask { priority: Some(5), ..Default::default() })
        .await
        .unwrap();
    store
        .update_project(project_id, UpdateProject { name: Some("Relaunch".into()), ..Default::default() })
        .await
        .unwrap();

    let details = store.project_details(project_id).await.unwrap().unwrap();
    let status = &details.status_map[&status_id];
    assert_eq!(status.name, "In Progress");
    assert_eq!(status.color, "#000000");
    assert_eq!(details.tasks[0].name, "Draft");
    assert_eq!(details.tasks[0].priority, 5);
    assert_eq!(details.project.name, "Relaunch");
    assert_eq!(details.project.description, "Q3 launch");

    assert!(matches!(
        store.update_task(9999, UpdateTask::default()).await.unwrap_err(),
        StoreError::NotFound { entity: "Task", id: 9999 }
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn deleting_a_used_status_conflicts(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, _, _) = seed(&store).await;
    let used = store.project_scope(project_id).await.unwrap().unwrap().status_ids[0];

    let err = store.delete_status(used).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.status_project(used).await.unwrap(), Some(project_id));

    let unused = store
        .create_status(project_id, CreateStatus { name: "Blocked".into(), description: None, color: "#000".into() })
        .await
        .unwrap();
    store.delete_status(unused).await.unwrap();
    assert_eq!(store.status_project(unused).await.unwrap(), None);
    assert!(matches!(
        store.delete_status(unused).await.unwrap_err(),
        StoreError::NotFound { entity: "Status", .. }
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn deleting_a_tag_detaches_it_from_tasks(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, tag_id, task_id) = seed(&store).await;

    store.delete_tag(tag_id).await.unwrap();

    let details = store.project_details(project_id).await.unwrap().unwrap();
    assert!(details.tag_map.is_empty());
    let task = details.tasks.iter().find(|task| task.id == task_id).unwrap();
    assert!(task.tag_ids.is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn deleting_a_project_cascades(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, tag_id, task_id) = seed(&store).await;
    let creator = store.find_project(project_id).await.unwrap().unwrap().created_by;

    store.delete_project(project_id).await.unwrap();

    assert!(store.project_details(project_id).await.unwrap().is_none());
    assert_eq!(store.task_project(task_id).await.unwrap(), None);
    assert_eq!(store.tag_project(tag_id).await.unwrap(), None);
    assert!(store.projects_for_member(creator).await.unwrap().is_empty());
    assert!(matches!(
        store.delete_project(project_id).await.unwrap_err(),
        StoreError::NotFound { entity: "Project", .. }
    ));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn workspace_listing_counts_members_and_tasks(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, _, _) = seed(&store).await;
    let creator = store.find_project(project_id).await.unwrap().unwrap().created_by;

    let projects = store.projects_for_member(creator).await.unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].num_members, Some(2));
    assert_eq!(projects[0].num_tasks, Some(1));
    assert_eq!(projects[0].members, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a MySQL DATABASE_URL"]
async fn task_times_past_2038_are_stored(pool: MySqlPool) {
    let store = MySqlStore::from_pool(pool);
    let (project_id, _, task_id) = seed(&store).await;
    let far = Utc.with_ymd_and_hms(2045, 12, 31, 23, 0, 0).unwrap();

    store
        .update_task(task_id, UpdateTask { end_time: Some(far), ..Default::default() })
        .await
        .unwrap();

    let details = store.project_details(project_id).await.unwrap().unwrap();
    assert_eq!(details.tasks[0].end_time, far);
}
