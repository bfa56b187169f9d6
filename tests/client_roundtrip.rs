use std::sync::Arc;

use actix_web::{web, App, HttpServer};

use tma_backend::auth::jwt::JwtConfig;
use tma_backend::client::workspace::{Session, UserProjectsStore, UsersDirectory};
use tma_backend::client::{ApiClient, ClientError, HttpApiClient, ProjectDetailsStore};
use tma_backend::routes::status::status_models::CreateStatusRequest;
use tma_backend::routes::tasks::tasks_models::UpdateTaskRequest;
use tma_backend::store::memory::{MemoryStore, DEMO_PASSWORD};
use tma_backend::{configure_app, AppState};

#[actix_web::test]
async fn client_stores_against_a_live_server() {
    let state = web::Data::new(AppState::new(
        Arc::new(MemoryStore::with_demo_data().unwrap()),
        JwtConfig {
            secret: "roundtrip-secret".to_string(),
            expiry_days: 1,
        },
    ));

    let server = HttpServer::new({
        let state = state.clone();
        move || App::new().app_data(state.clone()).configure(configure_app)
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let client = Arc::new(HttpApiClient::new(format!("http://{addr}")));

    // Public endpoints work before signing in, the rest do not.
    let directory = UsersDirectory::new(client.clone());
    directory.fetch().await.unwrap();
    assert_eq!(directory.snapshot().users.len(), 10);
    let err = client.get_project_details(1).await.unwrap_err();
    assert_eq!(err, ClientError::Unauthorized("No token provided".into()));

    let session = Session::new(client.clone());
    let user = session.login("sarah.chen@company.com", DEMO_PASSWORD).await.unwrap();
    assert_eq!(user.id, 1);

    let projects = UserProjectsStore::new(client.clone());
    projects.load(user.id).await.unwrap();
    assert_eq!(projects.snapshot().projects.len(), 1);

    let details = ProjectDetailsStore::new(client.clone());
    details.load(1).await.unwrap();
    let loaded = details.snapshot().details.unwrap();
    assert_eq!(loaded.tag_map[&2].id, 2);
    assert_eq!(loaded.status_map[&3].name, "Done");

    details
        .update_task(
            1,
            UpdateTaskRequest {
                id: Some(1),
                name: Some("Audit every page".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let stored = state.store.project_details(1).await.unwrap().unwrap();
    assert_eq!(stored.tasks[0].name, "Audit every page");

    let status_id = details
        .create_status(CreateStatusRequest {
            project_id: 1,
            name: "Blocked".into(),
            description: None,
            color: "#111".into(),
        })
        .await
        .unwrap();
    assert_eq!(details.snapshot().details.unwrap().status_map[&status_id].name, "Blocked");

    // In use by a task: the server refuses and the local removal is undone.
    let err = details.delete_status(1).await.unwrap_err();
    assert!(matches!(err, ClientError::Api { status: 409, .. }));
    assert!(details.snapshot().details.unwrap().status_map.contains_key(&1));
    assert_eq!(details.drain_notices().len(), 1);

    session.logout();
    assert!(matches!(
        client.get_user_projects(1).await,
        Err(ClientError::Unauthorized(_))
    ));

    handle.stop(true).await;
}
