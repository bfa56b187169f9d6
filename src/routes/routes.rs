use actix_web::middleware::from_fn;
use actix_web::{web, HttpResponse, Responder};

use super::auth::auth_handlers;
use super::projects::projects_handlers;
use super::shared::{json_config, query_config};
use super::status::status_handlers;
use super::tag::tag_handlers;
use super::tasks::tasks_handlers;
use super::users::users_handlers;
use crate::auth::middleware::require_token;

pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Task manager API is running.")
}

/// Everything under `/api`, behind the token check.
pub fn api_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_token))
            .app_data(json_config())
            .app_data(query_config())
            .configure(auth_configure)
            .configure(users_configure)
            .configure(projects_configure)
            .configure(tasks_configure),
    );
}

pub fn auth_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(auth_handlers::login))
            .route("/login/", web::post().to(auth_handlers::login))
            .route("/register", web::post().to(auth_handlers::register))
            .route("/register/", web::post().to(auth_handlers::register)),
    );
}

pub fn users_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(users_handlers::list_users))
            .route("/", web::get().to(users_handlers::list_users))
            .route("", web::post().to(users_handlers::create_user))
            .route("/", web::post().to(users_handlers::create_user))
            .route("", web::put().to(users_handlers::update_user))
            .route("/", web::put().to(users_handlers::update_user)),
    );
}

pub fn projects_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/projects")
            .route("", web::post().to(projects_handlers::create_project))
            .route("/", web::post().to(projects_handlers::create_project))
            .route("", web::put().to(projects_handlers::update_project))
            .route("/", web::put().to(projects_handlers::update_project))
            .route("", web::delete().to(projects_handlers::delete_project))
            .route("/", web::delete().to(projects_handlers::delete_project))
            .route("/users", web::get().to(projects_handlers::user_projects))
            .route("/users/", web::get().to(projects_handlers::user_projects))
            .route("/details", web::get().to(projects_handlers::project_details))
            .route("/details/", web::get().to(projects_handlers::project_details))
            .configure(status_configure)
            .configure(tag_configure),
    );
}

pub fn status_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/status")
            .route("", web::post().to(status_handlers::create_status))
            .route("/", web::post().to(status_handlers::create_status))
            .route("", web::put().to(status_handlers::update_status))
            .route("/", web::put().to(status_handlers::update_status))
            .route("", web::delete().to(status_handlers::delete_status))
            .route("/", web::delete().to(status_handlers::delete_status)),
    );
}

pub fn tag_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tag")
            .route("", web::post().to(tag_handlers::create_tag))
            .route("/", web::post().to(tag_handlers::create_tag))
            .route("", web::put().to(tag_handlers::update_tag))
            .route("/", web::put().to(tag_handlers::update_tag))
            .route("", web::delete().to(tag_handlers::delete_tag))
            .route("/", web::delete().to(tag_handlers::delete_tag)),
    );
}

pub fn tasks_configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tasks")
            .route("", web::post().to(tasks_handlers::create_task))
            .route("/", web::post().to(tasks_handlers::create_task))
            .route("", web::put().to(tasks_handlers::update_task))
            .route("/", web::put().to(tasks_handlers::update_task))
            .route("", web::delete().to(tasks_handlers::delete_task))
            .route("/", web::delete().to(tasks_handlers::delete_task)),
    );
}
