//! HTTP surface. Each area keeps its handlers and wire types side by side.

#[allow(clippy::module_inception)]
pub mod routes;
pub mod shared;

pub mod auth {
    pub mod auth_handlers;
    pub mod auth_models;
}

pub mod users {
    pub mod users_handlers;
    pub mod users_models;
}

pub mod projects {
    pub mod projects_handlers;
    pub mod projects_models;
}

pub mod status {
    pub mod status_handlers;
    pub mod status_models;
}

pub mod tag {
    pub mod tag_handlers;
    pub mod tag_models;
}

pub mod tasks {
    pub mod tasks_handlers;
    pub mod tasks_models;
}
