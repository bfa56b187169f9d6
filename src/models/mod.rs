// src/models/mod.rs

pub mod details;
pub mod project;
pub mod status;
pub mod tag;
pub mod task;
pub mod user;
