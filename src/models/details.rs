use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::project::ProjectOverview;
use super::status::{Status, StatusEntry};
use super::tag::{Tag, TagEntry};
use super::task::Task;

/// Everything the project page needs, with ids inside the map values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetails {
    pub project: ProjectOverview,
    pub tasks: Vec<Task>,
    pub tag_map: BTreeMap<i32, Tag>,
    pub status_map: BTreeMap<i32, Status>,
}

/// Wire form of [`ProjectDetails`]: map keys are the ids, values omit them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDetailsResponse {
    pub project: ProjectOverview,
    pub tasks: Vec<Task>,
    pub tag_map: BTreeMap<i32, TagEntry>,
    pub status_map: BTreeMap<i32, StatusEntry>,
}

impl ProjectDetails {
    pub fn from_response(response: ProjectDetailsResponse) -> Self {
        ProjectDetails {
            project: response.project,
            tasks: response.tasks,
            tag_map: response
                .tag_map
                .into_iter()
                .map(|(id, entry)| (id, entry.with_id(id)))
                .collect(),
            status_map: response
                .status_map
                .into_iter()
                .map(|(id, entry)| (id, entry.with_id(id)))
                .collect(),
        }
    }

    pub fn to_response(&self) -> ProjectDetailsResponse {
        ProjectDetailsResponse {
            project: self.project.clone(),
            tasks: self.tasks.clone(),
            tag_map: self.tag_map.iter().map(|(id, tag)| (*id, tag.entry())).collect(),
            status_map: self
                .status_map
                .iter()
                .map(|(id, status)| (*id, status.entry()))
                .collect(),
        }
    }

    pub fn task_mut(&mut self, task_id: i32) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == task_id)
    }
}
