//! Domain types for todotracker
//!
//! The normalized project plan (phases, tasks, labels), the closed task
//! vocabularies, and repository coordinates.

mod plan;
mod priority;
mod repo;

pub use plan::{
    DEFAULT_LABEL_COLOR, DEFAULT_LABEL_DESCRIPTION, Label, MAX_LABEL_DESCRIPTION_CHARS, Phase, ProjectPlan, Task,
};
pub use priority::{Effort, Priority, TaskType};
pub use repo::RepoCoordinate;
