pub mod category;
pub mod project;
pub mod task;

pub use category::{Category, NewCategoryRequest, UpdateCategoryRequest};
pub use project::{NewProjectRequest, Project, UpdateProjectRequest};
pub use task::{NewTaskRequest, Task, TaskStats, UpdateTaskRequest};
