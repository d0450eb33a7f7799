pub mod gitlab;
pub mod project_path;

pub use gitlab::{GitLabIntegration, GitLabSource};
pub use project_path::normalize_project_path;
