//! Normalize GitLab project references to the canonical `group/project` path.

/// Normalizes a GitLab project reference to its full path.
///
/// Supports:
/// - `group/project` and nested `group/subgroup/project`
/// - `https://gitlab.com/group/project`
/// - `https://gitlab.com/group/project.git`
/// - `https://gitlab.example.com/group/project/-/merge_requests`
/// - `git@gitlab.com:group/project.git`
///
/// Returns `None` if no namespace and project name can be found.
pub fn normalize_project_path(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let path = if let Some((_, rest)) = input.split_once("://") {
        // drop the host
        let (_, path) = rest.split_once('/')?;
        path
    } else if let Some(rest) = input.strip_prefix("git@") {
        let (_, path) = rest.split_once(':')?;
        path
    } else {
        input
    };

    let path = path.split(['?', '#']).next().unwrap_or(path);
    // everything after `/-/` is a page within the project
    let path = path.split("/-/").next().unwrap_or(path);
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty() || *s == "." || *s == "..") {
        return None;
    }

    Some(segments.join("/"))
}
