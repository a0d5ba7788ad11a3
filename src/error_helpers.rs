//! Error helper functions for creating actionable error messages

use std::io;
use std::path::Path;

/// Check if an IO error is a permission denied error
pub fn is_permission_denied(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::PermissionDenied
}

/// Check if an IO error is a "not found" error
pub fn is_not_found(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
}

/// Enhanced message for a migration target that does not exist
pub fn missing_target_error(path: &Path, rule_key: &str) -> String {
    format!(
        "Target file not found: '{}' (rule '{}')\n\n\
         Possible fixes:\n\
         1. Check the path half of the 'path=rule' target spec\n\
         2. Use an absolute path if the relative path is ambiguous\n\
         3. Run 'refmig rules' to confirm the rule key was not meant as the path\n\
         4. The file may already have been moved or renamed by an earlier migration",
        path.display(),
        rule_key
    )
}

/// Enhanced message for file permission issues
pub fn permission_error(path: &Path, operation: &str) -> String {
    let parent_dir = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| ".".to_string());

    format!(
        "Permission denied when {} '{}'\n\n\
         Possible fixes:\n\
         1. Check file permissions: ls -l '{}'\n\
         2. Ensure write access to the directory: chmod u+w '{}'\n\
         3. If owned by another user: Try with sudo (not recommended)",
        operation,
        path.display(),
        path.display(),
        parent_dir
    )
}
