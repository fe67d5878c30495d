//! Path checks for untrusted relative paths.

use std::path::{Component, Path};

/// Check that a relative path stays inside its base (no absolute paths, no escaping `..`)
pub fn is_safe_path(path: &Path) -> bool {
    if path.is_absolute() {
        return false;
    }

    let mut depth = 0i32;

    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            },
            Component::Normal(_) => {
                depth += 1;
            },
            // Prefixes and root dirs never belong in a relative path
            _ => return false,
        }
    }

    true
}
