// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use std::path::{Component, Path, PathBuf};

/// Lexically normalizes `path`: drops `.` components and folds `..` into the preceding
/// component. The file system is never consulted, so symlinks are not resolved.
///
/// Package roots are compared by their normalized form, which is what makes
/// `/ws/pkg/../framework` and `/ws/framework` the same package.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = vec![];
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                },
                // `..` at the root stays at the root.
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {},
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Makes `path` absolute against the current directory, then normalizes it. A path that cannot
/// be made absolute is only normalized.
pub fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_path(&absolute)
}

#[cfg(test)]
mod tests {
    use super::{absolute_path, normalize_path};
    use std::path::Path;

    #[test]
    fn folds_parent_components() {
        assert_eq!(
            normalize_path(Path::new("/workspace/my-counter/../framework")),
            Path::new("/workspace/framework")
        );
        assert_eq!(
            normalize_path(Path::new("/workspace/./a/b/../../c")),
            Path::new("/workspace/c")
        );
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(normalize_path(Path::new("/../../x")), Path::new("/x"));
    }

    #[test]
    fn relative_paths_keep_leading_parents() {
        assert_eq!(normalize_path(Path::new("../a/./b/..")), Path::new("../a"));
        assert_eq!(normalize_path(Path::new("a/..")), Path::new("."));
    }

    #[test]
    fn relative_paths_are_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_path(Path::new("a/./b/..")), cwd.join("a"));
        assert_eq!(absolute_path(Path::new("/x/../y")), Path::new("/y"));
    }
}
