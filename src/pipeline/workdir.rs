use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// Scoped working tree for one pipeline run.
///
/// Creation destroys any stale tree left at the same path; the tree is
/// removed again when the value drops, on success and error paths alike.
/// One run per path at a time — concurrent runs sharing a path would
/// corrupt each other.
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    pub fn create(root: &Path) -> anyhow::Result<Self> {
        if root.exists() {
            fs::remove_dir_all(root)
                .with_context(|| format!("remove stale working tree: {}", root.display()))?;
        }
        fs::create_dir_all(root)
            .with_context(|| format!("create working tree: {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for WorkTree {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::WorkTree;

    #[test]
    fn create_replaces_stale_tree_and_drop_removes_it() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("work");
        fs::create_dir_all(root.join("leftover")).unwrap();
        fs::write(root.join("leftover/old.xml"), b"stale").unwrap();

        {
            let tree = WorkTree::create(&root).unwrap();
            assert!(tree.root().exists());
            assert!(!root.join("leftover").exists());
        }
        assert!(!root.exists());
    }
}
