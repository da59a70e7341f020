use std::io;
use std::path::{Path, PathBuf};

/// A job's exclusive temporary directory. The directory tree is removed
/// when the guard goes out of scope, so teardown happens on success,
/// handled failure, and unwinding alike.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Create `<parent>/<id>` and take ownership of it.
    pub fn create(parent: &Path, id: &str) -> io::Result<Self> {
        let root = parent.join(id);
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        // Teardown is best-effort; a failure here must not mask the job result.
        if let Err(e) = std::fs::remove_dir_all(&self.root) {
            if e.kind() != io::ErrorKind::NotFound {
                eprintln!("Failed to remove workspace {:?}: {}", self.root, e);
            }
        }
    }
}
