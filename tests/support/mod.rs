use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

use tempfile::TempDir;

fn test_mutex() -> &'static Mutex<()> {
    static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
    MUTEX.get_or_init(|| Mutex::new(()))
}

pub fn lock_test_mutex() -> MutexGuard<'static, ()> {
    match test_mutex().lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Points HOME at a fresh directory until dropped.
pub struct TestHome {
    dir: TempDir,
    previous: Option<std::ffi::OsString>,
}

impl TestHome {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

impl Drop for TestHome {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(prev) => std::env::set_var("HOME", prev),
            None => std::env::remove_var("HOME"),
        }
    }
}

pub fn ensure_test_home() -> TestHome {
    let dir = tempfile::tempdir().expect("create temp home");
    let previous = std::env::var_os("HOME");
    std::env::set_var("HOME", dir.path());
    TestHome { dir, previous }
}
