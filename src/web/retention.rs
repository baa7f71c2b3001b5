// Time-to-live cleanup for staged uploads and generated files

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tokio::task::JoinHandle;
use walkdir::WalkDir;

use crate::{sys_info, sys_warn};

#[derive(Clone, Copy, Debug)]
pub struct RetentionPolicy {
    ttl: Duration,
}

impl RetentionPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn is_expired(&self, modified: SystemTime, now: SystemTime) -> bool {
        now.duration_since(modified)
            .map(|age| age > self.ttl)
            .unwrap_or(false)
    }

    /// Delete regular files older than the TTL under each root. Returns how many went.
    pub fn sweep(&self, roots: &[PathBuf], now: SystemTime) -> usize {
        let mut removed = 0;
        for root in roots.iter().filter(|r| r.is_dir()) {
            for entry in WalkDir::new(root).min_depth(1).into_iter().filter_map(Result::ok) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let modified = match entry.metadata().ok().and_then(|m| m.modified().ok()) {
                    Some(t) => t,
                    None => continue,
                };
                if !self.is_expired(modified, now) {
                    continue;
                }
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    Err(e) => sys_warn!("Failed to remove {}: {}", entry.path().display(), e),
                }
            }
        }
        removed
    }
}

/// Sweep `roots` every `interval` until the returned task is aborted or the runtime stops.
pub fn spawn_sweeper(policy: RetentionPolicy, roots: Vec<PathBuf>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let roots = roots.clone();
            match tokio::task::spawn_blocking(move || policy.sweep(&roots, SystemTime::now())).await {
                Ok(0) => {}
                Ok(n) => sys_info!("Retention sweep removed {} expired files", n),
                Err(e) => sys_warn!("Retention sweep task failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("label_forge_retention_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_is_expired() {
        let policy = RetentionPolicy::new(Duration::from_secs(60));
        let now = SystemTime::now();
        assert!(!policy.is_expired(now, now));
        assert!(!policy.is_expired(now - Duration::from_secs(59), now));
        assert!(policy.is_expired(now - Duration::from_secs(61), now));
        // clock skew: modified in the future is never expired
        assert!(!policy.is_expired(now + Duration::from_secs(600), now));
    }

    #[test]
    fn test_sweep_removes_only_old_files() {
        let root = scratch_root("sweep");
        let nested = root.join("output");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join("a_box.obj"), b"v").unwrap();
        std::fs::write(nested.join("a_render.png"), b"png").unwrap();

        let policy = RetentionPolicy::new(Duration::from_secs(3600));

        assert_eq!(policy.sweep(&[root.clone()], SystemTime::now()), 0);
        assert!(root.join("a_box.obj").exists());

        let later = SystemTime::now() + Duration::from_secs(7200);
        assert_eq!(policy.sweep(&[root.clone()], later), 2);
        assert!(!root.join("a_box.obj").exists());
        assert!(!nested.join("a_render.png").exists());
        assert!(nested.is_dir());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_sweeper_removes_expired_files_in_background() {
        let root = scratch_root("sweeper");
        std::fs::create_dir_all(&root).unwrap();
        let stale = root.join("a_apply_label.py");
        std::fs::write(&stale, b"import bpy").unwrap();

        let sweeper = spawn_sweeper(
            RetentionPolicy::new(Duration::from_millis(1)),
            vec![root.clone()],
            Duration::from_millis(10),
        );

        let mut removed = false;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if !stale.exists() {
                removed = true;
                break;
            }
        }
        sweeper.abort();

        assert!(removed, "sweeper never removed {}", stale.display());
        assert!(root.is_dir());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_sweep_skips_missing_roots() {
        let policy = RetentionPolicy::new(Duration::from_secs(1));
        assert_eq!(policy.sweep(&[scratch_root("missing")], SystemTime::now()), 0);
    }
}
