//! Lock-scoped atomic mutation helpers for the registry document.
//!
//! One advisory lock file serializes all writers system-wide. The critical
//! section is load, mutate, save: deciding the next free identifier or
//! checking a conflict outside the lock would let two processes hand out
//! the same ISBN twice.

use crate::registry::Registry;
use crate::store::StoreError;
use chrono::Utc;
use std::error::Error as StdError;
use std::ffi::OsString;
use std::fmt::{Display, Formatter};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Default bound on waiting for the store lock.
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;
pub const MIN_LOCK_TIMEOUT_MS: u64 = 100;
pub const MAX_LOCK_TIMEOUT_MS: u64 = 60_000;

const LOCK_POLL_INTERVAL_MS: u64 = 25;

pub fn registry_lock_path(store_path: &Path) -> PathBuf {
    let mut path: OsString = store_path.as_os_str().to_os_string();
    path.push(".lock");
    PathBuf::from(path)
}

#[derive(Debug)]
pub enum AtomicMutationError<E> {
    LockTimeout { lock_path: String, waited_ms: u64 },
    LockIo { lock_path: String, message: String },
    Store(StoreError),
    Mutation(E),
}

impl<E> AtomicMutationError<E> {
    fn lock_timeout(lock_path: &Path, waited: Duration) -> Self {
        Self::LockTimeout {
            lock_path: lock_path.display().to_string(),
            waited_ms: waited.as_millis() as u64,
        }
    }

    fn lock_io(lock_path: &Path, message: impl Into<String>) -> Self {
        Self::LockIo {
            lock_path: lock_path.display().to_string(),
            message: message.into(),
        }
    }
}

impl<E: Display> Display for AtomicMutationError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LockTimeout {
                lock_path,
                waited_ms,
            } => write!(
                f,
                "registry lock not acquired within {waited_ms}ms: {lock_path}"
            ),
            Self::LockIo { lock_path, message } => {
                write!(f, "failed to acquire registry lock {lock_path}: {message}")
            }
            Self::Store(err) => write!(f, "{err}"),
            Self::Mutation(err) => write!(f, "{err}"),
        }
    }
}

impl<E> StdError for AtomicMutationError<E> where
    E: Display + std::fmt::Debug + StdError + 'static
{
}

/// Execute one lock-scoped registry mutation with the default timeout.
///
/// The mutator returns `(value, changed)` where:
/// - `value` is returned to the caller
/// - `changed=true` persists the registry before lock release.
pub fn mutate_registry<T, E, F>(
    path: impl AsRef<Path>,
    mutator: F,
) -> Result<T, AtomicMutationError<E>>
where
    F: FnOnce(&mut Registry) -> Result<(T, bool), E>,
{
    mutate_registry_with_timeout(path, Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS), mutator)
}

/// Execute one lock-scoped registry mutation, waiting up to `timeout` for
/// the advisory lock before failing with `LockTimeout`.
pub fn mutate_registry_with_timeout<T, E, F>(
    path: impl AsRef<Path>,
    timeout: Duration,
    mutator: F,
) -> Result<T, AtomicMutationError<E>>
where
    F: FnOnce(&mut Registry) -> Result<(T, bool), E>,
{
    let path = path.as_ref();
    let timeout = timeout.clamp(
        Duration::from_millis(MIN_LOCK_TIMEOUT_MS),
        Duration::from_millis(MAX_LOCK_TIMEOUT_MS),
    );
    let _guard = RegistryFileLockGuard::acquire(path, timeout).map_err(|err| match err {
        AtomicMutationError::LockTimeout {
            lock_path,
            waited_ms,
        } => AtomicMutationError::LockTimeout {
            lock_path,
            waited_ms,
        },
        AtomicMutationError::LockIo { lock_path, message } => {
            AtomicMutationError::LockIo { lock_path, message }
        }
        AtomicMutationError::Store(source) => AtomicMutationError::Store(source),
        AtomicMutationError::Mutation(unreachable) => match unreachable {},
    })?;

    let mut registry = Registry::load(path).map_err(AtomicMutationError::Store)?;
    let (value, changed) = mutator(&mut registry).map_err(AtomicMutationError::Mutation)?;
    if changed {
        registry.save(path).map_err(AtomicMutationError::Store)?;
    }
    Ok(value)
}

struct RegistryFileLockGuard {
    lock_path: PathBuf,
    _file: File,
}

impl RegistryFileLockGuard {
    fn acquire(
        path: &Path,
        timeout: Duration,
    ) -> Result<Self, AtomicMutationError<std::convert::Infallible>> {
        let lock_path = registry_lock_path(path);
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .map_err(|e| AtomicMutationError::lock_io(&lock_path, e.to_string()))?;
        }

        let started = Instant::now();
        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    let _ = writeln!(
                        file,
                        "pid={}\nutc={}",
                        std::process::id(),
                        Utc::now().to_rfc3339()
                    );
                    return Ok(Self {
                        lock_path,
                        _file: file,
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(AtomicMutationError::lock_timeout(&lock_path, waited));
                    }
                    std::thread::sleep(Duration::from_millis(LOCK_POLL_INTERVAL_MS));
                }
                Err(err) => {
                    return Err(AtomicMutationError::lock_io(&lock_path, err.to_string()));
                }
            }
        }
    }
}

impl Drop for RegistryFileLockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store_path(prefix: &str) -> PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let root = std::env::temp_dir().join(format!(
            "shelfmark-atomic-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&root).expect("temp dir should be created");
        root.join("registry.json")
    }

    #[test]
    fn mutation_persists_when_changed_and_releases_the_lock() {
        let path = temp_store_path("persist");
        let count = mutate_registry::<_, Infallible, _>(&path, |registry| {
            let record =
                crate::assignment::Assignment::new("9781234561000", chrono::Utc::now());
            registry.upsert_assignment(record);
            Ok((registry.assignment_count(), true))
        })
        .expect("mutation should succeed");
        assert_eq!(count, 1);

        assert!(!registry_lock_path(&path).exists());
        let reloaded = Registry::load(&path).expect("registry should reload");
        assert_eq!(reloaded.assignment_count(), 1);
    }

    #[test]
    fn unchanged_mutation_does_not_write_the_store() {
        let path = temp_store_path("unchanged");
        mutate_registry::<_, Infallible, _>(&path, |_registry| Ok(((), false)))
            .expect("mutation should succeed");
        assert!(!path.exists());
    }

    #[test]
    fn held_lock_times_out_after_the_configured_wait() {
        let path = temp_store_path("timeout");
        let lock_path = registry_lock_path(&path);
        fs::write(&lock_path, "busy\n").expect("lock should be created");

        let result = mutate_registry_with_timeout::<(), Infallible, _>(
            &path,
            Duration::from_millis(120),
            |_registry| Ok(((), false)),
        );
        match result {
            Err(AtomicMutationError::LockTimeout {
                lock_path: reported,
                waited_ms,
            }) => {
                assert_eq!(reported, lock_path.display().to_string());
                assert!(waited_ms >= 120);
            }
            other => panic!("expected lock timeout, got {other:?}"),
        }
        let _ = fs::remove_file(lock_path);
    }

    #[test]
    fn mutation_error_propagates_without_writing() {
        let path = temp_store_path("mutation-error");
        let result = mutate_registry::<(), _, _>(&path, |_registry| {
            Err(crate::registry::RegistryError::DuplicateBlockId(
                "blk-1".to_string(),
            ))
        });
        assert!(matches!(result, Err(AtomicMutationError::Mutation(_))));
        assert!(!path.exists());
        assert!(!registry_lock_path(&path).exists());
    }
}
