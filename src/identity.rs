//! Session id resolution.
//!
//! The parser keys everything it learns (pins, definitions) by session id,
//! so the id has to stay stable for a user across runs. It is resolved
//! through a chain:
//!
//! 1. `--session <id>`: explicit per-run override
//! 2. `VOXELURN_SESSION` env var
//! 3. `session-id` in `~/.voxelurn/config.toml`
//! 4. `~/.voxelurn/session-id`: generated once, then reused

use std::path::{Path, PathBuf};
use std::{env, fs, io};

use tracing::{info, warn};
use uuid::Uuid;

/// Resolve the session id from the tiered resolution chain.
///
/// Falls back to the persisted id, minting and saving a new one when
/// there is none yet.
pub fn resolve_session_id(explicit: Option<&str>, configured: Option<&str>) -> String {
    // 1. Explicit --session flag.
    if let Some(id) = explicit.filter(|s| !s.is_empty()) {
        return id.to_string();
    }

    // 2. VOXELURN_SESSION environment variable.
    if let Ok(id) = env::var("VOXELURN_SESSION")
        && !id.is_empty()
    {
        return id;
    }

    // 3. config.toml.
    if let Some(id) = configured.filter(|s| !s.is_empty()) {
        return id.to_string();
    }

    // 4. Persisted id.
    match persisted_path() {
        Some(path) => load_or_create(&path),
        None => Uuid::new_v4().to_string(),
    }
}

fn persisted_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".voxelurn").join("session-id"))
}

/// Reads the id stored at `path`, or stores a fresh one there.
///
/// A fresh id is still returned when it cannot be saved.
fn load_or_create(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) if !s.trim().is_empty() => return s.trim().to_string(),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "could not read session id"),
    }

    let id = Uuid::new_v4().to_string();
    let saved = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| fs::write(path, &id));
    match saved {
        Ok(()) => info!(session_id = %id, "new session id"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not save session id"),
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[test]
    fn explicit_wins() {
        // When an explicit id is provided, it is returned immediately.
        // We can test this without touching the env or filesystem.
        let id = resolve_session_id(Some("abc"), Some("from-config"));
        assert_eq!(id, "abc");
    }

    #[test]
    fn generated_id_is_persisted_and_reused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session-id");

        let first = load_or_create(&path);
        let second = load_or_create(&path);

        assert_eq!(first, second);
        assert!(first.parse::<Uuid>().is_ok());
    }

    #[test]
    fn blank_file_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session-id");
        fs::write(&path, "  \n").unwrap();

        let id = load_or_create(&path);
        assert_eq!(fs::read_to_string(&path).unwrap(), id);
    }
}
