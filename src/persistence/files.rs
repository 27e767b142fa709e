use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Name of the data directory, both local and in $HOME
pub const DATA_DIR_NAME: &str = ".tend";

/// Get the tend directory - checks for local .tend first, then falls back to global ~/.tend
pub fn get_tend_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("TEND_HOME") {
        return Ok(PathBuf::from(dir));
    }

    let current_dir = env::current_dir().context("Could not determine current directory")?;
    if let Some(local_dir) = find_local_tend(&current_dir) {
        return Ok(local_dir);
    }

    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(DATA_DIR_NAME))
}

/// Find local .tend directory by walking up the directory tree
fn find_local_tend(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;

    loop {
        let tend_dir = current.join(DATA_DIR_NAME);
        if tend_dir.is_dir() {
            return Some(tend_dir);
        }

        current = current.parent()?;
    }
}

/// Ensure the tend directory exists
fn ensure_tend_dir() -> Result<PathBuf> {
    let dir = get_tend_dir()?;
    if !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(dir)
}

/// Initialize a local .tend directory in the current directory
pub fn init_local_tend() -> Result<PathBuf> {
    let current_dir = env::current_dir().context("Could not determine current directory")?;
    let tend_dir = current_dir.join(DATA_DIR_NAME);

    if tend_dir.exists() {
        anyhow::bail!("Tend directory already exists: {}", tend_dir.display());
    }

    fs::create_dir_all(&tend_dir)
        .with_context(|| format!("Failed to create directory: {}", tend_dir.display()))?;

    Ok(tend_dir)
}

/// Path to config.json
pub fn config_file() -> Result<PathBuf> {
    Ok(ensure_tend_dir()?.join("config.json"))
}

/// Path to the saved sign-in session
pub fn session_file() -> Result<PathBuf> {
    Ok(ensure_tend_dir()?.join("session.json"))
}

/// Path to the task list used in offline mode
pub fn tasks_file() -> Result<PathBuf> {
    Ok(ensure_tend_dir()?.join("tasks.json"))
}

/// Path to the board's log file
pub fn log_file() -> Result<PathBuf> {
    Ok(ensure_tend_dir()?.join("tend.log"))
}

/// Atomically write content to a file using temp file + rename
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = path
        .parent()
        .context("File path has no parent directory")?;

    let mut temp_file = NamedTempFile::new_in(dir)
        .context("Failed to create temporary file")?;

    temp_file
        .write_all(content.as_bytes())
        .context("Failed to write to temporary file")?;

    temp_file
        .as_file()
        .sync_all()
        .context("Failed to sync temporary file")?;

    temp_file
        .persist(path)
        .with_context(|| format!("Failed to persist file: {}", path.display()))?;

    Ok(())
}

/// Read file content, `None` if the file doesn't exist
pub fn read_optional<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }
    fs::read_to_string(path)
        .map(Some)
        .with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Remove a file if present
pub fn remove_if_exists<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove file: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_local_tend_walks_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let tend_dir = temp_dir.path().join(DATA_DIR_NAME);
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&tend_dir).unwrap();
        fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_local_tend(&nested), Some(tend_dir));
    }

    #[test]
    fn test_atomic_write_and_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("test.json");

        atomic_write(&test_file, "{}").unwrap();
        assert_eq!(read_optional(&test_file).unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn test_read_nonexistent_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("nonexistent.json");

        assert!(read_optional(&test_file).unwrap().is_none());
    }

    #[test]
    fn test_remove_if_exists() {
        let temp_dir = tempfile::tempdir().unwrap();
        let test_file = temp_dir.path().join("session.json");

        remove_if_exists(&test_file).unwrap();
        atomic_write(&test_file, "x").unwrap();
        remove_if_exists(&test_file).unwrap();
        assert!(!test_file.exists());
    }
}
