//! Marker recording that the arm is at its home position

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    fs, io,
    path::{Path, PathBuf},
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Records whether the arm is known to be at home.
///
/// The command handler only ever clears the marker. Setting it is left to whatever observes the
/// arm actually arriving at home.
pub trait HomeMarker {
    /// Record that the arm has left home. Clearing a marker which is not set is not an error.
    fn mark_left_home(&self) -> io::Result<()>;

    /// True if the arm is known to be at home.
    fn is_at_home(&self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A home marker backed by the existence of a file.
#[derive(Debug, Clone)]
pub struct FileHomeMarker {
    path: PathBuf,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FileHomeMarker {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HomeMarker for FileHomeMarker {
    fn mark_left_home(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn is_at_home(&self) -> bool {
        self.path.exists()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_file_home_marker() {
        let dir = tempfile::tempdir().unwrap();
        let marker = FileHomeMarker::new(dir.path().join("at_home"));

        assert!(!marker.is_at_home());

        // Clearing an absent marker is fine
        marker.mark_left_home().unwrap();

        fs::write(marker.path(), b"").unwrap();
        assert!(marker.is_at_home());

        marker.mark_left_home().unwrap();
        assert!(!marker.is_at_home());
    }
}
