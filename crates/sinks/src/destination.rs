//! Output destinations
//!
//! A destination hands out brand-new files. It never opens an existing
//! file, which is what guarantees a superseded file is never appended to.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Where output files are created
pub trait Destination: Send + Sync {
    /// Create a new file called `file_name`
    ///
    /// Fails with `io::ErrorKind::AlreadyExists` when the name is taken.
    fn create(&self, file_name: &str) -> io::Result<(PathBuf, File)>;

    /// Human-readable location for logs and errors
    fn describe(&self) -> String;
}

/// Files created inside one directory
#[derive(Debug, Clone)]
pub struct DirectoryDestination {
    path: PathBuf,
    create_dirs: bool,
}

impl DirectoryDestination {
    pub fn new(path: impl Into<PathBuf>, create_dirs: bool) -> Self {
        Self {
            path: path.into(),
            create_dirs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Destination for DirectoryDestination {
    fn create(&self, file_name: &str) -> io::Result<(PathBuf, File)> {
        if self.create_dirs {
            fs::create_dir_all(&self.path).map_err(|e| {
                // a regular file in the way must not look like a name collision
                if e.kind() == io::ErrorKind::AlreadyExists {
                    io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("{} is not a directory", self.path.display()),
                    )
                } else {
                    e
                }
            })?;
        }

        let path = self.path.join(file_name);
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok((path, file))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
