//! Writes generated sources to disk

use crate::error::Error;
use std::{
    fs,
    path::{Path, PathBuf}
};

/// Writes `source` to `<dir>/<package_name>.rs`, creating `dir` if needed.
///
/// An existing file is overwritten. Returns the path of the written file.
pub fn write_source(dir: &Path, package_name: &str, source: &str) -> Result<PathBuf, Error> {
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("{package_name}.rs"));
    fs::write(&path, source)?;

    tracing::info!(path = %path.display(), bytes = source.len(), "container written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::write_source;
    use std::fs;

    #[test]
    fn it_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("src").join("generated");

        let path = write_source(&output, "di", "// generated").unwrap();

        assert_eq!(path, output.join("di.rs"));
        assert_eq!(fs::read_to_string(path).unwrap(), "// generated");
    }

    #[test]
    fn it_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();

        write_source(dir.path(), "di", "// first, and longer").unwrap();
        let path = write_source(dir.path(), "di", "// second").unwrap();

        assert_eq!(fs::read_to_string(path).unwrap(), "// second");
    }

    #[test]
    fn it_fails_when_output_is_a_file() {
        let file = tempfile::NamedTempFile::new().unwrap();

        let err = write_source(file.path(), "di", "").unwrap_err();

        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
