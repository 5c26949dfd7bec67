//! Archive builder: zips a working directory into bytes.
//!
//! Entry names are forward-slash-relative, walked in sorted order, with
//! fixed timestamps, so identical inputs produce byte-identical archives.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::CodegenError;

/// Files that must carry the executable bit inside the archive.
const EXECUTABLE_NAMES: &[&str] = &["gradlew", "mvnw"];

/// Zip the contents of `work_dir` into an in-memory archive.
pub fn zip_dir(work_dir: &Path) -> Result<Vec<u8>, CodegenError> {
    let mut files = Vec::new();
    collect_files(work_dir, work_dir, &mut files)?;
    files.sort();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for relative in &files {
        let name = relative
            .to_str()
            .ok_or_else(|| CodegenError::Archive(format!("non-UTF-8 path: {relative:?}")))?
            .replace('\\', "/");

        let mut options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        if EXECUTABLE_NAMES.contains(&name.as_str()) {
            options = options.unix_permissions(0o755);
        }

        writer
            .start_file(&name, options)
            .map_err(|e| CodegenError::Archive(e.to_string()))?;
        let mut file = fs::File::open(work_dir.join(relative))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)?;
        writer.write_all(&contents)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| CodegenError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), CodegenError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| CodegenError::Archive(e.to_string()))?;
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn populate(dir: &Path) {
        fs::create_dir_all(dir.join("src/main/java/com/x")).unwrap();
        fs::write(dir.join("pom.xml"), "<project/>").unwrap();
        fs::write(dir.join("src/main/java/com/x/Order.java"), "class Order {}").unwrap();
    }

    #[test]
    fn archive_contains_forward_slash_entries() {
        let dir = tempfile::tempdir().unwrap();
        populate(dir.path());

        let bytes = zip_dir(dir.path()).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert_eq!(names, vec!["pom.xml", "src/main/java/com/x/Order.java"]);
    }

    #[test]
    fn identical_inputs_produce_identical_archives() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        populate(first.path());
        populate(second.path());

        assert_eq!(zip_dir(first.path()).unwrap(), zip_dir(second.path()).unwrap());
    }

    #[test]
    fn empty_directory_yields_empty_archive() {
        let dir = tempfile::tempdir().unwrap();
        let bytes = zip_dir(dir.path()).unwrap();
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }
}
