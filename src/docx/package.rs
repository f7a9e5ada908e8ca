use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use anyhow::Context;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::PipelineError;

/// Expands the package at `package_path` into `dest_dir`, preserving the
/// relative path of every entry. `dest_dir` must already exist.
pub fn extract_package(package_path: &Path, dest_dir: &Path) -> anyhow::Result<()> {
    if !package_path.exists() {
        return Err(PipelineError::InputNotFound(package_path.to_path_buf()).into());
    }
    let f = File::open(package_path)
        .with_context(|| format!("open package: {}", package_path.display()))?;
    let mut zip = ZipArchive::new(f).map_err(|source| PipelineError::InvalidArchive {
        path: package_path.to_path_buf(),
        source,
    })?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).context("read zip entry")?;
        let Some(rel) = entry.enclosed_name() else {
            // Entry names escaping the destination are never valid in a
            // document package; refuse rather than write outside the tree.
            anyhow::bail!("unsafe zip entry name: {}", entry.name());
        };
        let target = dest_dir.join(rel);
        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("create dir: {}", target.display()))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
        let mut out = File::create(&target)
            .with_context(|| format!("create file: {}", target.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("write file: {}", target.display()))?;
    }
    Ok(())
}

/// Folds `source_dir` back into a package at `package_path`, creating or
/// overwriting it. Entry names are the file paths relative to `source_dir`
/// with `/` separators; traversal order is sorted, so it is stable within a
/// run.
pub fn repack_package(source_dir: &Path, package_path: &Path) -> anyhow::Result<()> {
    let f = File::create(package_path)
        .with_context(|| format!("create package: {}", package_path.display()))?;
    let mut zip = ZipWriter::new(f);
    let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry.context("walk working tree")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source_dir)
            .context("relative entry path")?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        zip.start_file(&name, opts)
            .with_context(|| format!("start zip entry: {name}"))?;
        let data = fs::read(entry.path())
            .with_context(|| format!("read file: {}", entry.path().display()))?;
        zip.write_all(&data)
            .with_context(|| format!("write zip entry: {name}"))?;
    }
    zip.finish().context("finish package")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Write;

    use zip::write::SimpleFileOptions;
    use zip::{ZipArchive, ZipWriter};

    use crate::error::PipelineError;

    use super::{extract_package, repack_package};

    fn write_test_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) {
        let f = fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(f);
        for (name, data) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn extract_then_repack_round_trips_contents() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("in.docx");
        write_test_zip(
            &pkg,
            &[
                ("word/document.xml", b"<doc/>".as_slice()),
                ("word/media/image1.png", b"\x89PNG".as_slice()),
            ],
        );

        let tree = dir.path().join("tree");
        fs::create_dir_all(&tree).unwrap();
        extract_package(&pkg, &tree).unwrap();
        assert_eq!(fs::read(tree.join("word/document.xml")).unwrap(), b"<doc/>");

        let out = dir.path().join("out.docx");
        repack_package(&tree, &out).unwrap();

        let mut zip = ZipArchive::new(fs::File::open(&out).unwrap()).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["word/document.xml", "word/media/image1.png"]);
    }

    #[test]
    fn missing_input_is_input_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = extract_package(&dir.path().join("absent.docx"), dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InputNotFound(_))
        ));
    }

    #[test]
    fn non_zip_input_is_invalid_archive() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = dir.path().join("bogus.docx");
        fs::write(&pkg, b"this is not a zip").unwrap();
        let err = extract_package(&pkg, dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidArchive { .. })
        ));
    }
}
