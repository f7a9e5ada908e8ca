use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

/// The parts of an extracted package that carry rewritable text.
///
/// Absence of any part is not an error; the corresponding rewrite pass is
/// simply skipped.
pub struct DocumentParts {
    pub body: Option<PathBuf>,
    pub headers_footers: Vec<PathBuf>,
    pub footnotes: Option<PathBuf>,
}

/// Locates the rewrite targets under a working tree: the fixed body part,
/// any `header*`/`footer*` files directly under `word/` (case-sensitive
/// prefix, any extension), and the fixed footnotes part.
pub fn select_parts(tree_root: &Path) -> anyhow::Result<DocumentParts> {
    let word_dir = tree_root.join("word");

    let mut headers_footers = Vec::new();
    if word_dir.is_dir() {
        for entry in fs::read_dir(&word_dir)
            .with_context(|| format!("list parts dir: {}", word_dir.display()))?
        {
            let entry = entry.context("read parts dir entry")?;
            if !entry.file_type().context("part file type")?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("header") || name.starts_with("footer") {
                headers_footers.push(entry.path());
            }
        }
        // read_dir order is platform-dependent; sort for a stable pass order.
        headers_footers.sort();
    }

    Ok(DocumentParts {
        body: existing(word_dir.join("document.xml")),
        headers_footers,
        footnotes: existing(word_dir.join("footnotes.xml")),
    })
}

fn existing(path: PathBuf) -> Option<PathBuf> {
    path.is_file().then_some(path)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::select_parts;

    #[test]
    fn selects_body_headers_footers_and_footnotes() {
        let dir = tempfile::tempdir().unwrap();
        let word = dir.path().join("word");
        fs::create_dir_all(word.join("media")).unwrap();
        for name in [
            "document.xml",
            "footnotes.xml",
            "header1.xml",
            "header2.xml",
            "footer1.xml",
            "styles.xml",
            "Header1.xml",
        ] {
            fs::write(word.join(name), b"<x/>").unwrap();
        }
        // Prefix matching applies to files directly under word/ only.
        fs::write(word.join("media").join("header.png"), b"png").unwrap();

        let parts = select_parts(dir.path()).unwrap();
        assert_eq!(parts.body.as_deref(), Some(word.join("document.xml").as_path()));
        assert_eq!(
            parts.footnotes.as_deref(),
            Some(word.join("footnotes.xml").as_path())
        );
        let names: Vec<String> = parts
            .headers_footers
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["footer1.xml", "header1.xml", "header2.xml"]);
    }

    #[test]
    fn missing_parts_are_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let parts = select_parts(dir.path()).unwrap();
        assert!(parts.body.is_none());
        assert!(parts.headers_footers.is_empty());
        assert!(parts.footnotes.is_none());
    }
}
