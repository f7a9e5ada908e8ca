use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::docx::package::{extract_package, repack_package};
use crate::docx::parts::select_parts;
use crate::docx::rewrite::rewrite_part;
use crate::progress::ConsoleProgress;
use crate::provider::TextTransform;

use super::workdir::WorkTree;

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Free-form target-language code handed to the transform provider.
    pub target_lang: String,
    /// Where the package is expanded for this run. Owned exclusively by the
    /// run; anything already there is destroyed.
    pub work_dir: PathBuf,
}

/// Sequences one document through extract → rewrite → repack.
pub struct TranslatePipeline {
    cfg: PipelineConfig,
    provider: Box<dyn TextTransform>,
    progress: ConsoleProgress,
}

impl TranslatePipeline {
    pub fn new(
        cfg: PipelineConfig,
        provider: Box<dyn TextTransform>,
        progress: ConsoleProgress,
    ) -> Self {
        Self {
            cfg,
            provider,
            progress,
        }
    }

    pub fn translate_docx(&self, input: &Path, output: &Path) -> anyhow::Result<()> {
        self.progress.info(format!("Read DOCX: {}", input.display()));
        let tree = WorkTree::create(&self.cfg.work_dir)?;
        extract_package(input, tree.root())?;

        let parts = select_parts(tree.root())?;
        match parts.body.as_deref() {
            Some(body) => self.rewrite_file(tree.root(), body)?,
            None => self.progress.info("No body part; skipping"),
        }

        let aux: Vec<&Path> = parts
            .headers_footers
            .iter()
            .map(PathBuf::as_path)
            .chain(parts.footnotes.as_deref())
            .collect();
        for (i, part) in aux.iter().enumerate() {
            self.rewrite_file(tree.root(), part)?;
            self.progress.progress("Rewrote aux parts", i + 1, aux.len());
        }

        self.progress.info(format!("Write output: {}", output.display()));
        repack_package(tree.root(), output)?;
        Ok(())
    }

    fn rewrite_file(&self, tree_root: &Path, path: &Path) -> anyhow::Result<()> {
        let part_name = path
            .strip_prefix(tree_root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        self.progress.info(format!("Rewrite part: {part_name}"));
        let xml = fs::read(path).with_context(|| format!("read part: {}", path.display()))?;
        let rewritten = rewrite_part(&xml, &part_name, &self.cfg.target_lang, self.provider.as_ref())?;
        fs::write(path, rewritten).with_context(|| format!("write part: {}", path.display()))?;
        Ok(())
    }
}
