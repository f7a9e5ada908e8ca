use std::path::PathBuf;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use docx_translate::pipeline::{PipelineConfig, TranslatePipeline};
use docx_translate::progress::ConsoleProgress;
use docx_translate::provider::EchoTranslator;

#[derive(Parser, Debug)]
#[command(name = "docx-translate")]
#[command(about = "Rewrite DOCX text paragraph-by-paragraph, preserving run structure", long_about = None)]
struct Args {
    /// Input .docx
    #[arg(value_name = "DOCX")]
    input: Option<PathBuf>,

    /// Output .docx (default: <input_stem>_translated.docx)
    #[arg(short, long, value_name = "DOCX")]
    output: Option<PathBuf>,

    /// Target language code handed to the transform backend (e.g. en, fr)
    #[arg(short = 'l', long, default_value = "en")]
    target_lang: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let progress = ConsoleProgress::new(true);

    let input = match args.input {
        Some(p) => p,
        None => {
            let mut cmd = Args::command();
            cmd.print_help().context("print help")?;
            return Ok(());
        }
    };
    let output = match args.output {
        Some(p) => p,
        None => {
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output")
                .to_string();
            input.with_file_name(format!("{stem}_translated.docx"))
        }
    };

    let cfg = PipelineConfig {
        target_lang: args.target_lang,
        work_dir: output.with_extension("work"),
    };
    let pipeline = TranslatePipeline::new(cfg, Box::new(EchoTranslator::default()), progress);
    pipeline.translate_docx(&input, &output)
}
