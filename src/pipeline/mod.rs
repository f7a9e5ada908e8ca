mod translator;
mod workdir;

pub use translator::{PipelineConfig, TranslatePipeline};
pub use workdir::WorkTree;
