/// External text transform capability.
///
/// The pipeline calls this once per paragraph with the paragraph's joined,
/// trimmed text and the free-form target-language code it was given. The
/// implementation is a black box; the only requirement is that `Ok` carries
/// the full replacement text. Any `Err` aborts the run.
pub trait TextTransform {
    fn transform(&self, text: &str, target_lang: &str) -> anyhow::Result<String>;
}

/// Deterministic stand-in backend: echoes the input with a fixed suffix.
///
/// Used by the CLI until a real translation backend is wired in, and by
/// tests that need a predictable transform.
pub struct EchoTranslator {
    suffix: String,
}

impl EchoTranslator {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Default for EchoTranslator {
    fn default() -> Self {
        Self::new("++")
    }
}

impl TextTransform for EchoTranslator {
    fn transform(&self, text: &str, _target_lang: &str) -> anyhow::Result<String> {
        Ok(format!("{}{}", text, self.suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::{EchoTranslator, TextTransform};

    #[test]
    fn echo_appends_suffix() {
        let t = EchoTranslator::default();
        assert_eq!(t.transform("Hello world", "en").unwrap(), "Hello world++");
    }
}
