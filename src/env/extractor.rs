//! The environment-extraction pipeline: content extractors applied to one
//! file at a time, streamed lazily to a single consumer.

use super::extractors::{
    ComposeEnvExtractor, ContentExtractor, DockerfileEnvExtractor, DotenvExtractor,
    LibraryCallExtractor, StructuredConfigExtractor,
};
use super::types::EnvResult;
use tracing::trace;

/// Registry of content extractors. Each extractor that can handle a file
/// contributes its results; deduplication is the caller's job.
pub struct EnvExtractor {
    extractors: Vec<Box<dyn ContentExtractor>>,
}

impl EnvExtractor {
    pub fn with_defaults() -> Self {
        Self {
            extractors: vec![
                Box::new(ComposeEnvExtractor),
                Box::new(DockerfileEnvExtractor),
                Box::new(DotenvExtractor),
                Box::new(LibraryCallExtractor),
                Box::new(StructuredConfigExtractor),
            ],
        }
    }

    /// Applies every matching extractor to the file content, lazily: an
    /// extractor runs only when the consumer reaches its position in the
    /// stream, and abandoning the iterator skips the rest.
    pub fn extract<'a>(
        &'a self,
        filename: &'a str,
        content: &'a [u8],
    ) -> impl Iterator<Item = EnvResult> + 'a {
        self.extractors
            .iter()
            .filter(move |e| e.can_handle(filename))
            .flat_map(move |extractor| {
                match extractor.extract(filename, content) {
                    Ok(results) => results,
                    Err(e) => {
                        // Malformed content never fails the pipeline.
                        trace!(filename, error = %e, "extractor failed");
                        Vec::new()
                    }
                }
            })
    }
}

impl Default for EnvExtractor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::types::dedupe_by_name;

    #[test]
    fn test_multiple_extractors_contribute() {
        let extractor = EnvExtractor::with_defaults();

        let results: Vec<EnvResult> = extractor
            .extract(".env", b"PORT=3000\nAPI_KEY=abc123\n")
            .collect();

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.source.starts_with("dotenv:")));
    }

    #[test]
    fn test_unmatched_file_yields_nothing() {
        let extractor = EnvExtractor::with_defaults();
        let results: Vec<EnvResult> = extractor.extract("image.png", b"binary").collect();
        assert!(results.is_empty());
    }

    #[test]
    fn test_caller_dedupes_across_files() {
        let extractor = EnvExtractor::with_defaults();

        let mut all: Vec<EnvResult> = Vec::new();
        all.extend(extractor.extract("server.js", b"const p = process.env.PORT;"));
        all.extend(extractor.extract(".env", b"PORT=3000\n"));

        let deduped = dedupe_by_name(all);
        assert_eq!(deduped.len(), 1);
        // The dotenv declaration outranks the usage reference.
        assert!(deduped[0].source.starts_with("dotenv:"));
    }
}
