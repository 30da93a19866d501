//! Header-aware chunking for markdown-structured leases
//!
//! Three strictly ordered stages:
//! 1. split on `#` (Article) and `##` (Section) headers
//! 2. re-split oversized segments with [`RecursiveSplitter`]
//! 3. fuse undersized chunks into their successor until stable

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::splitter::RecursiveSplitter;
use crate::domain::ingestion::{Chunk, ChunkMetadata, ChunkerConfig, DocumentChunker};
use crate::domain::DomainError;

static HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,2})\s+(.+?)\s*#*\s*$").unwrap());

/// Header level recognised by the hierarchical split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderLevel {
    Article,
    Section,
}

fn parse_header(line: &str) -> Option<(HeaderLevel, String)> {
    let caps = HEADER.captures(line)?;
    let level = match caps.get(1)?.as_str().len() {
        1 => HeaderLevel::Article,
        _ => HeaderLevel::Section,
    };
    let title = caps.get(2)?.as_str().trim_matches('*').trim().to_string();

    if title.is_empty() {
        return None;
    }

    Some((level, title))
}

/// Words that carry text, ignoring bare markdown punctuation like `#` or `---`
fn content_word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

#[derive(Debug, Clone, Default)]
pub struct HeaderAwareChunker {
    config: ChunkerConfig,
}

impl HeaderAwareChunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Stage 1: ordered segments with article/section labels, headers kept
    /// inside the content.
    pub fn split_by_headers(&self, text: &str) -> Vec<Chunk> {
        let mut segments = Vec::new();
        let mut metadata = ChunkMetadata::new();
        let mut current: Vec<&str> = Vec::new();

        for line in text.lines() {
            if let Some((level, title)) = parse_header(line) {
                push_segment(&mut segments, &current, &metadata);
                current.clear();

                metadata = match level {
                    HeaderLevel::Article => ChunkMetadata::new().with_article(title),
                    HeaderLevel::Section => ChunkMetadata {
                        section: Some(title),
                        ..metadata
                    },
                };
            }
            current.push(line);
        }
        push_segment(&mut segments, &current, &metadata);

        segments
    }

    /// Stage 2: split any segment above `max_tokens`, dropping fragments
    /// with too few words.
    pub fn split_oversized(&self, segments: Vec<Chunk>) -> Vec<Chunk> {
        let splitter = RecursiveSplitter::new(
            self.config.secondary_chunk_chars(),
            self.config.secondary_overlap_chars(),
        );
        let mut output = Vec::with_capacity(segments.len());

        for segment in segments {
            if segment.token_count() <= self.config.max_tokens {
                output.push(segment);
                continue;
            }

            let pieces: Vec<String> = splitter
                .split(segment.content())
                .into_iter()
                .filter(|p| content_word_count(p) >= self.config.min_fragment_words)
                .collect();

            debug!(
                tokens = segment.token_count(),
                pieces = pieces.len(),
                section = segment.metadata().source_section().unwrap_or(""),
                "Secondary split of oversized segment"
            );

            output.extend(pieces.into_iter().enumerate().map(|(i, piece)| {
                Chunk::new(piece, segment.metadata().clone().with_sub_chunk(i))
            }));
        }

        output
    }

    /// Stage 3: fuse chunks below `orphan_min_tokens` into the next chunk.
    /// Returns the chunks and the number of passes run.
    pub fn merge_orphans(&self, mut chunks: Vec<Chunk>) -> (Vec<Chunk>, usize) {
        let mut passes = 0;

        while passes < self.config.max_merge_passes {
            passes += 1;
            let mut merges = 0;
            let mut output = Vec::with_capacity(chunks.len());
            let mut worklist = chunks.into_iter();

            while let Some(chunk) = worklist.next() {
                if chunk.token_count() < self.config.orphan_min_tokens {
                    if let Some(next) = worklist.next() {
                        output.push(chunk.absorb_into(next));
                        merges += 1;
                        continue;
                    }
                }
                output.push(chunk);
            }

            chunks = output;
            if merges == 0 {
                break;
            }
        }

        (chunks, passes)
    }
}

fn push_segment(segments: &mut Vec<Chunk>, lines: &[&str], metadata: &ChunkMetadata) {
    let content = lines.join("\n");
    let content = content.trim();

    if !content.is_empty() {
        segments.push(Chunk::new(content, metadata.clone()));
    }
}

impl DocumentChunker for HeaderAwareChunker {
    fn chunk(&self, text: &str) -> Result<Vec<Chunk>, DomainError> {
        self.config.validate()?;

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let segments = self.split_by_headers(text);
        let segment_count = segments.len();
        let split = self.split_oversized(segments);
        let split_count = split.len();
        let (chunks, passes) = self.merge_orphans(split);

        debug!(
            segments = segment_count,
            after_split = split_count,
            chunks = chunks.len(),
            merge_passes = passes,
            "Chunked document"
        );

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "header_aware"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ingestion::normalizer::normalize;

    const BODY: &str = "The Tenant shall at its own expense keep the Premises in good and substantial repair, ordinary wear and tear excepted.";

    fn chunker() -> HeaderAwareChunker {
        HeaderAwareChunker::new(ChunkerConfig::default())
    }

    fn long_section(chars: usize) -> String {
        let mut text = String::from("## 4.01 Basic Rent\n\n");
        let sentence = "The Tenant shall pay Basic Rent in equal monthly installments in advance on the first day of each month. ";
        let mut paragraph = 0;
        while text.len() < chars {
            text.push_str(sentence);
            paragraph += 1;
            if paragraph % 4 == 0 {
                text.push_str("\n\n");
            }
        }
        text
    }

    #[test]
    fn test_empty_input() {
        assert!(chunker().chunk("").unwrap().is_empty());
        assert!(chunker().chunk(" \n\n\t ").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let chunker = HeaderAwareChunker::new(ChunkerConfig::new(0));
        assert!(chunker.chunk("text").is_err());
    }

    #[test]
    fn test_header_hierarchy() {
        let text = "Preamble text before headers.\n# ARTICLE 1 - DEFINITIONS\n## 1.01 Terms\nTerms body.\n## 1.02 Rent\nRent body.\n# ARTICLE 2 - PREMISES\nPremises body.";
        let segments = chunker().split_by_headers(text);

        assert_eq!(segments.len(), 5);
        assert!(segments[0].metadata().is_empty());
        assert_eq!(segments[1].metadata().article.as_deref(), Some("ARTICLE 1 - DEFINITIONS"));
        assert_eq!(segments[2].metadata().section.as_deref(), Some("1.01 Terms"));
        assert_eq!(segments[2].metadata().article.as_deref(), Some("ARTICLE 1 - DEFINITIONS"));
        assert_eq!(segments[3].metadata().section.as_deref(), Some("1.02 Rent"));
        assert!(segments[3].content().starts_with("## 1.02 Rent"));

        // A new article clears the section
        assert_eq!(segments[4].metadata().article.as_deref(), Some("ARTICLE 2 - PREMISES"));
        assert_eq!(segments[4].metadata().section, None);
    }

    #[test]
    fn test_deeper_headers_stay_in_content() {
        let segments = chunker().split_by_headers("## 3.01 Use\n### (a) Permitted\nBody");
        assert_eq!(segments.len(), 1);
        assert!(segments[0].content().contains("### (a) Permitted"));
    }

    #[test]
    fn test_toc_then_light_fixtures_fuses_into_next_section() {
        let text = format!(
            "# LEASE\n\nTable of Contents\n\nARTICLE 1 - DEFINITIONS ....... 1\nARTICLE 7 - REPAIRS ....... 9\n\n# ARTICLE 1 - DEFINITIONS\n\nIn this Lease the following words have the meanings given below.\n\n# ARTICLE 7 - REPAIRS\n\n## 7.02 Light Fixtures\n\n## 7.03 Repairs by Tenant\n\n{}",
            BODY
        );

        let chunks = chunker().chunk(&normalize(&text)).unwrap();
        let fused = chunks
            .iter()
            .find(|c| c.content().contains("7.02 Light Fixtures"))
            .unwrap();

        assert!(fused.content().contains("7.03 Repairs by Tenant"));
        assert!(fused.content().contains(BODY));
        assert_eq!(fused.metadata().section.as_deref(), Some("7.03 Repairs by Tenant"));
        assert_eq!(fused.metadata().article.as_deref(), Some("ARTICLE 7 - REPAIRS"));
        assert!(chunks.iter().all(|c| !c.content().contains(".......")));
    }

    #[test]
    fn test_oversized_section_is_split() {
        let text = long_section(5000);
        let config = ChunkerConfig::default();
        let chunks = chunker().chunk(&text).unwrap();

        assert!(chunks.len() >= 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata().sub_chunk, Some(i));
            assert_eq!(chunk.metadata().section.as_deref(), Some("4.01 Basic Rent"));
            assert!(chunk.token_count() <= config.max_tokens + config.secondary_overlap_tokens);
        }
    }

    #[test]
    fn test_tiny_fragments_dropped_and_renumbered() {
        let config = ChunkerConfig::new(10)
            .with_secondary(8, 0)
            .with_min_fragment_words(3)
            .with_orphan_min_tokens(0);
        let chunker = HeaderAwareChunker::new(config);

        let text = "## 1.01 Terms\n\nalpha beta gamma delta\n\nOK\n\nepsilon zeta eta theta";
        let chunks = chunker.chunk(text).unwrap();

        // The header-only fragment has two words and is dropped
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content().starts_with("alpha beta"));
        let subs: Vec<_> = chunks.iter().filter_map(|c| c.metadata().sub_chunk).collect();
        assert_eq!(subs, (0..chunks.len()).collect::<Vec<_>>());
    }

    #[test]
    fn test_orphans_merge_into_next() {
        let text = format!("# ARTICLE 5\n## 5.01 Taxes\n{}\n## 5.02 Utilities\n{}", BODY, BODY);
        let chunks = chunker().chunk(&text).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].content().starts_with("# ARTICLE 5\n\n## 5.01 Taxes"));
        assert_eq!(chunks[0].metadata().article.as_deref(), Some("ARTICLE 5"));
        assert_eq!(chunks[0].metadata().section.as_deref(), Some("5.01 Taxes"));
        assert_eq!(chunks[0].token_count(), crate::domain::ingestion::estimate_tokens(chunks[0].content()));
    }

    #[test]
    fn test_last_chunk_kept_even_if_small() {
        let text = format!("## 9.01 Notices\n{}\n## 9.02 Time\nTime is of the essence.", BODY);
        let chunks = chunker().chunk(&text).unwrap();

        assert_eq!(chunks.len(), 2);
        assert!(chunks[1].token_count() < 25);
        assert!(chunks[1].content().contains("Time is of the essence."));
    }

    #[test]
    fn test_merge_stops_at_pass_cap() {
        let config = ChunkerConfig::default().with_max_merge_passes(2);
        let chunker = HeaderAwareChunker::new(config);

        let orphans: Vec<Chunk> = (0..16)
            .map(|i| Chunk::new(format!("s{}", i), ChunkMetadata::new()))
            .collect();
        let (chunks, passes) = chunker.merge_orphans(orphans);

        assert_eq!(passes, 2);
        assert_eq!(chunks.len(), 4);
        assert!(chunks[0].content().starts_with("s0\n\ns1\n\ns2\n\ns3"));
    }

    #[test]
    fn test_merge_terminates_when_stable() {
        let (chunks, passes) = chunker().merge_orphans(vec![
            Chunk::new(BODY, ChunkMetadata::new()),
            Chunk::new(BODY, ChunkMetadata::new()),
        ]);

        assert_eq!(passes, 1);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_order_preserved_and_idempotent() {
        let text = format!(
            "# ARTICLE 1\n{b}\n## 1.01 A\n{b}\n## 1.02 B\n{b}\n# ARTICLE 2\n{long}",
            b = BODY,
            long = long_section(6000)
        );

        let first = chunker().chunk(&text).unwrap();
        let second = chunker().chunk(&text).unwrap();
        assert_eq!(first, second);

        let positions: Vec<usize> = ["ARTICLE 1", "1.01 A", "1.02 B", "ARTICLE 2", "4.01 Basic Rent"]
            .iter()
            .map(|needle| first.iter().position(|c| c.content().contains(needle)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_no_fabrication_without_overlap() {
        let config = ChunkerConfig::new(200).with_secondary(150, 0);
        let chunker = HeaderAwareChunker::new(config);
        let text = format!("# ARTICLE 3\n\n{}\n## 3.01 Short\nA few words only here.", long_section(3000));

        let source: Vec<&str> = text.split_whitespace().collect();
        let chunks = chunker.chunk(&text).unwrap();
        let produced: Vec<&str> = chunks.iter().flat_map(|c| c.content().split_whitespace()).collect();

        let mut cursor = source.iter();
        assert!(produced.iter().all(|w| cursor.any(|s| s == w)));
    }
}
