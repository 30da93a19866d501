//! Recursive separator-cascade splitter
//!
//! Used for the secondary split of oversized sections. Sizes are measured in
//! characters.

use std::collections::VecDeque;

use unicode_segmentation::UnicodeSegmentation;

/// Separators tried in order, coarsest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Separator {
    Paragraph,
    Line,
    Sentence,
    Word,
    Character,
}

const CASCADE: [Separator; 5] = [
    Separator::Paragraph,
    Separator::Line,
    Separator::Sentence,
    Separator::Word,
    Separator::Character,
];

impl Separator {
    fn applies(self, text: &str) -> bool {
        match self {
            Self::Paragraph => text.contains("\n\n"),
            Self::Line => text.contains('\n'),
            Self::Sentence => text.unicode_sentences().nth(1).is_some(),
            Self::Word => text.split_whitespace().nth(1).is_some(),
            Self::Character => true,
        }
    }

    fn split(self, text: &str) -> Vec<&str> {
        let pieces: Vec<&str> = match self {
            Self::Paragraph => text.split("\n\n").collect(),
            Self::Line => text.split('\n').collect(),
            Self::Sentence => text.unicode_sentences().collect(),
            Self::Word => text.split_whitespace().collect(),
            Self::Character => vec![text],
        };

        pieces.into_iter().filter(|p| !p.trim().is_empty()).collect()
    }

    /// Text placed between merged pieces
    fn joiner(self) -> &'static str {
        match self {
            Self::Paragraph => "\n\n",
            Self::Line => "\n",
            Self::Word => " ",
            Self::Sentence | Self::Character => "",
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Splits text into pieces of at most `chunk_size` characters, carrying up to
/// `overlap` characters of trailing context into the next piece.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            overlap: overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        if char_len(trimmed) <= self.chunk_size {
            return vec![trimmed.to_string()];
        }

        self.split_from(trimmed, 0)
    }

    fn split_from(&self, text: &str, level: usize) -> Vec<String> {
        let (index, separator) = CASCADE
            .iter()
            .copied()
            .enumerate()
            .skip(level)
            .find(|(_, s)| s.applies(text))
            .unwrap_or((CASCADE.len() - 1, Separator::Character));

        if separator == Separator::Character {
            return self.hard_split(text);
        }

        let mut output = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();

        for piece in separator.split(text) {
            if char_len(piece) <= self.chunk_size {
                fitting.push(piece);
                continue;
            }

            if !fitting.is_empty() {
                output.extend(self.merge(&fitting, separator.joiner()));
                fitting.clear();
            }
            output.extend(self.split_from(piece, index + 1));
        }

        if !fitting.is_empty() {
            output.extend(self.merge(&fitting, separator.joiner()));
        }

        output
    }

    /// Greedy merge of pieces that each fit, with overlap carried forward
    fn merge(&self, pieces: &[&str], joiner: &str) -> Vec<String> {
        let joiner_len = char_len(joiner);
        let mut docs = Vec::new();
        let mut window: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let sep = if window.is_empty() { 0 } else { joiner_len };

            if total + sep + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut docs, &window, joiner);

                while total > self.overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { joiner_len }
                            > self.chunk_size)
                {
                    let Some(front) = window.pop_front() else {
                        break;
                    };
                    let removed_sep = if window.is_empty() { 0 } else { joiner_len };
                    total = total.saturating_sub(char_len(front) + removed_sep);
                }
            }

            if !window.is_empty() {
                total += joiner_len;
            }
            total += len;
            window.push_back(piece);
        }

        push_joined(&mut docs, &window, joiner);
        docs
    }

    fn hard_split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.trim().chars().collect();
        chars
            .chunks(self.chunk_size)
            .map(|c| c.iter().collect::<String>())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }
}

fn push_joined(docs: &mut Vec<String>, window: &VecDeque<&str>, joiner: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(joiner);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        docs.push(trimmed.to_string());
    }
}
