use regex::Regex;
use std::sync::OnceLock;

/// Line that separates two blocks in a record dump.
pub const BLOCK_SEPARATOR: &str = "---------------------------";

/// Marker that turns a block into a header.
pub const PARSING_INFO_MARKER: &str = "Parsing Info:";

/// A run of text between two separator lines, trimmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// 1-based position among the non-empty blocks of the source.
    pub number: usize,
    pub text: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind<'a> {
    /// Metadata block. `name` is `None` when the marker line carries nothing.
    Header { name: Option<String> },
    Payload { content: &'a str },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedBlock<'a> {
    pub number: usize,
    pub kind: BlockKind<'a>,
}

/// Single-pass iterator over the non-empty blocks of a source text.
pub struct Blocks<'a> {
    rest: Option<&'a str>,
    emitted: usize,
}

impl<'a> Blocks<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: Some(text),
            emitted: 0,
        }
    }

    // Returns the raw text up to the next separator line and advances past it.
    fn next_raw(&mut self) -> Option<&'a str> {
        let text = self.rest?;
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            if is_separator(line) {
                self.rest = Some(&text[offset + line.len()..]);
                return Some(&text[..offset]);
            }
            offset += line.len();
        }

        self.rest = None;
        Some(text)
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = Block<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let raw = self.next_raw()?;
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }

            self.emitted += 1;
            return Some(Block {
                number: self.emitted,
                text: trimmed,
            });
        }
    }
}

/// Splits `text` on separator lines, skipping whitespace-only blocks.
pub fn split_blocks(text: &str) -> Blocks<'_> {
    Blocks::new(text)
}

fn is_separator(line: &str) -> bool {
    line.trim_end() == BLOCK_SEPARATOR
}

fn marker_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(r"(?i)^\s*{}(.*)$", regex::escape(PARSING_INFO_MARKER));
        Regex::new(&pattern).expect("marker pattern is a valid regex")
    })
}

/// Returns the candidate name of the first marker line, `Some("")` when
/// the marker is present without a name, `None` when there is no marker.
pub fn find_candidate_name(text: &str) -> Option<&str> {
    let pattern = marker_pattern();
    text.lines().find_map(|line| {
        pattern
            .captures(line)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().trim())
    })
}

pub fn classify(block: Block<'_>) -> ClassifiedBlock<'_> {
    let kind = match find_candidate_name(block.text) {
        Some(candidate) if candidate.is_empty() => BlockKind::Header { name: None },
        Some(candidate) => BlockKind::Header {
            name: Some(candidate.to_string()),
        },
        None => BlockKind::Payload {
            content: block.text,
        },
    };

    ClassifiedBlock {
        number: block.number,
        kind,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<&str> {
        split_blocks(input).map(|b| b.text).collect()
    }

    #[test]
    fn test_split_on_separator_lines() {
        let input = format!("one\n{sep}\ntwo\nlines\n{sep}\nthree", sep = BLOCK_SEPARATOR);
        assert_eq!(texts(&input), vec!["one", "two\nlines", "three"]);
    }

    #[test]
    fn test_blank_blocks_are_dropped_and_numbering_skips_them() {
        let input = format!(
            "\n\n{sep}\nfirst\n{sep}\n   \n{sep}\nsecond\n{sep}\n",
            sep = BLOCK_SEPARATOR
        );
        let blocks: Vec<_> = split_blocks(&input).collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0], Block { number: 1, text: "first" });
        assert_eq!(blocks[1], Block { number: 2, text: "second" });
    }

    #[test]
    fn test_crlf_separators() {
        let input = format!("a\r\n{sep}\r\nb\r\n", sep = BLOCK_SEPARATOR);
        assert_eq!(texts(&input), vec!["a", "b"]);
    }

    #[test]
    fn test_dashes_inside_a_line_do_not_split() {
        let input = format!("keep {sep} inline\n", sep = BLOCK_SEPARATOR);
        assert_eq!(texts(&input), vec![input.trim()]);
    }

    #[test]
    fn test_empty_input_has_no_blocks() {
        assert!(texts("").is_empty());
        assert!(texts("  \n\t\n").is_empty());
        assert!(texts(BLOCK_SEPARATOR).is_empty());
    }

    #[test]
    fn test_find_candidate_name() {
        assert_eq!(find_candidate_name("Parsing Info:  site.txt  "), Some("site.txt"));
        assert_eq!(find_candidate_name("junk\n  parsing info: Mixed Case"), Some("Mixed Case"));
        assert_eq!(find_candidate_name("Parsing Info:"), Some(""));
        assert_eq!(find_candidate_name("no marker here"), None);
        assert_eq!(find_candidate_name("prefix Parsing Info: x"), None);
    }

    #[test]
    fn test_first_marker_line_wins() {
        let text = "Parsing Info: first\nParsing Info: second";
        assert_eq!(find_candidate_name(text), Some("first"));
    }

    #[test]
    fn test_classify() {
        let header = classify(Block { number: 3, text: "Host: x\nParsing Info: a.txt" });
        assert_eq!(header.number, 3);
        assert_eq!(header.kind, BlockKind::Header { name: Some("a.txt".to_string()) });

        let nameless = classify(Block { number: 4, text: "PARSING INFO:   " });
        assert_eq!(nameless.kind, BlockKind::Header { name: None });

        let payload = classify(Block { number: 5, text: "cookie=1" });
        assert_eq!(payload.kind, BlockKind::Payload { content: "cookie=1" });
    }
}
