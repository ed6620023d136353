use crate::extractor::blocks::{BlockKind, ClassifiedBlock};
use serde::Serialize;
use std::fmt;

/// A header paired with the payload block that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<'a> {
    pub header_block: usize,
    pub payload_block: usize,
    pub name: String,
    pub content: &'a str,
}

/// Why a block did not become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Header followed directly by another header.
    UnmatchedHeader { block: usize, name: Option<String> },
    /// Header left pending at end of input.
    TrailingHeader { block: usize, name: Option<String> },
    /// Payload with no header before it.
    OrphanData { block: usize },
    /// Header whose payload block holds only whitespace.
    EmptyPayload { block: usize, name: Option<String> },
    /// Header without a name after the marker.
    MissingName { block: usize },
}

impl SkipReason {
    pub fn block(&self) -> usize {
        match self {
            SkipReason::UnmatchedHeader { block, .. }
            | SkipReason::TrailingHeader { block, .. }
            | SkipReason::OrphanData { block }
            | SkipReason::EmptyPayload { block, .. }
            | SkipReason::MissingName { block } => *block,
        }
    }
}

fn describe_name(name: &Option<String>) -> String {
    match name {
        Some(name) => format!(" '{}'", name),
        None => String::new(),
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::UnmatchedHeader { block, name } => write!(
                f,
                "unmatched header{} at block {} (followed by another header)",
                describe_name(name),
                block
            ),
            SkipReason::TrailingHeader { block, name } => write!(
                f,
                "incomplete record: header{} at block {} has no data block",
                describe_name(name),
                block
            ),
            SkipReason::OrphanData { block } => {
                write!(f, "orphan data at block {} (no preceding header)", block)
            }
            SkipReason::EmptyPayload { block, name } => write!(
                f,
                "empty data block {} for header{}",
                block,
                describe_name(name)
            ),
            SkipReason::MissingName { block } => write!(
                f,
                "header at block {} has no name after '{}'",
                block,
                crate::extractor::blocks::PARSING_INFO_MARKER
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairEvent<'a> {
    Record(Record<'a>),
    Skipped(SkipReason),
}

struct PendingHeader {
    block: usize,
    name: Option<String>,
}

/// Pairs classified blocks into records, one pending header at a time.
pub struct Pairer<I> {
    blocks: I,
    pending: Option<PendingHeader>,
    finished: bool,
}

impl<'a, I> Pairer<I>
where
    I: Iterator<Item = ClassifiedBlock<'a>>,
{
    pub fn new(blocks: I) -> Self {
        Self {
            blocks,
            pending: None,
            finished: false,
        }
    }
}

impl<'a, I> Iterator for Pairer<I>
where
    I: Iterator<Item = ClassifiedBlock<'a>>,
{
    type Item = PairEvent<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let Some(block) = self.blocks.next() else {
                self.finished = true;
                return self.pending.take().map(|header| {
                    PairEvent::Skipped(SkipReason::TrailingHeader {
                        block: header.block,
                        name: header.name,
                    })
                });
            };

            match block.kind {
                BlockKind::Header { name } => {
                    let previous = self.pending.replace(PendingHeader {
                        block: block.number,
                        name,
                    });
                    if let Some(header) = previous {
                        return Some(PairEvent::Skipped(SkipReason::UnmatchedHeader {
                            block: header.block,
                            name: header.name,
                        }));
                    }
                }
                BlockKind::Payload { content } => {
                    let Some(header) = self.pending.take() else {
                        return Some(PairEvent::Skipped(SkipReason::OrphanData {
                            block: block.number,
                        }));
                    };

                    let content = content.trim();
                    let event = if content.is_empty() {
                        PairEvent::Skipped(SkipReason::EmptyPayload {
                            block: block.number,
                            name: header.name,
                        })
                    } else {
                        match header.name {
                            Some(name) => PairEvent::Record(Record {
                                header_block: header.block,
                                payload_block: block.number,
                                name,
                                content,
                            }),
                            None => PairEvent::Skipped(SkipReason::MissingName {
                                block: header.block,
                            }),
                        }
                    };
                    return Some(event);
                }
            }
        }
    }
}

pub fn pair<'a, I>(blocks: I) -> Pairer<I::IntoIter>
where
    I: IntoIterator<Item = ClassifiedBlock<'a>>,
{
    Pairer::new(blocks.into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(number: usize, name: &str) -> ClassifiedBlock<'static> {
        ClassifiedBlock {
            number,
            kind: BlockKind::Header {
                name: if name.is_empty() { None } else { Some(name.to_string()) },
            },
        }
    }

    fn payload(number: usize, content: &'static str) -> ClassifiedBlock<'static> {
        ClassifiedBlock {
            number,
            kind: BlockKind::Payload { content },
        }
    }

    #[test]
    fn test_header_then_payload_is_a_record() {
        let events: Vec<_> = pair(vec![header(1, "a.txt"), payload(2, "hello")]).collect();
        assert_eq!(
            events,
            vec![PairEvent::Record(Record {
                header_block: 1,
                payload_block: 2,
                name: "a.txt".to_string(),
                content: "hello",
            })]
        );
    }

    #[test]
    fn test_header_followed_by_header_skips_first() {
        let events: Vec<_> =
            pair(vec![header(1, "a"), header(2, "b"), payload(3, "data")]).collect();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            PairEvent::Skipped(SkipReason::UnmatchedHeader {
                block: 1,
                name: Some("a".to_string()),
            })
        );
        assert!(matches!(&events[1], PairEvent::Record(r) if r.name == "b"));
    }

    #[test]
    fn test_trailing_header_is_skipped() {
        let events: Vec<_> = pair(vec![header(1, "a"), payload(2, "x"), header(3, "b")]).collect();
        assert_eq!(
            events.last(),
            Some(&PairEvent::Skipped(SkipReason::TrailingHeader {
                block: 3,
                name: Some("b".to_string()),
            }))
        );
    }

    #[test]
    fn test_orphan_payloads_are_skipped() {
        let events: Vec<_> =
            pair(vec![payload(1, "lost"), header(2, "a"), payload(3, "x"), payload(4, "extra")])
                .collect();
        assert_eq!(events[0], PairEvent::Skipped(SkipReason::OrphanData { block: 1 }));
        assert!(matches!(events[1], PairEvent::Record(_)));
        assert_eq!(events[2], PairEvent::Skipped(SkipReason::OrphanData { block: 4 }));
    }

    #[test]
    fn test_empty_payload_clears_pending_header() {
        let blocks = vec![header(1, "a"), payload(2, "  \n "), payload(3, "x")];
        let events: Vec<_> = pair(blocks).collect();
        assert_eq!(
            events,
            vec![
                PairEvent::Skipped(SkipReason::EmptyPayload {
                    block: 2,
                    name: Some("a".to_string()),
                }),
                PairEvent::Skipped(SkipReason::OrphanData { block: 3 }),
            ]
        );
    }

    #[test]
    fn test_nameless_header_consumes_its_payload() {
        let events: Vec<_> = pair(vec![header(1, ""), payload(2, "data")]).collect();
        assert_eq!(events, vec![PairEvent::Skipped(SkipReason::MissingName { block: 1 })]);
    }

    #[test]
    fn test_no_blocks_no_events() {
        assert_eq!(pair(Vec::<ClassifiedBlock>::new()).count(), 0);
    }

    #[test]
    fn test_skip_reason_display() {
        let reason = SkipReason::UnmatchedHeader {
            block: 7,
            name: None,
        };
        assert_eq!(
            reason.to_string(),
            "unmatched header at block 7 (followed by another header)"
        );
        assert_eq!(reason.block(), 7);
        assert!(SkipReason::MissingName { block: 2 }
            .to_string()
            .contains("Parsing Info:"));
    }
}
