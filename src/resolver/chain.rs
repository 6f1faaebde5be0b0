//! Chains of sub-entity names, e.g. `http://api.x.io/orders/42#customer#address`.

use std::collections::VecDeque;
use std::fmt;

/// An ordered sequence of segments: the first is usually a URL, the rest are
/// sub-entity names walked one level at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chain {
    segments: VecDeque<String>,
}

/// Splits a `#`-delimited chain string into its segments.
///
/// One leading and one trailing `#` are stripped first. An empty input yields
/// a single empty segment.
pub fn parse_chain(input: &str) -> Vec<String> {
    let trimmed = input.strip_prefix('#').unwrap_or(input);
    let trimmed = trimmed.strip_suffix('#').unwrap_or(trimmed);
    trimmed.split('#').map(str::to_owned).collect()
}

impl Chain {
    pub fn parse(input: &str) -> Self {
        Self {
            segments: parse_chain(input).into(),
        }
    }

    /// A chain starting at `root` and continuing with `tail`.
    pub fn rooted(root: impl Into<String>, tail: Chain) -> Self {
        let mut segments = tail.segments;
        segments.push_front(root.into());
        Self { segments }
    }

    /// True when there is nothing left to walk. A lone empty segment (what an
    /// empty string parses to) counts as empty.
    pub fn is_empty(&self) -> bool {
        match self.segments.len() {
            0 => true,
            1 => self.segments[0].is_empty(),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.segments.pop_front()
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.segments().collect();
        write!(f, "{}", joined.join("#"))
    }
}

impl From<&str> for Chain {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}

impl From<String> for Chain {
    fn from(input: String) -> Self {
        Self::parse(&input)
    }
}

impl From<&String> for Chain {
    fn from(input: &String) -> Self {
        Self::parse(input)
    }
}

/// Already-split sequences are taken as they are.
impl From<Vec<String>> for Chain {
    fn from(segments: Vec<String>) -> Self {
        Self {
            segments: segments.into(),
        }
    }
}

impl From<Vec<&str>> for Chain {
    fn from(segments: Vec<&str>) -> Self {
        Self {
            segments: segments.into_iter().map(str::to_owned).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strips_outer_hashes() {
        assert_eq!(parse_chain("#order#customer#"), vec!["order", "customer"]);
        assert_eq!(parse_chain("order#customer"), vec!["order", "customer"]);
        assert_eq!(parse_chain("http://api.x.io/orders/42"), vec!["http://api.x.io/orders/42"]);
    }

    #[test]
    fn test_empty_input_is_one_empty_segment() {
        assert_eq!(parse_chain(""), vec![""]);
        let chain = Chain::parse("");
        assert_eq!(chain.len(), 1);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_pre_split_sequence_is_unchanged() {
        let chain = Chain::from(vec!["#a".to_string(), "b#".to_string()]);
        assert_eq!(chain.segments().collect::<Vec<_>>(), vec!["#a", "b#"]);
    }

    #[test]
    fn test_rooted_and_display() {
        let mut chain = Chain::rooted("/orders/42", Chain::parse("customer#address"));
        assert_eq!(chain.to_string(), "/orders/42#customer#address");
        assert_eq!(chain.pop_front().as_deref(), Some("/orders/42"));
        assert!(!chain.is_empty());
        chain.pop_front();
        chain.pop_front();
        assert!(chain.is_empty());
    }
}
