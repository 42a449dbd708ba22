//! Case-insensitive prefix tree used for keyword recognition and lexer diagnostics.
use std::collections::BTreeMap;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct Node {
    children: BTreeMap<char, NodeId>,
    is_terminal: bool,
}

/// Prefix tree over lower-cased strings.
///
/// Nodes live in a single arena and refer to their children by index,
/// the root node is always the first one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    /// Constructs an empty trie.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }

    /// Constructs a trie which contains all provided `strings`.
    pub fn from_strings<'a>(strings: impl IntoIterator<Item = &'a str>) -> Self {
        let mut trie = Self::new();
        for string in strings {
            trie.add(string);
        }
        trie
    }

    /// Inserts `string` (case-insensitively), creating all missing nodes on its path.
    pub fn add(&mut self, string: &str) {
        let mut current = ROOT;
        for c in string.chars().flat_map(char::to_lowercase) {
            current = match self.nodes[current].children.get(&c) {
                Some(&next) => next,
                None => {
                    let next = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[current].children.insert(c, next);
                    next
                }
            };
        }
        self.nodes[current].is_terminal = true;
    }

    /// Returns `true` if exactly this `string` was added to the trie.
    pub fn contains(&self, string: &str) -> bool {
        self.walk(string).is_some_and(|node| self.nodes[node].is_terminal)
    }

    /// Returns `true` if `string` is a prefix of at least one added string.
    pub fn contains_prefix(&self, string: &str) -> bool {
        self.walk(string).is_some()
    }

    /// Returns sorted characters which may follow `string`,
    /// or nothing if `string` isn't a prefix at all.
    pub fn chars_after(&self, string: &str) -> Vec<char> {
        self.walk(string)
            .map(|node| self.nodes[node].children.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Returns the longest (lower-cased) prefix of `string` which is a path in the trie.
    pub fn max_match_for(&self, string: &str) -> String {
        let mut buffer = String::new();
        let mut current = ROOT;
        for c in string.chars().flat_map(char::to_lowercase) {
            match self.nodes[current].children.get(&c) {
                Some(&next) => {
                    buffer.push(c);
                    current = next;
                }
                None => break,
            }
        }
        buffer
    }

    fn walk(&self, string: &str) -> Option<NodeId> {
        string
            .chars()
            .flat_map(char::to_lowercase)
            .try_fold(ROOT, |node, c| self.nodes[node].children.get(&c).copied())
    }
}

impl<'a> FromIterator<&'a str> for Trie {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self::from_strings(iter)
    }
}
