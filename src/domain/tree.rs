//! Generic N-ary tree with append-only insertion.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};

/// A recursive tree whose nodes exclusively own their children.
///
/// A node without a value is the empty tree and never has children.
/// Children always carry a value, and insertion only ever appends, so the
/// order of existing children is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode<T> {
    value: Option<T>,
    children: Vec<TreeNode<T>>,
}

impl<T> Default for TreeNode<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> TreeNode<T> {
    /// The empty tree.
    pub fn empty() -> Self {
        Self {
            value: None,
            children: Vec::new(),
        }
    }

    /// A single node holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// A node with the given children.
    ///
    /// Fails with [`DomainError::EmptyTree`] if any child is empty.
    pub fn with_children(value: T, children: Vec<TreeNode<T>>) -> DomainResult<Self> {
        if children.iter().any(TreeNode::is_empty) {
            return Err(DomainError::EmptyTree);
        }
        Ok(Self {
            value: Some(value),
            children,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn children(&self) -> &[TreeNode<T>] {
        &self.children
    }

    /// Number of nodes carrying a value.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        1 + self.children.iter().map(TreeNode::len).sum::<usize>()
    }

    /// Number of levels; 0 for the empty tree.
    pub fn depth(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        1 + self
            .children
            .iter()
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Values of all childless nodes, left to right.
    pub fn leaves(&self) -> Vec<&T> {
        self.iter().filter(|node| node.is_leaf()).filter_map(TreeNode::value).collect()
    }

    /// Pre-order iterator over all non-empty nodes.
    pub fn iter(&self) -> TreeIter<'_, T> {
        TreeIter::new(self)
    }
}

impl<T: PartialEq> TreeNode<T> {
    /// Whether `item` is stored in this node or any descendant.
    pub fn contains(&self, item: &T) -> bool {
        match &self.value {
            None => false,
            Some(value) if value == item => true,
            Some(_) => self.children.iter().any(|child| child.contains(item)),
        }
    }

    /// Position of the leftmost child holding `item`.
    fn index_child(&self, item: &T) -> Option<usize> {
        self.children
            .iter()
            .position(|child| child.value.as_ref() == Some(item))
    }

    /// Insert `items` as a chain of descendants.
    ///
    /// `items[0]` becomes a child of this node, `items[1]` a child of that,
    /// and so on. At every level the leftmost child already holding the item
    /// is reused; otherwise a new child is appended. Empty `items` is a no-op.
    ///
    /// ```
    /// use covtree::domain::TreeNode;
    ///
    /// let mut tree = TreeNode::new(111);
    /// tree.insert_sequence([1, 2, 3]).unwrap();
    /// tree.insert_sequence([1, 3, 5]).unwrap();
    /// assert_eq!(tree.render(), "111\n  1\n    2\n      3\n    3\n      5");
    /// ```
    pub fn insert_sequence<I>(&mut self, items: I) -> DomainResult<()>
    where
        I: IntoIterator<Item = T>,
    {
        let mut items = items.into_iter().peekable();
        if items.peek().is_none() {
            return Ok(());
        }
        if self.is_empty() {
            return Err(DomainError::EmptyTree);
        }

        let mut node = self;
        for item in items {
            let idx = match node.index_child(&item) {
                Some(idx) => idx,
                None => {
                    node.children.push(TreeNode::new(item));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        Ok(())
    }
}

impl<T: fmt::Display> TreeNode<T> {
    /// Indented rendering, parents before children, two spaces per level.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_indented(0, &mut out);
        out.truncate(out.trim_end().len());
        out
    }

    fn render_indented(&self, depth: usize, out: &mut String) {
        if let Some(value) = &self.value {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&value.to_string());
            out.push('\n');
            for child in &self.children {
                child.render_indented(depth + 1, out);
            }
        }
    }
}

impl<T: Serialize> TreeNode<T> {
    /// One-line form `Node(value, [child, ...])`.
    ///
    /// Values are written as JSON, so strings are quoted and escaped and
    /// the form is lossless. A value JSON cannot represent is written as `null`.
    pub fn to_debug_string(&self) -> String {
        match &self.value {
            None => String::new(),
            Some(value) => {
                let encoded = serde_json::to_string(value).unwrap_or_else(|_| "null".to_string());
                let children: Vec<String> =
                    self.children.iter().map(TreeNode::to_debug_string).collect();
                format!("Node({}, [{}])", encoded, children.join(", "))
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for TreeNode<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl<T: DeserializeOwned> TreeNode<T> {
    /// Rebuild a tree from the output of [`TreeNode::to_debug_string`].
    #[instrument(level = "trace")]
    pub fn from_debug_str(s: &str) -> DomainResult<Self> {
        if s.trim().is_empty() {
            return Ok(Self::empty());
        }
        let mut parser = DebugParser { src: s, pos: 0 };
        let tree = parser.node()?;
        if parser.pos != s.len() {
            return Err(parser.error("trailing input"));
        }
        Ok(tree)
    }
}

struct DebugParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> DebugParser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> DomainResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", token)))
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomainError {
        DomainError::MalformedTree {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn node<T: DeserializeOwned>(&mut self) -> DomainResult<TreeNode<T>> {
        self.expect("Node(")?;
        let mut values = serde_json::Deserializer::from_str(self.rest()).into_iter::<T>();
        let value = match values.next() {
            Some(Ok(value)) => value,
            Some(Err(e)) => return Err(self.error(format!("unparsable value: {}", e))),
            None => return Err(self.error("missing value")),
        };
        let consumed = values.byte_offset();
        self.pos += consumed;
        self.expect(", [")?;

        let mut children = Vec::new();
        if !self.eat("]") {
            loop {
                children.push(self.node()?);
                if self.eat(", ") {
                    continue;
                }
                self.expect("]")?;
                break;
            }
        }
        self.expect(")")?;

        Ok(TreeNode {
            value: Some(value),
            children,
        })
    }
}

/// Pre-order traversal, left to right.
pub struct TreeIter<'a, T> {
    stack: Vec<&'a TreeNode<T>>,
}

impl<'a, T> TreeIter<'a, T> {
    fn new(root: &'a TreeNode<T>) -> Self {
        let mut stack = Vec::new();
        if !root.is_empty() {
            stack.push(root);
        }
        Self { stack }
    }
}

impl<'a, T> Iterator for TreeIter<'a, T> {
    type Item = &'a TreeNode<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        // Reverse so the leftmost child is visited first
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
