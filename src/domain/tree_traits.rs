use std::fmt::Display;

use termtree::Tree;
use tracing::instrument;

use crate::domain::tree::TreeNode;

/// Conversion into a `termtree` tree for box-drawing output.
pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl<T: Display> TreeNodeConvert for TreeNode<T> {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self) -> Tree<String> {
        match self.value() {
            Some(value) => {
                let leaves: Vec<_> = self
                    .children()
                    .iter()
                    .map(|c| c.to_tree_string())
                    .collect();
                Tree::new(value.to_string()).with_leaves(leaves)
            }
            None => Tree::new("Empty tree".to_string()),
        }
    }
}
