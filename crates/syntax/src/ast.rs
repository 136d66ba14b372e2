use serde::{Deserialize, Serialize};

/// Zero-based row/column position in the source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            row: point.row,
            column: point.column,
        }
    }
}

/// Language-independent syntax tree node.
///
/// Mirrors a tree-sitter node but owns its data, so a tree outlives the
/// parser that produced it and can be handed to other tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericAstNode {
    /// Grammar node type (`function_declaration`, `identifier`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Source text covered by the node
    pub text: String,

    pub start_position: Position,

    pub end_position: Position,

    pub is_named: bool,

    /// Field under which the parent holds this node (`name`, `parameters`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,

    #[serde(default)]
    pub children: Vec<GenericAstNode>,
}

impl GenericAstNode {
    /// Named node without children or positions, mostly for hand-built trees.
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            start_position: Position::default(),
            end_position: Position::default(),
            is_named: true,
            field_name: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field_name = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<GenericAstNode>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.is_named = false;
        self
    }

    /// First child attached under `field`.
    pub fn child_by_field(&self, field: &str) -> Option<&GenericAstNode> {
        self.children
            .iter()
            .find(|child| child.field_name.as_deref() == Some(field))
    }

    /// Every child attached under `field`.
    pub fn children_by_field<'a>(
        &'a self,
        field: &'a str,
    ) -> impl Iterator<Item = &'a GenericAstNode> + 'a {
        self.children
            .iter()
            .filter(move |child| child.field_name.as_deref() == Some(field))
    }

    pub fn named_children(&self) -> impl Iterator<Item = &GenericAstNode> {
        self.children.iter().filter(|child| child.is_named)
    }

    /// First node under `field` anywhere in this subtree (breadth-first).
    pub fn find_field(&self, field: &str) -> Option<&GenericAstNode> {
        let mut queue: std::collections::VecDeque<&GenericAstNode> =
            self.children.iter().collect();
        while let Some(node) = queue.pop_front() {
            if node.field_name.as_deref() == Some(field) {
                return Some(node);
            }
            queue.extend(node.children.iter());
        }
        None
    }

    /// Pre-order iterator over this node and all descendants. Uses an
    /// explicit stack so arbitrarily deep trees are safe to walk.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a GenericAstNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a GenericAstNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> GenericAstNode {
        GenericAstNode::new("program", "fn a").with_children(vec![
            GenericAstNode::new("function", "fn a").with_children(vec![
                GenericAstNode::new("fn", "fn").anonymous(),
                GenericAstNode::new("identifier", "a").with_field("name"),
            ]),
            GenericAstNode::new("comment", "// x"),
        ])
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = sample();
        let kinds: Vec<&str> = tree.descendants().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds, vec!["program", "function", "fn", "identifier", "comment"]);
    }

    #[test]
    fn field_lookup() {
        let tree = sample();
        let function = &tree.children[0];
        assert_eq!(function.child_by_field("name").map(|n| n.text.as_str()), Some("a"));
        assert!(function.child_by_field("body").is_none());
        assert_eq!(tree.find_field("name").map(|n| n.text.as_str()), Some("a"));
        assert_eq!(function.named_children().count(), 1);
    }

    #[test]
    fn serializes_kind_as_type() {
        let json = serde_json::to_value(GenericAstNode::new("identifier", "x")).unwrap();
        assert_eq!(json["type"], "identifier");
        assert!(json.get("field_name").is_none());
    }
}
