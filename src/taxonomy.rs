//! Category tree and flat tag lists.
//!
//! WordPress attachment categories are hierarchical; the user types them as
//! paths (`Shop > Shoes > Running`). Tags are flat.
//!
//! ## Category tree
//!
//! [`CategoryTree`] is an arena: nodes live in a `Vec` and refer to their
//! parent and children by [`NodeId`]. Inserting a path walks level by level,
//! reusing a same-named sibling when one exists and appending a new child
//! otherwise, so inserting `Shop > Shoes` twice leaves one `Shop` with one
//! `Shoes`. Removing a node frees its whole subtree; freed slots are reused
//! by later inserts.
//!
//! On disk the tree is the nested shape the settings have always used:
//!
//! ```json
//! [{ "name": "Shop", "children": [{ "name": "Shoes" }] }]
//! ```
//!
//! ## Tag lists
//!
//! [`TagList`] is an insertion-ordered set of strings with add-if-absent /
//! remove-by-value semantics. It backs both the global tag vocabulary and
//! the WordPress tag list in [`TagSettings`].

use serde::{Deserialize, Serialize};

/// Separator between category path segments.
///
/// The spaces are part of it: `A>B` is one category name.
pub const PATH_SEPARATOR: &str = " > ";

/// Split a category path into trimmed, non-empty segments.
///
/// - `"Shop > Shoes"` → `["Shop", "Shoes"]`
/// - `" Shop >   Shoes "` → `["Shop", "Shoes"]`
/// - `"Shop >  > Shoes"` → `["Shop", "Shoes"]`
/// - `"Shop>Shoes"` → `["Shop>Shoes"]`
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Join segments back into the display form (`A > B`).
pub fn join_path<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(PATH_SEPARATOR)
}

// ============================================================================
// Tag list
// ============================================================================

/// Insertion-ordered set of unique tag strings.
///
/// Stored lists go through [`TagList::add`] on load, so duplicates and blank
/// entries in a hand-edited file are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TagList(Vec<String>);

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag if it is not already present. Input is trimmed; blank input
    /// is ignored. Returns `true` when the list changed.
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    /// Remove a tag by value. Returns `true` when the list changed.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    /// Add every tag from `tags`, keeping existing order. Returns how many were new.
    pub fn merge<'a>(&mut self, tags: impl IntoIterator<Item = &'a str>) -> usize {
        tags.into_iter().filter(|t| self.add(t)).count()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = TagList::new();
        for tag in iter {
            list.add(tag.as_ref());
        }
        list
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<TagList> for Vec<String> {
    fn from(list: TagList) -> Self {
        list.0
    }
}

// ============================================================================
// Category tree
// ============================================================================

/// Index of a node inside a [`CategoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct Slot {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Nested serialized form of a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryNode>,
}

/// Forest of named categories stored as an index arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<CategoryNode>", into = "Vec<CategoryNode>")]
pub struct CategoryTree {
    slots: Vec<Option<Slot>>,
    roots: Vec<NodeId>,
    free: Vec<usize>,
}

impl CategoryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a `A > B > C` path, creating missing levels.
    ///
    /// Returns the id of the last segment, or `None` when the path has no
    /// segments. Inserting an existing path changes nothing.
    pub fn insert_path(&mut self, path: &str) -> Option<NodeId> {
        let mut parent: Option<NodeId> = None;
        for segment in split_path(path) {
            let existing = self.child_named(parent, segment);
            let id = match existing {
                Some(id) => id,
                None => self.push_node(parent, segment),
            };
            parent = Some(id);
        }
        parent
    }

    /// Remove the node a path points at, with its whole subtree.
    ///
    /// A single-segment path removes a top-level node; longer paths locate
    /// the parent by the prefix and remove the matching child. Returns `false`
    /// (and changes nothing) when any segment is missing.
    pub fn remove_path(&mut self, path: &str) -> bool {
        match self.find(path) {
            Some(id) => {
                self.remove_node(id);
                true
            }
            None => false,
        }
    }

    /// Look up the node for a path.
    pub fn find(&self, path: &str) -> Option<NodeId> {
        let segments = split_path(path);
        if segments.is_empty() {
            return None;
        }
        let mut parent: Option<NodeId> = None;
        for segment in segments {
            parent = Some(self.child_named(parent, segment)?);
        }
        parent
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.slot(id).map(|s| s.name.as_str())
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Full display path of a node (`Shop > Shoes`).
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.slot(current) {
                Some(slot) => {
                    segments.push(slot.name.as_str());
                    cursor = slot.parent;
                }
                None => break,
            }
        }
        segments.reverse();
        join_path(&segments)
    }

    /// Every node as `(depth, id)` in depth-first, sibling order.
    pub fn walk(&self) -> Vec<(usize, NodeId)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, NodeId)> = self.roots.iter().rev().map(|&id| (0, id)).collect();
        while let Some((depth, id)) = stack.pop() {
            out.push((depth, id));
            for &child in self.children(id).iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// Convert to the nested serialized form.
    pub fn to_nodes(&self) -> Vec<CategoryNode> {
        self.roots.iter().map(|&id| self.to_node(id)).collect()
    }

    fn to_node(&self, id: NodeId) -> CategoryNode {
        CategoryNode {
            name: self.name(id).unwrap_or_default().to_string(),
            children: self.children(id).iter().map(|&c| self.to_node(c)).collect(),
        }
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn siblings(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            Some(p) => self.children(p),
            None => &self.roots,
        }
    }

    fn child_named(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        self.siblings(parent)
            .iter()
            .copied()
            .find(|&id| self.name(id) == Some(name))
    }

    fn push_node(&mut self, parent: Option<NodeId>, name: &str) -> NodeId {
        let slot = Slot {
            name: name.to_string(),
            parent,
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                NodeId(index)
            }
            None => {
                self.slots.push(Some(slot));
                NodeId(self.slots.len() - 1)
            }
        };
        match parent {
            Some(p) => {
                if let Some(Some(parent_slot)) = self.slots.get_mut(p.0) {
                    parent_slot.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        id
    }

    fn remove_node(&mut self, id: NodeId) {
        let parent = self.parent(id);
        match parent {
            Some(p) => {
                if let Some(Some(parent_slot)) = self.slots.get_mut(p.0) {
                    parent_slot.children.retain(|&c| c != id);
                }
            }
            None => self.roots.retain(|&r| r != id),
        }

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(slot) = self.slots.get_mut(current.0).and_then(Option::take) {
                pending.extend(slot.children);
                self.free.push(current.0);
            }
        }
    }
}

impl From<Vec<CategoryNode>> for CategoryTree {
    fn from(nodes: Vec<CategoryNode>) -> Self {
        fn graft(tree: &mut CategoryTree, parent: Option<NodeId>, node: &CategoryNode) {
            let name = node.name.trim();
            if name.is_empty() {
                return;
            }
            let id = match tree.child_named(parent, name) {
                Some(id) => id,
                None => tree.push_node(parent, name),
            };
            for child in &node.children {
                graft(tree, Some(id), child);
            }
        }

        let mut tree = CategoryTree::new();
        for node in &nodes {
            graft(&mut tree, None, node);
        }
        tree
    }
}

impl From<CategoryTree> for Vec<CategoryNode> {
    fn from(tree: CategoryTree) -> Self {
        tree.to_nodes()
    }
}

// ============================================================================
// Tag settings
// ============================================================================

/// WordPress attachment categories and tags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSettings {
    pub categories: CategoryTree,
    pub tags: TagList,
}

impl TagSettings {
    /// Seed from a legacy flat tag list (no categories).
    pub fn from_legacy(tags: &TagList) -> Self {
        Self {
            categories: CategoryTree::new(),
            tags: tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(tree: &CategoryTree) -> Vec<String> {
        tree.walk().into_iter().map(|(_, id)| tree.path_of(id)).collect()
    }

    // =========================================================================
    // Path parsing
    // =========================================================================

    #[test]
    fn split_path_trims_and_drops_empty_segments() {
        assert_eq!(split_path("Shop > Shoes"), vec!["Shop", "Shoes"]);
        assert_eq!(split_path("  Shop >   Shoes "), vec!["Shop", "Shoes"]);
        assert_eq!(split_path("Shop >  > Shoes"), vec!["Shop", "Shoes"]);
        assert!(split_path("   ").is_empty());
    }

    #[test]
    fn separator_needs_surrounding_spaces() {
        assert_eq!(split_path("A>B"), vec!["A>B"]);
        assert_eq!(split_path("A >B"), vec!["A >B"]);

        let mut tree = CategoryTree::new();
        let id = tree.insert_path("Sizes > 10>20 cm").unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.name(id), Some("10>20 cm"));
        assert_eq!(tree.path_of(id), "Sizes > 10>20 cm");
    }

    // =========================================================================
    // Insert
    // =========================================================================

    #[test]
    fn insert_same_path_twice_does_not_duplicate() {
        let mut tree = CategoryTree::new();
        let first = tree.insert_path("Shop > Shoes");
        let second = tree.insert_path("Shop > Shoes");

        assert_eq!(first, second);
        assert_eq!(tree.roots().len(), 1);
        let shop = tree.roots()[0];
        assert_eq!(tree.name(shop), Some("Shop"));
        assert_eq!(tree.children(shop).len(), 1);
        assert_eq!(tree.name(tree.children(shop)[0]), Some("Shoes"));
    }

    #[test]
    fn insert_reuses_shared_prefix() {
        let mut tree = CategoryTree::new();
        tree.insert_path("Shop > Shoes");
        tree.insert_path("Shop > Hats");
        tree.insert_path("Blog");

        assert_eq!(paths(&tree), vec!["Shop", "Shop > Shoes", "Shop > Hats", "Blog"]);
    }

    #[test]
    fn insert_empty_path_is_noop() {
        let mut tree = CategoryTree::new();
        assert_eq!(tree.insert_path(" > "), None);
        assert!(tree.is_empty());
    }

    // =========================================================================
    // Remove
    // =========================================================================

    #[test]
    fn remove_top_level_node() {
        let mut tree = CategoryTree::new();
        tree.insert_path("Shop > Shoes");
        tree.insert_path("Blog");

        assert!(tree.remove_path("Shop"));
        assert_eq!(paths(&tree), vec!["Blog"]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn remove_nested_node_keeps_parent() {
        let mut tree = CategoryTree::new();
        tree.insert_path("Shop > Shoes");
        tree.insert_path("Shop > Hats");

        assert!(tree.remove_path("Shop > Shoes"));
        assert_eq!(paths(&tree), vec!["Shop", "Shop > Hats"]);
    }

    #[test]
    fn remove_missing_segment_is_noop() {
        let mut tree = CategoryTree::new();
        tree.insert_path("Shop > Shoes");

        assert!(!tree.remove_path("Shop > Hats"));
        assert!(!tree.remove_path("Nope > Shoes"));
        assert!(!tree.remove_path(""));
        assert_eq!(paths(&tree), vec!["Shop", "Shop > Shoes"]);
    }

    #[test]
    fn removed_slots_are_reused() {
        let mut tree = CategoryTree::new();
        tree.insert_path("A > B > C");
        tree.remove_path("A");
        assert_eq!(tree.len(), 0);

        tree.insert_path("X > Y");
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.slots.len(), 3);
        assert_eq!(paths(&tree), vec!["X", "X > Y"]);
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    #[test]
    fn tree_serializes_as_nested_nodes() {
        let mut tree = CategoryTree::new();
        tree.insert_path("Shop > Shoes");

        let json = serde_json::to_string(&tree).unwrap();
        assert_eq!(json, r#"[{"name":"Shop","children":[{"name":"Shoes"}]}]"#);
    }

    #[test]
    fn tree_deserializes_and_merges_duplicate_names() {
        let json = r#"[
            {"name": "Shop", "children": [{"name": "Shoes", "children": []}]},
            {"name": "Shop", "children": [{"name": "Hats"}]}
        ]"#;
        let tree: CategoryTree = serde_json::from_str(json).unwrap();
        assert_eq!(paths(&tree), vec!["Shop", "Shop > Shoes", "Shop > Hats"]);
    }

    // =========================================================================
    // Tag list
    // =========================================================================

    #[test]
    fn tag_list_add_if_absent() {
        let mut tags = TagList::new();
        assert!(tags.add("Hero"));
        assert!(!tags.add("Hero"));
        assert!(!tags.add("  "));
        assert!(tags.add(" Banner "));
        assert_eq!(tags.as_slice(), &["Hero".to_string(), "Banner".to_string()]);
    }

    #[test]
    fn removing_absent_tag_leaves_list_unchanged() {
        let mut tags: TagList = ["Mobile", "Desktop"].into_iter().collect();
        let before = tags.clone();
        assert!(!tags.remove("Print"));
        assert_eq!(tags, before);
    }

    #[test]
    fn tag_list_merge_counts_new_tags() {
        let mut tags: TagList = ["a"].into_iter().collect();
        assert_eq!(tags.merge(["a", "b", "c"]), 2);
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn stored_tag_list_is_trimmed_and_deduplicated_on_load() {
        let tags: TagList = serde_json::from_str(r#"["a", "a", " b ", "", "b"]"#).unwrap();
        assert_eq!(tags.as_slice(), &["a".to_string(), "b".to_string()]);
        assert_eq!(serde_json::to_string(&tags).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn tag_settings_from_legacy_copies_tags() {
        let legacy: TagList = ["Mobile", "Banner"].into_iter().collect();
        let settings = TagSettings::from_legacy(&legacy);
        assert_eq!(settings.tags, legacy);
        assert!(settings.categories.is_empty());
    }
}
