use std::collections::HashMap;

use canvas_types::OutlineNode;

/// Nodes from `root` to the node with `target_id`, both inclusive.
pub fn find_path<'a>(root: &'a OutlineNode, target_id: &str) -> Option<Vec<&'a OutlineNode>> {
    let mut path = Vec::new();
    if descend(root, target_id, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn descend<'a>(node: &'a OutlineNode, target_id: &str, path: &mut Vec<&'a OutlineNode>) -> bool {
    path.push(node);
    if node.id == target_id {
        return true;
    }
    for child in node.children() {
        if descend(child, target_id, path) {
            return true;
        }
    }
    path.pop();
    false
}

pub fn find_node<'a>(root: &'a OutlineNode, target_id: &str) -> Option<&'a OutlineNode> {
    if root.id == target_id {
        return Some(root);
    }
    root.children().find_map(|child| find_node(child, target_id))
}

pub fn contains_node(root: &OutlineNode, target_id: &str) -> bool {
    find_node(root, target_id).is_some()
}

/// Deepest node whose subtree holds every target found under `root`.
///
/// Paths are compared index by index from the root up to the end of the shortest one, so a
/// target that is an ancestor of another target is itself the answer. Ids missing from the
/// tree are ignored; `None` when no target is found.
pub fn minimal_common_ancestor<'a, S: AsRef<str>>(
    root: &'a OutlineNode,
    target_ids: &[S],
) -> Option<&'a OutlineNode> {
    let paths = target_ids
        .iter()
        .filter_map(|id| find_path(root, id.as_ref()))
        .collect::<Vec<_>>();
    let (first, rest) = paths.split_first()?;
    if rest.is_empty() {
        return first.last().copied();
    }

    let shortest = paths.iter().map(Vec::len).min().unwrap_or(0);
    let mut ancestor = None;
    for depth in 0..shortest {
        let candidate = first[depth];
        if rest.iter().all(|path| path[depth].id == candidate.id) {
            ancestor = Some(candidate);
        } else {
            break;
        }
    }
    ancestor
}

/// Id to title of every titled node under `root`.
pub fn collect_titles(root: &OutlineNode) -> HashMap<String, String> {
    let mut titles = HashMap::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if !node.title.is_empty() {
            titles.insert(node.id.clone(), node.title.clone());
        }
        stack.extend(node.children());
    }
    titles
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_types::Slot;

    // root -> A -> {B, C}; B -> D
    fn tree() -> OutlineNode {
        let b = OutlineNode::new("B", "b").with_slot(Slot::new("s").with_child(OutlineNode::new("D", "d")));
        let a = OutlineNode::new("A", "a").with_slot(
            Slot::new("content")
                .with_child(b)
                .with_child(OutlineNode::new("C", "c")),
        );
        OutlineNode::new("root", "").with_slot(Slot::new("_rootSlot_").with_child(a))
    }

    fn ids(path: &[&OutlineNode]) -> Vec<String> {
        path.iter().map(|n| n.id.clone()).collect()
    }

    #[test]
    fn path_is_root_to_target_inclusive() {
        let root = tree();
        assert_eq!(ids(&find_path(&root, "D").expect("path")), vec!["root", "A", "B", "D"]);
        assert_eq!(ids(&find_path(&root, "root").expect("path")), vec!["root"]);
        assert!(find_path(&root, "Z").is_none());
    }

    #[test]
    fn siblings_meet_at_parent() {
        let root = tree();
        assert_eq!(minimal_common_ancestor(&root, &["B", "C"]).map(|n| n.id.as_str()), Some("A"));
        assert_eq!(minimal_common_ancestor(&root, &["D", "C"]).map(|n| n.id.as_str()), Some("A"));
    }

    #[test]
    fn single_target_is_its_own_ancestor() {
        let root = tree();
        assert_eq!(minimal_common_ancestor(&root, &["B"]).map(|n| n.id.as_str()), Some("B"));
    }

    #[test]
    fn ancestor_target_short_circuits() {
        let root = tree();
        assert_eq!(minimal_common_ancestor(&root, &["A", "D"]).map(|n| n.id.as_str()), Some("A"));
        assert_eq!(minimal_common_ancestor(&root, &["D", "B"]).map(|n| n.id.as_str()), Some("B"));
    }

    #[test]
    fn missing_targets_are_ignored() {
        let root = tree();
        assert_eq!(minimal_common_ancestor(&root, &["C", "Z"]).map(|n| n.id.as_str()), Some("C"));
        assert!(minimal_common_ancestor(&root, &["Y", "Z"]).is_none());
        assert!(minimal_common_ancestor::<&str>(&root, &[]).is_none());
    }

    #[test]
    fn titles_skip_untitled_nodes() {
        let titles = collect_titles(&tree());
        assert_eq!(titles.get("D").map(String::as_str), Some("d"));
        assert!(!titles.contains_key("root"));
    }
}
