use canvas_types::{FocusInfo, FocusKind, OutlineNode, PageInfo};

use crate::tree::contains_node;

const FOCUS_MARKER: &str = " [focused]";

/// Page tree as a markdown list, marking the focused page.
pub fn render_page_index(pages: &[PageInfo], focused_page: Option<&str>) -> String {
    let mut out = String::new();
    push_pages(&mut out, pages, focused_page, 0);
    if out.is_empty() {
        out.push_str("(no pages)\n");
    }
    out
}

fn push_pages(out: &mut String, pages: &[PageInfo], focused: Option<&str>, level: usize) {
    for page in pages {
        out.push_str(&"  ".repeat(level));
        out.push_str(&format!("- {}[id={}]", page.title, page.id));
        if let Some(kind) = page.component_type.as_deref().filter(|k| !k.is_empty()) {
            out.push_str(&format!("({kind})"));
        }
        if focused == Some(page.id.as_str()) {
            out.push_str(FOCUS_MARKER);
        }
        out.push('\n');
        push_pages(out, &page.children, focused, level + 1);
    }
}

/// Component hierarchy of the focused page. When a component is focused, branches that do
/// not lead to it are folded.
pub fn render_hierarchy(page: &OutlineNode, focus: &FocusInfo) -> String {
    let focused_com = match focus.kind {
        FocusKind::Component => focus.com_id.as_deref(),
        _ => None,
    };
    let mut out = String::new();
    for child in page.children() {
        push_node(&mut out, child, focus, focused_com, 0);
    }
    if out.is_empty() {
        out.push_str("(empty page)\n");
    }
    out
}

fn push_node(
    out: &mut String,
    node: &OutlineNode,
    focus: &FocusInfo,
    focused_com: Option<&str>,
    level: usize,
) {
    let folded = focused_com.is_some_and(|id| node.id != id && !contains_node(node, id));
    if !node.title.is_empty() {
        out.push_str(&"  ".repeat(level));
        out.push_str(&format!("- {}[id={}]", node.title, node.id));
        if let Some(ns) = node.namespace() {
            out.push_str(&format!("({ns})"));
        }
        if focus.target_id() == node.id {
            out.push_str(FOCUS_MARKER);
        }
        if folded && node.has_children() {
            out.push_str(" [children folded]");
        }
        out.push('\n');
    }
    if folded {
        return;
    }
    for child in node.children() {
        push_node(out, child, focus, focused_com, level + 1);
    }
}

/// One sentence naming what the user has selected.
pub fn describe_focus(focus: &FocusInfo) -> String {
    match (focus.kind, focus.com_id.as_deref()) {
        (FocusKind::Component, Some(com_id)) => format!(
            "Focused on component \"{}\" (id={com_id}) in page {}. \"This\" or an omitted subject refers to it and its children.",
            focus.title, focus.page_id
        ),
        _ => format!(
            "Focused on page \"{}\" (id={}). \"This\" or an omitted subject refers to it and its children.",
            focus.title, focus.page_id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_types::Slot;

    #[test]
    fn page_index_marks_focus_and_nests() {
        let pages = vec![
            PageInfo {
                children: vec![PageInfo {
                    component_type: Some("popup".to_string()),
                    ..PageInfo::new("p_dialog", "Dialog")
                }],
                ..PageInfo::new("p_home", "Home")
            },
            PageInfo::new("p_about", "About"),
        ];
        assert_eq!(
            render_page_index(&pages, Some("p_dialog")),
            "- Home[id=p_home]\n  - Dialog[id=p_dialog](popup) [focused]\n- About[id=p_about]\n"
        );
        assert_eq!(render_page_index(&[], None), "(no pages)\n");
    }

    #[test]
    fn hierarchy_folds_branches_away_from_focused_component() {
        let header = OutlineNode::new("u_head", "Header")
            .with_namespace("ns.flex")
            .with_slot(Slot::new("c").with_child(OutlineNode::new("u_logo", "Logo").with_namespace("ns.img")));
        let footer = OutlineNode::new("u_foot", "Footer")
            .with_namespace("ns.flex")
            .with_slot(Slot::new("c").with_child(OutlineNode::new("u_copy", "Copy")));
        let page = OutlineNode::new("p_home", "Home")
            .with_slot(Slot::new("_rootSlot_").with_child(header).with_child(footer));

        let focus = FocusInfo::component("p_home", "u_logo", "Logo");
        assert_eq!(
            render_hierarchy(&page, &focus),
            "- Header[id=u_head](ns.flex)\n  - Logo[id=u_logo](ns.img) [focused]\n- Footer[id=u_foot](ns.flex) [children folded]\n"
        );

        let whole = render_hierarchy(&page, &FocusInfo::page("p_home", "Home"));
        assert!(whole.contains("\n  - Copy[id=u_copy]\n"));
        assert!(!whole.contains("folded"));
    }

    #[test]
    fn focus_sentence_names_target() {
        let focus = FocusInfo::component("p_home", "u_logo", "Logo");
        assert!(describe_focus(&focus).contains("id=u_logo"));
    }
}
