//! Compact JSX-like rendering of outline trees for agent context.
//!
//! ```text
//! <mybricks.normal-pc.card id="u_card" title="Card" data={{"title":"Hi"}} layout={{"width":320}}>
//!   <slots.body title="Body">
//!     <mybricks.normal-pc.text id="u_text" title="Text" data={{}} />
//!     <mybricks.normal-pc.list id="u_list" title="List" hiddenChildren />
//!   </slots.body>
//! </mybricks.normal-pc.card>
//! ```
//!
//! Branches holding none of the requested targets collapse to a single line. Nodes without a
//! namespace (page roots) are transparent: only their slot contents are rendered.

use std::collections::{BTreeSet, HashSet};

use canvas_types::{OutlineNode, Slot};
use serde_json::{Map, Value};

use crate::tree::find_path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Collapse children that hold no target. With no targets every node is expanded.
    pub collapse_unrelated: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            collapse_unrelated: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Serialized {
    pub text: String,
    /// Namespaces of every expanded node, sorted.
    pub namespaces: BTreeSet<String>,
}

pub fn serialize<S: AsRef<str>>(node: &OutlineNode, target_ids: &[S]) -> Serialized {
    serialize_with(node, target_ids, &SerializeOptions::default())
}

pub fn serialize_with<S: AsRef<str>>(
    node: &OutlineNode,
    target_ids: &[S],
    options: &SerializeOptions,
) -> Serialized {
    let targets = target_ids
        .iter()
        .map(|id| id.as_ref().to_string())
        .collect::<Vec<_>>();
    let on_path = targets
        .iter()
        .filter_map(|id| find_path(node, id))
        .flatten()
        .map(|step| step.id.as_str())
        .collect::<HashSet<_>>();
    let mut renderer = Renderer {
        targets: &targets,
        on_path,
        collapse: options.collapse_unrelated && !targets.is_empty(),
        lines: Vec::new(),
        namespaces: BTreeSet::new(),
    };
    renderer.node(node, 0, false);
    Serialized {
        text: renderer.lines.join("\n"),
        namespaces: renderer.namespaces,
    }
}

struct Renderer<'a> {
    targets: &'a [String],
    /// Ids of the targets and of every node above one.
    on_path: HashSet<&'a str>,
    collapse: bool,
    lines: Vec<String>,
    namespaces: BTreeSet<String>,
}

impl Renderer<'_> {
    fn is_target(&self, node: &OutlineNode) -> bool {
        self.targets.iter().any(|id| *id == node.id)
    }

    fn holds_target(&self, node: &OutlineNode) -> bool {
        self.on_path.contains(node.id.as_str())
    }

    /// `under_target`: some ancestor is a target, so everything below it is expanded.
    fn node(&mut self, node: &OutlineNode, depth: usize, under_target: bool) {
        let under_target = under_target || self.is_target(node);
        let Some(namespace) = node.namespace() else {
            for slot in &node.slots {
                for child in &slot.children {
                    self.child(child, depth, under_target);
                }
            }
            return;
        };
        self.namespaces.insert(namespace.to_string());

        let indent = "  ".repeat(depth);
        let mut open = format!(
            "{indent}<{namespace} id=\"{}\" title=\"{}\" data={{{}}}",
            node.id,
            escape_attr(&node.title),
            compact_json(&node.data)
        );
        let layout = extract_layout(&node.style);
        if !layout.is_empty() {
            open.push_str(&format!(" layout={{{}}}", Value::Object(layout)));
        }
        let styles = extract_style_array(&node.style);
        if !styles.is_empty() {
            let quoted = styles
                .iter()
                .map(|s| format!("\"{}\"", escape_attr(s)))
                .collect::<Vec<_>>()
                .join(", ");
            open.push_str(&format!(" styleAry={{[{quoted}]}}"));
        }

        if node.slots.is_empty() {
            open.push_str(" />");
            self.lines.push(open);
            return;
        }
        open.push('>');
        self.lines.push(open);
        for slot in &node.slots {
            self.slot(slot, depth + 1, under_target);
        }
        self.lines.push(format!("{indent}</{namespace}>"));
    }

    fn slot(&mut self, slot: &Slot, depth: usize, under_target: bool) {
        let indent = "  ".repeat(depth);
        let mut open = format!("{indent}<slots.{}", slot.id);
        if let Some(title) = slot.title.as_deref().filter(|t| !t.is_empty()) {
            open.push_str(&format!(" title=\"{}\"", escape_attr(title)));
        }
        if let Some(layout) = &slot.layout {
            let layout = extract_layout(layout);
            if !layout.is_empty() {
                open.push_str(&format!(" layout={{{}}}", Value::Object(layout)));
            }
        }
        if slot.children.is_empty() {
            open.push_str(" />");
            self.lines.push(open);
            return;
        }
        open.push('>');
        self.lines.push(open);
        for child in &slot.children {
            self.child(child, depth + 1, under_target);
        }
        self.lines.push(format!("{indent}</slots.{}>", slot.id));
    }

    fn child(&mut self, child: &OutlineNode, depth: usize, under_target: bool) {
        if !self.collapse || under_target || self.holds_target(child) {
            self.node(child, depth, under_target);
            return;
        }
        let Some(namespace) = child.namespace() else {
            for slot in &child.slots {
                for grandchild in &slot.children {
                    self.child(grandchild, depth, under_target);
                }
            }
            return;
        };
        let marker = if child.has_children() {
            " hiddenChildren"
        } else {
            ""
        };
        self.lines.push(format!(
            "{}<{namespace} id=\"{}\" title=\"{}\"{marker} />",
            "  ".repeat(depth),
            child.id,
            escape_attr(&child.title)
        ));
    }
}

/// Size, margin and flex axis of a host style object, in the keys `setLayout` accepts.
pub fn extract_layout(style: &Value) -> Map<String, Value> {
    let mut layout = Map::new();
    let Some(style) = style.as_object() else {
        return layout;
    };
    for key in [
        "width",
        "height",
        "margin",
        "marginTop",
        "marginRight",
        "marginBottom",
        "marginLeft",
        "position",
    ] {
        if let Some(value) = style.get(key).filter(|v| !v.is_null()) {
            layout.insert(key.to_string(), value.clone());
        }
    }
    if let Some(mode) = style.get("layout").and_then(Value::as_str) {
        let direction = match mode {
            "flex-column" | "flex" => Some("column"),
            "flex-row" => Some("row"),
            _ => None,
        };
        if let Some(direction) = direction {
            layout.insert("display".to_string(), Value::String("flex".to_string()));
            layout.insert(
                "flexDirection".to_string(),
                Value::String(direction.to_string()),
            );
        }
        for key in ["alignItems", "justifyContent"] {
            if let Some(value) = style.get(key).filter(|v| !v.is_null()) {
                layout.insert(key.to_string(), value.clone());
            }
        }
    }
    layout
}

/// `style.css` entries rendered as `selector : { prop: 'value', ... }`.
pub fn extract_style_array(style: &Value) -> Vec<String> {
    let Some(entries) = style.get("css").and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .map(|entry| {
            let selector = entry.get("selector").and_then(Value::as_str).unwrap_or("");
            let props = entry
                .get("css")
                .and_then(Value::as_object)
                .map(|css| {
                    css.iter()
                        .map(|(key, value)| format!("{key}: '{}'", scalar_text(value)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            format!("{selector} : {{ {props} }}")
        })
        .collect()
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compact_json(value: &Value) -> String {
    match value {
        Value::Null => "{}".to_string(),
        other => other.to_string(),
    }
}

fn escape_attr(raw: &str) -> String {
    raw.replace('"', "\\\"")
}
