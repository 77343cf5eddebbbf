use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Component type descriptor as the host reports it on every outline node.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentDef {
    #[serde(default)]
    pub namespace: Option<String>,
}

/// One node of the host's component tree.
///
/// The tree is read-only for this engine: it is rendered into agent context and used to
/// resolve ids, never mutated in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OutlineNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub def: Option<ComponentDef>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub style: Value,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub layout: Option<Value>,
    #[serde(default, alias = "components")]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.def = Some(ComponentDef {
            namespace: Some(namespace.into()),
        });
        self
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.def
            .as_ref()
            .and_then(|def| def.namespace.as_deref())
            .filter(|ns| !ns.trim().is_empty())
    }

    pub fn has_children(&self) -> bool {
        self.slots.iter().any(|slot| !slot.children.is_empty())
    }

    pub fn children(&self) -> impl Iterator<Item = &OutlineNode> {
        self.slots.iter().flat_map(|slot| slot.children.iter())
    }
}

impl Slot {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_child(mut self, child: OutlineNode) -> Self {
        self.children.push(child);
        self
    }
}
