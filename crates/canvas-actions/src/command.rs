//! Typed mutation commands.
//!
//! A command is one line of agent output, `[targetId, selector, kind, params]`, decoded into
//! a per-kind parameter type and normalised. Shapes the host may still reject (e.g. a
//! `calc()` width) are carried through unchanged.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::error::{ActionsError, Result};
use crate::normalize::{normalize_config_value, normalize_layout, normalize_style};

pub const ROOT_SELECTOR: &str = ":root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    SetLayout,
    Configure,
    AddChild,
    Move,
    Delete,
}

impl OperationKind {
    /// Name used in the action stream.
    pub fn as_wire(self) -> &'static str {
        match self {
            OperationKind::SetLayout => "setLayout",
            OperationKind::Configure => "doConfig",
            OperationKind::AddChild => "addChild",
            OperationKind::Move => "move",
            OperationKind::Delete => "delete",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "setlayout" | "layout" => Some(OperationKind::SetLayout),
            "doconfig" | "configure" | "config" => Some(OperationKind::Configure),
            "addchild" | "add" => Some(OperationKind::AddChild),
            "move" | "moveto" => Some(OperationKind::Move),
            "delete" | "remove" => Some(OperationKind::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Width/height value. The host accepts a pixel number, `fit-content` or `100%`.
#[derive(Debug, Clone, PartialEq)]
pub enum Size {
    Px(Number),
    FitContent,
    Fill,
    Other(Value),
}

impl Size {
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Number(n) => Size::Px(n),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed == "fit-content" {
                    return Size::FitContent;
                }
                if trimmed == "100%" {
                    return Size::Fill;
                }
                let px = trimmed
                    .strip_suffix("px")
                    .and_then(|n| n.trim().parse::<f64>().ok())
                    .and_then(Number::from_f64);
                match px {
                    Some(n) => Size::Px(n),
                    None => Size::Other(Value::String(s)),
                }
            }
            other => Size::Other(other),
        }
    }

    /// Whether the host understands the size natively; other values are forwarded verbatim.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Size::Other(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Size::Px(n) => Value::Number(n.clone()),
            Size::FitContent => Value::String("fit-content".to_string()),
            Size::Fill => Value::String("100%".to_string()),
            Size::Other(v) => v.clone(),
        }
    }
}

impl Serialize for Size {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// `setLayout` params and `addChild.layout`. Keys other than the size pair (margins,
/// fixed-position offsets) stay in `rest`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutParams {
    pub width: Option<Size>,
    pub height: Option<Size>,
    pub rest: Map<String, Value>,
}

impl LayoutParams {
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        normalize_layout(&mut map);
        let width = map.remove("width").map(Size::from_value);
        let height = map.remove("height").map(Size::from_value);
        for (axis, size) in [("width", &width), ("height", &height)] {
            if let Some(size) = size.as_ref().filter(|size| !size.is_supported()) {
                tracing::debug!(target: "canvas.actions", axis, value = %size.to_value(), "size passed through unnormalized");
            }
        }
        Self {
            width,
            height,
            rest: map,
        }
    }

    /// Pinned to the viewport with offsets instead of flowing in its slot.
    pub fn is_fixed(&self) -> bool {
        self.rest.get("position").and_then(Value::as_str) == Some("fixed")
    }

    pub fn to_map(&self) -> Map<String, Value> {
        let mut out = self.rest.clone();
        if let Some(width) = &self.width {
            out.insert("width".to_string(), width.to_value());
        }
        if let Some(height) = &self.height {
            out.insert("height".to_string(), height.to_value());
        }
        out
    }
}

impl Serialize for LayoutParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// `doConfig` params: either a property value or a style object for a declared path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigureParams {
    Style {
        path: String,
        style: Map<String, Value>,
    },
    Property {
        path: String,
        value: Value,
    },
}

impl ConfigureParams {
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let path = map
            .remove("path")
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        if let Some(Value::Object(mut style)) = map.remove("style") {
            normalize_style(&mut style);
            return ConfigureParams::Style { path, style };
        }
        let mut value = map.remove("value").unwrap_or(Value::Null);
        normalize_config_value(&mut value);
        ConfigureParams::Property { path, value }
    }

    pub fn path(&self) -> &str {
        match self {
            ConfigureParams::Style { path, .. } | ConfigureParams::Property { path, .. } => path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChildParams {
    pub title: String,
    pub namespace: String,
    pub com_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutParams>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<ConfigureParams>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
}

impl AddChildParams {
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let namespace = map
            .remove("ns")
            .or_else(|| map.remove("namespace"))
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let layout = match map.remove("layout") {
            Some(Value::Object(layout)) => Some(LayoutParams::from_map(layout)),
            _ => None,
        };
        let configs = match map.remove("configs") {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => Some(ConfigureParams::from_map(obj)),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            title: take_string(&mut map, "title"),
            namespace,
            com_id: take_string(&mut map, "comId"),
            layout,
            configs,
            ignore: map
                .remove("ignore")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveTarget {
    pub com_id: String,
    pub slot_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveParams {
    pub to: MoveTarget,
}

impl MoveParams {
    /// Accepts the raw `{comId, slotId, index}` shape as well as an already wrapped `{to}`.
    pub fn from_map(mut map: Map<String, Value>) -> Self {
        let mut target = match map.remove("to") {
            Some(Value::Object(to)) => to,
            _ => map,
        };
        Self {
            to: MoveTarget {
                com_id: take_string(&mut target, "comId"),
                slot_id: take_string(&mut target, "slotId"),
                index: target.remove("index").and_then(|v| v.as_i64()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandParams {
    SetLayout(LayoutParams),
    Configure(ConfigureParams),
    AddChild(AddChildParams),
    Move(MoveParams),
    Delete(Map<String, Value>),
}

impl CommandParams {
    pub fn from_raw(kind: OperationKind, raw: Value) -> Result<Self> {
        let map = match raw {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other if kind == OperationKind::Delete => {
                tracing::debug!(target: "canvas.actions", params = %other, "ignoring params of delete");
                Map::new()
            }
            other => {
                return Err(ActionsError::InvalidParams {
                    kind: kind.to_string(),
                    reason: format!("expected an object, got {other}"),
                })
            }
        };
        Ok(match kind {
            OperationKind::SetLayout => CommandParams::SetLayout(LayoutParams::from_map(map)),
            OperationKind::Configure => CommandParams::Configure(ConfigureParams::from_map(map)),
            OperationKind::AddChild => CommandParams::AddChild(AddChildParams::from_map(map)),
            OperationKind::Move => CommandParams::Move(MoveParams::from_map(map)),
            OperationKind::Delete => CommandParams::Delete(Map::new()),
        })
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            CommandParams::SetLayout(_) => OperationKind::SetLayout,
            CommandParams::Configure(_) => OperationKind::Configure,
            CommandParams::AddChild(_) => OperationKind::AddChild,
            CommandParams::Move(_) => OperationKind::Move,
            CommandParams::Delete(_) => OperationKind::Delete,
        }
    }
}

/// How the document root is addressed in the command stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootAlias {
    /// Instance id of the generated root container, if the page has one.
    pub container_id: Option<String>,
    /// Reserved id of the root slot.
    pub slot_id: String,
    /// Stable id the host resolves to its document root.
    pub sentinel: String,
}

impl Default for RootAlias {
    fn default() -> Self {
        Self {
            container_id: None,
            slot_id: "_rootSlot_".to_string(),
            sentinel: "_root_".to_string(),
        }
    }
}

impl RootAlias {
    pub fn with_container(mut self, container_id: impl Into<String>) -> Self {
        self.container_id = Some(container_id.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MutationCommand {
    pub target_id: String,
    pub selector: String,
    pub params: CommandParams,
}

impl MutationCommand {
    /// Decodes one parsed line. Three-element lines are accepted; params default to `{}`.
    pub fn from_tuple(value: Value) -> Result<Self> {
        let Value::Array(items) = value else {
            return Err(ActionsError::NotATuple(value.to_string()));
        };
        if !(3..=4).contains(&items.len()) {
            return Err(ActionsError::NotATuple(format!(
                "array of {} elements",
                items.len()
            )));
        }
        let mut items = items.into_iter();
        let target = items.next().unwrap_or_default();
        let selector = items.next().unwrap_or_default();
        let kind = items.next().unwrap_or_default();
        let params = items.next().unwrap_or_else(|| Value::Object(Map::new()));

        let target_id = match target {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        };
        if target_id.is_empty() {
            return Err(ActionsError::EmptyTarget);
        }
        let selector = match selector {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            Value::Null | Value::String(_) => ROOT_SELECTOR.to_string(),
            other => return Err(ActionsError::NotATuple(format!("selector {other}"))),
        };
        let kind_raw = kind.as_str().unwrap_or_default();
        let kind = OperationKind::parse(kind_raw)
            .ok_or_else(|| ActionsError::UnknownKind(kind_raw.to_string()))?;

        Ok(Self {
            target_id,
            selector,
            params: CommandParams::from_raw(kind, params)?,
        })
    }

    pub fn kind(&self) -> OperationKind {
        self.params.kind()
    }

    /// Rewrites `addChild` into the root slot of the generated root container so that it
    /// targets the root sentinel instead of the instance id.
    pub fn canonicalize_root(&mut self, alias: &RootAlias) {
        let Some(container_id) = alias.container_id.as_deref() else {
            return;
        };
        if self.kind() == OperationKind::AddChild
            && self.target_id == container_id
            && self.selector == alias.slot_id
        {
            self.target_id = alias.sentinel.clone();
        }
    }
}

impl Serialize for MutationCommand {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry("targetId", &self.target_id)?;
        map.serialize_entry("selector", &self.selector)?;
        map.serialize_entry("kind", self.kind().as_wire())?;
        map.serialize_entry("params", &self.params)?;
        map.end()
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> String {
    match map.remove(key) {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}
