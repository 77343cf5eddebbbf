use serde::{Deserialize, Serialize};

/// Whether an opened document is a whole page or a slice of components inside one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Page,
    Component,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Page => "page",
            DocumentKind::Component => "component",
        }
    }
}

/// Entry of the host's page index. Pages nest (e.g. popups under a canvas).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub page_type: Option<String>,
    #[serde(default)]
    pub component_type: Option<String>,
    #[serde(default)]
    pub children: Vec<PageInfo>,
}

impl PageInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn find(&self, id: &str) -> Option<&PageInfo> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

pub fn find_page<'a>(pages: &'a [PageInfo], id: &str) -> Option<&'a PageInfo> {
    pages.iter().find_map(|page| page.find(id))
}

/// Depth-first list of every page id in the index.
pub fn flatten_page_ids(pages: &[PageInfo]) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack: Vec<&PageInfo> = pages.iter().rev().collect();
    while let Some(page) = stack.pop() {
        out.push(page.id.clone());
        stack.extend(page.children.iter().rev());
    }
    out
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FocusKind {
    Page,
    Component,
    Section,
}

/// What the user currently has selected in the editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FocusInfo {
    pub page_id: String,
    #[serde(default)]
    pub com_id: Option<String>,
    #[serde(default)]
    pub title: String,
    pub kind: FocusKind,
}

impl FocusInfo {
    pub fn page(page_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            com_id: None,
            title: title.into(),
            kind: FocusKind::Page,
        }
    }

    pub fn component(
        page_id: impl Into<String>,
        com_id: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            page_id: page_id.into(),
            com_id: Some(com_id.into()),
            title: title.into(),
            kind: FocusKind::Component,
        }
    }

    /// Id of the focused element: the component when one is selected, else the page.
    pub fn target_id(&self) -> &str {
        match (self.kind, self.com_id.as_deref()) {
            (FocusKind::Component, Some(id)) => id,
            _ => &self.page_id,
        }
    }
}
