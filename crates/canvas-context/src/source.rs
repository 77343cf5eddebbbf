use canvas_types::{DocumentKind, OutlineNode, PageInfo};

/// Read side of the host editor.
pub trait OutlineSource {
    /// Current outline of a page, or of the page holding a component.
    fn outline(&self, id: &str, kind: DocumentKind) -> Option<OutlineNode>;

    /// Page index, top-level pages first.
    fn all_pages(&self) -> Vec<PageInfo>;

    /// Usage documentation for a component namespace.
    fn component_doc(&self, namespace: &str) -> Option<String>;
}

/// In-memory source backed by fixed outlines, for the CLI and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    pub pages: Vec<PageInfo>,
    pub outlines: Vec<OutlineNode>,
    pub docs: Vec<(String, String)>,
}

impl StaticSource {
    pub fn with_page(mut self, info: PageInfo, outline: OutlineNode) -> Self {
        self.pages.push(info);
        self.outlines.push(outline);
        self
    }

    pub fn with_doc(mut self, namespace: impl Into<String>, doc: impl Into<String>) -> Self {
        self.docs.push((namespace.into(), doc.into()));
        self
    }
}

impl OutlineSource for StaticSource {
    fn outline(&self, id: &str, kind: DocumentKind) -> Option<OutlineNode> {
        match kind {
            DocumentKind::Page => self.outlines.iter().find(|o| o.id == id).cloned(),
            DocumentKind::Component => self
                .outlines
                .iter()
                .find(|o| crate::tree::contains_node(o, id))
                .cloned(),
        }
    }

    fn all_pages(&self) -> Vec<PageInfo> {
        self.pages.clone()
    }

    fn component_doc(&self, namespace: &str) -> Option<String> {
        self.docs
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, doc)| doc.clone())
    }
}
