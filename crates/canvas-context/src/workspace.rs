//! Per-conversation record of what the agent has already been shown.

use std::collections::HashSet;

use canvas_types::{flatten_page_ids, find_page, DocumentKind, FocusInfo, OutlineNode};
use serde::Serialize;

use crate::error::{ContextError, Result};
use crate::page_index::{describe_focus, render_hierarchy, render_page_index};
use crate::serialize::{serialize_with, SerializeOptions};
use crate::source::OutlineSource;
use crate::tree::{contains_node, minimal_common_ancestor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedDocument {
    /// Page id, or for a component view the id of the minimal common ancestor.
    pub id: String,
    pub kind: DocumentKind,
    pub page_id: String,
    /// Components merged into this view, in opening order. Empty for pages.
    pub targets: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// An existing component view of the same page was re-rendered with the new target.
    Merged,
    AlreadyOpen,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDoc {
    pub namespace: String,
    pub doc: String,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    focus: FocusInfo,
    options: SerializeOptions,
    documents: Vec<OpenedDocument>,
    namespaces: Vec<String>,
    namespace_index: HashSet<String>,
    drained: usize,
}

impl Workspace {
    pub fn new(focus: FocusInfo) -> Self {
        Self::with_options(focus, SerializeOptions::default())
    }

    pub fn with_options(focus: FocusInfo, options: SerializeOptions) -> Self {
        Self {
            focus,
            options,
            documents: Vec::new(),
            namespaces: Vec::new(),
            namespace_index: HashSet::new(),
            drained: 0,
        }
    }

    pub fn focus(&self) -> &FocusInfo {
        &self.focus
    }

    pub fn set_focus(&mut self, focus: FocusInfo) {
        self.focus = focus;
    }

    /// Forgets everything shown so far.
    pub fn reset(&mut self, focus: FocusInfo) {
        *self = Self::with_options(focus, self.options.clone());
    }

    pub fn documents(&self) -> &[OpenedDocument] {
        &self.documents
    }

    /// Whether `id` is already visible: an opened page, or a component merged into a view.
    pub fn is_open(&self, id: &str) -> bool {
        self.documents.iter().any(|doc| match doc.kind {
            DocumentKind::Page => doc.id == id,
            DocumentKind::Component => doc.targets.iter().any(|t| t == id),
        })
    }

    pub fn open_document<S: OutlineSource + ?Sized>(
        &mut self,
        source: &S,
        id: &str,
    ) -> Result<OpenOutcome> {
        if self.is_open(id) {
            return Ok(OpenOutcome::AlreadyOpen);
        }
        let pages = source.all_pages();
        if find_page(&pages, id).is_some() {
            return self.open_page(source, id);
        }

        let (page_id, outline) = self
            .enclosing_page(source, id)
            .ok_or_else(|| ContextError::UnknownDocument(id.to_string()))?;
        let page_open = self
            .documents
            .iter()
            .any(|doc| doc.kind == DocumentKind::Page && doc.id == page_id);
        if page_open {
            tracing::debug!(target: "canvas.context", id, page_id = %page_id, "component already visible in opened page");
            return Ok(OpenOutcome::AlreadyOpen);
        }

        let existing = self
            .documents
            .iter()
            .position(|doc| doc.kind == DocumentKind::Component && doc.page_id == page_id);
        let mut targets = existing
            .map(|idx| self.documents[idx].targets.clone())
            .unwrap_or_default();
        targets.push(id.to_string());

        let ancestor = minimal_common_ancestor(&outline, &targets).unwrap_or(&outline);
        let rendered = serialize_with(ancestor, &targets, &self.options);
        let document = OpenedDocument {
            id: ancestor.id.clone(),
            kind: DocumentKind::Component,
            page_id,
            targets,
            content: rendered.text,
        };
        for ns in rendered.namespaces {
            self.register_namespace_doc(&ns);
        }

        tracing::debug!(
            target: "canvas.context",
            id,
            view = %document.id,
            targets = document.targets.len(),
            "opened component"
        );
        match existing {
            Some(idx) => {
                self.documents[idx] = document;
                Ok(OpenOutcome::Merged)
            }
            None => {
                self.documents.push(document);
                Ok(OpenOutcome::Opened)
            }
        }
    }

    fn open_page<S: OutlineSource + ?Sized>(
        &mut self,
        source: &S,
        id: &str,
    ) -> Result<OpenOutcome> {
        let outline = source
            .outline(id, DocumentKind::Page)
            .ok_or_else(|| ContextError::MissingOutline {
                id: id.to_string(),
                kind: DocumentKind::Page.as_str(),
            })?;
        let rendered = serialize_with::<&str>(&outline, &[], &self.options);
        for ns in rendered.namespaces {
            self.register_namespace_doc(&ns);
        }
        // The page view supersedes any partial component view of it.
        self.documents
            .retain(|doc| !(doc.kind == DocumentKind::Component && doc.page_id == id));
        self.documents.push(OpenedDocument {
            id: id.to_string(),
            kind: DocumentKind::Page,
            page_id: id.to_string(),
            targets: Vec::new(),
            content: rendered.text,
        });
        tracing::debug!(target: "canvas.context", id, "opened page");
        Ok(OpenOutcome::Opened)
    }

    /// Page holding `id`, checking the focused page first.
    fn enclosing_page<S: OutlineSource + ?Sized>(
        &self,
        source: &S,
        id: &str,
    ) -> Option<(String, OutlineNode)> {
        let mut candidates = vec![self.focus.page_id.clone()];
        candidates.extend(
            flatten_page_ids(&source.all_pages())
                .into_iter()
                .filter(|pid| *pid != self.focus.page_id),
        );
        candidates.into_iter().find_map(|page_id| {
            let outline = source.outline(&page_id, DocumentKind::Page)?;
            contains_node(&outline, id).then_some((page_id, outline))
        })
    }

    pub fn close_document(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|doc| doc.id != id);
        before != self.documents.len()
    }

    pub fn has_namespace_doc(&self, namespace: &str) -> bool {
        self.namespace_index.contains(namespace)
    }

    /// Returns `false` if the namespace was registered before.
    pub fn register_namespace_doc(&mut self, namespace: &str) -> bool {
        if !self.namespace_index.insert(namespace.to_string()) {
            return false;
        }
        self.namespaces.push(namespace.to_string());
        true
    }

    /// Docs of namespaces registered since the last drain, in registration order.
    pub fn drain_namespace_docs<S: OutlineSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Vec<NamespaceDoc> {
        let pending = &self.namespaces[self.drained..];
        self.drained = self.namespaces.len();
        pending
            .iter()
            .filter_map(|ns| {
                let doc = source.component_doc(ns);
                if doc.is_none() {
                    tracing::debug!(target: "canvas.context", namespace = %ns, "host has no doc for namespace");
                }
                doc.map(|doc| NamespaceDoc {
                    namespace: ns.clone(),
                    doc,
                })
            })
            .collect()
    }

    pub fn render_documents(&self) -> String {
        if self.documents.is_empty() {
            return "No documents opened.".to_string();
        }
        self.documents
            .iter()
            .map(|doc| {
                format!(
                    "- [id={}]({}, page={})\n```jsx\n{}\n```",
                    doc.id,
                    doc.kind.as_str(),
                    doc.page_id,
                    doc.content
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Page index, focused hierarchy and opened documents, as handed to the agent each turn.
    pub fn render_overview<S: OutlineSource + ?Sized>(&self, source: &S) -> String {
        let pages = source.all_pages();
        let hierarchy = source
            .outline(&self.focus.page_id, DocumentKind::Page)
            .map(|outline| render_hierarchy(&outline, &self.focus))
            .unwrap_or_else(|| "(empty page)\n".to_string());
        format!(
            "# Workspace\n\n## Pages\n{}\n## Focus\n{}\n{}\n\n## Opened documents\n{}\n",
            render_page_index(&pages, Some(&self.focus.page_id)),
            hierarchy,
            describe_focus(&self.focus),
            self.render_documents()
        )
    }
}

pub fn render_namespace_docs(docs: &[NamespaceDoc]) -> String {
    let mut out = String::from("# Component docs\n");
    for doc in docs {
        out.push_str(&format!("<{0}>\n{1}\n</{0}>\n", doc.namespace, doc.doc.trim()));
    }
    out
}
