#![forbid(unsafe_code)]

//! Declarative view tree handed to the virtual-DOM patcher.
//!
//! Nodes carry their event listeners as data ([`Listener`]): the host wires
//! each one to a DOM listener that reports the [`UiAction`] back to the
//! engine together with the event target's value. The tree serializes to a
//! compact JSON shape the page-side patch adapter understands:
//!
//! ```json
//! {"tag":"div","classes":["column"],"on":[{"event":"scroll","action":{"type":"column_scroll","index":0}}],"children":["text",{"tag":"iframe"}]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::state::ColumnAddress;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomEvent {
    Scroll,
    Change,
    Input,
    Click,
    Load,
}

/// What a DOM event on a node means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiAction {
    ColumnScroll { index: usize },
    UrlChange { address: ColumnAddress },
    DisplayModeChange,
    /// Stepper button; `delta` is `-1` or `+1`.
    ColumnsStep { delta: i32 },
    WidthChange,
    /// Per-keystroke width typing, ahead of the debounced change.
    WidthInput,
    PresetPick { width: u32 },
    FrameLoad { address: ColumnAddress },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Listener {
    pub event: DomEvent,
    pub action: UiAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Element(Node),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub tag: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<&'static str, AttrValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub on: Vec<Listener>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}

impl Node {
    #[must_use]
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            on: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    /// Add `class` only when `enabled`.
    #[must_use]
    pub fn class_if(self, class: &str, enabled: bool) -> Self {
        if enabled { self.class(class) } else { self }
    }

    #[must_use]
    pub fn attr(mut self, name: &'static str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name, value.into());
        self
    }

    #[must_use]
    pub fn on(mut self, event: DomEvent, action: UiAction) -> Self {
        self.on.push(Listener { event, action });
        self
    }

    #[must_use]
    pub fn child(mut self, child: Node) -> Self {
        self.children.push(Child::Element(child));
        self
    }

    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children.into_iter().map(Child::Element));
        self
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    #[must_use]
    pub fn attr_text(&self, name: &str) -> Option<&str> {
        match self.attrs.get(name) {
            Some(AttrValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn attr_bool(&self, name: &str) -> bool {
        matches!(self.attrs.get(name), Some(AttrValue::Bool(true)))
    }

    /// Direct element children.
    pub fn elements(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(|child| match child {
            Child::Element(node) => Some(node),
            Child::Text(_) => None,
        })
    }

    /// Depth-first search including `self`.
    #[must_use]
    pub fn find(&self, pred: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.elements().find_map(|child| child.find(pred))
    }

    /// Every node matching `pred`, depth-first, including `self`.
    #[must_use]
    pub fn find_all(&self, pred: &dyn Fn(&Node) -> bool) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect(pred, &mut out);
        out
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&Node) -> bool, out: &mut Vec<&'a Node>) {
        if pred(self) {
            out.push(self);
        }
        for child in self.elements() {
            child.collect(pred, out);
        }
    }

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.find(&|node| node.id.as_deref() == Some(id))
    }

    /// Concatenated text of this subtree.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Child::Text(text) => out.push_str(text),
                Child::Element(node) => node.push_text(out),
            }
        }
    }
}
