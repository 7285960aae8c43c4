//! Screen construction collaborator
//!
//! Steps build their screens through [`ScreenBuilder`] and never own what
//! they build. Objects live in a table owned by the display side and are
//! addressed by generational handles: once an object is deleted every
//! handle to it goes stale instead of dangling.
//!
//! [`ScreenTable`] is the in-memory implementation used by the headless
//! binary, the terminal front-end, and the tests.

use crate::error::{Result, WizardError};
use std::collections::{HashMap, HashSet};

/// Generational index into a [`ScreenTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScreenHandle {
    index: u32,
    generation: u32,
}

/// Rendering operations the wizard core depends on
pub trait ScreenBuilder {
    /// Instantiate `template_id` under `parent`
    fn create_from_template(&mut self, parent: ScreenHandle, template_id: &str)
        -> Result<ScreenHandle>;

    /// Depth-first search for a descendant named `name`
    fn find_named_child(&self, screen: ScreenHandle, name: &str) -> Option<ScreenHandle>;

    /// Set the text of a label. Stale handles and non-labels are ignored.
    fn set_label_text(&mut self, handle: ScreenHandle, text: &str);

    /// Delete every child of `container` (the owner's side of cleanup)
    fn clear_children(&mut self, container: ScreenHandle);

    /// Whether `handle` still refers to a live object
    fn is_alive(&self, handle: ScreenHandle) -> bool;
}

/// One named label inside a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: String,
    pub text: String,
}

impl LabelSpec {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Declarative screen layout: a title and an ordered list of labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenTemplate {
    pub title: String,
    pub labels: Vec<LabelSpec>,
}

impl ScreenTemplate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            labels: Vec::new(),
        }
    }

    pub fn label(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.labels.push(LabelSpec::new(name, text));
        self
    }

    fn check(&self, id: &str) -> Result<()> {
        let malformed = |reason: String| WizardError::MalformedTemplate {
            template: id.to_string(),
            reason,
        };
        if id.trim().is_empty() {
            return Err(malformed("empty template id".to_string()));
        }
        let mut seen = HashSet::new();
        for label in &self.labels {
            if label.name.trim().is_empty() {
                return Err(malformed("label with empty name".to_string()));
            }
            if !seen.insert(label.name.as_str()) {
                return Err(malformed(format!("duplicate label '{}'", label.name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Container,
    Screen { title: String },
    Label { text: String },
}

#[derive(Debug, Clone)]
struct Node {
    name: Option<String>,
    kind: NodeKind,
    parent: Option<ScreenHandle>,
    children: Vec<ScreenHandle>,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// In-memory object table with registered templates
#[derive(Debug, Clone)]
pub struct ScreenTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    templates: HashMap<String, ScreenTemplate>,
    root: ScreenHandle,
}

impl Default for ScreenTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenTable {
    /// Empty table holding only the root container
    pub fn new() -> Self {
        let mut table = Self {
            slots: Vec::new(),
            free: Vec::new(),
            templates: HashMap::new(),
            root: ScreenHandle {
                index: 0,
                generation: 0,
            },
        };
        table.root = table.alloc(Node {
            name: Some("screen".to_string()),
            kind: NodeKind::Container,
            parent: None,
            children: Vec::new(),
        });
        table
    }

    pub fn root(&self) -> ScreenHandle {
        self.root
    }

    /// Register (or replace) a template after checking it is well formed
    pub fn register_template(&mut self, id: &str, template: ScreenTemplate) -> Result<()> {
        template.check(id)?;
        tracing::debug!("Registered screen template '{}'", id);
        self.templates.insert(id.to_string(), template);
        Ok(())
    }

    pub fn has_template(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }

    /// Create an empty named container under `parent`
    pub fn create_container(&mut self, parent: ScreenHandle, name: &str) -> Result<ScreenHandle> {
        if !self.is_alive(parent) {
            return Err(WizardError::screen(format!(
                "parent of container '{}' no longer exists",
                name
            )));
        }
        let handle = self.alloc(Node {
            name: Some(name.to_string()),
            kind: NodeKind::Container,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.attach(parent, handle);
        Ok(handle)
    }

    /// Delete an object and its whole subtree
    pub fn delete(&mut self, handle: ScreenHandle) {
        if handle == self.root || !self.is_alive(handle) {
            return;
        }
        if let Some(parent) = self.node(handle).and_then(|n| n.parent) {
            if let Some(p) = self.node_mut(parent) {
                p.children.retain(|c| *c != handle);
            }
        }
        self.delete_subtree(handle);
    }

    /// Text of the label called `name` below `screen`
    pub fn label_text(&self, screen: ScreenHandle, name: &str) -> Option<&str> {
        let handle = self.find_named_child(screen, name)?;
        match &self.node(handle)?.kind {
            NodeKind::Label { text } => Some(text.as_str()),
            NodeKind::Container | NodeKind::Screen { .. } => None,
        }
    }

    pub fn children(&self, handle: ScreenHandle) -> &[ScreenHandle] {
        self.node(handle).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live objects, root included
    pub fn live_count(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Flatten a subtree into display lines: screen titles and label texts
    pub fn render_text(&self, handle: ScreenHandle) -> Vec<String> {
        let mut lines = Vec::new();
        self.render_into(handle, &mut lines);
        lines
    }

    fn render_into(&self, handle: ScreenHandle, lines: &mut Vec<String>) {
        let Some(node) = self.node(handle) else {
            return;
        };
        match &node.kind {
            NodeKind::Screen { title } => lines.push(format!("== {} ==", title)),
            NodeKind::Label { text } if !text.is_empty() => lines.push(text.clone()),
            NodeKind::Label { .. } | NodeKind::Container => {}
        }
        for child in &node.children {
            self.render_into(*child, lines);
        }
    }

    fn alloc(&mut self, node: Node) -> ScreenHandle {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            ScreenHandle {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ScreenHandle {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    fn attach(&mut self, parent: ScreenHandle, child: ScreenHandle) {
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    fn delete_subtree(&mut self, handle: ScreenHandle) {
        let children = match self.node_mut(handle) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.delete_subtree(child);
        }
        self.slots[handle.index as usize].node = None;
        self.free.push(handle.index);
    }

    fn node(&self, handle: ScreenHandle) -> Option<&Node> {
        self.slots
            .get(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.node.as_ref())
    }

    fn node_mut(&mut self, handle: ScreenHandle) -> Option<&mut Node> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|s| s.generation == handle.generation)
            .and_then(|s| s.node.as_mut())
    }
}

impl ScreenBuilder for ScreenTable {
    fn create_from_template(
        &mut self,
        parent: ScreenHandle,
        template_id: &str,
    ) -> Result<ScreenHandle> {
        let template = self
            .templates
            .get(template_id)
            .cloned()
            .ok_or_else(|| WizardError::TemplateNotFound(template_id.to_string()))?;
        if !self.is_alive(parent) {
            return Err(WizardError::screen(format!(
                "parent of '{}' no longer exists",
                template_id
            )));
        }

        let screen = self.alloc(Node {
            name: Some(template_id.to_string()),
            kind: NodeKind::Screen {
                title: template.title,
            },
            parent: Some(parent),
            children: Vec::new(),
        });
        self.attach(parent, screen);

        for label in template.labels {
            let handle = self.alloc(Node {
                name: Some(label.name),
                kind: NodeKind::Label { text: label.text },
                parent: Some(screen),
                children: Vec::new(),
            });
            self.attach(screen, handle);
        }
        Ok(screen)
    }

    fn find_named_child(&self, screen: ScreenHandle, name: &str) -> Option<ScreenHandle> {
        let node = self.node(screen)?;
        for child in &node.children {
            let Some(child_node) = self.node(*child) else {
                continue;
            };
            if child_node.name.as_deref() == Some(name) {
                return Some(*child);
            }
            if let Some(found) = self.find_named_child(*child, name) {
                return Some(found);
            }
        }
        None
    }

    fn set_label_text(&mut self, handle: ScreenHandle, text: &str) {
        match self.node_mut(handle).map(|n| &mut n.kind) {
            Some(NodeKind::Label { text: current }) => {
                current.clear();
                current.push_str(text);
            }
            Some(_) => tracing::warn!("set_label_text on an object that is not a label"),
            None => tracing::debug!("set_label_text on a deleted object ignored"),
        }
    }

    fn clear_children(&mut self, container: ScreenHandle) {
        let children = match self.node_mut(container) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in children {
            self.delete_subtree(child);
        }
    }

    fn is_alive(&self, handle: ScreenHandle) -> bool {
        self.node(handle).is_some()
    }
}
