//! Editing session state: the current template, selection and drag payload.
//!
//! `EditorState` is the only owner of the template during a session. Every mutation goes
//! through the tree operations, is applied atomically, and notifies subscribers only
//! when the template value actually changed.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::block::{Block, BlockProps, BlockType, Template};
use crate::tree::{self, column_insert_index, columns_of, find_block, parent_of};

/// Called after each effective change with the new template and revision
pub type ChangeListener = Box<dyn FnMut(&Template, u64)>;

/// What is being dragged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSource {
    /// A new block taken from the palette
    Palette(BlockType),
    /// An existing block, by id
    Block(String),
}

/// Where a drag gesture ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Over another block: take its place in its sibling list
    Block(String),
    /// Into column `column` of the columns block `columns_id`
    Column { columns_id: String, column: usize },
    /// Onto the empty canvas: append to the root
    Canvas,
}

pub struct EditorState {
    template: Template,
    selected_block_id: Option<String>,
    drag: Option<DragSource>,
    revision: u64,
    listeners: Vec<ChangeListener>,
}

impl Default for EditorState {
    fn default() -> Self {
        EditorState::new(Template::new())
    }
}

impl fmt::Debug for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorState")
            .field("template", &self.template)
            .field("selected_block_id", &self.selected_block_id)
            .field("drag", &self.drag)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EditorState {
    pub fn new(template: Template) -> Self {
        EditorState {
            template: tree::ensure_unique_ids(&template),
            selected_block_id: None,
            drag: None,
            revision: 0,
            listeners: Vec::new(),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn selected_block_id(&self) -> Option<&str> {
        self.selected_block_id.as_deref()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block_id
            .as_deref()
            .and_then(|id| find_block(&self.template, id))
    }

    pub fn drag(&self) -> Option<&DragSource> {
        self.drag.as_ref()
    }

    /// Number of effective template changes so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&Template, u64) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn commit(&mut self, next: Template) -> bool {
        if next == self.template {
            return false;
        }
        self.template = next;
        self.revision += 1;
        if let Some(id) = self.selected_block_id.as_deref() {
            if find_block(&self.template, id).is_none() {
                self.selected_block_id = None;
            }
        }
        for listener in &mut self.listeners {
            listener(&self.template, self.revision);
        }
        true
    }

    /// Replace the whole document, e.g. when loading a saved template.
    /// Repeated ids in the incoming document are repaired, not rejected.
    pub fn set_template(&mut self, template: Template) -> bool {
        let template = tree::ensure_unique_ids(&template);
        self.commit(template)
    }

    /// Insert a block under `parent_id` (root when `None`).
    /// Returns the id the block ended up with, or `None` if it could not be placed.
    pub fn add_block(
        &mut self,
        block: Block,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Option<String> {
        let taken: HashSet<String> = tree::collect_ids(&self.template)
            .into_iter()
            .map(String::from)
            .collect();
        let block = tree::with_unique_ids(block, &taken);
        let id = block.id.clone();
        let next = tree::insert_block(&self.template, block, parent_id, index);
        self.commit(next).then_some(id)
    }

    /// Shallow-merge `patch` into a block's props
    pub fn update_block(&mut self, id: &str, patch: &Map<String, Value>) -> bool {
        let next = tree::update_block_props(&self.template, id, patch);
        self.commit(next)
    }

    /// Replace a block's props with a value of the same block type
    pub fn replace_block_props(&mut self, id: &str, props: BlockProps) -> bool {
        let next = tree::replace_block_props(&self.template, id, props);
        self.commit(next)
    }

    /// Move `id` to just before `over_id`
    pub fn move_block(&mut self, id: &str, over_id: &str) -> bool {
        let next = tree::move_block(&self.template, id, over_id);
        self.commit(next)
    }

    pub fn move_block_into(&mut self, id: &str, parent_id: Option<&str>, index: Option<usize>) -> bool {
        let next = tree::move_block_into(&self.template, id, parent_id, index);
        self.commit(next)
    }

    pub fn move_block_into_column(
        &mut self,
        id: &str,
        columns_id: &str,
        column: usize,
        position: Option<usize>,
    ) -> bool {
        let next = tree::move_block_into_column(&self.template, id, columns_id, column, position);
        self.commit(next)
    }

    /// Remove a block and its subtree; clears the selection if it pointed into it
    pub fn delete_block(&mut self, id: &str) -> bool {
        let next = tree::delete_block(&self.template, id);
        self.commit(next)
    }

    /// Select a block by id, or clear the selection. Unknown ids are ignored.
    pub fn select_block(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if find_block(&self.template, id).is_none() => {
                tracing::debug!(id, "cannot select unknown block");
                false
            }
            _ => {
                let changed = self.selected_block_id.as_deref() != id;
                self.selected_block_id = id.map(String::from);
                changed
            }
        }
    }

    /// Record (or clear) the in-progress drag payload
    pub fn set_drag(&mut self, source: Option<DragSource>) {
        self.drag = source;
    }

    /// Finish the current drag gesture.
    ///
    /// Palette drops create a block (which becomes selected); drops of existing blocks
    /// reorder or reparent them. A drop without a target leaves the tree untouched.
    pub fn apply_drop(&mut self, target: Option<DropTarget>) -> bool {
        let Some(source) = self.drag.take() else {
            tracing::debug!("drop without an active drag");
            return false;
        };
        let Some(target) = target else {
            tracing::debug!(?source, "drag ended outside any target");
            return false;
        };

        match source {
            DragSource::Palette(block_type) => {
                let Some((parent, index)) = self.drop_position(&target) else {
                    tracing::warn!(?target, "drop target not found");
                    return false;
                };
                match self.add_block(Block::new(block_type), parent.as_deref(), Some(index)) {
                    Some(id) => {
                        self.select_block(Some(id.as_str()));
                        true
                    }
                    None => false,
                }
            }
            DragSource::Block(id) => match target {
                DropTarget::Block(over_id) => self.reorder(&id, &over_id),
                DropTarget::Column { columns_id, column } => {
                    self.move_block_into_column(&id, &columns_id, column, None)
                }
                DropTarget::Canvas => self.move_block_into(&id, None, None),
            },
        }
    }

    /// Parent and index a new block dropped on `target` should take
    fn drop_position(&self, target: &DropTarget) -> Option<(Option<String>, usize)> {
        match target {
            DropTarget::Canvas => Some((None, self.template.children().len())),
            DropTarget::Block(over_id) => {
                let parent = parent_of(&self.template, over_id)?;
                let siblings = match parent {
                    Some(parent_id) => find_block(&self.template, parent_id)?.children(),
                    None => self.template.children(),
                };
                let index = siblings.iter().position(|b| b.id == *over_id)?;
                Some((parent.map(String::from), index))
            }
            DropTarget::Column { columns_id, column } => {
                let columns = find_block(&self.template, columns_id)?;
                let count = columns_of(columns)?;
                let index = column_insert_index(columns.children().len(), count, *column, None);
                Some((Some(columns_id.clone()), index))
            }
        }
    }

    /// Sortable-list semantics: within one list, dragging down lands after the target
    fn reorder(&mut self, id: &str, over_id: &str) -> bool {
        let same_list = match (parent_of(&self.template, id), parent_of(&self.template, over_id)) {
            (Some(a), Some(b)) if a == b => Some(a.map(String::from)),
            _ => None,
        };
        if let Some(parent) = same_list {
            let siblings = match parent.as_deref() {
                Some(parent_id) => find_block(&self.template, parent_id).map(|b| b.children()),
                None => Some(self.template.children()),
            }
            .unwrap_or(&[]);
            let from = siblings.iter().position(|b| b.id == id);
            let to = siblings.iter().position(|b| b.id == over_id);
            if let (Some(from), Some(to)) = (from, to) {
                if from < to {
                    return self.move_block_into(id, parent.as_deref(), Some(to));
                }
            }
        }
        self.move_block(id, over_id)
    }
}
