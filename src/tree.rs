//! Pure tree operations over a [`Template`].
//!
//! Every operation takes the tree by reference and returns a new tree; the input is never
//! mutated. Structural problems (unknown ids, depth bound, bad parent) never surface as
//! errors: the operation logs and returns the tree unchanged.
//!
//! All traversals go through two depth-guarded walkers, [`walk`] for reads and
//! [`rewrite_lists`] for edits, so the [`MAX_TREE_DEPTH`] bound is enforced in one place.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::block::{
    clamp_column_count, generate_block_id, Block, BlockProps, Template, MAX_COLUMNS,
    MIN_COLUMNS,
};

/// Maximum nesting depth of blocks. Root children sit at depth 1.
pub const MAX_TREE_DEPTH: usize = 50;

// ─── Walkers ─────────────────────────────────────────────────────────────────

/// Pre-order, depth-first read traversal. Stops at the first `Break`.
fn walk<'a, T, F>(blocks: &'a [Block], depth: usize, visit: &mut F) -> ControlFlow<T>
where
    F: FnMut(&'a Block, usize) -> ControlFlow<T>,
{
    if depth > MAX_TREE_DEPTH {
        return ControlFlow::Continue(());
    }
    for block in blocks {
        visit(block, depth)?;
        walk(block.children(), depth + 1, visit)?;
    }
    ControlFlow::Continue(())
}

/// Rebuild a sibling list top-down. `edit` receives the parent id (`None` for the root
/// list), the depth of the list's blocks and the list itself, and returns the new list;
/// the walker then descends into the children of every block in the result.
fn rewrite_lists<F>(blocks: Vec<Block>, parent_id: Option<&str>, depth: usize, edit: &mut F) -> Vec<Block>
where
    F: FnMut(Option<&str>, usize, Vec<Block>) -> Vec<Block>,
{
    if depth > MAX_TREE_DEPTH {
        if !blocks.is_empty() {
            tracing::warn!(
                depth,
                max_depth = MAX_TREE_DEPTH,
                "tree depth bound reached, leaving subtree unchanged"
            );
        }
        return blocks;
    }

    let blocks = edit(parent_id, depth, blocks);
    blocks
        .into_iter()
        .map(|mut block| {
            let had_children = block.children.is_some();
            let children = block.children.take().unwrap_or_default();
            let children = rewrite_lists(children, Some(block.id.as_str()), depth + 1, edit);
            block.children = if children.is_empty() && !had_children {
                None
            } else {
                Some(children)
            };
            block
        })
        .collect()
}

fn rewrite<F>(template: &Template, edit: &mut F) -> Template
where
    F: FnMut(Option<&str>, usize, Vec<Block>) -> Vec<Block>,
{
    let mut out = template.clone();
    let children = std::mem::take(&mut out.root.children);
    out.root.children = rewrite_lists(children, None, 1, edit);
    out
}

// ─── Queries ─────────────────────────────────────────────────────────────────

/// Depth-first search by id; the first match wins
pub fn find_block<'a>(template: &'a Template, id: &str) -> Option<&'a Block> {
    find_in(template.children(), id)
}

/// [`find_block`] over an arbitrary block list
pub fn find_in<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    let found = walk(blocks, 1, &mut |block: &'a Block, _| {
        if block.id == id {
            ControlFlow::Break(block)
        } else {
            ControlFlow::Continue(())
        }
    });
    match found {
        ControlFlow::Break(block) => Some(block),
        ControlFlow::Continue(()) => None,
    }
}

/// Id of the block whose children list contains `id`; `Some(None)` means the root list
pub fn parent_of<'a>(template: &'a Template, id: &str) -> Option<Option<&'a str>> {
    if template.children().iter().any(|b| b.id == id) {
        return Some(None);
    }
    let found = walk(template.children(), 1, &mut |block: &'a Block, _| {
        if block.children().iter().any(|c| c.id == id) {
            ControlFlow::Break(block.id.as_str())
        } else {
            ControlFlow::Continue(())
        }
    });
    match found {
        ControlFlow::Break(parent) => Some(Some(parent)),
        ControlFlow::Continue(()) => None,
    }
}

/// Every id in the tree, in pre-order (duplicates included)
pub fn collect_ids(template: &Template) -> Vec<&str> {
    let mut ids = Vec::new();
    let _ = walk(template.children(), 1, &mut |block, _| {
        ids.push(block.id.as_str());
        ControlFlow::<()>::Continue(())
    });
    ids
}

/// First id that occurs more than once, if any
pub fn first_duplicate_id(template: &Template) -> Option<&str> {
    let mut seen = HashSet::new();
    collect_ids(template).into_iter().find(|id| !seen.insert(*id))
}

/// Deepest block level in the tree (0 for an empty tree), capped at the depth bound
pub fn tree_depth(template: &Template) -> usize {
    let mut max = 0;
    let _ = walk(template.children(), 1, &mut |_: &Block, depth| {
        max = max.max(depth);
        ControlFlow::<()>::Continue(())
    });
    max
}

/// True when some block sits below [`MAX_TREE_DEPTH`]
pub fn exceeds_depth(template: &Template) -> bool {
    walk(template.children(), 1, &mut |block: &Block, depth| {
        if depth == MAX_TREE_DEPTH && !block.children().is_empty() {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })
    .is_break()
}

/// Number of levels in a block's subtree, the block itself included
pub fn subtree_height(block: &Block) -> usize {
    fn height(block: &Block, budget: usize) -> usize {
        if budget == 0 {
            return 1;
        }
        1 + block
            .children()
            .iter()
            .map(|c| height(c, budget - 1))
            .max()
            .unwrap_or(0)
    }
    height(block, MAX_TREE_DEPTH)
}

// ─── Id uniqueness ───────────────────────────────────────────────────────────

fn reassign_ids(block: &mut Block, taken: &mut HashSet<String>, depth: usize) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    if !taken.insert(block.id.clone()) {
        let fresh = generate_block_id(block.block_type().as_str());
        tracing::debug!(old = %block.id, new = %fresh, "block id collision, assigning fresh id");
        block.id = fresh.clone();
        taken.insert(fresh);
    }
    if let Some(children) = block.children.as_mut() {
        for child in children {
            reassign_ids(child, taken, depth + 1);
        }
    }
}

/// Give fresh ids to any node of `block` whose id is already in `taken`
pub fn with_unique_ids(mut block: Block, taken: &HashSet<String>) -> Block {
    let mut taken = taken.clone();
    reassign_ids(&mut block, &mut taken, 1);
    block
}

/// Re-establish id uniqueness across the tree; the first occurrence of an id keeps it
pub fn ensure_unique_ids(template: &Template) -> Template {
    let mut out = template.clone();
    let mut taken = HashSet::new();
    for block in &mut out.root.children {
        reassign_ids(block, &mut taken, 1);
    }
    out
}

// ─── Placement ───────────────────────────────────────────────────────────────

enum Anchor<'a> {
    /// Into the children of `parent_id` (root when `None`) at `index` (append when `None`)
    Into {
        parent_id: Option<&'a str>,
        index: Option<usize>,
    },
    /// Immediately before the sibling holding this id
    Before(&'a str),
}

/// Insert `block` at `anchor`; `None` when the anchor does not exist or the depth bound
/// would be exceeded
fn place(template: &Template, block: Block, anchor: Anchor<'_>) -> Option<Template> {
    let height = subtree_height(&block);
    let mut pending = Some(block);
    let mut too_deep = false;

    let out = rewrite(template, &mut |parent, depth, mut list| {
        if pending.is_none() {
            return list;
        }
        let at = match &anchor {
            Anchor::Into { parent_id, index } if parent == *parent_id => {
                Some(index.map_or(list.len(), |i| i.min(list.len())))
            }
            Anchor::Before(over_id) => list.iter().position(|b| b.id == *over_id),
            Anchor::Into { .. } => None,
        };
        if let Some(at) = at {
            if depth + height - 1 > MAX_TREE_DEPTH {
                too_deep = true;
            } else if let Some(block) = pending.take() {
                list.insert(at, block);
            }
        }
        list
    });

    if too_deep {
        tracing::warn!(max_depth = MAX_TREE_DEPTH, "insertion would exceed the depth bound, ignoring");
        return None;
    }
    if pending.is_some() {
        return None;
    }
    Some(out)
}

// ─── Mutations ───────────────────────────────────────────────────────────────

/// Insert a new block under `parent_id` (root when `None`) at `index` (append when `None`).
///
/// Colliding ids inside `block` are replaced with fresh ones, so inserting never moves or
/// duplicates an existing node. Unknown parents and depth overflow leave the tree as is.
pub fn insert_block(
    template: &Template,
    block: Block,
    parent_id: Option<&str>,
    index: Option<usize>,
) -> Template {
    let taken: HashSet<String> = collect_ids(template).into_iter().map(String::from).collect();
    let block = with_unique_ids(block, &taken);
    match place(template, block, Anchor::Into { parent_id, index }) {
        Some(out) => out,
        None => {
            tracing::warn!(?parent_id, "insert target not found, tree unchanged");
            template.clone()
        }
    }
}

/// Shallow-merge `patch` into the props of block `id`.
/// Unknown ids and patches that do not fit the block type are ignored.
pub fn update_block_props(template: &Template, id: &str, patch: &Map<String, Value>) -> Template {
    let mut found = false;
    let out = rewrite(template, &mut |_, _, mut list| {
        if found {
            return list;
        }
        if let Some(block) = list.iter_mut().find(|b| b.id == id) {
            found = true;
            match block.props.merged(patch) {
                Ok(props) => block.props = props,
                Err(e) => tracing::warn!(id, error = %e, "props patch rejected"),
            }
        }
        list
    });
    if !found {
        tracing::debug!(id, "update target not found");
    }
    out
}

/// Replace the props of block `id` wholesale; the block type may not change
pub fn replace_block_props(template: &Template, id: &str, props: BlockProps) -> Template {
    let mut pending = Some(props);
    rewrite(template, &mut |_, _, mut list| {
        if let Some(block) = list.iter_mut().find(|b| b.id == id) {
            if let Some(props) = pending.take() {
                if props.block_type() == block.block_type() {
                    block.props = props;
                } else {
                    tracing::warn!(
                        id,
                        from = %block.block_type(),
                        to = %props.block_type(),
                        "props replacement would change the block type, ignoring"
                    );
                }
            }
        }
        list
    })
}

/// Remove block `id` (with its subtree) wherever it is.
/// Returns the removed subtree and the remaining tree.
pub fn extract_block(template: &Template, id: &str) -> (Option<Block>, Template) {
    let mut found = None;
    let out = rewrite(template, &mut |_, _, mut list| {
        if found.is_none() {
            if let Some(pos) = list.iter().position(|b| b.id == id) {
                found = Some(list.remove(pos));
            }
        }
        list
    });
    (found, out)
}

/// Move block `id` to just before the block `over_id`, at whatever level it sits.
///
/// If `over_id` cannot be found once `id` is removed (unknown, equal to `id`, or inside
/// the moved subtree) the original tree is returned.
pub fn move_block(template: &Template, id: &str, over_id: &str) -> Template {
    if id == over_id {
        return template.clone();
    }
    let (found, rest) = extract_block(template, id);
    let Some(block) = found else {
        tracing::debug!(id, "move source not found");
        return template.clone();
    };
    match place(&rest, block, Anchor::Before(over_id)) {
        Some(out) => out,
        None => {
            tracing::warn!(id, over_id, "move target not found, restoring original position");
            template.clone()
        }
    }
}

/// Move block `id` into the children of `parent_id` (root when `None`) at `index`.
/// A parent inside the moved subtree, or an unknown parent, leaves the tree unchanged.
pub fn move_block_into(
    template: &Template,
    id: &str,
    parent_id: Option<&str>,
    index: Option<usize>,
) -> Template {
    let (found, rest) = extract_block(template, id);
    let Some(block) = found else {
        tracing::debug!(id, "move source not found");
        return template.clone();
    };
    match place(&rest, block, Anchor::Into { parent_id, index }) {
        Some(out) => out,
        None => {
            tracing::warn!(id, ?parent_id, "move target not found, restoring original position");
            template.clone()
        }
    }
}

/// Move block `id` into column `column` of the columns block `columns_id`, at `position`
/// within that column (end of column when `None`).
pub fn move_block_into_column(
    template: &Template,
    id: &str,
    columns_id: &str,
    column: usize,
    position: Option<usize>,
) -> Template {
    let (found, rest) = extract_block(template, id);
    let Some(block) = found else {
        tracing::debug!(id, "move source not found");
        return template.clone();
    };
    let Some((len, count)) = find_block(&rest, columns_id)
        .and_then(|target| Some((target.children().len(), columns_of(target)?)))
    else {
        tracing::warn!(id, columns_id, "column target is not a columns block");
        return template.clone();
    };
    let index = column_insert_index(len, count, column, position);
    match place(&rest, block, Anchor::Into { parent_id: Some(columns_id), index: Some(index) }) {
        Some(out) => out,
        None => {
            tracing::warn!(id, columns_id, "column move rejected, restoring original position");
            template.clone()
        }
    }
}

/// Remove block `id` and its subtree; a no-op when absent
pub fn delete_block(template: &Template, id: &str) -> Template {
    let (found, out) = extract_block(template, id);
    if found.is_none() {
        tracing::debug!(id, "delete target not found");
    }
    out
}

// ─── Column distribution ─────────────────────────────────────────────────────

/// Split `children` into `column_count` contiguous slices of `ceil(len / count)` items each;
/// trailing columns take the remainder and may be empty. `column_count` is clamped to the
/// supported range.
pub fn redistribute_columns(children: &[Block], column_count: usize) -> Vec<&[Block]> {
    let count = column_count.clamp(MIN_COLUMNS, MAX_COLUMNS);
    let len = children.len();
    let per_column = len.div_ceil(count);
    (0..count)
        .map(|i| {
            let start = (i * per_column).min(len);
            let end = (start + per_column).min(len);
            &children[start..end]
        })
        .collect()
}

/// Flat index into a columns block's children for "column `column`, `position` within it".
/// Inverse of [`redistribute_columns`]; `position` past the column's end (or `None`)
/// appends to that column.
pub fn column_insert_index(
    children_len: usize,
    column_count: usize,
    column: usize,
    position: Option<usize>,
) -> usize {
    let count = column_count.clamp(MIN_COLUMNS, MAX_COLUMNS);
    let column = column.min(count - 1);
    let per_column = children_len.div_ceil(count);
    let start = (column * per_column).min(children_len);
    let in_column = (start + per_column).min(children_len) - start;
    start + position.map_or(in_column, |p| p.min(in_column))
}

/// Column count of a columns block's props value, clamped
pub fn columns_of(block: &Block) -> Option<usize> {
    match &block.props {
        BlockProps::Columns(p) => Some(clamp_column_count(p.column_count)),
        _ => None,
    }
}
