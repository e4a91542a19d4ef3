use std::io::Write;

use snap::write::FrameEncoder;

use crate::arena::Arena;
use crate::error::Result;
use crate::node::{NodeId, NULL};
use crate::trie::Tree;

use super::{MAGIC, VERSION};

/// Writes `tree` as a Snappy-framed preorder node stream.
pub(crate) fn dump<W: Write>(tree: &Tree, w: W) -> Result<()> {
    let mut enc = FrameEncoder::new(w);
    enc.write_all(&MAGIC)?;
    enc.write_all(&[VERSION])?;
    enc.write_all(&[tree.ul as u8])?;
    enc.write_all(&[(tree.root != NULL) as u8])?;
    if tree.root != NULL {
        write_node(&mut enc, &tree.arena, tree.root)?;
    }
    // FrameEncoder buffers internally; an explicit flush is required to emit
    // the final (possibly short) Snappy block before `w` is dropped.
    enc.flush()?;
    Ok(())
}

/// Preorder: a one-byte tag (`1` leaf, `0` internal), then the leaf's three
/// fields or the internal node's `level` followed by its two children.
/// `prefix` is never written for internal nodes — see module docs.
fn write_node<W: Write>(w: &mut W, arena: &Arena, id: NodeId) -> Result<()> {
    let n = *arena.get(id);
    if n.is_leaf() {
        w.write_all(&[1u8])?;
        w.write_all(&n.prefix.to_le_bytes())?;
        w.write_all(&[n.incl as u8, n.ul as u8])?;
    } else {
        w.write_all(&[0u8])?;
        w.write_all(&[n.level])?;
        write_node(w, arena, n.left)?;
        write_node(w, arena, n.right)?;
    }
    Ok(())
}
