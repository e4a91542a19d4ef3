use std::io::Read;

use snap::read::FrameDecoder;

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::node::{Node, NodeId, NULL};
use crate::trie::{build_internal_from_children, Tree};

use super::{MAGIC, VERSION};

/// Reads back a tree written by [`super::write::dump`].
pub(crate) fn load<R: Read>(r: R) -> Result<Tree> {
    let mut dec = FrameDecoder::new(r);

    let mut magic = [0u8; 4];
    dec.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(Error::CorruptSerialization(format!("bad magic {magic:?}")));
    }

    let mut byte = [0u8; 1];
    dec.read_exact(&mut byte)?;
    if byte[0] != VERSION {
        return Err(Error::CorruptSerialization(format!("unsupported version {}", byte[0])));
    }

    dec.read_exact(&mut byte)?;
    let ul = byte[0] != 0;

    dec.read_exact(&mut byte)?;
    let has_root = byte[0] != 0;

    let mut arena = Arena::default();
    let root = if has_root { read_node(&mut dec, &mut arena)? } else { NULL };

    Ok(Tree { arena, root, ul })
}

fn read_node<R: Read>(r: &mut R, arena: &mut Arena) -> Result<NodeId> {
    let mut tag = [0u8; 1];
    r.read_exact(&mut tag)?;
    match tag[0] {
        1 => {
            let mut prefix_buf = [0u8; 8];
            r.read_exact(&mut prefix_buf)?;
            let prefix = u64::from_le_bytes(prefix_buf);
            let mut flags = [0u8; 2];
            r.read_exact(&mut flags)?;
            Ok(arena.alloc(Node::leaf(prefix, flags[1] != 0, flags[0] != 0)))
        }
        0 => {
            let mut level = [0u8; 1];
            r.read_exact(&mut level)?;
            let left = read_node(r, arena)?;
            let right = read_node(r, arena)?;
            Ok(build_internal_from_children(arena, level[0], left, right))
        }
        other => Err(Error::CorruptSerialization(format!("unknown node tag {other}"))),
    }
}
