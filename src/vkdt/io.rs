//! The VKDT on-disk format (§6): big-endian header, then `node_count` packed
//! 16-bit nodes. Resolves the Open Questions left by `writeToBuffer` being
//! declared-but-unimplemented and the non-packed load path being
//! unimplemented in the source (see `SPEC_FULL.md` §13).

use std::io::{Read, Write};

use crate::error::{Result, VkdtError};
use crate::geom::ICuboid;
use crate::vkdt::node::PackedNode;
use crate::vkdt::tree::TreeData;
use crate::V3c;

const VERSION: [u8; 3] = [1, 0, 0];
const MAX_NODE_COUNT: u32 = 1 << 25;

struct Header {
    tree_id: u32,
    node_count: u32,
    bounds: ICuboid,
}

fn write_i32(out: &mut impl Write, value: i32) -> Result<()> {
    out.write_all(&value.to_be_bytes())?;
    Ok(())
}

fn read_i32(input: &mut impl Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

fn write_header(out: &mut impl Write, header: &Header) -> Result<()> {
    out.write_all(&VERSION)?;
    out.write_all(&[0u8])?; // padding
    out.write_all(&header.tree_id.to_be_bytes())?;
    out.write_all(&header.node_count.to_be_bytes())?;
    for axis in 0..3 {
        write_i32(out, header.bounds.origin.component(axis))?;
    }
    for axis in 0..3 {
        write_i32(out, header.bounds.extent.component(axis))?;
    }
    Ok(())
}

fn read_header(input: &mut impl Read) -> Result<Header> {
    let mut version = [0u8; 3];
    input.read_exact(&mut version)?;
    let mut padding = [0u8; 1];
    input.read_exact(&mut padding)?;

    let mut tree_id_buf = [0u8; 4];
    input.read_exact(&mut tree_id_buf)?;
    let tree_id = u32::from_be_bytes(tree_id_buf);

    let mut count_buf = [0u8; 4];
    input.read_exact(&mut count_buf)?;
    let node_count = u32::from_be_bytes(count_buf);
    if node_count > MAX_NODE_COUNT {
        return Err(VkdtError::InvalidInput(format!(
            "node_count {node_count} exceeds the 2^25 size guard"
        )));
    }

    let mut origin = V3c::new(0, 0, 0);
    for axis in 0..3 {
        origin.set_component(axis, read_i32(input)?);
    }
    let mut extent = V3c::new(0, 0, 0);
    for axis in 0..3 {
        extent.set_component(axis, read_i32(input)?);
    }

    Ok(Header {
        tree_id,
        node_count,
        bounds: ICuboid::new(origin, extent),
    })
}

/// Depth-first preorder (node, then its whole left subtree, then its whole
/// right subtree) -- the order the on-disk format stores nodes in.
fn serialize_preorder(tree: &TreeData) -> Vec<PackedNode> {
    let mut out = Vec::with_capacity(tree.node_count());
    let mut stack = vec![0usize];
    while let Some(index) = stack.pop() {
        let node = tree.geometry[index];
        out.push(node);
        if !node.is_leaf() {
            stack.push(tree.right_child_index(index));
            stack.push(tree.left_child_index(index));
        }
    }
    out
}

/// Writes `tree` to `out` in the §6 on-disk format. Only packed trees can be
/// written; this crate never builds non-packed trees with `should_pack_nodes
/// = false` intending to serialize them.
pub fn write_tree(out: &mut impl Write, tree: &TreeData, tree_id: u32) -> Result<()> {
    if !tree.is_packed {
        return Err(VkdtError::Unsupported(
            "writing a non-packed tree is not supported".into(),
        ));
    }

    let header = Header {
        tree_id,
        node_count: tree.node_count() as u32,
        bounds: tree.bounds,
    };
    write_header(out, &header)?;

    for node in serialize_preorder(tree) {
        out.write_all(&node.0.to_be_bytes())?;
    }
    Ok(())
}

/// Reads a packed tree from `input`. The loader recovers the packed layout
/// by re-pairing siblings as it walks the preorder sequence, writing the
/// root to index 0 and each internal node's descendant entry to the
/// post-pairing index of its left child.
pub fn read_tree(input: &mut impl Read) -> Result<TreeData> {
    let header = read_header(input)?;
    let node_count = header.node_count as usize;

    let mut preorder = Vec::with_capacity(node_count);
    for _ in 0..node_count {
        let mut buf = [0u8; 2];
        input.read_exact(&mut buf)?;
        preorder.push(PackedNode(u16::from_be_bytes(buf)));
    }

    let mut geometry = vec![PackedNode::default(); node_count];
    let mut descendants = vec![-1i32; node_count];
    let mut cursor = 0usize;
    let mut next_free = 1usize;
    let mut stack = vec![0usize];

    while let Some(output_slot) = stack.pop() {
        let raw = preorder.get(cursor).copied().ok_or_else(|| {
            VkdtError::Unsupported("preorder stream ended before all nodes were placed".into())
        })?;
        cursor += 1;
        geometry[output_slot] = raw;

        if raw.is_leaf() {
            continue;
        }

        let left = next_free;
        next_free += 2;
        if next_free > node_count + 1 {
            return Err(VkdtError::Unsupported(
                "packed tree file is internally inconsistent: more children than node_count allows".into(),
            ));
        }
        descendants[output_slot] = left as i32;
        stack.push(left + 1);
        stack.push(left);
    }

    Ok(TreeData {
        bounds: header.bounds,
        geometry,
        descendants: Some(descendants),
        properties: None,
        max_depth_reached: 0,
        is_packed: true,
    })
}

/// Per §9's Open Question: the unpacked-tree load path was never finished
/// in the source. This crate rejects it outright rather than guess at an
/// implementation.
pub fn read_unpacked_tree(_input: &mut impl Read) -> Result<TreeData> {
    Err(VkdtError::Unsupported(
        "loading a non-packed serialized tree is not implemented".into(),
    ))
}
