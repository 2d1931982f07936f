//! Tree of rigid sub-models linked at tags.
//!
//! Nodes live in a flat arena and refer to each other by [`NodeId`]. A child
//! stores its parent id and the parent tag it hangs from; a parent keeps its
//! children ordered by tag index. Ids are never reused, so a removed node's
//! id reports [`Md3Error::UnknownNode`].

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::animation::cursor::AnimationCursor;
use crate::error::{Md3Error, Result};
use crate::model::Md3Model;
use crate::skin::Skin;
use crate::texture::Md3Texture;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Index of a node in a [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Body part a model plays, taken from its load name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelRole {
    /// Name contains "lower"
    pub legs: bool,
    /// Name contains "upper"
    pub torso: bool,
}

impl ModelRole {
    pub fn from_load_name(name: &str) -> Self {
        let name = name.to_lowercase();
        Self {
            legs: name.contains("lower"),
            torso: name.contains("upper"),
        }
    }
}

/// A model placed in the scene with its playback position
#[derive(Debug, Clone)]
pub struct SceneNode {
    pub model: Md3Model,
    pub cursor: AnimationCursor,
    parent: Option<(NodeId, usize)>,
    children: BTreeMap<usize, NodeId>,
}

impl SceneNode {
    fn new(model: Md3Model) -> Self {
        let cursor = AnimationCursor::initial(model.frame_count());
        Self {
            model,
            cursor,
            parent: None,
            children: BTreeMap::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent.map(|(id, _)| id)
    }

    /// Tag of the parent this node is attached to
    pub fn parent_tag(&self) -> Option<usize> {
        self.parent.map(|(_, tag)| tag)
    }

    /// Children with their tag indices, ascending
    pub fn children(&self) -> impl Iterator<Item = (usize, NodeId)> + '_ {
        self.children.iter().map(|(&tag, &id)| (tag, id))
    }

    pub fn child_at(&self, tag_index: usize) -> Option<NodeId> {
        self.children.get(&tag_index).copied()
    }

    pub fn role(&self) -> ModelRole {
        ModelRole::from_load_name(&self.model.load_name)
    }
}

/// Arena of scene nodes
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: Vec<Option<SceneNode>>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unattached model
    pub fn insert(&mut self, model: Md3Model) -> NodeId {
        let id = NodeId(self.nodes.len());
        debug!("Scene: inserted '{}' as {}", model.load_name, id);
        self.nodes.push(Some(SceneNode::new(model)));
        id
    }

    pub fn get(&self, id: NodeId) -> Result<&SceneNode> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(Md3Error::UnknownNode(id.0))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(Md3Error::UnknownNode(id.0))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_ok()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live nodes without a parent
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().enumerate().filter_map(|(i, n)| match n {
            Some(node) if node.parent.is_none() => Some(NodeId(i)),
            _ => None,
        })
    }

    /// Hang `child` from tag `tag_index` of `parent`.
    ///
    /// A child that already has a parent is detached first. A node already
    /// attached at that tag is detached and returned; it becomes a root.
    /// Attaching an ancestor below one of its descendants creates a cycle
    /// and must not be done.
    pub fn attach(
        &mut self,
        parent: NodeId,
        tag_index: usize,
        child: NodeId,
    ) -> Result<Option<NodeId>> {
        let tag_count = self.get(parent)?.model.tag_count();
        self.get(child)?;
        if tag_index >= tag_count {
            return Err(Md3Error::TagIndexOutOfRange {
                index: tag_index,
                count: tag_count,
            });
        }

        if self.get(child)?.parent.is_some() {
            self.detach(child)?;
        }

        let displaced = self.get_mut(parent)?.children.insert(tag_index, child);
        if let Some(old) = displaced {
            self.get_mut(old)?.parent = None;
        }
        self.get_mut(child)?.parent = Some((parent, tag_index));

        debug!("Scene: attached {} to {} at tag {}", child, parent, tag_index);
        Ok(displaced)
    }

    /// Unlink `child` from its parent; it becomes a root
    pub fn detach(&mut self, child: NodeId) -> Result<()> {
        let Some((parent, tag)) = self.get_mut(child)?.parent.take() else {
            return Ok(());
        };
        let siblings = &mut self.get_mut(parent)?.children;
        if siblings.get(&tag) == Some(&child) {
            siblings.remove(&tag);
        }
        debug!("Scene: detached {} from {}", child, parent);
        Ok(())
    }

    /// Node ids below and including `root`, depth first, parents before
    /// children, children by ascending tag index
    pub fn subtree(&self, root: NodeId) -> Result<Vec<NodeId>> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = self.get(id)?;
            order.push(id);
            stack.extend(node.children.values().rev());
        }
        Ok(order)
    }

    /// Call `f` on every node of the subtree at `root`, pre-order
    pub fn visit<F>(&self, root: NodeId, mut f: F) -> Result<()>
    where
        F: FnMut(NodeId, &SceneNode),
    {
        for id in self.subtree(root)? {
            f(id, self.get(id)?);
        }
        Ok(())
    }

    /// Like [`SceneGraph::visit`] with mutable access to each node
    pub fn visit_mut<F>(&mut self, root: NodeId, mut f: F) -> Result<()>
    where
        F: FnMut(NodeId, &mut SceneNode),
    {
        for id in self.subtree(root)? {
            f(id, self.get_mut(id)?);
        }
        Ok(())
    }

    /// Remove `root` and everything attached below it.
    ///
    /// Returns the removed models, `root` first.
    pub fn remove(&mut self, root: NodeId) -> Result<Vec<Md3Model>> {
        self.detach(root)?;
        let ids = self.subtree(root)?;
        let mut models = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.nodes.get_mut(id.0).and_then(Option::take) {
                models.push(node.model);
            }
        }
        debug!("Scene: removed {} node(s) at {}", models.len(), root);
        Ok(models)
    }

    /// Set every mesh texture below `root` from `skin`.
    ///
    /// Meshes the skin has no entry for keep their textures. A mesh
    /// without texture slots receives one. Returns the number of meshes
    /// changed.
    pub fn apply_skin(&mut self, root: NodeId, skin: &Skin) -> Result<usize> {
        let mut changed = 0;
        self.visit_mut(root, |_, node| {
            for mesh in &mut node.model.meshes {
                if let Some(texture) = skin.texture(mesh.name()) {
                    set_textures(&mut mesh.textures, texture);
                    changed += 1;
                }
            }
        })?;
        Ok(changed)
    }

    /// Put `texture` on every mesh below `root`
    pub fn apply_texture(&mut self, root: NodeId, texture: &Md3Texture) -> Result<usize> {
        let mut changed = 0;
        self.visit_mut(root, |_, node| {
            for mesh in &mut node.model.meshes {
                set_textures(&mut mesh.textures, texture);
                changed += 1;
            }
        })?;
        Ok(changed)
    }

    /// Counts and mesh names of every model below `root`
    pub fn summary(&self, root: NodeId) -> Result<SceneSummary> {
        let mut summary = SceneSummary::default();
        self.visit(root, |_, node| {
            let model = &node.model;
            let entry = NodeSummary {
                load_name: model.load_name.clone(),
                tag_count: model.tag_count(),
                frame_count: model.frame_count(),
                vertex_count: model.vertex_total(),
                triangle_count: model.triangle_total(),
                mesh_names: model.meshes.iter().map(|m| m.name().to_string()).collect(),
            };
            summary.total_vertices += entry.vertex_count;
            summary.total_triangles += entry.triangle_count;
            summary.nodes.push(entry);
        })?;
        Ok(summary)
    }
}

fn set_textures(slots: &mut Vec<Md3Texture>, texture: &Md3Texture) {
    if slots.is_empty() {
        slots.push(texture.clone());
    } else {
        for slot in slots.iter_mut() {
            slot.clone_from(texture);
        }
    }
}

/// Properties of one model in a [`SceneSummary`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct NodeSummary {
    pub load_name: String,
    pub tag_count: usize,
    pub frame_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub mesh_names: Vec<String>,
}

/// Properties of a scene subtree, pre-order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct SceneSummary {
    pub nodes: Vec<NodeSummary>,
    pub total_vertices: usize,
    pub total_triangles: usize,
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            writeln!(f, "{}", node.load_name)?;
            writeln!(
                f,
                "     {}, {}, {}, {},",
                plural(node.tag_count, "tag", "tags"),
                plural(node.frame_count, "animation frame", "animation frames"),
                plural(node.vertex_count, "vertex", "vertices"),
                plural(node.triangle_count, "triangle", "triangles"),
            )?;
            let meshes = plural(node.mesh_names.len(), "mesh", "meshes");
            writeln!(f, "     {meshes}:")?;
            writeln!(f, "         {}", node.mesh_names.join(", "))?;
        }
        writeln!(f)?;
        write!(
            f,
            "Totals: {} vertices, {} triangles",
            self.total_vertices, self.total_triangles
        )
    }
}
