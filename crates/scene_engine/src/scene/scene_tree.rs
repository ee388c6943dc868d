//! Scene tree: cached world transforms and bounds over a [`SceneDocument`]
//!
//! The tree owns the document and a parallel cache table indexed by
//! [`NodeId`]. Changing a node's local transform marks it and every descendant
//! dirty; world transforms are recomputed lazily on the next query and world
//! bounds on the next bounds pass.

use bitflags::bitflags;
use log::{info, trace};

use crate::foundation::math::{LocalTransform, Mat4};
use crate::scene::bounds::Aabb;
use crate::scene::document::{NodeId, NodeKind, SceneDocument};

bitflags! {
    /// Which cached values of a node may be stale
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// Cached world transform must be recomputed
        const TRANSFORM = 1 << 0;
        /// Cached world bounds must be recomputed
        const BOUNDS = 1 << 1;
    }
}

#[derive(Debug, Clone)]
struct NodeCache {
    world: Mat4,
    aabb: Aabb,
    dirty: DirtyFlags,
}

impl Default for NodeCache {
    fn default() -> Self {
        Self {
            world: Mat4::identity(),
            aabb: Aabb::empty(),
            dirty: DirtyFlags::all(),
        }
    }
}

/// Animatable scene hierarchy with lazily recomputed world state
#[derive(Debug)]
pub struct SceneTree {
    document: SceneDocument,
    parents: Vec<Option<NodeId>>,
    cache: Vec<NodeCache>,
}

impl SceneTree {
    /// Take ownership of a validated document; every cache starts dirty
    pub fn new(document: SceneDocument) -> Self {
        let mut parents = vec![None; document.nodes.len()];
        for (index, node) in document.nodes.iter().enumerate() {
            for child in &node.children {
                parents[child.index()] = Some(NodeId(index));
            }
        }

        info!(
            "Created scene tree '{}': {} nodes, {} drivers, {} meshes",
            document.scene.name,
            document.nodes.len(),
            document.drivers.len(),
            document.meshes.len()
        );

        Self {
            cache: vec![NodeCache::default(); document.nodes.len()],
            document,
            parents,
        }
    }

    /// The underlying document
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    /// Parent of a node, `None` for roots and detached nodes
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.parents[node.index()]
    }

    /// Current local transform
    pub fn local_transform(&self, node: NodeId) -> &LocalTransform {
        &self.document.nodes[node.index()].local
    }

    /// Whether the cached world transform is stale
    pub fn is_transform_dirty(&self, node: NodeId) -> bool {
        self.cache[node.index()].dirty.contains(DirtyFlags::TRANSFORM)
    }

    /// Whether the cached world bounds are stale
    pub fn is_bounds_dirty(&self, node: NodeId) -> bool {
        self.cache[node.index()].dirty.contains(DirtyFlags::BOUNDS)
    }

    /// World transform of a node, recomputed along the parent chain if stale
    pub fn world_transform(&mut self, node: NodeId) -> Mat4 {
        let index = node.index();
        if !self.cache[index].dirty.contains(DirtyFlags::TRANSFORM) {
            return self.cache[index].world;
        }

        let parent_world = match self.parents[index] {
            Some(parent) => self.world_transform(parent),
            None => Mat4::identity(),
        };
        let world = parent_world * self.document.nodes[index].local.to_matrix();

        let entry = &mut self.cache[index];
        entry.world = world;
        entry.dirty.remove(DirtyFlags::TRANSFORM);
        world
    }

    /// Replace a node's local transform and invalidate its subtree
    pub fn set_local_transform(&mut self, node: NodeId, local: LocalTransform) {
        self.document.nodes[node.index()].local = local;
        self.mark_dirty(node);
    }

    /// Mark a node and all of its descendants dirty
    pub fn mark_dirty(&mut self, node: NodeId) {
        let mut stack = vec![node];
        let mut count = 0usize;
        while let Some(current) = stack.pop() {
            self.cache[current.index()].dirty = DirtyFlags::all();
            stack.extend_from_slice(&self.document.nodes[current.index()].children);
            count += 1;
        }
        trace!("Invalidated {} nodes below '{}'", count, self.document.nodes[node.index()].name);
    }

    /// Mark every node dirty
    pub fn clear_cache(&mut self) {
        for entry in &mut self.cache {
            entry.dirty = DirtyFlags::all();
        }
    }

    /// World bounds of a node's subtree, recomputing whatever is stale below it
    pub fn world_aabb(&mut self, node: NodeId) -> Aabb {
        self.update_bounds(node);
        self.cache[node.index()].aabb
    }

    /// Bring the world bounds of every node reachable from the scene roots up to date
    pub fn update_aabbs(&mut self) {
        for i in 0..self.document.scene.roots.len() {
            let root = self.document.scene.roots[i];
            self.update_bounds(root);
        }
    }

    /// Returns whether the node's bounds were recomputed
    fn update_bounds(&mut self, node: NodeId) -> bool {
        let index = node.index();

        // A recomputed child changes this node's union even if this node was not dirtied.
        let mut child_changed = false;
        for i in 0..self.document.nodes[index].children.len() {
            let child = self.document.nodes[index].children[i];
            child_changed |= self.update_bounds(child);
        }

        if !child_changed && !self.cache[index].dirty.contains(DirtyFlags::BOUNDS) {
            return false;
        }

        let world = self.world_transform(node);
        let node_ref = &self.document.nodes[index];
        let own = match node_ref.kind {
            NodeKind::Mesh(mesh) => self.document.meshes[mesh.index()].local_aabb.transformed(&world),
            _ => Aabb::empty(),
        };
        let aabb = node_ref
            .children
            .iter()
            .fold(own, |acc, child| acc.merge(&self.cache[child.index()].aabb));

        let entry = &mut self.cache[index];
        entry.aabb = aabb;
        entry.dirty.remove(DirtyFlags::BOUNDS);
        true
    }
}

impl Drop for SceneTree {
    fn drop(&mut self) {
        info!("Destroyed scene tree '{}'", self.document.scene.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Quat, Vec3};
    use crate::scene::document::{DocumentBuilder, MeshDesc, NodeDesc};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
    }

    /// root -> (a -> (a1, a2), b), detached
    fn sample_tree() -> SceneTree {
        let doc = DocumentBuilder::new("sample")
            .mesh(MeshDesc::new("cube", 0, 36, unit_box()))
            .node(NodeDesc::new("root").with_children(["a", "b"]))
            .node(NodeDesc::new("a").with_translation(Vec3::new(1.0, 0.0, 0.0)).with_children(["a1", "a2"]))
            .node(NodeDesc::new("a1").with_translation(Vec3::new(0.0, 2.0, 0.0)).with_mesh("cube"))
            .node(NodeDesc::new("a2").with_translation(Vec3::new(0.0, -2.0, 0.0)))
            .node(NodeDesc::new("b").with_translation(Vec3::new(-5.0, 0.0, 0.0)).with_mesh("cube"))
            .node(NodeDesc::new("detached").with_translation(Vec3::new(3.0, 3.0, 3.0)))
            .root("root")
            .build()
            .unwrap();
        SceneTree::new(doc)
    }

    fn id(tree: &SceneTree, name: &str) -> NodeId {
        tree.document().node_by_name(name).unwrap()
    }

    /// Reference product of local matrices along the ancestor chain
    fn direct_world(tree: &SceneTree, node: NodeId) -> Mat4 {
        let local = tree.local_transform(node).to_matrix();
        match tree.parent(node) {
            Some(parent) => direct_world(tree, parent) * local,
            None => local,
        }
    }

    #[test]
    fn test_child_follows_parent() {
        let doc = DocumentBuilder::new("rc")
            .node(NodeDesc::new("R").with_children(["C"]))
            .node(NodeDesc::new("C").with_translation(Vec3::new(1.0, 0.0, 0.0)))
            .root("R")
            .build()
            .unwrap();
        let mut tree = SceneTree::new(doc);
        let r = id(&tree, "R");
        let c = id(&tree, "C");

        assert_relative_eq!(
            tree.world_transform(c),
            Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)),
            epsilon = 1e-6
        );

        tree.set_local_transform(r, LocalTransform::from_translation(Vec3::new(0.0, 5.0, 0.0)));
        assert_relative_eq!(
            tree.world_transform(c),
            Mat4::new_translation(&Vec3::new(1.0, 5.0, 0.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_cache_matches_direct_product_randomized() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let count = 24;

        // Node i > 0 hangs below a random earlier node
        let mut children: Vec<Vec<String>> = vec![Vec::new(); count];
        for i in 1..count {
            let parent = rng.gen_range(0..i);
            children[parent].push(format!("n{}", i));
        }
        let mut builder = DocumentBuilder::new("random").root("n0");
        for (i, kids) in children.into_iter().enumerate() {
            builder = builder.node(NodeDesc::new(format!("n{}", i)).with_children(kids));
        }
        let mut tree = SceneTree::new(builder.build().unwrap());

        for _ in 0..200 {
            let target = NodeId(rng.gen_range(0..count));
            let local = LocalTransform::new(
                Vec3::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0)),
                Quat::from_euler_angles(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0)),
                Vec3::new(rng.gen_range(0.5..1.5), rng.gen_range(0.5..1.5), rng.gen_range(0.5..1.5)),
            );
            tree.set_local_transform(target, local);

            // Query a few random nodes so parts of the cache are warm between mutations
            for _ in 0..3 {
                let probe = NodeId(rng.gen_range(0..count));
                let expected = direct_world(&tree, probe);
                assert_relative_eq!(tree.world_transform(probe), expected, epsilon = 1e-3);
            }
        }

        for i in 0..count {
            let expected = direct_world(&tree, NodeId(i));
            assert_relative_eq!(tree.world_transform(NodeId(i)), expected, epsilon = 1e-3);
        }
    }

    #[test]
    fn test_invalidation_is_downward_only() {
        let mut tree = sample_tree();
        for i in 0..tree.document().nodes.len() {
            tree.world_transform(NodeId(i));
        }

        let a = id(&tree, "a");
        tree.set_local_transform(a, LocalTransform::from_translation(Vec3::new(2.0, 0.0, 0.0)));

        assert!(tree.is_transform_dirty(a));
        assert!(tree.is_transform_dirty(id(&tree, "a1")));
        assert!(tree.is_transform_dirty(id(&tree, "a2")));
        assert!(!tree.is_transform_dirty(id(&tree, "root")));
        assert!(!tree.is_transform_dirty(id(&tree, "b")));
        assert!(!tree.is_transform_dirty(id(&tree, "detached")));
    }

    #[test]
    fn test_detached_node_uses_identity_parent() {
        let mut tree = sample_tree();
        let detached = id(&tree, "detached");
        assert_eq!(tree.parent(detached), None);
        assert_relative_eq!(
            tree.world_transform(detached),
            Mat4::new_translation(&Vec3::new(3.0, 3.0, 3.0)),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_bounds_contain_children_and_mesh() {
        let mut tree = sample_tree();
        tree.update_aabbs();

        let root = id(&tree, "root");
        let a = id(&tree, "a");
        let a1 = id(&tree, "a1");
        let b = id(&tree, "b");

        let a1_box = tree.world_aabb(a1);
        assert_relative_eq!(a1_box.min, Vec3::new(0.0, 1.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(a1_box.max, Vec3::new(2.0, 3.0, 1.0), epsilon = 1e-6);

        let root_box = tree.world_aabb(root);
        assert!(root_box.contains(&tree.world_aabb(a)));
        assert!(root_box.contains(&tree.world_aabb(b)));
        assert!(tree.world_aabb(a).contains(&a1_box));
        assert_relative_eq!(root_box.min, Vec3::new(-6.0, -1.0, -1.0), epsilon = 1e-6);
        assert_relative_eq!(root_box.max, Vec3::new(2.0, 3.0, 1.0), epsilon = 1e-6);
        assert!(!tree.is_bounds_dirty(root));
    }

    #[test]
    fn test_empty_subtree_has_empty_bounds() {
        let mut tree = sample_tree();
        tree.update_aabbs();
        assert!(tree.world_aabb(id(&tree, "a2")).is_empty());
    }

    #[test]
    fn test_bounds_follow_moved_descendant() {
        let mut tree = sample_tree();
        tree.update_aabbs();

        let a1 = id(&tree, "a1");
        tree.set_local_transform(a1, LocalTransform::from_translation(Vec3::new(0.0, 10.0, 0.0)));
        assert!(!tree.is_bounds_dirty(id(&tree, "root")));

        tree.update_aabbs();
        let root_box = tree.world_aabb(id(&tree, "root"));
        assert_relative_eq!(root_box.max.y, 11.0, epsilon = 1e-6);
        assert!(root_box.contains(&tree.world_aabb(a1)));
    }

    #[test]
    fn test_clear_cache_marks_everything() {
        let mut tree = sample_tree();
        tree.update_aabbs();
        tree.clear_cache();
        for i in 0..tree.document().nodes.len() {
            assert!(tree.is_transform_dirty(NodeId(i)));
            assert!(tree.is_bounds_dirty(NodeId(i)));
        }
    }
}
