//! Bounding Volume Hierarchy (BVH) over mesh triangles.
//!
//! One tree per mesh, stored as an arena of nodes addressed by [`NodeId`].
//! Every leaf holds exactly one triangle. Trees are built once, before any
//! rendering, and are read-only afterwards.

use log::debug;
use pbgi_math::{axis_component, intersect_triangle, Aabb, Interval, Ray, TriangleHit, Vec3};

use crate::mesh::Mesh;

/// Flat geometry (e.g. an axis-aligned quad) still gets a box with volume.
const BOUNDS_PADDING: f32 = 1e-4;

/// Index of a node inside a hierarchy arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The root is always the first node allocated.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Split `items` in two around the median of `position(item)` along the
/// longest axis of their bounding box.
///
/// The median is the element at `len / 2` of the sorted coordinates. Items
/// strictly below it go left, strictly above go right, and items exactly on
/// it alternate between right and left (first one right). With two or more
/// items neither half is ever empty. The order of items inside each half
/// follows their input order, so the split is deterministic.
pub fn median_split<T, F>(items: &[T], position: F) -> (Vec<T>, Vec<T>)
where
    T: Copy,
    F: Fn(&T) -> Vec3,
{
    let bounds = Aabb::enclosing(items.iter().map(&position));
    let axis = bounds.longest_axis();

    let mut coords: Vec<f32> = items
        .iter()
        .map(|item| axis_component(position(item), axis))
        .collect();
    coords.sort_unstable_by(f32::total_cmp);
    let median = coords[items.len() / 2];

    let mut left = Vec::with_capacity(items.len() / 2 + 1);
    let mut right = Vec::with_capacity(items.len() / 2 + 1);
    let mut equal_goes_right = true;

    for item in items {
        let c = axis_component(position(item), axis);
        if c < median {
            left.push(*item);
        } else if c > median {
            right.push(*item);
        } else {
            if equal_goes_right {
                right.push(*item);
            } else {
                left.push(*item);
            }
            equal_goes_right = !equal_goes_right;
        }
    }

    (left, right)
}

/// Node of a [`TriangleBvh`].
#[derive(Debug, Clone, PartialEq)]
pub enum BvhNode {
    /// Tree built from a mesh without triangles.
    Empty,
    /// Exactly one triangle of the owning mesh.
    Leaf {
        triangle: u32,
        indices: [u32; 3],
        bounds: Aabb,
    },
    /// Two children plus the box enclosing both.
    Internal {
        left: NodeId,
        right: NodeId,
        bounds: Aabb,
    },
}

impl BvhNode {
    pub fn bounds(&self) -> Aabb {
        match self {
            BvhNode::Empty => Aabb::EMPTY,
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => *bounds,
        }
    }
}

/// Closest intersection against one mesh (or the whole scene).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHit {
    pub t: f32,
    pub hit: TriangleHit,
    pub mesh_index: usize,
    pub triangle_index: usize,
}

/// Median-split binary tree over the triangles of a single mesh.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    mesh_index: usize,
}

impl TriangleBvh {
    /// Build the hierarchy for `mesh`.
    ///
    /// Uses an explicit work stack, so deep trees cannot overflow the call
    /// stack. A mesh without triangles yields a single [`BvhNode::Empty`].
    pub fn build(mesh: &Mesh, mesh_index: usize) -> Self {
        if mesh.triangles.is_empty() {
            return Self {
                nodes: vec![BvhNode::Empty],
                mesh_index,
            };
        }

        let mut nodes = Vec::with_capacity(2 * mesh.triangles.len());
        nodes.push(BvhNode::Empty);

        let all: Vec<u32> = (0..mesh.triangles.len() as u32).collect();
        let mut stack: Vec<(NodeId, Vec<u32>)> = vec![(NodeId::ROOT, all)];

        while let Some((id, triangles)) = stack.pop() {
            let bounds = Aabb::enclosing(
                triangles
                    .iter()
                    .flat_map(|&t| mesh.triangle(t as usize)),
            )
            .padded(BOUNDS_PADDING);

            if triangles.len() == 1 {
                let triangle = triangles[0];
                nodes[id.index()] = BvhNode::Leaf {
                    triangle,
                    indices: mesh.triangles[triangle as usize],
                    bounds,
                };
                continue;
            }

            let (left_set, right_set) =
                median_split(&triangles, |&t| mesh.barycenter(mesh.triangles[t as usize]));

            let left = NodeId(nodes.len() as u32);
            nodes.push(BvhNode::Empty);
            let right = NodeId(nodes.len() as u32);
            nodes.push(BvhNode::Empty);

            nodes[id.index()] = BvhNode::Internal {
                left,
                right,
                bounds,
            };
            stack.push((right, right_set));
            stack.push((left, left_set));
        }

        debug!(
            "BVH for '{}': {} triangles, {} nodes",
            mesh.name,
            mesh.triangles.len(),
            nodes.len()
        );

        Self { nodes, mesh_index }
    }

    pub fn root(&self) -> &BvhNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &BvhNode {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn mesh_index(&self) -> usize {
        self.mesh_index
    }

    /// Triangle indices stored in the leaves, in arena order.
    pub fn leaf_triangles(&self) -> Vec<u32> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                BvhNode::Leaf { triangle, .. } => Some(*triangle),
                _ => None,
            })
            .collect()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_triangles().len()
    }

    /// Closest triangle hit by `ray`, if any.
    ///
    /// The root is always entered; every other internal node is skipped when
    /// the ray misses its box before the closest hit found so far. Equal
    /// distances keep the first triangle found (left subtree first).
    pub fn hit(&self, mesh: &Mesh, ray: &Ray) -> Option<MeshHit> {
        let mut closest: Option<MeshHit> = None;
        let mut closest_t = f32::INFINITY;
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            match &self.nodes[id.index()] {
                BvhNode::Empty => {}
                BvhNode::Leaf {
                    triangle, indices, ..
                } => {
                    if let Some(hit) = intersect_triangle(ray, mesh.vertices(*indices)) {
                        if hit.t < closest_t {
                            closest_t = hit.t;
                            closest = Some(MeshHit {
                                t: hit.t,
                                hit,
                                mesh_index: self.mesh_index,
                                triangle_index: *triangle as usize,
                            });
                        }
                    }
                }
                BvhNode::Internal {
                    left,
                    right,
                    bounds,
                } => {
                    if id != NodeId::ROOT
                        && bounds.hit(ray, Interval::new(0.0, closest_t)).is_none()
                    {
                        continue;
                    }
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }

        closest
    }
}

/// The per-mesh trees of a scene.
#[derive(Debug, Clone, Default)]
pub struct SceneBvh {
    trees: Vec<TriangleBvh>,
}

impl SceneBvh {
    pub fn build(meshes: &[Mesh]) -> Self {
        let trees = meshes
            .iter()
            .enumerate()
            .map(|(index, mesh)| TriangleBvh::build(mesh, index))
            .collect();
        Self { trees }
    }

    pub fn trees(&self) -> &[TriangleBvh] {
        &self.trees
    }

    pub fn node_count(&self) -> usize {
        self.trees.iter().map(TriangleBvh::node_count).sum()
    }

    /// Globally closest hit across all meshes. Ties keep the lower mesh index.
    pub fn hit(&self, meshes: &[Mesh], ray: &Ray) -> Option<MeshHit> {
        let mut closest: Option<MeshHit> = None;
        for (tree, mesh) in self.trees.iter().zip(meshes) {
            if let Some(hit) = tree.hit(mesh, ray) {
                if closest.map_or(true, |c| hit.t < c.t) {
                    closest = Some(hit);
                }
            }
        }
        closest
    }
}
