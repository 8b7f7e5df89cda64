//! Bounding Sphere Hierarchy (BSH) over surfels.
//!
//! Same median-split construction as the triangle BVH, applied to surfel
//! positions. Every node carries an enclosing sphere, a normal cone and an
//! aggregate color so a gathering point can treat a far-away cluster as a
//! single emitter.

use std::time::Instant;

use log::info;
use pbgi_core::{median_split, Color, NodeId};
use pbgi_math::{BoundingSphere, Interval, Ray, Vec3};

use crate::point_cloud::PointCloud;
use crate::surfel::Surfel;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BshKind {
    /// Hierarchy over an empty cloud.
    Empty,
    /// Exactly one surfel, by index into [`SurfelHierarchy::surfels`].
    Leaf { surfel: u32 },
    Internal { left: NodeId, right: NodeId },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BshNode {
    pub kind: BshKind,
    /// Encloses every surfel position of the subtree. Leaves use the
    /// surfel's own radius.
    pub sphere: BoundingSphere,
    /// Unit average of the subtree's normals
    pub normal: Vec3,
    /// Largest angle (radians) between `normal` and any surfel normal
    pub cone_angle: f32,
    /// Surfel color for leaves, mean of both children otherwise
    pub color: Color,
}

impl BshNode {
    fn empty() -> Self {
        Self {
            kind: BshKind::Empty,
            sphere: BoundingSphere::default(),
            normal: Vec3::ZERO,
            cone_angle: 0.0,
            color: Color::ZERO,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, BshKind::Leaf { .. })
    }
}

/// Arena hierarchy over a point cloud. Read-only once built.
#[derive(Debug, Clone)]
pub struct SurfelHierarchy {
    nodes: Vec<BshNode>,
    surfels: Vec<Surfel>,
    max_surfel_radius: f32,
}

impl SurfelHierarchy {
    pub fn build(cloud: &PointCloud) -> Self {
        Self::from_surfels(cloud.surfels().to_vec())
    }

    /// Build over `surfels`. An empty input gives a single empty node.
    pub fn from_surfels(surfels: Vec<Surfel>) -> Self {
        let start = Instant::now();
        let max_surfel_radius = surfels.iter().map(|s| s.radius).fold(0.0, f32::max);

        if surfels.is_empty() {
            return Self {
                nodes: vec![BshNode::empty()],
                surfels,
                max_surfel_radius,
            };
        }

        let mut nodes = Vec::with_capacity(2 * surfels.len());
        nodes.push(BshNode::empty());

        let all: Vec<u32> = (0..surfels.len() as u32).collect();
        let mut stack: Vec<(NodeId, Vec<u32>)> = vec![(NodeId::ROOT, all)];

        while let Some((id, members)) = stack.pop() {
            let (normal, cone_angle) = normal_cone(&surfels, &members);

            if members.len() == 1 {
                let surfel = &surfels[members[0] as usize];
                nodes[id.index()] = BshNode {
                    kind: BshKind::Leaf { surfel: members[0] },
                    sphere: BoundingSphere::new(surfel.position, surfel.radius),
                    normal,
                    cone_angle,
                    color: surfel.color,
                };
                continue;
            }

            let positions: Vec<Vec3> = members
                .iter()
                .map(|&i| surfels[i as usize].position)
                .collect();
            let (left_set, right_set) = median_split(&members, |&i| surfels[i as usize].position);

            let left = NodeId(nodes.len() as u32);
            nodes.push(BshNode::empty());
            let right = NodeId(nodes.len() as u32);
            nodes.push(BshNode::empty());

            nodes[id.index()] = BshNode {
                kind: BshKind::Internal { left, right },
                sphere: BoundingSphere::enclosing(&positions),
                normal,
                cone_angle,
                color: Color::ZERO,
            };
            stack.push((right, right_set));
            stack.push((left, left_set));
        }

        // Children always sit after their parent in the arena.
        for index in (0..nodes.len()).rev() {
            if let BshKind::Internal { left, right } = nodes[index].kind {
                nodes[index].color = (nodes[left.index()].color + nodes[right.index()].color) * 0.5;
            }
        }

        info!(
            "Built BSH over {} surfels ({} nodes) in {:.2?}",
            surfels.len(),
            nodes.len(),
            start.elapsed()
        );

        Self {
            nodes,
            surfels,
            max_surfel_radius,
        }
    }

    pub fn root(&self) -> &BshNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &BshNode {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn surfels(&self) -> &[Surfel] {
        &self.surfels
    }

    pub fn surfel(&self, index: u32) -> &Surfel {
        &self.surfels[index as usize]
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Closest surfel disc along `ray`, as `(t, surfel index)`.
    ///
    /// Node spheres only bound surfel centers, so they are inflated by the
    /// largest disc radius before pruning.
    pub fn closest_disc_hit(&self, ray: &Ray) -> Option<(f32, u32)> {
        let mut closest: Option<(f32, u32)> = None;
        let mut closest_t = f32::INFINITY;
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.index()];
            match node.kind {
                BshKind::Empty => {}
                BshKind::Leaf { surfel } => {
                    if let Some(t) = self.surfels[surfel as usize].intersect(ray) {
                        if t < closest_t {
                            closest_t = t;
                            closest = Some((t, surfel));
                        }
                    }
                }
                BshKind::Internal { left, right } => {
                    let bound = BoundingSphere::new(
                        node.sphere.center,
                        node.sphere.radius + self.max_surfel_radius,
                    );
                    if bound.hit(ray, Interval::new(0.0, closest_t)).is_some() {
                        stack.push(right);
                        stack.push(left);
                    }
                }
            }
        }

        closest
    }
}

/// Average normal of `members` and the widest deviation from it.
fn normal_cone(surfels: &[Surfel], members: &[u32]) -> (Vec3, f32) {
    let sum: Vec3 = members.iter().map(|&i| surfels[i as usize].normal).sum();
    let normal = sum.normalize_or_zero();
    if normal == Vec3::ZERO {
        // Opposing normals cancel out: no direction is representative.
        return (Vec3::ZERO, std::f32::consts::PI);
    }

    let cone_angle = members
        .iter()
        .map(|&i| surfels[i as usize].normal.dot(normal).clamp(-1.0, 1.0).acos())
        .fold(0.0, f32::max);
    (normal, cone_angle)
}
