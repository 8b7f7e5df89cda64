//! Micro-buffer: a small hemispherical raster around one shading point.
//!
//! Cell `(i, j)` of an `N × N` buffer covers the offset square centered at
//! `(-1 + (2i + 1) / N, -1 + (2j + 1) / N)` in the tangent plane. An offset
//! `(x, y)` inside the unit disc stands for the direction
//! `(x, y, sqrt(1 - x² - y²))` in the local frame of the shading normal
//! (orthographic projection of the hemisphere). Cells whose center lies
//! outside the disc have no direction and never contribute.
//!
//! Filling happens in three phases: adaptive BSH traversal, an exact ray
//! cast against leaves too large to rasterize, then convolution with the
//! material at the shading point.

use std::f32::consts::PI;

use pbgi_core::{Color, Material, NodeId};
use pbgi_math::{Frame, Ray, Vec2, Vec3};

use crate::bsh::{BshKind, SurfelHierarchy};

/// Nodes closer than this to the shading point have no usable direction.
const MIN_NODE_DISTANCE: f32 = 1e-6;

/// Offsets outside the disc are pulled back to this radius when
/// finite-differencing footprints at the rim.
const RIM_RADIUS: f32 = 0.9999;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub color: Color,
    /// Distance to the closest node written so far
    pub depth: f32,
    /// Node that last won the depth test. Lookup only.
    pub node: Option<NodeId>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            color: Color::ZERO,
            depth: f32::INFINITY,
            node: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MicroBuffer {
    size: usize,
    position: Vec3,
    frame: Frame,
    cells: Vec<Cell>,
    /// Per-cell solid angle, zero for cells without a direction
    solid_angles: Vec<f32>,
    deferred: Vec<NodeId>,
}

impl MicroBuffer {
    /// Empty buffer of `size × size` cells at `position`, oriented by `normal`.
    pub fn new(size: usize, position: Vec3, normal: Vec3) -> Self {
        let solid_angles = (0..size * size)
            .map(|k| cell_footprint(size, k % size, k / size))
            .collect();

        Self {
            size,
            position,
            frame: Frame::from_normal(normal),
            cells: vec![Cell::default(); size * size],
            solid_angles,
            deferred: Vec::new(),
        }
    }

    /// Run all phases for one shading point and return the outgoing radiance.
    pub fn gather(
        size: usize,
        position: Vec3,
        normal: Vec3,
        hierarchy: &SurfelHierarchy,
        material: &Material,
        view_point: Vec3,
    ) -> Color {
        let mut buffer = Self::new(size, position, normal);
        buffer.fill(hierarchy);
        buffer.ray_cast_deferred(hierarchy);
        buffer.convolve(material, view_point)
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn normal(&self) -> Vec3 {
        self.frame.normal
    }

    pub fn cell(&self, i: usize, j: usize) -> Option<&Cell> {
        self.index(i, j).map(|k| &self.cells[k])
    }

    /// Leaves left for the exact ray-cast pass.
    pub fn deferred(&self) -> &[NodeId] {
        &self.deferred
    }

    /// World-space unit direction through the center of cell `(i, j)`.
    pub fn cell_direction(&self, i: usize, j: usize) -> Option<Vec3> {
        self.index(i, j)?;
        hemisphere_direction(cell_offset(self.size, i, j)).map(|d| self.frame.to_world(d))
    }

    /// Solid angle covered by cell `(i, j)`; zero outside the raster or disc.
    pub fn cell_solid_angle(&self, i: usize, j: usize) -> f32 {
        self.index(i, j).map_or(0.0, |k| self.solid_angles[k])
    }

    /// Cell hit by `direction`, or `None` when it points into the lower
    /// hemisphere or falls outside the raster.
    pub fn direction_to_cell(&self, direction: Vec3) -> Option<(usize, usize)> {
        let local = self.frame.to_local(direction.normalize_or_zero());
        if local.z <= 0.0 {
            return None;
        }

        let n = self.size as f32;
        let fx = (local.x + 1.0) * 0.5 * n;
        let fy = (local.y + 1.0) * 0.5 * n;
        if !(fx >= 0.0 && fy >= 0.0) {
            return None;
        }
        let (i, j) = (fx as usize, fy as usize);
        self.index(i, j).map(|_| (i, j))
    }

    /// Adaptive traversal of `hierarchy`.
    ///
    /// A node whose solid angle `π r² / d²` is smaller than the footprint of
    /// the cell its center maps to is depth-tested into that cell. Larger
    /// nodes are refined; larger leaves are deferred to
    /// [`MicroBuffer::ray_cast_deferred`]. Nodes entirely below the tangent
    /// plane are skipped, and so are leaves centered on or below it.
    pub fn fill(&mut self, hierarchy: &SurfelHierarchy) {
        let mut stack = vec![NodeId::ROOT];

        while let Some(id) = stack.pop() {
            let node = hierarchy.node(id);
            if node.kind == BshKind::Empty {
                continue;
            }

            let to_center = node.sphere.center - self.position;
            let radius = node.sphere.radius;
            if to_center.dot(self.frame.normal) < -radius {
                continue;
            }

            let distance = to_center.length();
            if distance > MIN_NODE_DISTANCE {
                let node_angle = PI * radius * radius / (distance * distance);
                if let Some((i, j)) = self.direction_to_cell(to_center) {
                    if node_angle < self.cell_solid_angle(i, j) {
                        self.splat(i, j, distance, node.color, id);
                        continue;
                    }
                }
            }

            match node.kind {
                BshKind::Internal { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
                BshKind::Leaf { .. } => {
                    if to_center.dot(self.frame.normal) > 0.0 {
                        self.deferred.push(id);
                    }
                }
                BshKind::Empty => {}
            }
        }
    }

    /// Cast one ray per cell against every deferred surfel disc.
    pub fn ray_cast_deferred(&mut self, hierarchy: &SurfelHierarchy) {
        if self.deferred.is_empty() {
            return;
        }

        for j in 0..self.size {
            for i in 0..self.size {
                let Some(direction) = self.cell_direction(i, j) else {
                    continue;
                };
                let ray = Ray::new(self.position, direction);
                let cell = &mut self.cells[j * self.size + i];

                for &id in &self.deferred {
                    let BshKind::Leaf { surfel } = hierarchy.node(id).kind else {
                        continue;
                    };
                    let surfel = hierarchy.surfel(surfel);
                    if let Some(t) = surfel.intersect(&ray) {
                        if t < cell.depth {
                            *cell = Cell {
                                color: surfel.color,
                                depth: t,
                                node: Some(id),
                            };
                        }
                    }
                }
            }
        }
    }

    /// Sum of `color · material(direction) · solid angle` over all cells.
    ///
    /// The material response already includes the cosine term.
    pub fn convolve(&self, material: &Material, view_point: Vec3) -> Color {
        let mut radiance = Color::ZERO;
        for j in 0..self.size {
            for i in 0..self.size {
                let k = j * self.size + i;
                let cell = &self.cells[k];
                if cell.color == Color::ZERO {
                    continue;
                }
                let Some(direction) = self.cell_direction(i, j) else {
                    continue;
                };
                radiance += cell.color
                    * material.evaluate(self.position, self.frame.normal, direction, view_point)
                    * self.solid_angles[k];
            }
        }
        radiance
    }

    fn splat(&mut self, i: usize, j: usize, depth: f32, color: Color, id: NodeId) {
        let cell = &mut self.cells[j * self.size + i];
        if depth < cell.depth {
            *cell = Cell {
                color,
                depth,
                node: Some(id),
            };
        }
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> Option<usize> {
        (i < self.size && j < self.size).then(|| j * self.size + i)
    }
}

/// Center offset of cell `(i, j)` in `[-1, 1]²`.
#[inline]
fn cell_offset(size: usize, i: usize, j: usize) -> Vec2 {
    let n = size as f32;
    Vec2::new(
        -1.0 + (2 * i + 1) as f32 / n,
        -1.0 + (2 * j + 1) as f32 / n,
    )
}

/// Local direction for a disc offset, `None` outside the unit disc.
#[inline]
fn hemisphere_direction(offset: Vec2) -> Option<Vec3> {
    let r2 = offset.length_squared();
    (r2 < 1.0).then(|| Vec3::new(offset.x, offset.y, (1.0 - r2).sqrt()))
}

fn clamped_direction(offset: Vec2) -> Vec3 {
    let r = offset.length();
    let offset = if r > RIM_RADIUS { offset * (RIM_RADIUS / r) } else { offset };
    Vec3::new(offset.x, offset.y, (1.0 - offset.length_squared()).max(0.0).sqrt())
}

/// Solid angle of a cell by finite differences: the area spanned on the
/// unit hemisphere by the directions half a cell away on each axis.
fn cell_footprint(size: usize, i: usize, j: usize) -> f32 {
    let center = cell_offset(size, i, j);
    if hemisphere_direction(center).is_none() {
        return 0.0;
    }

    let half = 1.0 / size as f32;
    let dx = clamped_direction(center + Vec2::new(half, 0.0))
        - clamped_direction(center - Vec2::new(half, 0.0));
    let dy = clamped_direction(center + Vec2::new(0.0, half))
        - clamped_direction(center - Vec2::new(0.0, half));
    dx.cross(dy).length()
}
