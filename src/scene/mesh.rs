/// Triangle mesh with shared-index attribute arrays.
///
/// Positions, texture coordinates and normals are parallel arrays; every
/// index in `indices` addresses all three at once, three indices per triangle.
use glam::{Vec2, Vec3};

use crate::error::{RenderError, Result};
use crate::math::Aabb;

#[derive(Debug, Clone)]
pub struct Mesh {
    positions: Vec<Vec3>,
    texcoords: Vec<Vec2>,
    normals: Vec<Vec3>,
    indices: Vec<u32>,
    bounds: Aabb,
}

impl Mesh {
    /// Build a mesh, validating the index buffer against the attribute arrays.
    pub fn new(
        positions: Vec<Vec3>,
        texcoords: Vec<Vec2>,
        normals: Vec<Vec3>,
        indices: Vec<u32>,
    ) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        if texcoords.len() != positions.len() {
            return Err(RenderError::InvalidMesh(format!(
                "{} texcoords for {} positions",
                texcoords.len(),
                positions.len()
            )));
        }
        if normals.len() != positions.len() {
            return Err(RenderError::InvalidMesh(format!(
                "{} normals for {} positions",
                normals.len(),
                positions.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(RenderError::InvalidMesh(format!(
                "index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }

        let bounds = Aabb::from_points(&positions);
        Ok(Self {
            positions,
            texcoords,
            normals,
            indices,
            bounds,
        })
    }

    /// Axis-aligned quad from four corners in order, split along the 0-2 diagonal.
    /// Winding follows the corner order; texcoords span [0, 1]^2 with
    /// corner 0 at (0, 0) and corner 2 at (1, 1).
    pub fn quad(corners: [Vec3; 4]) -> Result<Self> {
        let normal = (corners[1] - corners[0])
            .cross(corners[2] - corners[0])
            .normalize_or_zero();
        Self::new(
            corners.to_vec(),
            vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            vec![normal; 4],
            vec![0, 1, 2, 0, 2, 3],
        )
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    #[inline]
    pub fn texcoords(&self) -> &[Vec2] {
        &self.texcoords
    }

    #[inline]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// View of triangle `i`.
    #[inline]
    pub fn triangle(&self, i: usize) -> Triangle<'_> {
        let base = i * 3;
        Triangle {
            mesh: self,
            indices: [
                self.indices[base] as usize,
                self.indices[base + 1] as usize,
                self.indices[base + 2] as usize,
            ],
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = Triangle<'_>> + '_ {
        (0..self.triangle_count()).map(move |i| self.triangle(i))
    }
}

/// Transient view of one triangle of a mesh
#[derive(Debug, Clone, Copy)]
pub struct Triangle<'a> {
    mesh: &'a Mesh,
    indices: [usize; 3],
}

impl<'a> Triangle<'a> {
    #[inline]
    pub fn positions(&self) -> [Vec3; 3] {
        self.indices.map(|i| self.mesh.positions[i])
    }

    #[inline]
    pub fn texcoords(&self) -> [Vec2; 3] {
        self.indices.map(|i| self.mesh.texcoords[i])
    }

    #[inline]
    pub fn normals(&self) -> [Vec3; 3] {
        self.indices.map(|i| self.mesh.normals[i])
    }
}
