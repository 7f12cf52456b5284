//! CPU-side descriptions of the primitives handed to the builder.

use bytemuck::{Pod, Zeroable};
use glam::{UVec3, Vec3};

use crate::BuildInputError;

#[repr(u32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    #[default]
    Diffuse = 0,
    Metal = 1,
    Dielectric = 2,
    Emissive = 3,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Material {
    pub kind: MaterialKind,
    pub emission: Vec3,
    pub diffuse_color: Vec3,
    /// Roughness of metallic reflection.
    pub fuzz: f32,
    /// Index of refraction for dielectrics.
    pub eta: f32,
}

impl Material {
    pub fn diffuse(color: Vec3) -> Self {
        Self {
            kind: MaterialKind::Diffuse,
            diffuse_color: color,
            ..Default::default()
        }
    }
    pub fn metal(color: Vec3, fuzz: f32) -> Self {
        Self {
            kind: MaterialKind::Metal,
            diffuse_color: color,
            fuzz,
            ..Default::default()
        }
    }
    pub fn dielectric(eta: f32) -> Self {
        Self {
            kind: MaterialKind::Dielectric,
            diffuse_color: Vec3::ONE,
            eta,
            ..Default::default()
        }
    }
    pub fn emissive(emission: Vec3) -> Self {
        Self {
            kind: MaterialKind::Emissive,
            emission,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SphereRecord {
    pub center: Vec3,
    pub radius: f32,
    pub material: Material,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriangleRecord {
    pub vertices: Vec<Vec3>,
    /// Each triple indexes into `vertices`.
    pub indices: Vec<UVec3>,
    pub material: Material,
}

impl TriangleRecord {
    /// Checks that every index names an existing vertex.
    pub fn validate(&self) -> Result<(), BuildInputError> {
        let vertex_count = self.vertices.len();
        for (triangle, triple) in self.indices.iter().enumerate() {
            if let Some(&index) = triple
                .to_array()
                .iter()
                .find(|&&index| index as usize >= vertex_count)
            {
                return Err(BuildInputError::IndexOutOfRange {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }
}

/// GPU layout of a [`Material`], one entry per geometry in build order.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct MaterialRecord {
    pub emission: [f32; 3],
    pub kind: u32,
    pub diffuse_color: [f32; 3],
    pub fuzz: f32,
    pub eta: f32,
    pub _padding: [u32; 3],
}

impl From<&Material> for MaterialRecord {
    fn from(material: &Material) -> Self {
        Self {
            emission: material.emission.to_array(),
            kind: material.kind as u32,
            diffuse_color: material.diffuse_color.to_array(),
            fuzz: material.fuzz,
            eta: material.eta,
            _padding: [0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_record_layout() {
        assert_eq!(std::mem::size_of::<MaterialRecord>(), 48);
        let record = MaterialRecord::from(&Material::metal(Vec3::new(0.8, 0.6, 0.2), 0.3));
        assert_eq!(record.kind, MaterialKind::Metal as u32);
        assert_eq!(record.diffuse_color, [0.8, 0.6, 0.2]);
        assert_eq!(record.fuzz, 0.3);
    }

    #[test]
    fn test_validate_indices() {
        let mut record = TriangleRecord {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            indices: vec![UVec3::new(0, 1, 2)],
            material: Material::default(),
        };
        assert!(record.validate().is_ok());

        record.indices.push(UVec3::new(2, 3, 0));
        match record.validate() {
            Err(BuildInputError::IndexOutOfRange {
                triangle,
                index,
                vertex_count,
            }) => {
                assert_eq!((triangle, index, vertex_count), (1, 3, 3));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
