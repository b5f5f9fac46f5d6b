//! GPU uniform layouts and per-frame packing

use strata_core::Vec3;

use crate::lights::LightsUniform;
use crate::scene::{GeometryId, Mesh, Scene};

/// Round `size` up to a multiple of `alignment`
pub fn align_to(size: u64, alignment: u64) -> u64 {
    if alignment == 0 {
        return size;
    }
    size.div_ceil(alignment) * alignment
}

/// Camera and lights, bound once per frame
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub lights: LightsUniform,
}

/// One mesh, bound with a dynamic offset
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
    pub base_color: [f32; 4],
    pub emissive: [f32; 4],
    /// metalness, roughness, opacity, unused
    pub material: [f32; 4],
}

impl ObjectUniform {
    pub fn from_mesh(mesh: &Mesh) -> Self {
        let m = &mesh.material;
        Self {
            model: mesh.transform.matrix().to_cols_array_2d(),
            normal: mesh.transform.normal_matrix().to_cols_array_2d(),
            base_color: m.color.to_array(),
            emissive: m.emissive_radiance(),
            material: [
                m.metalness.clamp(0.0, 1.0),
                m.roughness.clamp(0.04, 1.0),
                m.opacity.clamp(0.0, 1.0),
                0.0,
            ],
        }
    }
}

/// Logical overlay space and output encoding for the screen passes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ScreenUniform {
    /// Logical width and height
    pub size: [f32; 2],
    /// 1 when the surface is not sRGB and shaders must encode themselves
    pub encode_srgb: f32,
    pub _pad: f32,
}

/// Mesh draw resolved against the object uniform buffer
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DrawItem {
    pub geometry: GeometryId,
    /// Index into the object uniform array
    pub slot: u32,
    pub blended: bool,
}

/// Frame uniform plus every visible mesh, opaque first, then blended meshes
/// far to near
pub(crate) fn pack_scene(scene: &Scene) -> (FrameUniform, Vec<ObjectUniform>, Vec<DrawItem>) {
    let camera = scene.camera();
    let (lights, _) = LightsUniform::pack(scene.lights());
    let p = camera.position;
    let frame = FrameUniform {
        view_proj: camera.view_projection().to_cols_array_2d(),
        camera_position: [p.x, p.y, p.z, 1.0],
        lights,
    };

    let mut objects = Vec::with_capacity(scene.meshes().len());
    let mut opaque = Vec::new();
    let mut blended: Vec<(f32, DrawItem)> = Vec::new();
    for mesh in scene.meshes().iter().filter(|m| m.is_drawn()) {
        let slot = objects.len() as u32;
        objects.push(ObjectUniform::from_mesh(mesh));
        let is_blended = mesh.material.is_blended();
        let item = DrawItem {
            geometry: mesh.geometry,
            slot,
            blended: is_blended,
        };
        if is_blended {
            let depth = distance_sq(mesh.transform.position, p);
            blended.push((depth, item));
        } else {
            opaque.push(item);
        }
    }
    blended.sort_by(|a, b| b.0.total_cmp(&a.0));
    opaque.extend(blended.into_iter().map(|(_, item)| item));
    (frame, objects, opaque)
}

fn distance_sq(a: Vec3, b: Vec3) -> f32 {
    let d = a - b;
    d.dot(d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{build_chip_scene, chip};
    use strata_animation::{PropertyPath, PropertySink, Target};

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(176, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(10, 0), 10);
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 176);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 64 + 16 + 112);
        assert_eq!(std::mem::size_of::<ScreenUniform>(), 16);
    }

    #[test]
    fn test_pack_orders_opaque_before_blended() {
        let scene = build_chip_scene(1.5).unwrap();
        let (_, objects, draws) = pack_scene(&scene);
        assert_eq!(objects.len(), draws.len());

        let first_blended = draws.iter().position(|d| d.blended).unwrap();
        assert!(draws[first_blended..].iter().all(|d| d.blended));
        assert_eq!(draws.len() - first_blended, chip::LAYER_COUNT);
    }

    #[test]
    fn test_hidden_meshes_are_not_packed() {
        let mut scene = build_chip_scene(1.5).unwrap();
        let total = pack_scene(&scene).2.len();
        scene
            .write(&Target::object("layer.1"), PropertyPath::Opacity, 0.0)
            .unwrap();
        scene
            .write(&Target::object(chip::CORE), PropertyPath::Scale, 0.0)
            .unwrap();
        assert_eq!(pack_scene(&scene).2.len(), total - 2);
    }

    #[test]
    fn test_object_uniform_carries_material() {
        let mut scene = build_chip_scene(1.5).unwrap();
        let core = Target::object(chip::CORE);
        scene.write(&core, PropertyPath::EmissiveIntensity, 1.2).unwrap();
        let mesh = scene.mesh(chip::CORE).unwrap();
        let uniform = ObjectUniform::from_mesh(mesh);
        let expected = mesh.material.emissive.r * 1.2;
        assert!((uniform.emissive[0] - expected).abs() < 1e-6);
        assert_eq!(uniform.material[2], 1.0);
        assert_eq!(uniform.model[3][1], 0.12);
    }
}
