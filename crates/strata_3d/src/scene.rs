//! Scene graph
//!
//! A flat list of meshes and lights plus one camera. Objects that timelines
//! animate carry a name; everything else (the pin rows) is anonymous. The
//! scene is the [`PropertySink`] for every `Target::Object` write.

use rustc_hash::FxHashMap;
use strata_animation::{PropertyPath, PropertySink, SinkError, Target};
use strata_core::math::look_at_euler;
use strata_core::{Color, Mat4, Vec3};

use crate::camera::{IdleOscillation, PerspectiveCamera};
use crate::error::{Result, SceneError};
use crate::geometry::{BoxGeometry, Geometry};
use crate::lights::{AmbientLight, DirectionalLight, Light, PointLight};
use crate::materials::StandardMaterial;

/// Name under which the camera is addressable
pub const CAMERA: &str = "camera";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryId(pub u32);

/// Translation, Euler XYZ rotation and scale
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn rotated(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_trs(self.position, self.rotation, self.scale)
    }

    pub fn normal_matrix(&self) -> Mat4 {
        Mat4::normal_matrix(self.rotation, self.scale)
    }

    /// All axes collapsed, nothing to draw
    pub fn is_degenerate(&self) -> bool {
        self.scale.x.abs() < 1e-6 && self.scale.y.abs() < 1e-6 && self.scale.z.abs() < 1e-6
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    pub name: Option<String>,
    pub geometry: GeometryId,
    pub material: StandardMaterial,
    pub transform: Transform,
    pub visible: bool,
}

impl Mesh {
    pub fn new(geometry: GeometryId, material: StandardMaterial, transform: Transform) -> Self {
        Self {
            name: None,
            geometry,
            material,
            transform,
            visible: true,
        }
    }

    /// Drawn this frame
    pub fn is_drawn(&self) -> bool {
        self.visible && !self.material.is_invisible() && !self.transform.is_degenerate()
    }
}

#[derive(Clone, Copy, Debug)]
enum Node {
    Mesh(usize),
    Light(usize),
    Camera,
}

pub struct Scene {
    background: Color,
    camera: PerspectiveCamera,
    idle: Option<IdleOscillation>,
    geometries: Vec<Geometry>,
    meshes: Vec<Mesh>,
    lights: Vec<Light>,
    names: FxHashMap<String, Node>,
}

impl Scene {
    pub fn new(background: Color, camera: PerspectiveCamera) -> Self {
        let mut names = FxHashMap::default();
        names.insert(CAMERA.to_string(), Node::Camera);
        Self {
            background,
            camera,
            idle: None,
            geometries: Vec::new(),
            meshes: Vec::new(),
            lights: Vec::new(),
            names,
        }
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut PerspectiveCamera {
        &mut self.camera
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.push(geometry);
        GeometryId(self.geometries.len() as u32 - 1)
    }

    pub fn add_mesh(&mut self, name: Option<&str>, mut mesh: Mesh) -> Result<()> {
        let index = self.meshes.len();
        if let Some(name) = name {
            self.claim(name, Node::Mesh(index))?;
            mesh.name = Some(name.to_string());
        }
        self.meshes.push(mesh);
        Ok(())
    }

    pub fn add_light(&mut self, name: &str, light: Light) -> Result<()> {
        self.claim(name, Node::Light(self.lights.len()))?;
        self.lights.push(light);
        Ok(())
    }

    pub fn mesh(&self, name: &str) -> Option<&Mesh> {
        match self.names.get(name)? {
            Node::Mesh(i) => self.meshes.get(*i),
            _ => None,
        }
    }

    pub fn light(&self, name: &str) -> Option<&Light> {
        match self.names.get(name)? {
            Node::Light(i) => self.lights.get(*i),
            _ => None,
        }
    }

    /// Enable or disable the idle camera drift
    pub fn set_idle(&mut self, idle: Option<IdleOscillation>) {
        self.idle = idle;
    }

    /// Per-frame scene update
    pub fn tick(&mut self, time_ms: f64) {
        if let Some(idle) = &self.idle {
            idle.apply(&mut self.camera, time_ms);
        }
    }

    fn claim(&mut self, name: &str, node: Node) -> Result<()> {
        if self.names.contains_key(name) {
            return Err(SceneError::DuplicateName(name.to_string()));
        }
        self.names.insert(name.to_string(), node);
        Ok(())
    }

    fn slot(&mut self, name: &str, property: PropertyPath) -> Option<&mut f32> {
        match *self.names.get(name)? {
            Node::Mesh(i) => {
                let mesh = self.meshes.get_mut(i)?;
                match property {
                    PropertyPath::Opacity => Some(&mut mesh.material.opacity),
                    PropertyPath::EmissiveIntensity => Some(&mut mesh.material.emissive_intensity),
                    _ => transform_slot(&mut mesh.transform, property),
                }
            }
            Node::Light(i) => {
                let light = self.lights.get_mut(i)?;
                match property {
                    PropertyPath::Intensity => Some(match light {
                        Light::Ambient(l) => &mut l.intensity,
                        Light::Directional(l) => &mut l.intensity,
                        Light::Point(l) => &mut l.intensity,
                    }),
                    _ => light.position_mut().and_then(|p| position_slot(p, property)),
                }
            }
            Node::Camera => match property {
                PropertyPath::RotationX => Some(&mut self.camera.rotation.x),
                PropertyPath::RotationY => Some(&mut self.camera.rotation.y),
                PropertyPath::RotationZ => Some(&mut self.camera.rotation.z),
                _ => position_slot(&mut self.camera.position, property),
            },
        }
    }
}

fn position_slot(position: &mut Vec3, property: PropertyPath) -> Option<&mut f32> {
    match property {
        PropertyPath::PositionX => Some(&mut position.x),
        PropertyPath::PositionY => Some(&mut position.y),
        PropertyPath::PositionZ => Some(&mut position.z),
        _ => None,
    }
}

fn transform_slot(transform: &mut Transform, property: PropertyPath) -> Option<&mut f32> {
    match property {
        PropertyPath::RotationX => Some(&mut transform.rotation.x),
        PropertyPath::RotationY => Some(&mut transform.rotation.y),
        PropertyPath::RotationZ => Some(&mut transform.rotation.z),
        PropertyPath::ScaleX => Some(&mut transform.scale.x),
        PropertyPath::ScaleY => Some(&mut transform.scale.y),
        PropertyPath::ScaleZ => Some(&mut transform.scale.z),
        _ => position_slot(&mut transform.position, property),
    }
}

impl PropertySink for Scene {
    fn write(
        &mut self,
        target: &Target,
        property: PropertyPath,
        value: f32,
    ) -> std::result::Result<(), SinkError> {
        let Target::Object(name) = target else {
            return Err(SinkError::UnknownTarget(target.to_string()));
        };
        if !self.names.contains_key(name) {
            return Err(SinkError::UnknownTarget(name.clone()));
        }

        // Uniform scale fans out to all three axes
        if property == PropertyPath::Scale {
            if let Some(Node::Mesh(i)) = self.names.get(name).copied() {
                if let Some(mesh) = self.meshes.get_mut(i) {
                    mesh.transform.scale = Vec3::splat(value);
                    return Ok(());
                }
            }
        }

        let slot = self.slot(name, property).ok_or_else(|| SinkError::Unsupported {
            target: name.clone(),
            property,
        })?;
        *slot = match property {
            PropertyPath::Opacity => value.clamp(0.0, 1.0),
            _ => value,
        };
        Ok(())
    }

    fn read(&self, target: &Target, property: PropertyPath) -> Option<f32> {
        let Target::Object(name) = target else {
            return None;
        };
        let vec = |v: &Vec3| match property {
            PropertyPath::PositionX | PropertyPath::RotationX | PropertyPath::ScaleX => Some(v.x),
            PropertyPath::PositionY | PropertyPath::RotationY | PropertyPath::ScaleY => Some(v.y),
            PropertyPath::PositionZ | PropertyPath::RotationZ | PropertyPath::ScaleZ => Some(v.z),
            _ => None,
        };
        match *self.names.get(name)? {
            Node::Mesh(i) => {
                let mesh = self.meshes.get(i)?;
                let t = &mesh.transform;
                match property {
                    PropertyPath::Opacity => Some(mesh.material.opacity),
                    PropertyPath::EmissiveIntensity => Some(mesh.material.emissive_intensity),
                    PropertyPath::Scale => Some(t.scale.x),
                    PropertyPath::PositionX | PropertyPath::PositionY | PropertyPath::PositionZ => {
                        vec(&t.position)
                    }
                    PropertyPath::RotationX | PropertyPath::RotationY | PropertyPath::RotationZ => {
                        vec(&t.rotation)
                    }
                    _ => vec(&t.scale),
                }
            }
            Node::Light(i) => {
                let light = self.lights.get(i)?;
                match property {
                    PropertyPath::Intensity => Some(light.intensity()),
                    PropertyPath::PositionX | PropertyPath::PositionY | PropertyPath::PositionZ => {
                        light.position().as_ref().and_then(vec)
                    }
                    _ => None,
                }
            }
            Node::Camera => match property {
                PropertyPath::PositionX | PropertyPath::PositionY | PropertyPath::PositionZ => {
                    vec(&self.camera.position)
                }
                PropertyPath::RotationX | PropertyPath::RotationY | PropertyPath::RotationZ => {
                    vec(&self.camera.rotation)
                }
                _ => None,
            },
        }
    }
}

// ============================================================================
// Chip scene
// ============================================================================

/// Names of the animated chip objects
pub mod chip {
    pub const CORE: &str = "core";
    pub const RED_LIGHT: &str = "red";
    pub const LAYER_COUNT: usize = 3;
    pub const CAMERA_POSITION: (f32, f32, f32) = (0.0, 4.0, 7.0);

    /// Name of the `i`th substrate layer
    pub fn layer(i: usize) -> String {
        format!("layer.{i}")
    }
}

/// Pin spacing along each edge
const PIN_PITCH: f32 = 0.22;
/// Distance of the pin rows from the center
const PIN_EDGE: f32 = 4.1;

/// Stacked substrate layers with a glowing core and pins on every edge
pub fn build_chip_scene(aspect: f32) -> Result<Scene> {
    let mut camera = PerspectiveCamera::new(35.0, aspect, 0.1, 100.0);
    let (cx, cy, cz) = chip::CAMERA_POSITION;
    camera.position = Vec3::new(cx, cy, cz);
    camera.rotation = look_at_euler(camera.position, Vec3::ZERO);

    let mut scene = Scene::new(Color::from_hex(0x050507), camera);
    scene.set_idle(Some(IdleOscillation::new(Vec3::new(cx, cy, cz))));

    scene.add_light(
        "ambient",
        Light::Ambient(AmbientLight {
            color: Color::WHITE,
            intensity: 0.6,
        }),
    )?;
    scene.add_light(
        "key",
        Light::Directional(DirectionalLight {
            color: Color::WHITE,
            intensity: 2.0,
            position: Vec3::new(5.0, 8.0, 4.0),
        }),
    )?;
    scene.add_light(
        "fill",
        Light::Directional(DirectionalLight {
            color: Color::WHITE,
            intensity: 0.8,
            position: Vec3::new(-3.0, 3.0, -2.0),
        }),
    )?;
    scene.add_light(
        chip::RED_LIGHT,
        Light::Point(PointLight {
            color: Color::from_hex(0xc1121f),
            intensity: 0.0,
            distance: 12.0,
            decay: 2.0,
            position: Vec3::new(0.0, 0.5, 0.0),
        }),
    )?;

    let silicon = StandardMaterial::new(Color::from_hex(0x0f1116), 0.35, 0.55).transparent(true);
    let slab = scene.add_geometry(BoxGeometry::new(8.0, 0.1, 8.0));
    for i in 0..chip::LAYER_COUNT {
        let material = silicon.clone().roughness(0.55 - i as f32 * 0.05);
        let transform = Transform::at(Vec3::new(0.0, i as f32 * 0.04, 0.0));
        scene.add_mesh(Some(&chip::layer(i)), Mesh::new(slab, material, transform))?;
    }

    let core_material = StandardMaterial::new(Color::from_hex(0x1a1b20), 0.0, 1.0)
        .emissive(Color::from_hex(0xc1121f), 0.0);
    let core = scene.add_geometry(BoxGeometry::new(3.2, 0.15, 3.2));
    scene.add_mesh(
        Some(chip::CORE),
        Mesh::new(core, core_material, Transform::at(Vec3::new(0.0, 0.12, 0.0))),
    )?;

    let pin_material = StandardMaterial::new(Color::from_hex(0x3a3a3e), 0.9, 0.2);
    let pin = scene.add_geometry(BoxGeometry::new(0.16, 0.04, 0.24));
    for i in -18..=18 {
        let x = i as f32 * PIN_PITCH;
        for z in [PIN_EDGE, -PIN_EDGE] {
            let transform = Transform::at(Vec3::new(x, -0.02, z));
            scene.add_mesh(None, Mesh::new(pin, pin_material.clone(), transform))?;
        }
    }
    let quarter = Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0);
    for i in -17..=17 {
        let z = i as f32 * PIN_PITCH;
        for x in [PIN_EDGE, -PIN_EDGE] {
            let transform = Transform::at(Vec3::new(x, -0.02, z)).rotated(quarter);
            scene.add_mesh(None, Mesh::new(pin, pin_material.clone(), transform))?;
        }
    }

    tracing::debug!(
        "chip scene: {} meshes, {} lights",
        scene.meshes().len(),
        scene.lights().len()
    );
    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_scene_contents() {
        let scene = build_chip_scene(16.0 / 9.0).unwrap();
        assert_eq!(scene.meshes().len(), 3 + 1 + 74 + 70);
        assert_eq!(scene.lights().len(), 4);
        assert_eq!(scene.geometries().len(), 3);

        let layer = scene.mesh("layer.2").unwrap();
        assert!((layer.material.roughness - 0.45).abs() < 1e-6);
        assert!((layer.transform.position.y - 0.08).abs() < 1e-6);

        let core = scene.mesh(chip::CORE).unwrap();
        assert_eq!(core.material.emissive_intensity, 0.0);
        assert_eq!(scene.light(chip::RED_LIGHT).unwrap().intensity(), 0.0);

        assert_eq!(scene.camera().fov, 35.0);
        assert!(scene.camera().rotation.x < -0.5);
    }

    #[test]
    fn test_sink_writes_resolve_by_name() {
        let mut scene = build_chip_scene(1.0).unwrap();
        let core = Target::object(chip::CORE);

        scene.write(&core, PropertyPath::Scale, 0.5).unwrap();
        assert_eq!(scene.mesh(chip::CORE).unwrap().transform.scale, Vec3::splat(0.5));
        assert_eq!(scene.read(&core, PropertyPath::Scale), Some(0.5));

        scene
            .write(&Target::object("red"), PropertyPath::Intensity, 5.0)
            .unwrap();
        assert_eq!(scene.light("red").unwrap().intensity(), 5.0);

        scene
            .write(&Target::object(CAMERA), PropertyPath::RotationX, -0.2)
            .unwrap();
        assert_eq!(scene.camera().rotation.x, -0.2);

        scene
            .write(&Target::object("layer.0"), PropertyPath::Opacity, 1.7)
            .unwrap();
        assert_eq!(scene.mesh("layer.0").unwrap().material.opacity, 1.0);
    }

    #[test]
    fn test_sink_rejects_unknown_targets() {
        let mut scene = build_chip_scene(1.0).unwrap();
        assert!(matches!(
            scene.write(&Target::object("nope"), PropertyPath::Scale, 1.0),
            Err(SinkError::UnknownTarget(_))
        ));
        assert!(matches!(
            scene.write(&Target::object("red"), PropertyPath::Opacity, 1.0),
            Err(SinkError::Unsupported { .. })
        ));
        assert!(scene
            .write(&Target::element("hero"), PropertyPath::Opacity, 1.0)
            .is_err());
        assert_eq!(scene.read(&Target::object("red"), PropertyPath::Opacity), None);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut scene = Scene::new(Color::BLACK, PerspectiveCamera::new(35.0, 1.0, 0.1, 10.0));
        let geometry = scene.add_geometry(BoxGeometry::new(1.0, 1.0, 1.0));
        let mesh = Mesh::new(geometry, StandardMaterial::default(), Transform::default());
        scene.add_mesh(Some("a"), mesh.clone()).unwrap();
        assert!(matches!(
            scene.add_mesh(Some("a"), mesh.clone()),
            Err(SceneError::DuplicateName(_))
        ));
        assert!(scene.add_mesh(Some(CAMERA), mesh).is_err());
    }

    #[test]
    fn test_degenerate_meshes_are_skipped() {
        let mut scene = build_chip_scene(1.0).unwrap();
        scene
            .write(&Target::object(chip::CORE), PropertyPath::Scale, 0.0)
            .unwrap();
        assert!(!scene.mesh(chip::CORE).unwrap().is_drawn());
        assert!(scene.mesh("layer.0").unwrap().is_drawn());
    }
}
