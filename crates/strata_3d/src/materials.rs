//! Standard material

use strata_core::Color;

/// Metallic-roughness material
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMaterial {
    /// Base color (albedo)
    pub color: Color,
    /// 0 = dielectric, 1 = metal
    pub metalness: f32,
    /// 0 = mirror, 1 = fully rough
    pub roughness: f32,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub opacity: f32,
    /// Drawn in the blended pass, after every opaque mesh
    pub transparent: bool,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            metalness: 0.0,
            roughness: 1.0,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            opacity: 1.0,
            transparent: false,
        }
    }
}

impl StandardMaterial {
    pub fn new(color: Color, metalness: f32, roughness: f32) -> Self {
        Self {
            color,
            metalness,
            roughness,
            ..Default::default()
        }
    }

    pub fn emissive(mut self, color: Color, intensity: f32) -> Self {
        self.emissive = color;
        self.emissive_intensity = intensity;
        self
    }

    pub fn transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    pub fn roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// Emissive color premultiplied by intensity
    pub fn emissive_radiance(&self) -> [f32; 4] {
        let e = self.emissive.scaled(self.emissive_intensity.max(0.0));
        [e.r, e.g, e.b, 0.0]
    }

    /// Needs the blended pass
    pub fn is_blended(&self) -> bool {
        self.transparent || self.opacity < 1.0
    }

    /// Contributes nothing to the frame
    pub fn is_invisible(&self) -> bool {
        self.opacity <= 0.0
    }
}
