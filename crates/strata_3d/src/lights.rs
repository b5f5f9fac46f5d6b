//! Scene lights and their GPU packing

use strata_core::{Color, Vec3};

/// Directional lights the shader evaluates
pub const MAX_DIRECTIONAL_LIGHTS: usize = 2;

#[derive(Clone, Debug, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f32,
}

/// Sun-like light shining from `position` toward the origin
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f32,
    pub position: Vec3,
}

impl DirectionalLight {
    /// Unit vector pointing at the light
    pub fn direction(&self) -> Vec3 {
        self.position.normalize()
    }
}

/// Omnidirectional light with a finite range
#[derive(Clone, Debug, PartialEq)]
pub struct PointLight {
    pub color: Color,
    pub intensity: f32,
    /// Range of influence, 0 for unlimited
    pub distance: f32,
    pub decay: f32,
    pub position: Vec3,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Light {
    Ambient(AmbientLight),
    Directional(DirectionalLight),
    Point(PointLight),
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match self {
            Light::Ambient(l) => l.intensity,
            Light::Directional(l) => l.intensity,
            Light::Point(l) => l.intensity,
        }
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        match self {
            Light::Ambient(l) => l.intensity = intensity,
            Light::Directional(l) => l.intensity = intensity,
            Light::Point(l) => l.intensity = intensity,
        }
    }

    pub fn position(&self) -> Option<Vec3> {
        match self {
            Light::Ambient(_) => None,
            Light::Directional(l) => Some(l.position),
            Light::Point(l) => Some(l.position),
        }
    }

    pub fn position_mut(&mut self) -> Option<&mut Vec3> {
        match self {
            Light::Ambient(_) => None,
            Light::Directional(l) => Some(&mut l.position),
            Light::Point(l) => Some(&mut l.position),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalUniform {
    /// xyz toward the light
    pub direction: [f32; 4],
    /// rgb premultiplied by intensity
    pub radiance: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointUniform {
    /// xyz position, w range
    pub position: [f32; 4],
    /// rgb premultiplied by intensity, w decay
    pub radiance: [f32; 4],
}

/// Every light folded into the fixed layout the shader expects
///
/// Ambient lights sum; extra directional lights beyond the shader's slots
/// and extra point lights are dropped (and logged once by the caller).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    pub ambient: [f32; 4],
    pub directional: [DirectionalUniform; MAX_DIRECTIONAL_LIGHTS],
    pub point: PointUniform,
}

impl LightsUniform {
    pub fn pack<'a>(lights: impl IntoIterator<Item = &'a Light>) -> (Self, usize) {
        let mut uniform = LightsUniform::default();
        let mut directional = 0;
        let mut has_point = false;
        let mut dropped = 0;

        for light in lights {
            match light {
                Light::Ambient(l) => {
                    let c = l.color.scaled(l.intensity);
                    uniform.ambient[0] += c.r;
                    uniform.ambient[1] += c.g;
                    uniform.ambient[2] += c.b;
                }
                Light::Directional(l) if directional < MAX_DIRECTIONAL_LIGHTS => {
                    let d = l.direction();
                    let c = l.color.scaled(l.intensity);
                    uniform.directional[directional] = DirectionalUniform {
                        direction: [d.x, d.y, d.z, 0.0],
                        radiance: [c.r, c.g, c.b, 0.0],
                    };
                    directional += 1;
                }
                Light::Point(l) if !has_point => {
                    let c = l.color.scaled(l.intensity.max(0.0));
                    uniform.point = PointUniform {
                        position: [l.position.x, l.position.y, l.position.z, l.distance],
                        radiance: [c.r, c.g, c.b, l.decay],
                    };
                    has_point = true;
                }
                _ => dropped += 1,
            }
        }
        (uniform, dropped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_folds_lights() {
        let lights = vec![
            Light::Ambient(AmbientLight {
                color: Color::WHITE,
                intensity: 0.6,
            }),
            Light::Directional(DirectionalLight {
                color: Color::WHITE,
                intensity: 2.0,
                position: Vec3::new(0.0, 10.0, 0.0),
            }),
            Light::Point(PointLight {
                color: Color::rgb(1.0, 0.0, 0.0),
                intensity: 5.0,
                distance: 12.0,
                decay: 2.0,
                position: Vec3::new(0.0, 0.5, 0.0),
            }),
        ];
        let (packed, dropped) = LightsUniform::pack(&lights);
        assert_eq!(dropped, 0);
        assert!((packed.ambient[0] - 0.6).abs() < 1e-6);
        assert_eq!(packed.directional[0].direction, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(packed.directional[0].radiance[1], 2.0);
        assert_eq!(packed.directional[1], DirectionalUniform::default());
        assert_eq!(packed.point.position, [0.0, 0.5, 0.0, 12.0]);
        assert_eq!(packed.point.radiance, [5.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_extra_lights_are_dropped() {
        let sun = Light::Directional(DirectionalLight {
            color: Color::WHITE,
            intensity: 1.0,
            position: Vec3::UP,
        });
        let (_, dropped) = LightsUniform::pack(&[sun.clone(), sun.clone(), sun]);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_uniform_layout_is_vec4_aligned() {
        assert_eq!(std::mem::size_of::<LightsUniform>(), 16 + 2 * 32 + 32);
    }
}
