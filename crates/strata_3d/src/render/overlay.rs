//! 2D overlay quads drawn over the composited scene

use strata_core::{Color, Rect};

/// Fill style of an overlay quad
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayKind {
    Solid,
    /// Circular falloff from the center, reaching zero at `falloff` of the radius
    RadialGlow { falloff: f32 },
    /// Left-to-right blend into `end`
    HorizontalGradient { end: Color },
}

/// Axis-aligned quad in logical pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayQuad {
    pub rect: Rect,
    pub color: Color,
    pub kind: OverlayKind,
}

impl OverlayQuad {
    pub fn solid(rect: Rect, color: Color) -> Self {
        Self {
            rect,
            color,
            kind: OverlayKind::Solid,
        }
    }

    pub fn glow(rect: Rect, color: Color, falloff: f32) -> Self {
        Self {
            rect,
            color,
            kind: OverlayKind::RadialGlow { falloff },
        }
    }

    pub fn gradient(rect: Rect, start: Color, end: Color) -> Self {
        Self {
            rect,
            color: start,
            kind: OverlayKind::HorizontalGradient { end },
        }
    }

    /// Fully transparent or zero-sized, skipped when packing
    pub fn is_empty(&self) -> bool {
        let end_alpha = match self.kind {
            OverlayKind::HorizontalGradient { end } => end.a,
            _ => 0.0,
        };
        self.rect.width <= 0.0
            || self.rect.height <= 0.0
            || (self.color.a <= 0.0 && end_alpha <= 0.0)
    }

    pub fn to_instance(&self) -> OverlayInstance {
        let r = &self.rect;
        let (kind, end, falloff) = match self.kind {
            OverlayKind::Solid => (0.0, self.color, 1.0),
            OverlayKind::RadialGlow { falloff } => {
                (1.0, self.color.with_alpha(0.0), falloff.clamp(0.01, 1.0))
            }
            OverlayKind::HorizontalGradient { end } => (2.0, end, 1.0),
        };
        OverlayInstance {
            rect: [r.x, r.y, r.width, r.height],
            color: self.color.to_array(),
            color_end: end.to_array(),
            params: [kind, falloff, 0.0, 0.0],
        }
    }
}

/// Per-instance vertex data for the overlay pipeline
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct OverlayInstance {
    /// x, y, width, height in logical pixels
    pub rect: [f32; 4],
    pub color: [f32; 4],
    pub color_end: [f32; 4],
    /// kind (0 solid, 1 glow, 2 gradient), falloff, unused, unused
    pub params: [f32; 4],
}

impl OverlayInstance {
    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
            0 => Float32x4,
            1 => Float32x4,
            2 => Float32x4,
            3 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Visible quads packed in draw order
pub(crate) fn pack_overlay(quads: &[OverlayQuad]) -> Vec<OverlayInstance> {
    quads
        .iter()
        .filter(|q| !q.is_empty())
        .map(OverlayQuad::to_instance)
        .collect()
}
