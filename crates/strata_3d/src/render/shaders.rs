//! WGSL sources

/// Lit mesh shader (metallic-roughness, ambient + 2 directional + 1 point)
pub const MESH_SHADER: &str = r#"
// ============================================================================
// Strata Mesh Shader
// ============================================================================

const PI: f32 = 3.14159265359;

struct DirectionalLight {
    direction: vec4<f32>,
    radiance: vec4<f32>,
}

struct PointLight {
    // xyz position, w range
    position: vec4<f32>,
    // rgb radiance, w decay
    radiance: vec4<f32>,
}

struct FrameUniforms {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    directional: array<DirectionalLight, 2>,
    point: PointLight,
}

struct ObjectUniforms {
    model: mat4x4<f32>,
    normal: mat4x4<f32>,
    base_color: vec4<f32>,
    emissive: vec4<f32>,
    // metalness, roughness, opacity, unused
    material: vec4<f32>,
}

@group(0) @binding(0) var<uniform> frame: FrameUniforms;
@group(1) @binding(0) var<uniform> object: ObjectUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = object.model * vec4<f32>(in.position, 1.0);
    out.world_position = world.xyz;
    out.normal = (object.normal * vec4<f32>(in.normal, 0.0)).xyz;
    out.clip_position = frame.view_proj * world;
    return out;
}

fn direct_light(
    n: vec3<f32>,
    v: vec3<f32>,
    l: vec3<f32>,
    radiance: vec3<f32>,
    diffuse_color: vec3<f32>,
    f0: vec3<f32>,
    roughness: f32,
) -> vec3<f32> {
    let n_dot_l = max(dot(n, l), 0.0);
    if n_dot_l <= 0.0 {
        return vec3<f32>(0.0);
    }
    let h = normalize(l + v);
    let n_dot_v = max(dot(n, v), 1e-4);
    let n_dot_h = max(dot(n, h), 0.0);
    let v_dot_h = max(dot(v, h), 0.0);

    // GGX distribution
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    let d = a2 / (PI * denom * denom);

    // Smith-Schlick geometry
    let k = (roughness + 1.0) * (roughness + 1.0) / 8.0;
    let g = (n_dot_v / (n_dot_v * (1.0 - k) + k)) * (n_dot_l / (n_dot_l * (1.0 - k) + k));

    // Schlick fresnel
    let f = f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - v_dot_h, 5.0);

    let specular = d * g * f / max(4.0 * n_dot_v * n_dot_l, 1e-4);
    return (diffuse_color / PI + specular) * radiance * n_dot_l;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let base = object.base_color.rgb;
    let metalness = object.material.x;
    let roughness = object.material.y;
    let opacity = object.material.z;

    var n = vec3<f32>(0.0, 1.0, 0.0);
    let normal_length = length(in.normal);
    if normal_length > 1e-5 {
        n = in.normal / normal_length;
    }
    let v = normalize(frame.camera_position.xyz - in.world_position);

    let diffuse_color = base * (1.0 - metalness);
    let f0 = mix(vec3<f32>(0.04), base, metalness);

    var color = frame.ambient.rgb * diffuse_color / PI;

    for (var i = 0u; i < 2u; i = i + 1u) {
        let light = frame.directional[i];
        if length(light.direction.xyz) > 0.0 {
            color += direct_light(n, v, normalize(light.direction.xyz), light.radiance.rgb, diffuse_color, f0, roughness);
        }
    }

    let point = frame.point;
    let to_light = point.position.xyz - in.world_position;
    let distance = length(to_light);
    if distance > 1e-4 && dot(point.radiance.rgb, vec3<f32>(1.0)) > 0.0 {
        var attenuation = 1.0 / max(pow(distance, point.radiance.w), 0.01);
        if point.position.w > 0.0 {
            let ratio = distance / point.position.w;
            let cutoff = clamp(1.0 - ratio * ratio * ratio * ratio, 0.0, 1.0);
            attenuation *= cutoff * cutoff;
        }
        color += direct_light(n, v, to_light / distance, point.radiance.rgb * attenuation, diffuse_color, f0, roughness);
    }

    color += object.emissive.rgb;
    return vec4<f32>(color, opacity);
}
"#;

/// Blits the offscreen scene onto the surface
pub const COMPOSITE_SHADER: &str = r#"
// ============================================================================
// Strata Composite Shader
// ============================================================================

struct ScreenUniforms {
    size: vec2<f32>,
    encode_srgb: f32,
    _padding: f32,
}

@group(0) @binding(0) var<uniform> screen: ScreenUniforms;
@group(0) @binding(1) var scene_texture: texture_2d<f32>;
@group(0) @binding(2) var scene_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
}

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32) -> VertexOutput {
    var out: VertexOutput;

    // Fullscreen triangle
    let uv = vec2<f32>(
        f32((vertex_index << 1u) & 2u),
        f32(vertex_index & 2u)
    );

    out.position = vec4<f32>(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let c_clamped = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
    return select(
        1.055 * pow(c_clamped, vec3<f32>(1.0 / 2.4)) - 0.055,
        c_clamped * 12.92,
        c_clamped <= vec3<f32>(0.0031308)
    );
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let color = textureSample(scene_texture, scene_sampler, in.uv);
    if screen.encode_srgb > 0.5 {
        return vec4<f32>(linear_to_srgb(color.rgb), 1.0);
    }
    return vec4<f32>(color.rgb, 1.0);
}
"#;

/// Instanced overlay quads in logical pixels
pub const OVERLAY_SHADER: &str = r#"
// ============================================================================
// Strata Overlay Shader
// ============================================================================

struct ScreenUniforms {
    size: vec2<f32>,
    encode_srgb: f32,
    _padding: f32,
}

@group(0) @binding(0) var<uniform> screen: ScreenUniforms;

struct InstanceInput {
    @location(0) rect: vec4<f32>,
    @location(1) color: vec4<f32>,
    @location(2) color_end: vec4<f32>,
    // kind, falloff, unused, unused
    @location(3) params: vec4<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) local: vec2<f32>,
    @location(1) color: vec4<f32>,
    @location(2) color_end: vec4<f32>,
    @location(3) params: vec4<f32>,
}

const KIND_GLOW: u32 = 1u;
const KIND_GRADIENT: u32 = 2u;

@vertex
fn vs_main(@builtin(vertex_index) vertex_index: u32, instance: InstanceInput) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 0.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(0.0, 1.0),
    );
    let local = corners[vertex_index];
    let px = instance.rect.xy + local * instance.rect.zw;
    let size = max(screen.size, vec2<f32>(1.0));

    var out: VertexOutput;
    out.position = vec4<f32>(px.x / size.x * 2.0 - 1.0, 1.0 - px.y / size.y * 2.0, 0.0, 1.0);
    out.local = local;
    out.color = instance.color;
    out.color_end = instance.color_end;
    out.params = instance.params;
    return out;
}

fn linear_to_srgb(c: vec3<f32>) -> vec3<f32> {
    let c_clamped = clamp(c, vec3<f32>(0.0), vec3<f32>(1.0));
    return select(
        1.055 * pow(c_clamped, vec3<f32>(1.0 / 2.4)) - 0.055,
        c_clamped * 12.92,
        c_clamped <= vec3<f32>(0.0031308)
    );
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let kind = u32(round(in.params.x));
    var color = in.color;
    if kind == KIND_GLOW {
        let d = length(in.local - vec2<f32>(0.5)) * 2.0;
        let t = clamp(d / max(in.params.y, 0.01), 0.0, 1.0);
        color = mix(in.color, in.color_end, t);
    } else if kind == KIND_GRADIENT {
        color = mix(in.color, in.color_end, in.local.x);
    }

    if screen.encode_srgb > 0.5 {
        return vec4<f32>(linear_to_srgb(color.rgb), color.a);
    }
    return color;
}
"#;
