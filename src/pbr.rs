//! Base physically-based surface program.
//!
//! Metal/roughness shading lit by an environment cube map, with a clearcoat
//! layer, derivative bump mapping and linear-range fog. The program exposes
//! three insertion points (see [`InsertionPoint`](crate::shader::InsertionPoint)):
//!
//! - `declarations`: module scope
//! - `begin_vertex`: may rewrite `transformed` (object space) and `tint`
//! - `color_fragment`: may rewrite `color` before fog is applied
//!
//! Bind groups:
//!
//! | Group | Binding | Resource |
//! |-------|---------|----------|
//! | 0 | 0 | `Globals` (camera, fog) |
//! | 1 | 0 | `Surface` parameters |
//! | 1 | 1, 2 | bump map + sampler |
//! | 1 | 3, 4 | environment cube + sampler |
//!
//! Groups 2 and up are free for patches.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::shader::BaseProgram;

/// Per-frame camera and fog block (group 0, binding 0).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Globals {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    pub fog_color: [f32; 4],
    /// x = near, y = far.
    pub fog_range: [f32; 4],
}

impl Globals {
    pub fn new(view_proj: Mat4, camera_position: Vec3, fog_color: Vec3, fog_near: f32, fog_far: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            camera_position: camera_position.extend(1.0).to_array(),
            fog_color: fog_color.extend(1.0).to_array(),
            fog_range: [fog_near, fog_far, 0.0, 0.0],
        }
    }
}

/// Vertex layout shared by every mesh drawn with the surface program.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// The base program.
pub const SURFACE_PROGRAM: BaseProgram = BaseProgram {
    name: "physical_surface",
    source: SURFACE_WGSL,
};

const SURFACE_WGSL: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    fog_color: vec4<f32>,
    fog_range: vec4<f32>,
};

struct Surface {
    color: vec4<f32>,
    roughness: f32,
    metalness: f32,
    reflectivity: f32,
    clearcoat: f32,
    clearcoat_roughness: f32,
    bump_scale: f32,
    _pad0: f32,
    _pad1: f32,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> surface: Surface;
@group(1) @binding(1)
var bump_map: texture_2d<f32>;
@group(1) @binding(2)
var bump_sampler: sampler;
@group(1) @binding(3)
var env_map: texture_cube<f32>;
@group(1) @binding(4)
var env_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) tint: vec3<f32>,
};

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - cos_theta, 5.0);
}

fn fresnel_schlick_roughness(cos_theta: f32, f0: vec3<f32>, roughness: f32) -> vec3<f32> {
    let grazing = max(vec3<f32>(1.0 - roughness), f0);
    return f0 + (grazing - f0) * pow(1.0 - cos_theta, 5.0);
}

// @insert declarations

@vertex
fn vs_main(v_in: VertexInput, inst: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(inst.model_0, inst.model_1, inst.model_2, inst.model_3);
    let position = v_in.position;
    var tint = vec3<f32>(1.0);
    var transformed = position;
    // @insert begin_vertex

    let world = model * vec4<f32>(transformed, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = normalize((model * vec4<f32>(v_in.normal, 0.0)).xyz);
    out.uv = v_in.uv;
    out.tint = tint;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let geometry_normal = normalize(in.world_normal);

    // Derivative bump mapping
    let height = textureSample(bump_map, bump_sampler, in.uv).r;
    let dh = vec2<f32>(dpdx(height), dpdy(height)) * surface.bump_scale;
    let sigma_x = dpdx(in.world_position);
    let sigma_y = dpdy(in.world_position);
    let r1 = cross(sigma_y, geometry_normal);
    let r2 = cross(geometry_normal, sigma_x);
    let det = dot(sigma_x, r1);
    let grad = sign(det) * (dh.x * r1 + dh.y * r2);
    let bumped = normalize(abs(det) * geometry_normal - grad);
    let normal = select(geometry_normal, bumped, abs(det) > 1e-12);

    let view_dir = normalize(globals.camera_position.xyz - in.world_position);
    let n_dot_v = max(dot(normal, view_dir), 1e-4);
    let max_lod = f32(textureNumLevels(env_map) - 1u);

    let base_color = surface.color.rgb * in.tint;
    let dielectric_f0 = vec3<f32>(0.16 * surface.reflectivity * surface.reflectivity);
    let f0 = mix(dielectric_f0, base_color, surface.metalness);

    let specular_env = textureSampleLevel(env_map, env_sampler, reflect(-view_dir, normal), surface.roughness * max_lod).rgb;
    let diffuse_env = textureSampleLevel(env_map, env_sampler, normal, max_lod).rgb;

    let fresnel = fresnel_schlick_roughness(n_dot_v, f0, surface.roughness);
    let kd = (vec3<f32>(1.0) - fresnel) * (1.0 - surface.metalness);
    var color = kd * base_color * diffuse_env + fresnel * specular_env;

    // Clearcoat layer uses the unbumped normal
    let coat_n_dot_v = max(dot(geometry_normal, view_dir), 1e-4);
    let coat_fresnel = fresnel_schlick(coat_n_dot_v, vec3<f32>(0.04)).x * surface.clearcoat;
    let coat_env = textureSampleLevel(env_map, env_sampler, reflect(-view_dir, geometry_normal), surface.clearcoat_roughness * max_lod).rgb;
    color = color * (1.0 - coat_fresnel) + coat_env * coat_fresnel;
    // @insert color_fragment

    let depth = length(globals.camera_position.xyz - in.world_position);
    let fog = smoothstep(globals.fog_range.x, globals.fog_range.y, depth);
    color = mix(color, globals.fog_color.rgb, fog);

    return vec4<f32>(color, 1.0);
}
"#;
