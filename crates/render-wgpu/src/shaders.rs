/// WGSL shader for scene drawables. One instance per draw item carries the
/// world matrix, the material color and the shading parameters.
pub const SCENE_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    // x: shading model, y: metalness, z: roughness, w: transmission
    @location(7) shading: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) world_pos: vec3<f32>,
    @location(2) color: vec4<f32>,
    @location(3) shading: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = normalize(world_normal);
    out.world_pos = world_pos.xyz;
    out.color = instance.color;
    out.shading = instance.shading;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let kind = u32(in.shading.x + 0.5);
    // Basic
    if kind == 0u {
        return in.color;
    }
    // Normal
    if kind == 1u {
        return vec4<f32>(in.world_normal * 0.5 + vec3<f32>(0.5), in.color.a);
    }

    let n = normalize(in.world_normal);
    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let view_dir = normalize(uniforms.eye.xyz - in.world_pos);
    let half_dir = normalize(light_dir + view_dir);
    let metalness = in.shading.y;
    let roughness = max(in.shading.z, 0.04);

    let diffuse = max(dot(n, light_dir), 0.0) * (1.0 - metalness);
    let shininess = 2.0 / (roughness * roughness);
    let specular = pow(max(dot(n, half_dir), 0.0), shininess) * mix(0.04, 1.0, metalness);
    let lit = in.color.rgb * (0.3 + diffuse * 0.7) + vec3<f32>(specular);

    // Transmission thins the surface towards the background.
    let alpha = in.color.a * (1.0 - 0.6 * in.shading.w);
    return vec4<f32>(lit, alpha);
}
"#;

/// WGSL shader for wireframe edges. Same inputs as [`SCENE_SHADER`], flat color.
pub const WIREFRAME_SHADER: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    eye: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
    @location(7) shading: vec4<f32>,
};

struct WireOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_wire(vertex: VertexInput, instance: InstanceInput) -> WireOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    var out: WireOutput;
    out.clip_position = uniforms.view_proj * model * vec4<f32>(vertex.position, 1.0);
    out.color = instance.color;
    return out;
}

@fragment
fn fs_wire(in: WireOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
