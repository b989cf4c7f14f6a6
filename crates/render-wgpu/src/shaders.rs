/// WGSL shader for chunk cubes. The uniform struct mirrors
/// `VoxelScene::program_desc` field for field.
pub const VOXEL_SHADER: &str = r#"
struct Uniforms {
    modelView: mat4x4<f32>,
    cameraView: mat4x4<f32>,
    cameraProjection: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = uniforms.cameraProjection
        * uniforms.cameraView
        * uniforms.modelView
        * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;

/// WGSL shader copying the offscreen framebuffer onto the surface with a
/// single fullscreen triangle.
pub const BLIT_SHADER: &str = r#"
@group(0) @binding(0)
var frame_texture: texture_2d<f32>;
@group(0) @binding(1)
var frame_sampler: sampler;

struct BlitOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_blit(@builtin(vertex_index) index: u32) -> BlitOutput {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    var out: BlitOutput;
    out.clip_position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_blit(in: BlitOutput) -> @location(0) vec4<f32> {
    return textureSample(frame_texture, frame_sampler, in.uv);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use voxelview_render::VoxelScene;

    #[test]
    fn voxel_uniforms_match_scene_layout() {
        let desc = VoxelScene::program_desc();
        let mut last = 0;
        for (name, _) in &desc.uniforms {
            let field = format!("{name}: mat4x4<f32>");
            let at = VOXEL_SHADER
                .find(&field)
                .unwrap_or_else(|| panic!("missing uniform {name}"));
            assert!(at > last, "uniform {name} out of order");
            last = at;
        }
    }

    #[test]
    fn entry_points_present() {
        assert!(VOXEL_SHADER.contains("fn vs_main"));
        assert!(VOXEL_SHADER.contains("fn fs_main"));
        assert!(BLIT_SHADER.contains("fn vs_blit"));
        assert!(BLIT_SHADER.contains("fn fs_blit"));
    }
}
