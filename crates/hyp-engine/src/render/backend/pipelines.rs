//! Pipeline and bind-group-layout construction for the wgpu facade.

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};

use crate::render::vertex::{CircleVertex, LineVertex, QuadVertex};

pub(super) const TEXTURE_BINDINGS_MARKER: &str = "{{TEXTURE_BINDINGS}}";
pub(super) const TEXTURE_SWITCH_MARKER: &str = "{{TEXTURE_SWITCH}}";

// ── uniforms ──────────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct CameraUniform {
    pub view_projection: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct LightParams {
    pub count: u32,
    pub ambient: f32,
    pub _pad: [u32; 2], // 16-byte alignment
}

// ── blend ─────────────────────────────────────────────────────────────────

/// Shaders write premultiplied color.
pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── shader templating ─────────────────────────────────────────────────────

/// Expands the quad shader template for `slots` texture bindings.
///
/// Group 1 holds `t_slot0..t_slot{N-1}` at bindings `0..N` and the shared
/// sampler at binding `N`.
pub(super) fn expand_quad_shader(template: &str, slots: usize) -> String {
    let mut bindings = String::new();
    let mut cases = String::new();
    for i in 0..slots {
        bindings.push_str(&format!(
            "@group(1) @binding({i}) var t_slot{i}: texture_2d<f32>;\n"
        ));
        // Non-uniform control flow: explicit LOD instead of implicit derivatives.
        cases.push_str(&format!(
            "        case {i}u: {{ texel = textureSampleLevel(t_slot{i}, slot_sampler, uv, 0.0); }}\n"
        ));
    }
    bindings.push_str(&format!(
        "@group(1) @binding({slots}) var slot_sampler: sampler;\n"
    ));

    template
        .replace(TEXTURE_BINDINGS_MARKER, &bindings)
        .replace(TEXTURE_SWITCH_MARKER, cases.trim_end())
}

/// Parses and validates `source` on the CPU.
///
/// Errors carry naga's rendered diagnostic, labelled with `name`.
pub(super) fn validate_wgsl(name: &str, source: &str) -> Result<()> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow::anyhow!(e.emit_to_string_with_path(source, name)))
        .with_context(|| format!("failed to parse {name}"))?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow::anyhow!(e.emit_to_string_with_path(source, name)))
    .with_context(|| format!("failed to validate {name}"))?;

    Ok(())
}

/// Compiled shader modules, kept for pipeline rebuilds.
pub(super) struct ShaderModules {
    pub quad: wgpu::ShaderModule,
    pub circle: wgpu::ShaderModule,
    pub line: wgpu::ShaderModule,
}

impl ShaderModules {
    /// Compiles the three modules inside a validation error scope.
    pub fn compile(device: &wgpu::Device, quad: &str, circle: &str, line: &str) -> Result<Self> {
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = |label: &str, source: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };
        let modules = Self {
            quad: module("hyp quad shader", quad),
            circle: module("hyp circle shader", circle),
            line: module("hyp line shader", line),
        };

        if let Some(err) = pollster::block_on(scope.pop()) {
            anyhow::bail!("shader compilation failed: {err}");
        }
        Ok(modules)
    }
}

// ── layouts ───────────────────────────────────────────────────────────────

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages, size: usize) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: true,
            min_binding_size: wgpu::BufferSize::new(size as u64),
        },
        count: None,
    }
}

fn storage_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: true,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Bind group layouts shared by every pipeline. Independent of the surface
/// format, so they live as long as the device facade.
///
/// Every buffer binding takes a dynamic offset selecting one recorded draw's
/// region of a persistent buffer.
pub(super) struct Layouts {
    /// Group 0 of the circle and line pipelines: the camera block only.
    pub camera: wgpu::BindGroupLayout,
    /// Group 0 of the quad pipeline: camera, transforms, lights, light params.
    pub quad_frame: wgpu::BindGroupLayout,
    /// Group 1 of the quad pipeline: `slots` textures followed by the sampler.
    pub quad_texture: wgpu::BindGroupLayout,
}

impl Layouts {
    pub fn new(device: &wgpu::Device, slots: usize) -> Self {
        let camera_size = std::mem::size_of::<CameraUniform>();

        let camera = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hyp camera bgl"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, camera_size)],
        });

        let quad_frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hyp quad frame bgl"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX, camera_size),
                storage_entry(1, wgpu::ShaderStages::VERTEX),
                storage_entry(2, wgpu::ShaderStages::FRAGMENT),
                uniform_entry(3, wgpu::ShaderStages::FRAGMENT, std::mem::size_of::<LightParams>()),
            ],
        });

        let mut entries: Vec<wgpu::BindGroupLayoutEntry> = (0..slots as u32)
            .map(|binding| wgpu::BindGroupLayoutEntry {
                binding,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            })
            .collect();
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: slots as u32,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let quad_texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hyp quad texture bgl"),
            entries: &entries,
        });

        Self { camera, quad_frame, quad_texture }
    }
}

// ── pipelines ─────────────────────────────────────────────────────────────

pub(super) struct PipelineDesc<'a> {
    pub label: &'a str,
    pub module: &'a wgpu::ShaderModule,
    pub bind_group_layouts: &'a [&'a wgpu::BindGroupLayout],
    pub vertex_layout: wgpu::VertexBufferLayout<'static>,
    pub topology: wgpu::PrimitiveTopology,
}

pub(super) fn create_pipeline(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(desc.label),
        bind_group_layouts: desc.bind_group_layouts,
        immediate_size: 0,
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: desc.module,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[desc.vertex_layout],
        },

        fragment: Some(wgpu::FragmentState {
            module: desc.module,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

/// Every pipeline the facade draws with, built for one surface format.
pub(super) struct Pipelines {
    pub format: wgpu::TextureFormat,
    pub quad: wgpu::RenderPipeline,
    pub circle: wgpu::RenderPipeline,
    pub line: wgpu::RenderPipeline,
}

impl Pipelines {
    pub fn build(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        modules: &ShaderModules,
        layouts: &Layouts,
    ) -> Self {
        let quad = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "hyp quad pipeline",
                module: &modules.quad,
                bind_group_layouts: &[&layouts.quad_frame, &layouts.quad_texture],
                vertex_layout: QuadVertex::layout(),
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );
        let circle = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "hyp circle pipeline",
                module: &modules.circle,
                bind_group_layouts: &[&layouts.camera],
                vertex_layout: CircleVertex::layout(),
                topology: wgpu::PrimitiveTopology::TriangleList,
            },
        );
        let line = create_pipeline(
            device,
            format,
            PipelineDesc {
                label: "hyp line pipeline",
                module: &modules.line,
                bind_group_layouts: &[&layouts.camera],
                vertex_layout: LineVertex::layout(),
                topology: wgpu::PrimitiveTopology::LineList,
            },
        );

        Self { format, quad, circle, line }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = include_str!("shaders/quad.wgsl");

    #[test]
    fn expands_one_binding_and_case_per_slot() {
        let src = expand_quad_shader(TEMPLATE, 3);
        assert!(!src.contains(TEXTURE_BINDINGS_MARKER));
        assert!(!src.contains(TEXTURE_SWITCH_MARKER));
        for i in 0..3 {
            assert!(src.contains(&format!("@group(1) @binding({i}) var t_slot{i}: texture_2d<f32>;")));
            assert!(src.contains(&format!("case {i}u:")));
        }
        assert!(!src.contains("t_slot3"));
    }

    #[test]
    fn sampler_follows_the_last_texture_binding() {
        let src = expand_quad_shader(TEMPLATE, 32);
        assert!(src.contains("@group(1) @binding(32) var slot_sampler: sampler;"));
        assert!(src.contains("case 31u:"));
    }

    #[test]
    fn builtin_shaders_validate() {
        validate_wgsl("quad.wgsl", &expand_quad_shader(TEMPLATE, 32)).unwrap();
        validate_wgsl("circle.wgsl", include_str!("shaders/circle.wgsl")).unwrap();
        validate_wgsl("line.wgsl", include_str!("shaders/line.wgsl")).unwrap();
    }

    #[test]
    fn syntax_error_is_reported_with_shader_name() {
        let broken = TEMPLATE.replace("fn vs_main(", "fn vs_main(((");
        let err = validate_wgsl("quad.wgsl", &expand_quad_shader(&broken, 4)).unwrap_err();
        assert!(format!("{err:#}").contains("quad.wgsl"), "{err:#}");
    }

    #[test]
    fn type_error_fails_validation() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        assert!(validate_wgsl("line.wgsl", src).is_err());
    }

    #[test]
    fn uniform_blocks_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightParams>(), 16);
    }
}
