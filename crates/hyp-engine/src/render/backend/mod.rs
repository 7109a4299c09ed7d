//! wgpu implementation of [`RenderDevice`].
//!
//! Shaders are validated and compiled when the facade is created. Draw calls
//! are recorded with CPU copies of their batch data and replayed into a single
//! render pass by [`WgpuDevice::encode`]. Vertices, transforms, cameras and
//! lights live in persistent buffers; each recorded draw owns a region of
//! them, so several rollovers in one frame never overwrite each other's data
//! before the GPU consumes it.

mod buffers;
mod pipelines;

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use nalgebra::Matrix4;
use wgpu::util::DeviceExt;

use super::batch::mat4_columns;
use super::config::RendererConfig;
use super::ctx::{RenderCtx, RenderTarget};
use super::device::{QuadSubmission, RenderDevice, TextureId, TextureSpec};
use super::lighting::Light;
use super::vertex::{CircleVertex, LineVertex, QuadVertex};

use buffers::{GrowableBuffer, Strides, VertexCursor};
use pipelines::{
    expand_quad_shader, validate_wgsl, CameraUniform, Layouts, LightParams, Pipelines,
    ShaderModules, TEXTURE_BINDINGS_MARKER, TEXTURE_SWITCH_MARKER,
};

const QUAD_SHADER: &str = include_str!("shaders/quad.wgsl");
const CIRCLE_SHADER: &str = include_str!("shaders/circle.wgsl");
const LINE_SHADER: &str = include_str!("shaders/line.wgsl");

/// Distinct texture sets kept bound before the cache is rebuilt.
const TEXTURE_GROUP_CACHE: usize = 64;

/// Sampler filter shared by every texture slot.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

impl TextureFilter {
    fn to_wgpu(self) -> wgpu::FilterMode {
        match self {
            TextureFilter::Linear => wgpu::FilterMode::Linear,
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WgpuDeviceConfig {
    /// Directory holding `quad.wgsl`, `circle.wgsl` and `line.wgsl`.
    /// `None` uses the shaders compiled into the crate.
    pub shader_dir: Option<PathBuf>,
    pub filter: TextureFilter,
    /// Light level applied to lit quads before point lights are added.
    pub ambient: f32,
    /// Upper bound on texture bindings; the device limit may lower it further.
    pub max_texture_slots: usize,
}

impl Default for WgpuDeviceConfig {
    fn default() -> Self {
        Self {
            shader_dir: None,
            filter: TextureFilter::Linear,
            ambient: 0.1,
            max_texture_slots: 32,
        }
    }
}

// ── shader sources ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ShaderSources {
    quad: String,
    circle: String,
    line: String,
}

impl ShaderSources {
    fn load(dir: Option<&Path>) -> Result<Self> {
        let sources = match dir {
            None => Self {
                quad: QUAD_SHADER.to_owned(),
                circle: CIRCLE_SHADER.to_owned(),
                line: LINE_SHADER.to_owned(),
            },
            Some(dir) => Self {
                quad: read_shader(dir, "quad.wgsl")?,
                circle: read_shader(dir, "circle.wgsl")?,
                line: read_shader(dir, "line.wgsl")?,
            },
        };

        anyhow::ensure!(
            sources.quad.contains(TEXTURE_BINDINGS_MARKER)
                && sources.quad.contains(TEXTURE_SWITCH_MARKER),
            "quad shader must contain the {} and {} placeholders",
            TEXTURE_BINDINGS_MARKER,
            TEXTURE_SWITCH_MARKER
        );
        Ok(sources)
    }

    /// Expands the quad template for `slots` and validates all three
    /// sources. Returns the expanded quad source.
    fn validated(&self, slots: usize) -> Result<String> {
        let quad = expand_quad_shader(&self.quad, slots);
        validate_wgsl("quad.wgsl", &quad)?;
        validate_wgsl("circle.wgsl", &self.circle)?;
        validate_wgsl("line.wgsl", &self.line)?;
        Ok(quad)
    }
}

fn read_shader(dir: &Path, name: &str) -> Result<String> {
    let path = dir.join(name);
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read shader {}", path.display()))?;
    log::debug!("loaded shader {}", path.display());
    Ok(source)
}

// ── recorded state ────────────────────────────────────────────────────────

struct GpuTexture {
    spec: TextureSpec,
    upload: Option<Vec<u8>>,
    view: Option<wgpu::TextureView>,
    _texture: Option<wgpu::Texture>,
}

struct LightSet {
    lights: Vec<Light>,
    active: u32,
}

enum PendingDraw {
    Quads {
        vertices: Vec<QuadVertex>,
        transforms: Vec<[[f32; 4]; 4]>,
        textures: Vec<TextureId>,
        index_count: u32,
        camera: usize,
        lights: usize,
    },
    Circles {
        vertices: Vec<CircleVertex>,
        index_count: u32,
        camera: usize,
    },
    Lines {
        vertices: Vec<LineVertex>,
        camera: usize,
    },
}

/// A recorded draw resolved to buffer regions for this frame.
enum StagedDraw {
    Quads {
        vertices: Range<u64>,
        /// Camera, transforms, lights and light-params offsets, in binding order.
        offsets: [u32; 4],
        textures: Vec<TextureId>,
        index_count: u32,
    },
    Circles {
        vertices: Range<u64>,
        camera: u32,
        index_count: u32,
    },
    Lines {
        vertices: Range<u64>,
        camera: u32,
        vertex_count: u32,
    },
}

#[derive(Debug, Copy, Clone)]
enum Region {
    QuadVertices,
    CircleVertices,
    LineVertices,
    Transforms,
    Cameras,
    Lights,
    LightParams,
}

struct FrameBuffers {
    quad_vertices: GrowableBuffer,
    circle_vertices: GrowableBuffer,
    line_vertices: GrowableBuffer,
    transforms: GrowableBuffer,
    cameras: GrowableBuffer,
    lights: GrowableBuffer,
    light_params: GrowableBuffer,
}

impl FrameBuffers {
    fn new(device: &wgpu::Device, batch: &RendererConfig, strides: &Strides) -> Self {
        let vertex = wgpu::BufferUsages::VERTEX;
        let bytes = |count: usize, size: usize| (count * size) as u64;

        Self {
            quad_vertices: GrowableBuffer::new(
                device,
                "hyp quad vbo",
                vertex,
                bytes(batch.max_quads * 4, std::mem::size_of::<QuadVertex>()),
            ),
            circle_vertices: GrowableBuffer::new(
                device,
                "hyp circle vbo",
                vertex,
                bytes(batch.max_circles * 4, std::mem::size_of::<CircleVertex>()),
            ),
            line_vertices: GrowableBuffer::new(
                device,
                "hyp line vbo",
                vertex,
                bytes(batch.max_line_vertices, std::mem::size_of::<LineVertex>()),
            ),
            transforms: GrowableBuffer::new(
                device,
                "hyp quad transforms",
                wgpu::BufferUsages::STORAGE,
                strides.transforms,
            ),
            cameras: GrowableBuffer::new(
                device,
                "hyp camera ubo",
                wgpu::BufferUsages::UNIFORM,
                strides.camera,
            ),
            lights: GrowableBuffer::new(
                device,
                "hyp light storage",
                wgpu::BufferUsages::STORAGE,
                strides.lights,
            ),
            light_params: GrowableBuffer::new(
                device,
                "hyp light params",
                wgpu::BufferUsages::UNIFORM,
                strides.light_params,
            ),
        }
    }

    fn get(&self, region: Region) -> &wgpu::Buffer {
        match region {
            Region::QuadVertices => self.quad_vertices.buffer(),
            Region::CircleVertices => self.circle_vertices.buffer(),
            Region::LineVertices => self.line_vertices.buffer(),
            Region::Transforms => self.transforms.buffer(),
            Region::Cameras => self.cameras.buffer(),
            Region::Lights => self.lights.buffer(),
            Region::LightParams => self.light_params.buffer(),
        }
    }
}

/// Bind groups over the persistent buffers; rebuilt only when one grows.
struct FrameBindings {
    camera: wgpu::BindGroup,
    quad_frame: wgpu::BindGroup,
}

impl FrameBindings {
    fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        buffers: &FrameBuffers,
        strides: &Strides,
    ) -> Self {
        let camera_size = std::mem::size_of::<CameraUniform>() as u64;

        let camera = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hyp camera bind group"),
            layout: &layouts.camera,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer_binding(&buffers.cameras, camera_size),
            }],
        });

        let quad_frame = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hyp quad frame bind group"),
            layout: &layouts.quad_frame,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer_binding(&buffers.cameras, camera_size),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: buffer_binding(&buffers.transforms, strides.transforms_binding),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: buffer_binding(&buffers.lights, strides.lights_binding),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: buffer_binding(
                        &buffers.light_params,
                        std::mem::size_of::<LightParams>() as u64,
                    ),
                },
            ],
        });

        Self { camera, quad_frame }
    }
}

/// One region of a dynamically offset buffer binding.
fn buffer_binding(buffer: &GrowableBuffer, size: u64) -> wgpu::BindingResource<'_> {
    wgpu::BindingResource::Buffer(wgpu::BufferBinding {
        buffer: buffer.buffer(),
        offset: 0,
        size: wgpu::BufferSize::new(size),
    })
}

/// [`RenderDevice`] backed by wgpu.
///
/// Construction compiles the shaders and allocates the batch buffers; the
/// surface-dependent pipelines and texture uploads wait for the first
/// [`encode`](Self::encode).
pub struct WgpuDevice {
    device: wgpu::Device,
    config: WgpuDeviceConfig,
    batch: RendererConfig,
    slots: usize,
    max_texture_dimension: u32,

    modules: ShaderModules,
    layouts: Layouts,
    pipelines: Option<Pipelines>,
    sampler: wgpu::Sampler,

    strides: Strides,
    buffers: FrameBuffers,
    bindings: FrameBindings,
    texture_groups: HashMap<Vec<TextureId>, wgpu::BindGroup>,
    quad_ibo: Option<wgpu::Buffer>,

    textures: Vec<GpuTexture>,
    cameras: Vec<CameraUniform>,
    light_sets: Vec<LightSet>,
    pending: Vec<PendingDraw>,
}

impl WgpuDevice {
    /// Creates the facade for batches up to the limits in `batch`.
    ///
    /// Fails if a shader cannot be read, parsed, validated or compiled.
    pub fn new(device: &wgpu::Device, config: WgpuDeviceConfig, batch: &RendererConfig) -> Result<Self> {
        let limits = device.limits();
        let slots = config
            .max_texture_slots
            .min(limits.max_sampled_textures_per_shader_stage as usize);
        anyhow::ensure!(slots > 0, "device exposes no sampled texture bindings");

        let sources = ShaderSources::load(config.shader_dir.as_deref())
            .context("failed to load renderer shaders")?;
        let quad_source = sources
            .validated(slots)
            .context("failed to compile renderer shaders")?;
        let modules = ShaderModules::compile(device, &quad_source, &sources.circle, &sources.line)
            .context("failed to compile renderer shaders")?;

        let layouts = Layouts::new(device, slots);
        let strides = Strides::new(&limits, batch);
        let buffers = FrameBuffers::new(device, batch, &strides);
        let bindings = FrameBindings::new(device, &layouts, &buffers, &strides);

        let filter = config.filter.to_wgpu();
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("hyp texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "wgpu render device: {} texture slots, max texture size {}",
            slots,
            limits.max_texture_dimension_2d
        );

        Ok(Self {
            device: device.clone(),
            batch: batch.clone(),
            slots,
            max_texture_dimension: limits.max_texture_dimension_2d,
            modules,
            layouts,
            pipelines: None,
            sampler,
            strides,
            buffers,
            bindings,
            texture_groups: HashMap::new(),
            quad_ibo: None,
            textures: Vec::new(),
            cameras: Vec::new(),
            light_sets: Vec::new(),
            pending: Vec::new(),
            config,
        })
    }

    /// Number of draws recorded since the last [`encode`](Self::encode).
    pub fn pending_draws(&self) -> usize {
        self.pending.len()
    }

    /// Replays every recorded draw into `target`, in submission order.
    ///
    /// Loads the existing target contents; clearing is the caller's job.
    pub fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        self.ensure_pipelines(ctx);
        self.upload_textures(ctx);

        if self.pending.is_empty() {
            self.retire();
            return;
        }

        let staged = self.stage_draws(ctx);

        // Immutable borrows only from here on.
        let Some(pipelines) = self.pipelines.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("hyp 2d pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for draw in &staged {
                match draw {
                    StagedDraw::Quads { vertices, offsets, textures, index_count } => {
                        let Some(texture_group) = self.texture_groups.get(textures) else { continue };
                        rpass.set_pipeline(&pipelines.quad);
                        rpass.set_bind_group(0, &self.bindings.quad_frame, offsets);
                        rpass.set_bind_group(1, texture_group, &[]);
                        rpass.set_vertex_buffer(0, self.buffers.quad_vertices.buffer().slice(vertices.clone()));
                        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    StagedDraw::Circles { vertices, camera, index_count } => {
                        rpass.set_pipeline(&pipelines.circle);
                        rpass.set_bind_group(0, &self.bindings.camera, &[*camera]);
                        rpass.set_vertex_buffer(0, self.buffers.circle_vertices.buffer().slice(vertices.clone()));
                        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint32);
                        rpass.draw_indexed(0..*index_count, 0, 0..1);
                    }
                    StagedDraw::Lines { vertices, camera, vertex_count } => {
                        rpass.set_pipeline(&pipelines.line);
                        rpass.set_bind_group(0, &self.bindings.camera, &[*camera]);
                        rpass.set_vertex_buffer(0, self.buffers.line_vertices.buffer().slice(vertices.clone()));
                        rpass.draw(0..*vertex_count, 0..1);
                    }
                }
            }
        }

        self.retire();
    }

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self.pipelines.as_ref().map(|p| p.format) == Some(ctx.surface_format) {
            return;
        }
        log::debug!("building 2D pipelines for {:?}", ctx.surface_format);
        self.pipelines = Some(Pipelines::build(
            ctx.device,
            ctx.surface_format,
            &self.modules,
            &self.layouts,
        ));
    }

    fn upload_textures(&mut self, ctx: &RenderCtx<'_>) {
        for tex in &mut self.textures {
            let Some(rgba) = tex.upload.take() else { continue };

            let size = wgpu::Extent3d {
                width: tex.spec.width,
                height: tex.spec.height,
                depth_or_array_layers: 1,
            };
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: tex.spec.label.as_deref(),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(tex.spec.width * 4),
                    rows_per_image: Some(tex.spec.height),
                },
                size,
            );

            tex.view = Some(texture.create_view(&wgpu::TextureViewDescriptor::default()));
            tex._texture = Some(texture);
        }
    }

    /// Assigns every recorded draw its buffer regions, grows the persistent
    /// buffers to fit and writes this frame's data into them.
    fn stage_draws(&mut self, ctx: &RenderCtx<'_>) -> Vec<StagedDraw> {
        let strides = self.strides;
        let mut uploads: Vec<(Region, u64, &[u8])> = Vec::new();
        let mut staged = Vec::with_capacity(self.pending.len());

        let mut quad_vertices = VertexCursor::default();
        let mut circle_vertices = VertexCursor::default();
        let mut line_vertices = VertexCursor::default();
        let mut quad_draws = 0u64;

        if self.texture_groups.len() >= TEXTURE_GROUP_CACHE {
            self.texture_groups.clear();
        }

        for draw in &self.pending {
            match draw {
                PendingDraw::Quads { vertices, transforms, textures, index_count, camera, lights } => {
                    if !self.texture_groups.contains_key(textures) {
                        let Some(group) = texture_group(
                            ctx.device,
                            &self.layouts,
                            &self.sampler,
                            &self.textures,
                            self.slots,
                            textures,
                        ) else {
                            log::warn!("quad batch references no uploaded texture; draw skipped");
                            continue;
                        };
                        self.texture_groups.insert(textures.clone(), group);
                    }

                    let bytes: &[u8] = bytemuck::cast_slice(vertices);
                    let range = quad_vertices.reserve(bytes.len() as u64);
                    uploads.push((Region::QuadVertices, range.start, bytes));

                    let transforms_offset = quad_draws * strides.transforms;
                    let transforms = &transforms[..transforms.len().min(self.batch.max_quads)];
                    uploads.push((Region::Transforms, transforms_offset, bytemuck::cast_slice(transforms)));
                    quad_draws += 1;

                    staged.push(StagedDraw::Quads {
                        vertices: range,
                        offsets: [
                            (*camera as u64 * strides.camera) as u32,
                            transforms_offset as u32,
                            (*lights as u64 * strides.lights) as u32,
                            (*lights as u64 * strides.light_params) as u32,
                        ],
                        textures: textures.clone(),
                        index_count: *index_count,
                    });
                }
                PendingDraw::Circles { vertices, index_count, camera } => {
                    let bytes: &[u8] = bytemuck::cast_slice(vertices);
                    let range = circle_vertices.reserve(bytes.len() as u64);
                    uploads.push((Region::CircleVertices, range.start, bytes));
                    staged.push(StagedDraw::Circles {
                        vertices: range,
                        camera: (*camera as u64 * strides.camera) as u32,
                        index_count: *index_count,
                    });
                }
                PendingDraw::Lines { vertices, camera } => {
                    let bytes: &[u8] = bytemuck::cast_slice(vertices);
                    let range = line_vertices.reserve(bytes.len() as u64);
                    uploads.push((Region::LineVertices, range.start, bytes));
                    staged.push(StagedDraw::Lines {
                        vertices: range,
                        camera: (*camera as u64 * strides.camera) as u32,
                        vertex_count: vertices.len() as u32,
                    });
                }
            }
        }

        for (i, camera) in self.cameras.iter().enumerate() {
            uploads.push((Region::Cameras, i as u64 * strides.camera, bytemuck::bytes_of(camera)));
        }

        let mut light_params = Vec::with_capacity(self.light_sets.len());
        for (i, set) in self.light_sets.iter().enumerate() {
            let lights = &set.lights[..set.lights.len().min(self.batch.max_lights)];
            if !lights.is_empty() {
                uploads.push((Region::Lights, i as u64 * strides.lights, bytemuck::cast_slice(lights)));
            }
            light_params.push(LightParams {
                count: set.active.min(lights.len() as u32),
                ambient: self.config.ambient,
                _pad: [0; 2],
            });
        }
        for (i, params) in light_params.iter().enumerate() {
            uploads.push((Region::LightParams, i as u64 * strides.light_params, bytemuck::bytes_of(params)));
        }

        let device = ctx.device;
        let buffers = &mut self.buffers;
        buffers.quad_vertices.ensure_capacity(device, quad_vertices.total());
        buffers.circle_vertices.ensure_capacity(device, circle_vertices.total());
        buffers.line_vertices.ensure_capacity(device, line_vertices.total());

        // Bound buffers need room for a full region past the last offset.
        let mut rebind = false;
        rebind |= buffers.transforms.ensure_capacity(device, quad_draws.max(1) * strides.transforms);
        rebind |= buffers.cameras.ensure_capacity(device, self.cameras.len().max(1) as u64 * strides.camera);
        rebind |= buffers.lights.ensure_capacity(device, self.light_sets.len().max(1) as u64 * strides.lights);
        rebind |= buffers
            .light_params
            .ensure_capacity(device, self.light_sets.len().max(1) as u64 * strides.light_params);
        if rebind {
            self.bindings = FrameBindings::new(device, &self.layouts, &self.buffers, &strides);
        }

        for (region, offset, bytes) in uploads {
            if !bytes.is_empty() {
                ctx.queue.write_buffer(self.buffers.get(region), offset, bytes);
            }
        }

        staged
    }

    /// Drops recorded draws, keeping the latest camera and light set so a
    /// scene left open across frames still draws with them.
    fn retire(&mut self) {
        self.pending.clear();
        if let Some(camera) = self.cameras.pop() {
            self.cameras.clear();
            self.cameras.push(camera);
        }
        if let Some(lights) = self.light_sets.pop() {
            self.light_sets.clear();
            self.light_sets.push(lights);
        }
    }

    fn camera_index(&mut self) -> usize {
        if self.cameras.is_empty() {
            self.cameras.push(CameraUniform { view_projection: mat4_columns(&Matrix4::identity()) });
        }
        self.cameras.len() - 1
    }

    fn lights_index(&mut self) -> usize {
        if self.light_sets.is_empty() {
            self.light_sets.push(LightSet { lights: Vec::new(), active: 0 });
        }
        self.light_sets.len() - 1
    }
}

fn view_of(textures: &[GpuTexture], id: TextureId) -> Option<&wgpu::TextureView> {
    textures.get(id.0 as usize).and_then(|t| t.view.as_ref())
}

/// Binds `ids` to slots `0..slots`; unused slots repeat slot 0.
fn texture_group(
    device: &wgpu::Device,
    layouts: &Layouts,
    sampler: &wgpu::Sampler,
    textures: &[GpuTexture],
    slots: usize,
    ids: &[TextureId],
) -> Option<wgpu::BindGroup> {
    let fallback = ids.first().and_then(|id| view_of(textures, *id))?;

    let mut entries: Vec<wgpu::BindGroupEntry<'_>> = (0..slots)
        .map(|slot| {
            let view = ids
                .get(slot)
                .and_then(|id| view_of(textures, *id))
                .unwrap_or(fallback);
            wgpu::BindGroupEntry {
                binding: slot as u32,
                resource: wgpu::BindingResource::TextureView(view),
            }
        })
        .collect();
    entries.push(wgpu::BindGroupEntry {
        binding: slots as u32,
        resource: wgpu::BindingResource::Sampler(sampler),
    });

    Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("hyp quad texture bind group"),
        layout: &layouts.quad_texture,
        entries: &entries,
    }))
}

impl RenderDevice for WgpuDevice {
    fn max_texture_slots(&self) -> usize {
        self.slots
    }

    fn create_texture(&mut self, spec: &TextureSpec, rgba: &[u8]) -> Result<TextureId> {
        anyhow::ensure!(
            spec.width > 0 && spec.height > 0,
            "texture {:?} has zero size",
            spec.label
        );
        anyhow::ensure!(
            spec.width <= self.max_texture_dimension && spec.height <= self.max_texture_dimension,
            "texture {}x{} exceeds the device limit of {}",
            spec.width,
            spec.height,
            self.max_texture_dimension
        );
        anyhow::ensure!(
            rgba.len() == spec.byte_len(),
            "texture data is {} bytes, expected {}",
            rgba.len(),
            spec.byte_len()
        );

        let id = TextureId(self.textures.len() as u32);
        self.textures.push(GpuTexture {
            spec: spec.clone(),
            upload: Some(rgba.to_vec()),
            view: None,
            _texture: None,
        });
        Ok(id)
    }

    fn set_quad_indices(&mut self, indices: &[u32]) {
        self.quad_ibo = Some(self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("hyp quad ibo"),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn set_camera(&mut self, view_projection: &Matrix4<f32>) {
        self.cameras.push(CameraUniform { view_projection: mat4_columns(view_projection) });
    }

    fn set_lights(&mut self, lights: &[Light], active: u32) {
        self.light_sets.push(LightSet { lights: lights.to_vec(), active });
    }

    fn draw_quads(&mut self, batch: QuadSubmission<'_>) {
        let camera = self.camera_index();
        let lights = self.lights_index();
        self.pending.push(PendingDraw::Quads {
            vertices: batch.vertices.to_vec(),
            transforms: batch.transforms.to_vec(),
            textures: batch.textures.to_vec(),
            index_count: batch.index_count,
            camera,
            lights,
        });
    }

    fn draw_circles(&mut self, vertices: &[CircleVertex], index_count: u32) {
        let camera = self.camera_index();
        self.pending.push(PendingDraw::Circles { vertices: vertices.to_vec(), index_count, camera });
    }

    fn draw_lines(&mut self, vertices: &[LineVertex]) {
        let camera = self.camera_index();
        self.pending.push(PendingDraw::Lines { vertices: vertices.to_vec(), camera });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shaders_carry_texture_placeholders() {
        let sources = ShaderSources::load(None).unwrap();
        assert!(sources.quad.contains(TEXTURE_BINDINGS_MARKER));
        assert!(sources.circle.contains("fn fs_main"));
        assert!(sources.line.contains("fn vs_main"));
    }

    #[test]
    fn missing_shader_dir_reports_the_path() {
        let dir = std::env::temp_dir().join("hyp-engine-no-such-shader-dir");
        let err = ShaderSources::load(Some(&dir)).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("quad.wgsl"), "{msg}");
    }

    #[test]
    fn shader_dir_without_placeholders_is_rejected() {
        let dir = std::env::temp_dir().join(format!("hyp-engine-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("quad.wgsl"), "// no placeholders").unwrap();
        std::fs::write(dir.join("circle.wgsl"), CIRCLE_SHADER).unwrap();
        std::fs::write(dir.join("line.wgsl"), LINE_SHADER).unwrap();

        let err = ShaderSources::load(Some(&dir)).unwrap_err();
        assert!(err.to_string().contains("placeholders"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn builtin_shaders_expand_and_validate() {
        let sources = ShaderSources::load(None).unwrap();
        let quad = sources.validated(32).unwrap();
        assert!(quad.contains("var t_slot31: texture_2d<f32>;"));
    }

    #[test]
    fn invalid_shader_in_dir_is_rejected_at_creation() {
        let dir = std::env::temp_dir().join(format!("hyp-engine-broken-shaders-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let broken = QUAD_SHADER.replace("fn fs_main(", "fn fs_main((");
        std::fs::write(dir.join("quad.wgsl"), broken).unwrap();
        std::fs::write(dir.join("circle.wgsl"), CIRCLE_SHADER).unwrap();
        std::fs::write(dir.join("line.wgsl"), LINE_SHADER).unwrap();

        // Placeholders are intact, so loading alone succeeds.
        let sources = ShaderSources::load(Some(&dir)).unwrap();
        let err = sources.validated(4).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("quad.wgsl"), "{msg}");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn filter_maps_to_wgpu_modes() {
        assert_eq!(TextureFilter::default().to_wgpu(), wgpu::FilterMode::Linear);
        assert_eq!(TextureFilter::Nearest.to_wgpu(), wgpu::FilterMode::Nearest);
    }
}
