//! Per-frame render driver.
//!
//! Owns N frame slots (render targets, framebuffer, command list, fence,
//! render-finished semaphore) allocated once at construction and reused
//! every frame. Each `update` runs the per-frame state machine:
//! batch entities by pipeline → wait on the slot fence (bounded) → record
//! → submit → advance the slot index modulo N. The fence-wait-before-
//! reuse rule caps CPU/GPU overlap at N frames and guarantees a command
//! list is never reset while still in flight.

use glam::Mat4;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearValue, CommandList, Fence, Framebuffer, FramebufferDesc, GraphicsDevice,
    RenderPass, Rect2D, Semaphore, ShaderStageFlags, SubmitDesc, Texture,
    TextureDesc, TextureFormat, TextureUsage, Viewport,
};
use crate::log::Log;
use crate::render::render_pass_manager::{RenderPassKind, RenderPassManager};
use crate::render::renderable::Renderable;
use crate::resource::{AssetId, ResourceManager};
use crate::{engine_error, engine_warn};

/// Bound on the per-frame fence wait; exceeding it means a stuck device
const FRAME_FENCE_TIMEOUT: Duration = Duration::from_secs(1);

/// Render system configuration
#[derive(Debug, Clone)]
pub struct RenderSystemConfig {
    /// Number of frame slots; `None` uses the device's swapchain image count
    pub frame_count: Option<u32>,
    /// Render target width in pixels
    pub width: u32,
    /// Render target height in pixels
    pub height: u32,
}

impl Default for RenderSystemConfig {
    fn default() -> Self {
        Self {
            frame_count: None,
            width: 1280,
            height: 720,
        }
    }
}

/// Counters for the most recent `update`
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    /// Indexed draw calls issued
    pub draw_calls: u32,
    /// Pipeline buckets that were drawn
    pub batches: u32,
    /// Entities skipped (unresolved references, undriven pass kinds)
    pub skipped_entities: u32,
}

/// One of N reusable sets of per-frame resources
struct FrameSlot {
    color_target: Arc<dyn Texture>,
    #[allow(dead_code)]
    depth_target: Arc<dyn Texture>,
    framebuffer: Arc<dyn Framebuffer>,
    cmd: Box<dyn CommandList>,
    fence: Box<dyn Fence>,
    render_finished: Arc<dyn Semaphore>,
}

/// The per-frame driver: batches draw work, manages N-buffered
/// synchronization, and orders submission.
pub struct RenderSystem {
    device: Arc<dyn GraphicsDevice>,
    log: Log,
    forward_pass: Arc<dyn RenderPass>,
    slots: Vec<FrameSlot>,
    current_frame_index: usize,
    width: u32,
    height: u32,
    stats: FrameStats,
}

impl RenderSystem {
    /// Allocate all frame slots.
    ///
    /// Fences start signaled so the first wait on each slot does not
    /// block. "Image available" semaphores are supplied per-update by the
    /// presentation subsystem. Any device-object-creation failure here is
    /// fatal.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        render_passes: &RenderPassManager,
        log: Log,
        config: RenderSystemConfig,
    ) -> Result<Self> {
        let frame_count = config
            .frame_count
            .unwrap_or_else(|| device.swapchain_image_count())
            .max(1);

        let forward_pass = render_passes
            .render_pass(RenderPassKind::ForwardComposite)
            .ok_or_else(|| {
                Error::MissingDependency(
                    "render pass kind ForwardComposite required by the render system".to_string(),
                )
            })?
            .clone();
        let color_format = render_passes
            .color_format(RenderPassKind::ForwardComposite)
            .unwrap_or(TextureFormat::B8G8R8A8_UNORM);
        let depth_format = render_passes
            .depth_format(RenderPassKind::ForwardComposite)
            .unwrap_or(TextureFormat::D32_FLOAT);

        let mut slots = Vec::with_capacity(frame_count as usize);
        for slot_index in 0..frame_count {
            let color_target = device
                .create_texture(TextureDesc {
                    width: config.width,
                    height: config.height,
                    format: color_format,
                    usage: TextureUsage::RENDER_TARGET | TextureUsage::SAMPLED,
                    mip_levels: 1,
                    array_layers: 1,
                })
                .map_err(|e| {
                    engine_error!(
                        log,
                        "quasar3d::RenderSystem",
                        "Failed to create color target for frame slot {}: {}",
                        slot_index,
                        e
                    );
                    e
                })?;
            let depth_target = device
                .create_texture(TextureDesc {
                    width: config.width,
                    height: config.height,
                    format: depth_format,
                    usage: TextureUsage::DEPTH_STENCIL,
                    mip_levels: 1,
                    array_layers: 1,
                })
                .map_err(|e| {
                    engine_error!(
                        log,
                        "quasar3d::RenderSystem",
                        "Failed to create depth target for frame slot {}: {}",
                        slot_index,
                        e
                    );
                    e
                })?;
            let framebuffer = device.create_framebuffer(&FramebufferDesc {
                render_pass: Arc::clone(&forward_pass),
                attachments: vec![Arc::clone(&color_target), Arc::clone(&depth_target)],
                width: config.width,
                height: config.height,
            })?;
            let cmd = device.create_command_list()?;
            // Signaled so the first Prepare on this slot does not block
            let fence = device.create_fence(true)?;
            let render_finished = device.create_semaphore()?;

            slots.push(FrameSlot {
                color_target,
                depth_target,
                framebuffer,
                cmd,
                fence,
                render_finished,
            });
        }

        Ok(Self {
            device,
            log,
            forward_pass,
            slots,
            current_frame_index: 0,
            width: config.width,
            height: config.height,
            stats: FrameStats::default(),
        })
    }

    /// Run one frame: batch, wait, record, submit, advance.
    ///
    /// With zero renderables the frame is still recorded (clear-only),
    /// submitted, and the slot index advances.
    pub fn update(
        &mut self,
        renderables: &[Renderable],
        resources: &ResourceManager,
        image_available: Option<&Arc<dyn Semaphore>>,
    ) -> Result<()> {
        // ========== BATCHING ==========
        // Recomputed every frame, no cross-frame caching: correct under
        // arbitrary scene mutation at the cost of some CPU per frame.
        let mut batches: FxHashMap<AssetId, Vec<usize>> = FxHashMap::default();
        let mut skipped_entities = 0u32;
        for (index, renderable) in renderables.iter().enumerate() {
            match resources.material(renderable.material) {
                Ok(material) => {
                    batches.entry(material.pipeline()).or_default().push(index);
                }
                Err(_) => {
                    engine_warn!(
                        self.log,
                        "quasar3d::RenderSystem",
                        "Skipping entity {}: material {} not resolvable",
                        index,
                        renderable.material
                    );
                    skipped_entities += 1;
                }
            }
        }
        // Time-ordered ids give a deterministic submission order
        let mut pipeline_ids: Vec<AssetId> = batches.keys().copied().collect();
        pipeline_ids.sort_unstable();

        // ========== PREPARE ==========
        let frame_index = self.current_frame_index;
        let slot = &mut self.slots[frame_index];
        slot.fence.wait(FRAME_FENCE_TIMEOUT).map_err(|_| {
            engine_error!(
                self.log,
                "quasar3d::RenderSystem",
                "Frame slot {} fence did not signal within {:?}",
                frame_index,
                FRAME_FENCE_TIMEOUT
            );
            Error::SyncTimeout(format!(
                "frame slot {} fence exceeded {:?}",
                frame_index, FRAME_FENCE_TIMEOUT
            ))
        })?;
        slot.fence.reset()?;
        slot.cmd.reset()?;
        slot.cmd.begin()?;

        // ========== RECORD ==========
        let clear_values = [
            ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ];
        slot.cmd
            .begin_render_pass(&self.forward_pass, &slot.framebuffer, &clear_values)?;
        slot.cmd.set_viewport(Viewport {
            x: 0.0,
            y: 0.0,
            width: self.width as f32,
            height: self.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        })?;
        slot.cmd.set_scissor(Rect2D {
            x: 0,
            y: 0,
            width: self.width,
            height: self.height,
        })?;

        let mut draw_calls = 0u32;
        let mut batch_count = 0u32;
        for pipeline_id in pipeline_ids {
            let entity_indices = &batches[&pipeline_id];
            let pipeline = match resources.pipeline(pipeline_id) {
                Ok(pipeline) => pipeline,
                Err(_) => {
                    skipped_entities += entity_indices.len() as u32;
                    engine_warn!(
                        self.log,
                        "quasar3d::RenderSystem",
                        "Skipping batch: pipeline {} not resolvable",
                        pipeline_id
                    );
                    continue;
                }
            };
            // Only the forward pass is driven here; entities targeting
            // other kinds are skipped until those passes are wired in.
            if pipeline.render_pass_kind() != RenderPassKind::ForwardComposite {
                skipped_entities += entity_indices.len() as u32;
                continue;
            }

            slot.cmd.bind_pipeline(pipeline.pipeline())?;
            batch_count += 1;

            for &entity_index in entity_indices {
                let renderable = &renderables[entity_index];
                let material = resources.material(renderable.material)?;
                let mesh = match resources.mesh(renderable.mesh) {
                    Ok(mesh) => mesh,
                    Err(_) => {
                        engine_warn!(
                            self.log,
                            "quasar3d::RenderSystem",
                            "Skipping entity {}: mesh {} not resolvable",
                            entity_index,
                            renderable.mesh
                        );
                        skipped_entities += 1;
                        continue;
                    }
                };
                if mesh.index_count() == 0 {
                    // No geometry uploaded yet
                    skipped_entities += 1;
                    continue;
                }

                slot.cmd
                    .bind_binding_group(pipeline.pipeline(), 1, material.binding_group())?;
                slot.cmd.push_constants(
                    ShaderStageFlags::VERTEX,
                    0,
                    bytemuck::bytes_of::<Mat4>(&renderable.transform),
                )?;
                slot.cmd.bind_vertex_buffer(mesh.vertex_buffer(), 0)?;
                slot.cmd.bind_index_buffer(mesh.index_buffer(), 0, mesh.index_type())?;
                slot.cmd.draw_indexed(mesh.index_count(), 0, 0)?;
                draw_calls += 1;
            }
        }

        slot.cmd.end_render_pass()?;

        // ========== SUBMIT / END ==========
        slot.cmd.end()?;

        let wait_semaphores: Vec<&dyn Semaphore> =
            image_available.map(|s| s.as_ref()).into_iter().collect();
        let signal_semaphores: [&dyn Semaphore; 1] = [slot.render_finished.as_ref()];
        self.device.submit(SubmitDesc {
            command_lists: &[slot.cmd.as_ref()],
            wait_semaphores: &wait_semaphores,
            signal_semaphores: &signal_semaphores,
            fence: Some(slot.fence.as_ref()),
        })?;

        self.current_frame_index = (frame_index + 1) % self.slots.len();
        self.stats = FrameStats {
            draw_calls,
            batches: batch_count,
            skipped_entities,
        };
        Ok(())
    }

    // ===== ACCESSORS =====

    /// Index of the frame slot the next `update` will use
    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    /// Number of frame slots N
    pub fn frame_count(&self) -> usize {
        self.slots.len()
    }

    /// The render-finished semaphore of a slot, for presentation wiring
    pub fn render_finished_semaphore(&self, slot: usize) -> Option<&Arc<dyn Semaphore>> {
        self.slots.get(slot).map(|s| &s.render_finished)
    }

    /// The color render target of a slot, for presentation blits
    pub fn color_target(&self, slot: usize) -> Option<&Arc<dyn Texture>> {
        self.slots.get(slot).map(|s| &s.color_target)
    }

    /// Counters for the most recent `update`
    pub fn frame_stats(&self) -> FrameStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "render_system_tests.rs"]
mod tests;
