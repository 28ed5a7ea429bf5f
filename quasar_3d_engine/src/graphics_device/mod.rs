/// Graphics device module - the device-context boundary
///
/// Everything the core needs from a graphics backend: a factory trait for
/// device objects, recording/synchronization traits, and the plain value
/// types describing them. Backends (Vulkan) and the test mock implement
/// these traits; the core never touches a native API.

// Module declarations
pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod sampler;
pub mod shader;
pub mod render_pass;
pub mod frame_buffer;
pub mod pipeline;
pub mod binding_group;
pub mod command_list;
pub mod sync;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use texture::*;
pub use buffer::*;
pub use sampler::*;
pub use shader::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use pipeline::*;
pub use binding_group::*;
pub use command_list::*;
pub use sync::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
