/*!
# Quasar 3D Engine

GPU resource and frame synchronization core of the Quasar3D rendering
engine.

This crate is platform-agnostic: every device interaction goes through the
`graphics_device` trait boundary, implemented by backend crates (Vulkan)
loaded by the application assembly.

## Architecture

- **graphics_device**: the device-context boundary (factory, recording,
  synchronization traits and their value types)
- **resource**: asset model, per-kind asset managers, and the central
  registry that owns every asset
- **pipeline**: builder/director construction of immutable pipeline and
  pipeline-layout objects
- **render**: precomputed render-pass descriptions and the per-frame
  render system
- **worker**: the background render worker thread
*/

// Internal modules
pub mod error;
pub mod log;
pub mod graphics_device;
pub mod pipeline;
pub mod render;
pub mod resource;
pub mod worker;

// Main quasar3d namespace module
pub mod quasar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{ConsoleLogger, Log, LogEntry, LogSeverity, Logger};
    }

    // Device boundary sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Pipeline construction sub-module
    pub mod pipeline {
        pub use crate::pipeline::*;
    }

    // Render sub-module
    pub mod render {
        pub use crate::render::*;
    }

    // Resource sub-module
    pub mod resource {
        pub use crate::resource::*;
    }

    // Background worker
    pub use crate::worker::RenderWorker;
}

// Re-export math library at crate root
pub use glam;
