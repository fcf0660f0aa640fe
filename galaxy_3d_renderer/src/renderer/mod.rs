/// Renderer module - frontend, backend contract and resource bookkeeping

// Module declarations
pub mod backend;
pub mod config;
pub mod deletion_queue;
pub mod freelist;
pub mod frontend;
pub mod geometry;
pub mod handle;
pub mod renderbuffer;
pub mod sampler;
pub mod shader;
pub mod state;
pub mod texture;

#[cfg(test)]
pub mod mock_backend;

pub use backend::*;
pub use config::*;
pub use deletion_queue::{DeletionPass, DeletionQueue, DeletionSlot};
pub use freelist::{Freelist, MemoryRange};
pub use frontend::{RenderWindow, RendererFrontend, RendererStats};
pub use geometry::*;
pub use handle::*;
pub use renderbuffer::*;
pub use sampler::*;
pub use shader::*;
pub use state::*;
pub use texture::*;
