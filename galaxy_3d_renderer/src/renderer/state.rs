/// Dynamic pipeline state and frame sequencing types

use glam::Vec4;

// ===== VIEWPORT / SCISSOR =====

/// Viewport rectangle with depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Viewport covering `rect` (x, y, width, height) with the full depth range
    pub fn from_rect(rect: Vec4) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            width: rect.z,
            height: rect.w,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::from_rect(Vec4::new(0.0, 0.0, 1.0, 1.0))
    }
}

/// Integer rectangle (scissor, render area)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

// ===== RASTER STATE =====

/// Front-face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Winding {
    #[default]
    CounterClockwise,
    Clockwise,
}

impl Winding {
    /// The opposite winding (used for mirrored/negative-scale geometry)
    pub fn inverted(self) -> Self {
        match self {
            Winding::CounterClockwise => Winding::Clockwise,
            Winding::Clockwise => Winding::CounterClockwise,
        }
    }
}

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
    FrontAndBack,
}

/// Comparison operation for stencil tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil buffer operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementAndClamp,
    DecrementAndClamp,
    Invert,
    IncrementAndWrap,
    DecrementAndWrap,
}

/// Full stencil operation set for `stencil_op_set`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StencilOpState {
    pub fail_op: StencilOp,
    pub pass_op: StencilOp,
    pub depth_fail_op: StencilOp,
    pub compare_op: CompareOp,
}

impl Default for StencilOpState {
    fn default() -> Self {
        Self {
            fail_op: StencilOp::Keep,
            pass_op: StencilOp::Keep,
            depth_fail_op: StencilOp::Keep,
            compare_op: CompareOp::Always,
        }
    }
}

// ===== FRAME SEQUENCING =====

/// Result of a `frame_prepare` call
///
/// `Skip` is not an error: the swapchain (or an equivalent backend resource)
/// is being recreated and the rest of the frame must not be issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    Ready,
    Skip,
}

/// Where the frontend is in the per-frame command sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStage {
    /// No frame in progress (also the state after `present`)
    Idle,
    /// `frame_prepare` succeeded, surfaces acquired
    Prepared,
    /// Between `begin` and `end`
    Recording,
    /// `end` submitted the command list, waiting for `present`
    Submitted,
}
