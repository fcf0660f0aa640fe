/// Events the platform layer reports to the engine loop

use winit::dpi::PhysicalSize;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use crate::renderer::backend::WindowId;

/// Value of a console variable
#[derive(Debug, Clone, PartialEq)]
pub enum KvarValue {
    Int(i32),
    Float(f32),
    String(String),
}

/// A console variable was changed
#[derive(Debug, Clone, PartialEq)]
pub struct KvarChanged {
    pub name: String,
    pub value: KvarValue,
}

impl KvarChanged {
    pub fn new(name: &str, value: KvarValue) -> Self {
        Self { name: name.to_string(), value }
    }
}

/// Platform event drained once per tick
#[derive(Debug, Clone, PartialEq)]
pub enum PlatformEvent {
    WindowCreated { window: WindowId, size: PhysicalSize<u32> },
    WindowDestroyed { window: WindowId },
    WindowResized { window: WindowId, size: PhysicalSize<u32> },
    /// The application lost its surface (minimized, backgrounded)
    Suspended,
    Resumed,
    /// Stop the engine loop
    Quit,
    KvarChanged(KvarChanged),
    Key { key: KeyCode, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    MouseMoved { x: f32, y: f32 },
}
