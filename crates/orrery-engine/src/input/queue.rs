/// Input events forwarded from the host page.
/// Pointer coordinates are CSS pixels relative to the canvas, Y down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    PointerDown { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    /// Wheel or pinch delta in DOM pixels; the host flips the sign so positive zooms in.
    Wheel { delta: f32 },
    KeyDown { key_code: u32 },
    KeyUp { key_code: u32 },
    /// Canvas size changed.
    Resize { width: f32, height: f32 },
    /// A UI command (time speed, layer toggle, focus by index, ...).
    /// `kind` identifies the command; `a`, `b`, `c` carry its arguments.
    Custom { kind: u32, a: f32, b: f32, c: f32 },
}

/// Events collected between frames. The host pushes, the simulation drains once per tick.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Take all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    /// Most recent resize in the queue, if any.
    pub fn last_resize(&self) -> Option<(f32, f32)> {
        self.events.iter().rev().find_map(|e| match *e {
            InputEvent::Resize { width, height } => Some((width, height)),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
