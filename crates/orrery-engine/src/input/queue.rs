/// Input events the host pushes. Drained once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A key was pressed. `key_code` is the DOM `keyCode`.
    KeyDown { key_code: u32 },
    /// The viewport changed size or orientation.
    Resize { width: u32, height: u32 },
    /// `navigator.connection` fired `change` (effective type or save-data).
    ConnectionChange,
    /// A custom event from the UI layer (speed slider, planet list, date
    /// picker). `kind` identifies the event type; `a`, `b`, `c` carry data.
    Custom { kind: u32, a: f64, b: f64, c: f64 },
}

/// A queue of input events.
/// JS writes events into the queue; Rust reads and drains them each frame.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(16),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events in arrival order.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain() {
        let mut q = InputQueue::new();
        q.push(InputEvent::Resize { width: 800, height: 600 });
        q.push(InputEvent::KeyDown { key_code: 32 });
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events[1], InputEvent::KeyDown { key_code: 32 });
        assert!(q.is_empty());
    }

    #[test]
    fn custom_event_keeps_payload() {
        let mut q = InputQueue::new();
        q.push(InputEvent::Custom { kind: 3, a: 8766.25, b: 0.0, c: 0.0 });
        match q.drain()[0] {
            InputEvent::Custom { kind, a, .. } => {
                assert_eq!(kind, 3);
                assert_eq!(a, 8766.25);
            }
            other => panic!("Expected Custom event, got {:?}", other),
        }
    }
}
