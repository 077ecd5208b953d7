//! Explicit input listener registrations.
//!
//! Components record which inputs they currently listen to; the
//! presentation layer only routes an input to a component while the
//! matching listener is attached.

/// Inputs a component can listen to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Click on an item card
    Click,
    /// Click on the favourite toggle of a card
    Favourite,
    /// Keyboard input
    Keyboard,
    /// The gallery overlay's own close control
    CloseControl,
}

#[derive(Debug, Default, Clone)]
pub struct Listeners {
    attached: Vec<Listener>,
}

impl Listeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `listener`. Returns `false` if it was already attached, in
    /// which case nothing changes.
    pub fn attach(&mut self, listener: Listener) -> bool {
        if self.is_attached(listener) {
            return false;
        }
        self.attached.push(listener);
        true
    }

    /// Returns `false` if it was not attached.
    pub fn detach(&mut self, listener: Listener) -> bool {
        let before = self.attached.len();
        self.attached.retain(|l| *l != listener);
        self.attached.len() != before
    }

    pub fn detach_all(&mut self) {
        self.attached.clear();
    }

    pub fn is_attached(&self, listener: Listener) -> bool {
        self.attached.contains(&listener)
    }

    pub fn count(&self) -> usize {
        self.attached.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_is_idempotent() {
        let mut listeners = Listeners::new();
        assert!(listeners.attach(Listener::Keyboard));
        assert!(!listeners.attach(Listener::Keyboard));
        assert_eq!(listeners.count(), 1);

        assert!(listeners.detach(Listener::Keyboard));
        assert!(!listeners.detach(Listener::Keyboard));
        assert_eq!(listeners.count(), 0);
    }
}
