/// The single current host process, or none.
///
/// Owned by the main pipeline's task and mutated only there, so no lock.
#[derive(Debug)]
pub struct ChildSlot<P> {
    current: Option<P>,
}

impl<P> Default for ChildSlot<P> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<P> ChildSlot<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `next` as current, handing back the one it replaces.
    pub fn replace(&mut self, next: P) -> Option<P> {
        self.current.replace(next)
    }

    /// Empty the slot.
    pub fn take(&mut self) -> Option<P> {
        self.current.take()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&P> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn is_occupied(&self) -> bool {
        self.current.is_some()
    }
}
