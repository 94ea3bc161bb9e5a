/// How many more pieces of work a frame may start.
///
/// The texture store sizes it from its free load slots. Slots are counted,
/// never timed, so a replayed frame admits exactly the same work.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameBudget {
    free: u32,
}

impl FrameBudget {
    /// `capacity` slots of which `in_use` are occupied. Over-subscription
    /// leaves nothing free rather than failing.
    pub fn from_slots(capacity: usize, in_use: usize) -> Self {
        let free = capacity.saturating_sub(in_use);
        Self {
            free: u32::try_from(free).unwrap_or(u32::MAX),
        }
    }

    pub fn free(&self) -> u32 {
        self.free
    }

    pub fn is_spent(&self) -> bool {
        self.free == 0
    }

    /// Claims one slot if any is left.
    pub fn take_slot(&mut self) -> bool {
        match self.free.checked_sub(1) {
            Some(rest) => {
                self.free = rest;
                true
            }
            None => false,
        }
    }
}
