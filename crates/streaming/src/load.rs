use std::cell::RefCell;
use std::rc::Rc;

use foundation::Time;
use geometry::Tile;

use crate::asset::Asset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// Transient; the store retries after its retry delay.
    Network { message: String },
    Decode { message: String },
    Cancelled,
    /// The source dropped its completer without answering.
    Abandoned,
}

impl LoadError {
    pub fn network(message: impl Into<String>) -> Self {
        LoadError::Network {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        LoadError::Decode {
            message: message.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LoadError::Network { .. })
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Network { message } => write!(f, "network error: {message}"),
            LoadError::Decode { message } => write!(f, "decode error: {message}"),
            LoadError::Cancelled => write!(f, "load cancelled"),
            LoadError::Abandoned => write!(f, "load abandoned by source"),
        }
    }
}

impl std::error::Error for LoadError {}

pub type LoadResult = Result<Box<dyn Asset>, LoadError>;

enum Slot {
    Pending,
    Done(LoadResult),
    Cancelled,
    Taken,
}

/// Consumer end of one asset load.
///
/// Cancelling is idempotent and race-safe: once cancelled, a later
/// completion is dropped unseen.
pub struct LoadHandle {
    slot: Rc<RefCell<Slot>>,
}

/// Producer end of one asset load, held by the source until the asset is
/// ready. Answers at most once.
pub struct Completer {
    slot: Rc<RefCell<Slot>>,
}

/// Creates a connected handle/completer pair.
pub fn load_channel() -> (LoadHandle, Completer) {
    let slot = Rc::new(RefCell::new(Slot::Pending));
    (
        LoadHandle {
            slot: Rc::clone(&slot),
        },
        Completer { slot },
    )
}

impl LoadHandle {
    /// A load that has already finished.
    pub fn ready(result: LoadResult) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Slot::Done(result))),
        }
    }

    /// Returns `true` if this call cancelled a pending load. Cancelling a
    /// finished, taken or already-cancelled load does nothing.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.borrow_mut();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Cancelled;
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.slot.borrow(), Slot::Cancelled)
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.slot.borrow(), Slot::Pending)
    }

    /// Hands out the result once it is available. Returns `None` while
    /// pending and after the result was taken or the load cancelled.
    pub fn take(&self) -> Option<LoadResult> {
        let mut slot = self.slot.borrow_mut();
        if !matches!(*slot, Slot::Done(_)) {
            return None;
        }
        match std::mem::replace(&mut *slot, Slot::Taken) {
            Slot::Done(result) => Some(result),
            _ => None,
        }
    }
}

impl std::fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match *self.slot.borrow() {
            Slot::Pending => "pending",
            Slot::Done(Ok(_)) => "loaded",
            Slot::Done(Err(_)) => "failed",
            Slot::Cancelled => "cancelled",
            Slot::Taken => "taken",
        };
        f.debug_struct("LoadHandle").field("state", &state).finish()
    }
}

impl Completer {
    /// Delivers the result. Returns `false` if the load was cancelled, in
    /// which case the result is dropped without being seen.
    pub fn complete(self, result: LoadResult) -> bool {
        let mut slot = self.slot.borrow_mut();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Done(result);
            true
        } else {
            false
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.slot.borrow(), Slot::Cancelled)
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        let mut slot = self.slot.borrow_mut();
        if matches!(*slot, Slot::Pending) {
            *slot = Slot::Done(Err(LoadError::Abandoned));
        }
    }
}

impl std::fmt::Debug for Completer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Completer")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Supplier of per-tile assets.
pub trait Source {
    /// Starts loading the asset for `tile`.
    fn load_asset(&mut self, tile: &Tile) -> LoadHandle;

    /// Gives sources that finish work cooperatively a chance to do so; the
    /// store calls it at the start of every frame.
    fn poll(&mut self, _now: Time) {}
}
