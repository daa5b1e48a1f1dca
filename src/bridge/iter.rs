//! The external dictionary iterator.
//!
//! Produced by [`DictAdapter::iter`]; walks the backing dictionary's entries
//! in iteration order and yields converted values. The bounds are a snapshot:
//! the `last` cursor is computed once, at creation, as one before the end, so
//! entries appended after creation are never visited. An empty dictionary has
//! `begin == last == end` and exhausts on the first call.
//!
//! Instead of the undefined behavior a dangling cursor would give, the
//! iterator records the dictionary's structural generation at creation and
//! fails with [`BridgeError::Invalidated`] once the shape has changed.

use log::warn;

use crate::bridge::context::{Context, HostValue};
use crate::bridge::error::BridgeError;
use crate::runtime::DictRef;

pub struct DictIterator {
    dict: DictRef,
    generation: u64,
    cursor: usize,
    last: usize,
    end: usize,
    fresh: bool,
}

impl DictIterator {
    /// Snapshots the iteration bounds of `dict`. The iterator shares the
    /// handle but is a reader only; it never mutates the dictionary.
    pub(crate) fn over(dict: &DictRef) -> Self {
        let end = dict.count();
        DictIterator {
            dict: dict.clone(),
            generation: dict.generation(),
            cursor: 0,
            last: end.saturating_sub(1),
            end,
            fresh: true,
        }
    }

    /// Yields the next value, or `StopIteration` once exhausted.
    /// `StopIteration` is loop termination, not a fault; `Invalidated` means
    /// the dictionary changed shape since the iterator was created.
    pub fn next_value(&mut self, ctx: &Context) -> Result<HostValue, BridgeError> {
        if self.generation != self.dict.generation() {
            warn!("grt.Dict iterator invalidated by structural mutation");
            return Err(BridgeError::Invalidated);
        }
        if self.cursor == self.last || self.cursor == self.end {
            return Err(BridgeError::StopIteration);
        }
        if !self.fresh {
            self.cursor += 1;
        }
        self.fresh = false;
        // the generation check above guarantees the cursor is in range
        let (_, value) = self
            .dict
            .entry_at(self.cursor)
            .ok_or_else(|| BridgeError::Internal("iterator cursor out of range".to_owned()))?;
        Ok(ctx.to_host(&value))
    }

    /// Self-returning "get iterator" step: the conventional protocol obtains
    /// an iterator from the iterable and then iterates it. Resets only the
    /// not-yet-advanced flag, never the cursor.
    pub fn iter(&mut self) -> &mut Self {
        self.fresh = true;
        self
    }
}
