//! Dynamically shaped value slots with scoped patch-and-restore.
//!
//! A [`PatchSlot`] wraps one process-wide value whose concrete type is
//! fixed at construction. Scopes overwrite the value for the duration of a
//! test via [`Scope::patch`](crate::Scope::patch); restoration moves the
//! original boxed value back rather than cloning it, so reference-counted
//! contents come back pointer-identical.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) type BoxedValue = Box<dyn Any + Send>;

/// Process-wide mutable value that scopes may temporarily overwrite.
///
/// Cloning a slot clones the handle, not the value: all clones observe and
/// mutate the same underlying state, which is what lets a restore action
/// captured at patch time reach the slot at unwind time.
///
/// # Examples
/// ```
/// use scoped_restore::PatchSlot;
///
/// let verbose = PatchSlot::of(false);
/// assert!(!verbose.get::<bool>());
/// ```
#[derive(Clone)]
pub struct PatchSlot {
    inner: Arc<SlotInner>,
}

struct SlotInner {
    type_name: &'static str,
    value: Mutex<BoxedValue>,
}

impl PatchSlot {
    /// Creates a slot holding `initial`; the slot's type is fixed to the
    /// type of `initial` for its whole lifetime.
    #[must_use]
    pub fn of<T: Any + Send>(initial: T) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                type_name: type_name::<T>(),
                value: Mutex::new(Box::new(initial)),
            }),
        }
    }

    /// Returns a clone of the current value.
    ///
    /// # Panics
    /// Panics when `T` is not the slot's type.
    #[must_use]
    pub fn get<T: Any + Clone>(&self) -> T {
        self.with(T::clone)
    }

    /// Runs `inspect` against the current value and returns its result.
    ///
    /// # Panics
    /// Panics when `T` is not the slot's type.
    pub fn with<T: Any, R>(&self, inspect: impl FnOnce(&T) -> R) -> R {
        let guard = self.lock();
        guard.downcast_ref::<T>().map_or_else(
            || mismatch(type_name::<T>(), self.inner.type_name),
            inspect,
        )
    }

    /// Swaps in `new_value` after checking it matches the slot's type,
    /// returning the displaced value. Panics on a type mismatch, naming
    /// both types.
    pub(crate) fn swap_checked(
        &self,
        new_value: BoxedValue,
        new_type: &'static str,
    ) -> BoxedValue {
        let mut guard = self.lock();
        if (**guard).type_id() != (*new_value).type_id() {
            mismatch(new_type, self.inner.type_name);
        }
        std::mem::replace(&mut *guard, new_value)
    }

    /// Reinstates a value previously displaced by [`Self::swap_checked`].
    pub(crate) fn put(&self, value: BoxedValue) {
        *self.lock() = value;
    }

    fn lock(&self) -> MutexGuard<'_, BoxedValue> {
        self.inner
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl fmt::Debug for PatchSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchSlot")
            .field("type", &self.inner.type_name)
            .finish_non_exhaustive()
    }
}

fn mismatch(offered: &'static str, expected: &'static str) -> ! {
    panic!("value of type {offered} is not assignable to target of type {expected}")
}

#[cfg(test)]
mod tests {
    use super::PatchSlot;

    #[test]
    fn get_returns_current_value() {
        let slot = PatchSlot::of(99_i32);
        assert_eq!(slot.get::<i32>(), 99);
    }

    #[test]
    fn swap_returns_displaced_value() {
        let slot = PatchSlot::of(String::from("before"));
        let displaced = slot.swap_checked(Box::new(String::from("after")), "alloc::string::String");
        assert_eq!(
            displaced.downcast_ref::<String>().map(String::as_str),
            Some("before")
        );
        assert_eq!(slot.get::<String>(), "after");
    }

    #[test]
    #[should_panic(expected = "is not assignable to target of type")]
    fn swap_rejects_mismatched_type() {
        let slot = PatchSlot::of(99_i32);
        slot.swap_checked(Box::new(88_u32), "u32");
    }

    #[test]
    #[should_panic(expected = "is not assignable to target of type")]
    fn get_rejects_mismatched_type() {
        let slot = PatchSlot::of(99_i32);
        slot.get::<u32>();
    }
}
