use gc::{Gc, GcCell, Trace};

/// Shared, mutable, cycle-collected storage
pub type GcShared<T> = Gc<GcCell<T>>;

pub fn shared<T: Trace>(x: T) -> GcShared<T> {
    Gc::new(GcCell::new(x))
}
