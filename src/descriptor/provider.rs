//! Lazy descriptor providers
//!
//! A provider is an indirection between a field (or collection element) and
//! the descriptor of its type. It can be constructed before the descriptor
//! it returns is complete and is only dereferenced when the field is
//! actually accessed, which breaks construction-order cycles in recursive
//! and mutually-referential schemas.

use std::fmt;
use std::sync::{Arc, OnceLock};

use super::Descriptor;

/// Lazy accessor returning a [`Descriptor`].
#[derive(Clone)]
pub struct Provider {
    inner: Inner,
}

#[derive(Clone)]
enum Inner {
    Ready(Descriptor),
    Lazy(Arc<LazyCell>),
}

struct LazyCell {
    cell: OnceLock<Descriptor>,
    thunk: Box<dyn Fn() -> Descriptor + Send + Sync>,
}

impl Provider {
    /// A provider for an already-resolved descriptor.
    #[must_use]
    pub fn of(descriptor: Descriptor) -> Self {
        Self {
            inner: Inner::Ready(descriptor),
        }
    }

    /// A provider that resolves its descriptor on first access.
    ///
    /// The thunk must not (transitively) dereference this same provider;
    /// cyclic schemas break the cycle by deferring to a separately
    /// initialized descriptor instead.
    #[must_use]
    pub fn lazy<F>(thunk: F) -> Self
    where
        F: Fn() -> Descriptor + Send + Sync + 'static,
    {
        Self {
            inner: Inner::Lazy(Arc::new(LazyCell {
                cell: OnceLock::new(),
                thunk: Box::new(thunk),
            })),
        }
    }

    /// Resolve the descriptor, caching the result of a lazy thunk.
    #[must_use]
    pub fn descriptor(&self) -> Descriptor {
        match &self.inner {
            Inner::Ready(d) => d.clone(),
            Inner::Lazy(lazy) => lazy.cell.get_or_init(|| (lazy.thunk)()).clone(),
        }
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Ready(d) => write!(f, "Provider({})", d.type_name()),
            Inner::Lazy(lazy) => match lazy.cell.get() {
                Some(d) => write!(f, "Provider({})", d.type_name()),
                None => f.write_str("Provider(<unresolved>)"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_ready_provider() {
        let p = Provider::of(Descriptor::I32);
        assert_eq!(p.descriptor().kind(), TypeKind::I32);
    }

    #[test]
    fn test_lazy_provider_resolves_once() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let p = Provider::lazy(|| {
            CALLS.fetch_add(1, Ordering::SeqCst);
            Descriptor::Str
        });
        assert_eq!(p.descriptor().kind(), TypeKind::Str);
        assert_eq!(p.descriptor().kind(), TypeKind::Str);
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
