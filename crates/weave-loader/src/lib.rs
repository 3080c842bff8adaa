//! Dependency-aware Loader (§4.4): holds rewritten class bytes and defines
//! them into a host VM's class-loading domain in dependency order, filling in
//! non-declared dependencies (supertypes, handler interfaces the Loader
//! itself didn't rewrite) from an ambient resource store.
//!
//! `ClassLoadingDomain` and `AmbientResourceStore` are the Loader's two host
//! callbacks: a small, `Send + Sync` seam the embedding VM implements,
//! rather than this crate reaching into any concrete VM binding.

use rustc_hash::FxHashMap;
use thiserror::Error;
use weave_core::{RuntimeHostError};
use weave_deps::{DependencyError, DependencyTree};

/// The host's class-loading domain: can report whether a binary name is
/// already defined, and can be handed bytes to define one.
pub trait ClassLoadingDomain: Send + Sync {
    fn is_defined(&self, internal_name: &str) -> bool;
    fn define(&mut self, internal_name: &str, bytes: &[u8]);
}

/// The host's ambient byte source for classes the Loader did not itself
/// rewrite (supertypes, unrelated classes, handler interfaces left untouched).
pub trait AmbientResourceStore: Send + Sync {
    fn bytes_for(&self, internal_name: &str) -> Option<Vec<u8>>;
}

/// Errors surfaced while defining classes: either a runtime-host condition
/// (already defined, ambient bytes missing) or a dependency-ordering failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoaderError {
    #[error(transparent)]
    RuntimeHost(#[from] RuntimeHostError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
}

/// Holds rewritten byte blobs and defines them into a target domain in
/// dependency order (§4.4).
pub struct Loader {
    bytes: FxHashMap<String, Vec<u8>>,
    deps: DependencyTree,
    reload: bool,
    reserved_prefix: String,
}

impl Loader {
    /// `reserved_prefix` names the binary-name prefix the host VM's own
    /// bootstrap classes carry; the Loader never instruments or shadows
    /// anything under it, always deferring to the ambient store.
    pub fn new(reload: bool, reserved_prefix: impl Into<String>) -> Self {
        Self {
            bytes: FxHashMap::default(),
            deps: DependencyTree::new(),
            reload,
            reserved_prefix: reserved_prefix.into(),
        }
    }

    pub fn is_reserved(&self, internal_name: &str) -> bool {
        internal_name.starts_with(&self.reserved_prefix)
    }

    /// Install rewritten bytes for `internal_name`. If it was instrumented
    /// under `handler_interface`, that interface must precede it in load
    /// order; otherwise only its outer/inner containment is recorded.
    pub fn install(&mut self, internal_name: &str, bytes: Vec<u8>, handler_interface: Option<&str>) {
        match handler_interface {
            Some(interface) => self.deps.declare_handler_dependency(internal_name, interface),
            None => self.deps.declare_class(internal_name),
        }
        self.bytes.insert(internal_name.to_string(), bytes);
    }

    /// Define every not-yet-loaded class in `query` (or every declared class,
    /// if empty) into `domain`, in dependency order, sourcing bytes from this
    /// Loader's own installed set first and the ambient store otherwise.
    pub fn define_all(
        &self,
        domain: &mut dyn ClassLoadingDomain,
        store: &dyn AmbientResourceStore,
        query: &[String],
    ) -> Result<(), LoaderError> {
        for name in self.deps.linearize(query)? {
            if self.is_reserved(&name) {
                if !domain.is_defined(&name) {
                    domain.define(&name, &self.ambient_bytes(&name, store)?);
                }
                continue;
            }

            if domain.is_defined(&name) {
                if self.reload {
                    if let Some(bytes) = self.bytes.get(&name) {
                        domain.define(&name, bytes);
                        continue;
                    }
                }
                return Err(RuntimeHostError::AlreadyDefined { class_name: name }.into());
            }

            let bytes = match self.bytes.get(&name) {
                Some(bytes) => bytes.clone(),
                None => self.ambient_bytes(&name, store)?,
            };
            domain.define(&name, &bytes);
        }
        Ok(())
    }

    fn ambient_bytes(&self, name: &str, store: &dyn AmbientResourceStore) -> Result<Vec<u8>, LoaderError> {
        store
            .bytes_for(name)
            .ok_or_else(|| RuntimeHostError::MissingAmbientResource { class_name: name.to_string() }.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeDomain {
        defined: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl ClassLoadingDomain for FakeDomain {
        fn is_defined(&self, internal_name: &str) -> bool {
            self.defined.borrow().contains_key(internal_name)
        }

        fn define(&mut self, internal_name: &str, bytes: &[u8]) {
            self.defined.borrow_mut().insert(internal_name.to_string(), bytes.to_vec());
        }
    }

    #[derive(Default)]
    struct FakeStore {
        bytes: HashMap<String, Vec<u8>>,
    }

    impl AmbientResourceStore for FakeStore {
        fn bytes_for(&self, internal_name: &str) -> Option<Vec<u8>> {
            self.bytes.get(internal_name).cloned()
        }
    }

    #[test]
    fn defines_declared_class_from_own_bytes() {
        let mut loader = Loader::new(false, "java/");
        loader.install("pkg/Handlee", vec![1, 2, 3], None);
        let mut domain = FakeDomain::default();
        let store = FakeStore::default();
        loader.define_all(&mut domain, &store, &[]).unwrap();
        assert_eq!(domain.defined.borrow().get("pkg/Handlee"), Some(&vec![1, 2, 3]));
    }

    #[test]
    fn orders_handler_interface_before_handlee() {
        let mut loader = Loader::new(false, "java/");
        loader.install("pkg/Counter", vec![9], None);
        loader.install("pkg/Handlee", vec![1], Some("pkg/Counter"));
        let mut domain = FakeDomain::default();
        let store = FakeStore::default();
        loader.define_all(&mut domain, &store, &[]).unwrap();
        assert!(domain.is_defined("pkg/Counter"));
        assert!(domain.is_defined("pkg/Handlee"));
    }

    #[test]
    fn falls_back_to_ambient_store_for_undeclared_dependency() {
        let mut loader = Loader::new(false, "java/");
        loader.install("pkg/Handlee", vec![1], Some("pkg/Counter"));
        let mut domain = FakeDomain::default();
        let mut store = FakeStore::default();
        store.bytes.insert("pkg/Counter".to_string(), vec![7]);
        loader.define_all(&mut domain, &store, &[]).unwrap();
        assert_eq!(domain.defined.borrow().get("pkg/Counter"), Some(&vec![7]));
    }

    #[test]
    fn missing_ambient_bytes_is_an_error() {
        let mut loader = Loader::new(false, "java/");
        loader.install("pkg/Handlee", vec![1], Some("pkg/Counter"));
        let mut domain = FakeDomain::default();
        let store = FakeStore::default();
        let err = loader.define_all(&mut domain, &store, &[]).unwrap_err();
        assert!(matches!(err, LoaderError::RuntimeHost(RuntimeHostError::MissingAmbientResource { .. })));
    }

    #[test]
    fn redefining_without_reload_mode_fails() {
        let mut loader = Loader::new(false, "java/");
        loader.install("pkg/Handlee", vec![1], None);
        let mut domain = FakeDomain::default();
        domain.define("pkg/Handlee", &[0]);
        let store = FakeStore::default();
        let err = loader.define_all(&mut domain, &store, &[]).unwrap_err();
        assert!(matches!(err, LoaderError::RuntimeHost(RuntimeHostError::AlreadyDefined { .. })));
    }

    #[test]
    fn reload_mode_shadows_already_defined_class_with_own_bytes() {
        let mut loader = Loader::new(true, "java/");
        loader.install("pkg/Handlee", vec![2, 2], None);
        let mut domain = FakeDomain::default();
        domain.define("pkg/Handlee", &[0]);
        let store = FakeStore::default();
        loader.define_all(&mut domain, &store, &[]).unwrap();
        assert_eq!(domain.defined.borrow().get("pkg/Handlee"), Some(&vec![2, 2]));
    }

    #[test]
    fn reserved_prefix_classes_always_resolve_via_ambient_store() {
        let mut loader = Loader::new(false, "java/");
        loader.install("pkg/Handlee", vec![1], Some("java/lang/Object"));
        let mut domain = FakeDomain::default();
        let mut store = FakeStore::default();
        store.bytes.insert("java/lang/Object".to_string(), vec![9, 9]);
        loader.define_all(&mut domain, &store, &[]).unwrap();
        assert_eq!(domain.defined.borrow().get("java/lang/Object"), Some(&vec![9, 9]));
    }
}
