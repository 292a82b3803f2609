//! Name- and signature-keyed index over decoded classes.
//!
//! The index is built once per run. Classification, method ownership and the
//! data-access flag are settled while loading; afterwards the index is
//! read-only and every lookup is a pure function of the loaded classes.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classfile::{ClassDecoder, JvmClassDecoder};
use crate::descriptor::{canonical_name, erasure};
use crate::model::{
    ClassDescriptor, Classification, MethodDescriptor, MethodSignature, StereotypeKind,
};

/// Base interfaces whose implementors are data-access receivers.
pub const DATA_ACCESS_INTERFACES: &[&str] = &[
    "org.springframework.data.repository.Repository",
    "org.springframework.data.repository.CrudRepository",
    "org.springframework.data.repository.ListCrudRepository",
    "org.springframework.data.repository.PagingAndSortingRepository",
    "org.springframework.data.repository.reactive.ReactiveCrudRepository",
    "org.springframework.data.jpa.repository.JpaRepository",
    "org.springframework.data.mongodb.repository.MongoRepository",
];

/// A callee that could not be found among the indexed classes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unresolved callee {owner}#{name}{descriptor}")]
pub struct UnresolvedCalleeError {
    pub owner: String,
    pub name: String,
    pub descriptor: String,
}

/// A buffer that failed to decode and was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedArtifact {
    /// Position of the buffer in the load order
    pub position: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    classes: BTreeMap<String, ClassDescriptor>,
    skipped: Vec<SkippedArtifact>,
}

impl ClassIndex {
    /// Decodes and indexes class buffers with the JVM decoder.
    pub fn load<B: AsRef<[u8]>>(buffers: &[B]) -> Self {
        Self::load_with(&JvmClassDecoder, buffers, &[])
    }

    /// Decodes buffers with `decoder`; malformed buffers are logged and skipped.
    ///
    /// `extra_data_access` names further base interfaces, beyond
    /// [`DATA_ACCESS_INTERFACES`], that mark a class as data access.
    pub fn load_with<B: AsRef<[u8]>>(
        decoder: &dyn ClassDecoder,
        buffers: &[B],
        extra_data_access: &[String],
    ) -> Self {
        let mut classes = Vec::with_capacity(buffers.len());
        let mut skipped = Vec::new();
        for (position, buffer) in buffers.iter().enumerate() {
            match decoder.decode(buffer.as_ref()) {
                Ok(class) => classes.push(class),
                Err(e) => {
                    warn!(position, error = %e, "skipping malformed class buffer");
                    skipped.push(SkippedArtifact {
                        position,
                        path: None,
                        reason: e.to_string(),
                    });
                }
            }
        }
        let mut index = Self::from_descriptors(classes, extra_data_access);
        index.skipped = skipped;
        info!(
            classes = index.len(),
            skipped = index.skipped.len(),
            "class index loaded"
        );
        index
    }

    /// Indexes already-decoded classes. The first class with a given name wins.
    pub fn from_descriptors(classes: Vec<ClassDescriptor>, extra_data_access: &[String]) -> Self {
        let mut map = BTreeMap::new();
        for mut class in classes {
            class.name = canonical_name(&class.name);
            if map.contains_key(&class.name) {
                debug!(class = %class.name, "duplicate class ignored");
                continue;
            }
            class.classification = Classification::from_markers(&class.markers, class.is_enum);
            for method in &mut class.methods {
                method.owner = class.name.clone();
            }
            map.insert(class.name.clone(), class);
        }

        let mut index = Self {
            classes: map,
            skipped: Vec::new(),
        };
        let data_access: Vec<String> = index
            .classes
            .values()
            .filter(|c| index.computes_data_access(c, extra_data_access))
            .map(|c| c.name.clone())
            .collect();
        for name in data_access {
            if let Some(class) = index.classes.get_mut(&name) {
                class.data_access = true;
            }
        }
        index
    }

    fn computes_data_access(&self, class: &ClassDescriptor, extra: &[String]) -> bool {
        class.has_stereotype(StereotypeKind::Repository)
            || self.all_interfaces(&class.name).iter().any(|i| {
                DATA_ACCESS_INTERFACES.contains(&i.as_str()) || extra.iter().any(|e| e == i)
            })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes.values()
    }

    pub fn skipped(&self) -> &[SkippedArtifact] {
        &self.skipped
    }

    /// Lookup by any spelling of the class name; generic arguments are ignored.
    pub fn class_by_name(&self, name: &str) -> Option<&ClassDescriptor> {
        self.classes
            .get(name)
            .or_else(|| self.classes.get(&canonical_name(erasure(name))))
    }

    pub fn method_by_signature(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<&MethodDescriptor> {
        self.class_by_name(owner)?.method(name, descriptor)
    }

    pub fn method(&self, signature: &MethodSignature) -> Option<&MethodDescriptor> {
        self.method_by_signature(&signature.owner, &signature.name, &signature.descriptor)
    }

    /// Resolves a call target: the owner itself, then its superclasses, then
    /// its interfaces (default methods).
    pub fn resolve_method(
        &self,
        owner: &str,
        name: &str,
        descriptor: &str,
    ) -> Result<&MethodDescriptor, UnresolvedCalleeError> {
        let found = self
            .superclass_chain(owner)
            .into_iter()
            .chain(self.all_interfaces(owner))
            .find_map(|class| self.method_by_signature(&class, name, descriptor));
        found.ok_or_else(|| UnresolvedCalleeError {
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
        })
    }

    /// Superclasses of `type_name`, nearest first. The chain includes the
    /// first superclass that is not indexed and stops there;
    /// `java.lang.Object` is left out.
    pub fn ancestors(&self, type_name: &str) -> Vec<String> {
        let mut chain = self.superclass_chain(type_name);
        if !chain.is_empty() {
            chain.remove(0);
        }
        chain
    }

    /// `type_name` followed by its superclasses, as far as they are known.
    fn superclass_chain(&self, type_name: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(canonical_name(erasure(type_name)));
        while let Some(name) = current.take() {
            if name == "java.lang.Object" || !seen.insert(name.clone()) {
                break;
            }
            current = self
                .classes
                .get(&name)
                .and_then(|c| c.superclass.clone());
            chain.push(name);
        }
        chain
    }

    /// Every interface `type_name` implements, directly or through its
    /// superclasses and super-interfaces, in discovery order.
    pub fn all_interfaces(&self, type_name: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        for class in self.superclass_chain(type_name) {
            if let Some(c) = self.classes.get(&class) {
                queue.extend(c.interfaces.iter().cloned());
            }
        }
        while let Some(iface) = queue.pop_front() {
            if !seen.insert(iface.clone()) {
                continue;
            }
            if let Some(c) = self.classes.get(&iface) {
                queue.extend(c.interfaces.iter().cloned());
            }
            out.push(iface);
        }
        out
    }

    /// Non-interface business components implementing `interface`, in name order.
    pub fn implementors(&self, interface: &str) -> Vec<&ClassDescriptor> {
        let interface = canonical_name(erasure(interface));
        self.classes
            .values()
            .filter(|c| !c.is_interface && c.classification == Classification::BusinessComponent)
            .filter(|c| self.all_interfaces(&c.name).contains(&interface))
            .collect()
    }

    /// Handler classes in name order.
    pub fn handlers(&self) -> impl Iterator<Item = &ClassDescriptor> {
        self.classes
            .values()
            .filter(|c| c.classification == Classification::Handler)
    }

    pub fn classification_of(&self, name: &str) -> Classification {
        self.class_by_name(name)
            .map(|c| c.classification)
            .unwrap_or_default()
    }

    pub fn is_data_access(&self, name: &str) -> bool {
        self.class_by_name(name).is_some_and(|c| c.data_access)
    }
}
