//! Class registry: registered definitions indexed by ID and name

use crate::builder::{BehaviorBuilder, ClassBuilder, ClassParts};
use crate::class::{ClassDef, ClassId, ClassKind};
use crate::error::{RuntimeError, RuntimeResult};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Registry of class definitions.
///
/// Registration resolves the declared parent, checks kinds and name
/// uniqueness, and flattens the parent's tables into the new definition, so
/// instances never walk the parent chain at run time.
#[derive(Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<Arc<ClassDef>>,
    name_to_id: FxHashMap<String, ClassId>,
}

impl ClassRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component class.
    pub fn register_component(&mut self, builder: ClassBuilder) -> RuntimeResult<ClassId> {
        self.register(builder.into_parts(), ClassKind::Component)
    }

    /// Register a behavior class.
    pub fn register_behavior(&mut self, builder: BehaviorBuilder) -> RuntimeResult<ClassId> {
        self.register(builder.into_parts(), ClassKind::Behavior)
    }

    fn register(&mut self, parts: ClassParts, kind: ClassKind) -> RuntimeResult<ClassId> {
        if self.name_to_id.contains_key(&parts.name) {
            return Err(RuntimeError::DuplicateClass {
                name: parts.name.clone(),
            });
        }
        let parent = match &parts.parent {
            Some(parent_name) => {
                let parent = self.by_name(parent_name).ok_or_else(|| {
                    RuntimeError::UnknownClass {
                        name: parent_name.clone(),
                    }
                })?;
                if parent.kind() != kind {
                    return Err(RuntimeError::ClassKindMismatch {
                        class: parent_name.clone(),
                        expected: kind.name().to_string(),
                        actual: parent.kind().name().to_string(),
                    });
                }
                Some(parent)
            }
            None => None,
        };

        let id = ClassId(self.classes.len());
        let def = parts.build(id, kind, parent.as_deref());
        self.name_to_id.insert(def.name.clone(), id);
        self.classes.push(Arc::new(def));
        Ok(id)
    }

    /// Insert a pre-built definition. The caller guarantees name uniqueness
    /// and a resolved parent; used for built-in classes.
    pub(crate) fn insert_builtin(&mut self, parts: ClassParts, kind: ClassKind) -> ClassId {
        let id = ClassId(self.classes.len());
        let def = parts.build(id, kind, None);
        self.name_to_id.insert(def.name.clone(), id);
        self.classes.push(Arc::new(def));
        id
    }

    /// Get a class by ID.
    pub fn get(&self, id: ClassId) -> Option<Arc<ClassDef>> {
        self.classes.get(id.0).cloned()
    }

    /// Get a class by name.
    pub fn by_name(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.name_to_id.get(name).and_then(|id| self.get(*id))
    }

    /// Get a class ID by name.
    pub fn id_of(&self, name: &str) -> Option<ClassId> {
        self.name_to_id.get(name).copied()
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes are registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
