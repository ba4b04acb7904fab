//! Key prefix to task lookup

use crate::error::{MagicBucketError, Result};
use crate::model::task_name;
use crate::tasks::{ApeNearFieldPrcs, PdalInfo, PdalTranslate, Rimtatls, Task};
use std::collections::BTreeMap;

/// Builds a fresh task instance
pub type TaskConstructor = fn() -> Box<dyn Task>;

/// Fixed mapping from task name (the key's topmost segment) to constructor
#[derive(Clone)]
pub struct TaskRegistry {
    constructors: BTreeMap<&'static str, TaskConstructor>,
}

impl TaskRegistry {
    /// An empty registry
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor under `name`, replacing any previous one
    pub fn register(&mut self, name: &'static str, constructor: TaskConstructor) -> &mut Self {
        self.constructors.insert(name, constructor);
        self
    }

    /// Find the constructor for the task named by the key's topmost segment
    pub fn resolve(&self, key: &str) -> Result<TaskConstructor> {
        let name = task_name(key);
        self.constructors
            .get(name)
            .copied()
            .ok_or_else(|| MagicBucketError::UnknownTask {
                task_name: name.to_string(),
            })
    }

    /// Resolve and construct in one step
    pub fn create(&self, key: &str) -> Result<Box<dyn Task>> {
        self.resolve(key).map(|constructor| constructor())
    }

    /// Registered task names, sorted
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.constructors.keys().copied()
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry
            .register(PdalTranslate::NAME, pdal_translate)
            .register(PdalInfo::NAME, pdal_info)
            .register(Rimtatls::NAME, rimtatls)
            .register(ApeNearFieldPrcs::NAME, ape_near_field_prcs);
        registry
    }
}

fn pdal_translate() -> Box<dyn Task> {
    Box::new(PdalTranslate)
}

fn pdal_info() -> Box<dyn Task> {
    Box::new(PdalInfo)
}

fn rimtatls() -> Box<dyn Task> {
    Box::new(Rimtatls)
}

fn ape_near_field_prcs() -> Box<dyn Task> {
    Box::new(ApeNearFieldPrcs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_builtin_tasks() {
        let registry = TaskRegistry::default();
        assert_eq!(
            registry.create("pdal-translate/to-laz/simple.las.zip").unwrap().name(),
            "pdal-translate"
        );
        assert_eq!(registry.create("rimtatls/scan1/data.rxp").unwrap().name(), "rimtatls");
        assert_eq!(registry.create("pdal-info/a/b/c.laz").unwrap().name(), "pdal-info");
        assert_eq!(
            registry.create("ape-near-field-prcs/scan.laz").unwrap().name(),
            "ape-near-field-prcs"
        );
    }

    #[test]
    fn test_unknown_task_carries_segment() {
        let registry = TaskRegistry::default();
        match registry.create("lastools/dir/file.las") {
            Err(MagicBucketError::UnknownTask { task_name }) => assert_eq!(task_name, "lastools"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(task) => panic!("unexpected task: {}", task.name()),
        }
    }

    #[test]
    fn test_selection_ignores_deeper_segments() {
        let registry = TaskRegistry::default();
        // A deeper segment named like another task does not matter
        let task = registry.create("rimtatls/pdal-translate/data.rxp").unwrap();
        assert_eq!(task.name(), "rimtatls");
    }

    #[test]
    fn test_single_segment_key_is_its_own_task_name() {
        let registry = TaskRegistry::default();
        assert!(matches!(
            registry.create("rimtatls"),
            Ok(task) if task.name() == "rimtatls"
        ));
        assert!(matches!(
            registry.create("simple.las"),
            Err(MagicBucketError::UnknownTask { task_name }) if task_name == "simple.las"
        ));
    }

    #[test]
    fn test_names_are_sorted() {
        let names: Vec<_> = TaskRegistry::default().names().collect();
        assert_eq!(
            names,
            vec!["ape-near-field-prcs", "pdal-info", "pdal-translate", "rimtatls"]
        );
    }
}
