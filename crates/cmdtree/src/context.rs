//! State visible to filters, hooks and handlers while a line runs.
//!
//! A [`CommandContext`] holds two type-keyed bags. `app_state` is set once
//! on the dispatcher and shared by every line (the world, the player
//! roster). `extensions` belongs to a single line: the host fills it through
//! [`Dispatcher::execute_with`](crate::Dispatcher::execute_with), usually
//! with the sender, and pre-dispatch hooks may add to it.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use anyhow::anyhow;

struct Entry {
    type_name: &'static str,
    value: Box<dyn Any>,
}

impl Entry {
    fn new<T: 'static>(value: T) -> Self {
        Self {
            type_name: type_name::<T>(),
            value: Box::new(value),
        }
    }

    fn into_inner<T: 'static>(self) -> Option<T> {
        self.value.downcast().ok().map(|boxed| *boxed)
    }
}

/// A bag holding at most one value per type.
///
/// ```rust
/// use cmdtree::Extensions;
///
/// struct Sender { name: String, operator: bool }
///
/// let mut ext = Extensions::new();
/// ext.insert(Sender { name: "alex".into(), operator: true });
///
/// let sender = ext.get_required::<Sender>()?;
/// assert!(sender.operator);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Default)]
pub struct Extensions {
    entries: HashMap<TypeId, Entry>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value`, handing back the one of the same type it displaced.
    pub fn insert<T: 'static>(&mut self, value: T) -> Option<T> {
        self.entries
            .insert(TypeId::of::<T>(), Entry::new(value))
            .and_then(Entry::into_inner)
    }

    pub fn get<T: 'static>(&self) -> Option<&T> {
        self.entries.get(&TypeId::of::<T>())?.value.downcast_ref()
    }

    pub fn get_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.entries.get_mut(&TypeId::of::<T>())?.value.downcast_mut()
    }

    /// Like [`get`](Self::get), for handlers that cannot run without `T`.
    pub fn get_required<T: 'static>(&self) -> anyhow::Result<&T> {
        self.get::<T>()
            .ok_or_else(|| anyhow!("this command needs a {} but none was provided", type_name::<T>()))
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.entries
            .remove(&TypeId::of::<T>())
            .and_then(Entry::into_inner)
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.entries.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

/// Everything a command can see besides its arguments.
#[derive(Debug)]
pub struct CommandContext {
    /// Command labels as typed, root first (`["admin", "tp"]`)
    pub command_path: Vec<String>,
    pub app_state: Rc<Extensions>,
    pub extensions: Extensions,
}

impl CommandContext {
    pub fn new(app_state: Rc<Extensions>, extensions: Extensions) -> Self {
        Self {
            command_path: Vec::new(),
            app_state,
            extensions,
        }
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new(Rc::default(), Extensions::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Sender(&'static str);

    #[test]
    fn one_value_per_type() {
        let mut ext = Extensions::new();
        assert!(ext.is_empty());
        assert!(ext.insert(Sender("alex")).is_none());

        let displaced = ext.insert(Sender("steve"));
        assert_eq!(displaced.map(|s| s.0), Some("alex"));
        assert_eq!(ext.get::<Sender>().map(|s| s.0), Some("steve"));
        assert_eq!(ext.len(), 1);

        ext.insert(7u32);
        assert_eq!(ext.len(), 2);
        assert_eq!(ext.remove::<Sender>().map(|s| s.0), Some("steve"));
        assert!(!ext.contains::<Sender>());
        assert!(ext.contains::<u32>());
    }

    #[test]
    fn values_can_be_updated_in_place() {
        struct Cooldown(u32);

        let mut ext = Extensions::new();
        ext.insert(Cooldown(3));
        if let Some(cooldown) = ext.get_mut::<Cooldown>() {
            cooldown.0 -= 1;
        }
        assert_eq!(ext.get::<Cooldown>().map(|c| c.0), Some(2));
        assert!(ext.get_mut::<Sender>().is_none());
    }

    #[test]
    fn missing_required_value_names_its_type() {
        let err = Extensions::new().get_required::<Sender>().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("this command needs a "));
        assert!(message.contains("Sender"));
    }

    #[test]
    fn debug_lists_stored_types() {
        let mut ext = Extensions::new();
        ext.insert(Sender("sam"));
        ext.insert(1u8);
        let debug = format!("{:?}", ext);
        assert!(debug.contains("Sender"));
        assert!(debug.contains("u8"));
    }

    #[test]
    fn app_state_is_shared_between_contexts() {
        struct World {
            seed: u64,
        }

        let mut app_state = Extensions::new();
        app_state.insert(World { seed: 7 });
        let app_state = Rc::new(app_state);

        let first = CommandContext::new(Rc::clone(&app_state), Extensions::new());
        let second = CommandContext::new(Rc::clone(&app_state), Extensions::new());
        assert_eq!(first.app_state.get::<World>().map(|w| w.seed), Some(7));
        assert_eq!(second.app_state.get::<World>().map(|w| w.seed), Some(7));
        assert_eq!(Rc::strong_count(&app_state), 3);
        assert!(first.command_path.is_empty());
    }
}
