//! Module composition
//!
//! Entities and the world are assembled from named modules instead of
//! inheritance. A module receives the object under construction (its state
//! and itself) and returns a [`MethodBundle`]: late-bound methods plus
//! `before` / `after` hooks around methods that already exist.
//!
//! Hooks on the same method nest in composition order. A later `before`
//! hook wraps the earlier ones, so it runs first; a later `after` hook runs
//! last. The wrapped call always returns the original method's result.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

use crate::error::{EngineError, EngineResult};

/// A late-bound method body
pub type MethodFn<T> = Rc<dyn Fn(&mut T, &[Value]) -> Value>;
/// A hook run around a method; its return value is ignored
pub type HookFn<T> = Rc<dyn Fn(&mut T, &[Value])>;

/// A method body with the hooks wrapped around it
struct Method<T> {
    body: MethodFn<T>,
    before: Vec<HookFn<T>>,
    after: Vec<HookFn<T>>,
}

impl<T> Method<T> {
    fn new(body: MethodFn<T>) -> Self {
        Self {
            body,
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

/// Resolved call chain, detached from the table so the target can be borrowed mutably
struct CallChain<T> {
    body: MethodFn<T>,
    before: Vec<HookFn<T>>,
    after: Vec<HookFn<T>>,
}

impl<T> CallChain<T> {
    fn run(&self, target: &mut T, args: &[Value]) -> Value {
        // Latest-registered before hook is the outermost wrapper
        for hook in self.before.iter().rev() {
            hook(target, args);
        }
        let result = (self.body)(target, args);
        for hook in &self.after {
            hook(target, args);
        }
        result
    }
}

/// What a module contributes to the object it is included into
pub struct MethodBundle<T> {
    methods: Vec<(String, MethodFn<T>)>,
    before: Vec<(String, HookFn<T>)>,
    after: Vec<(String, HookFn<T>)>,
}

impl<T> Default for MethodBundle<T> {
    fn default() -> Self {
        Self {
            methods: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }
}

impl<T> MethodBundle<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a named method
    pub fn method<F>(mut self, name: &str, body: F) -> Self
    where
        F: Fn(&mut T, &[Value]) -> Value + 'static,
    {
        let body: MethodFn<T> = Rc::new(body);
        self.methods.push((name.to_string(), body));
        self
    }

    /// Run `hook` before the existing method `name`
    pub fn before<F>(mut self, name: &str, hook: F) -> Self
    where
        F: Fn(&mut T, &[Value]) + 'static,
    {
        let hook: HookFn<T> = Rc::new(hook);
        self.before.push((name.to_string(), hook));
        self
    }

    /// Run `hook` after the existing method `name`
    pub fn after<F>(mut self, name: &str, hook: F) -> Self
    where
        F: Fn(&mut T, &[Value]) + 'static,
    {
        let hook: HookFn<T> = Rc::new(hook);
        self.after.push((name.to_string(), hook));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.before.is_empty() && self.after.is_empty()
    }
}

/// Named methods of a composed object, plus the modules that built it
pub struct MethodTable<T> {
    methods: HashMap<String, Method<T>>,
    modules: Vec<String>,
}

impl<T> Default for MethodTable<T> {
    fn default() -> Self {
        Self {
            methods: HashMap::new(),
            modules: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for MethodTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodTable")
            .field("methods", &self.method_names())
            .field("modules", &self.modules)
            .finish()
    }
}

impl<T> MethodTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Sorted method names
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }

    /// Modules merged into this table, in composition order
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    pub fn has_module(&self, name: &str) -> bool {
        self.modules.iter().any(|m| m == name)
    }

    /// Number of (before, after) hooks wrapped around `name`
    pub fn hook_counts(&self, name: &str) -> Option<(usize, usize)> {
        self.methods
            .get(name)
            .map(|m| (m.before.len(), m.after.len()))
    }

    /// Merge a bundle. Every hook target must exist, either already or in
    /// the bundle itself; otherwise nothing is applied.
    pub fn merge(&mut self, module: &str, bundle: MethodBundle<T>) -> EngineResult<()> {
        let MethodBundle {
            methods,
            before,
            after,
        } = bundle;

        for (target, _) in before.iter().chain(after.iter()) {
            let defined_here = methods.iter().any(|(name, _)| name == target);
            if !defined_here && !self.contains(target) {
                return Err(EngineError::MissingMethod {
                    module: module.to_string(),
                    method: target.clone(),
                });
            }
        }

        for (name, body) in methods {
            self.methods.insert(name, Method::new(body));
        }
        for (name, hook) in before {
            if let Some(method) = self.methods.get_mut(&name) {
                method.before.push(hook);
            }
        }
        for (name, hook) in after {
            if let Some(method) = self.methods.get_mut(&name) {
                method.after.push(hook);
            }
        }
        self.modules.push(module.to_string());
        Ok(())
    }

    fn chain(&self, name: &str) -> Option<CallChain<T>> {
        self.methods.get(name).map(|m| CallChain {
            body: Rc::clone(&m.body),
            before: m.before.clone(),
            after: m.after.clone(),
        })
    }
}

/// A named unit of behavior that can be included into a `T`
pub trait Module<T> {
    fn name(&self) -> &str;

    /// Prepare `target` (defaults, listeners) and return what to merge into it
    fn build(&self, target: &mut T) -> EngineResult<MethodBundle<T>>;
}

/// A module backed by a closure
pub struct FnModule<T> {
    name: String,
    factory: Rc<dyn Fn(&mut T) -> MethodBundle<T>>,
}

impl<T> FnModule<T> {
    pub fn new<F>(name: &str, factory: F) -> Self
    where
        F: Fn(&mut T) -> MethodBundle<T> + 'static,
    {
        Self {
            name: name.to_string(),
            factory: Rc::new(factory),
        }
    }
}

impl<T> Module<T> for FnModule<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn build(&self, target: &mut T) -> EngineResult<MethodBundle<T>> {
        Ok((self.factory)(target))
    }
}

/// Objects assembled from modules
pub trait Composable: Sized {
    fn method_table(&self) -> &MethodTable<Self>;
    fn method_table_mut(&mut self) -> &mut MethodTable<Self>;

    /// Merge an ad-hoc bundle under the given label
    fn extend(&mut self, label: &str, bundle: MethodBundle<Self>) -> EngineResult<()> {
        self.method_table_mut().merge(label, bundle)
    }

    /// Build `module` against this object and merge the result
    fn include(&mut self, module: &dyn Module<Self>) -> EngineResult<()> {
        let bundle = module.build(self)?;
        self.method_table_mut().merge(module.name(), bundle)?;
        log::debug!("Included module `{}`", module.name());
        Ok(())
    }

    fn responds_to(&self, name: &str) -> bool {
        self.method_table().contains(name)
    }

    fn has_module(&self, name: &str) -> bool {
        self.method_table().has_module(name)
    }

    /// Invoke a late-bound method with its hooks
    fn call(&mut self, name: &str, args: &[Value]) -> EngineResult<Value> {
        let chain = self
            .method_table()
            .chain(name)
            .ok_or_else(|| EngineError::UnknownMethod(name.to_string()))?;
        Ok(chain.run(self, args))
    }
}

/// Modules available to an object type, by name
pub struct ModuleRegistry<T> {
    modules: HashMap<String, Rc<dyn Module<T>>>,
}

impl<T> Default for ModuleRegistry<T> {
    fn default() -> Self {
        Self {
            modules: HashMap::new(),
        }
    }
}

impl<T> Clone for ModuleRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            modules: self.modules.clone(),
        }
    }
}

impl<T> std::fmt::Debug for ModuleRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.modules.keys().collect();
        names.sort();
        f.debug_struct("ModuleRegistry").field("modules", &names).finish()
    }
}

impl<T> ModuleRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name (replacing any previous one)
    pub fn register<M>(&mut self, module: M) -> &mut Self
    where
        M: Module<T> + 'static,
    {
        let module: Rc<dyn Module<T>> = Rc::new(module);
        self.modules.insert(module.name().to_string(), module);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> EngineResult<Rc<dyn Module<T>>> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::UnknownModule(name.to_string()))
    }

    /// Defaults first, then `included`, minus every name in `excluded`
    pub fn resolve<S: AsRef<str>>(
        &self,
        defaults: &[&str],
        included: &[S],
        excluded: &[S],
    ) -> EngineResult<Vec<Rc<dyn Module<T>>>> {
        defaults
            .iter()
            .copied()
            .chain(included.iter().map(|s| s.as_ref()))
            .filter(|name| !excluded.iter().any(|e| e.as_ref() == *name))
            .map(|name| self.get(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Widget {
        trace: Vec<String>,
        speed: i64,
        methods: MethodTable<Widget>,
    }

    impl Composable for Widget {
        fn method_table(&self) -> &MethodTable<Self> {
            &self.methods
        }

        fn method_table_mut(&mut self) -> &mut MethodTable<Self> {
            &mut self.methods
        }
    }

    fn widget_with_update() -> Widget {
        let mut widget = Widget::default();
        let core = MethodBundle::new().method("update", |w: &mut Widget, _| {
            w.trace.push("update".into());
            json!(true)
        });
        widget.extend("core", core).unwrap();
        widget
    }

    fn tracing_module(name: &'static str) -> FnModule<Widget> {
        FnModule::new(name, move |_| {
            MethodBundle::new()
                .before("update", move |w: &mut Widget, _| {
                    w.trace.push(format!("{}:before", name))
                })
                .after("update", move |w: &mut Widget, _| {
                    w.trace.push(format!("{}:after", name))
                })
        })
    }

    #[test]
    fn test_hooks_nest_in_composition_order() {
        let mut widget = widget_with_update();
        widget.include(&tracing_module("a")).unwrap();
        widget.include(&tracing_module("b")).unwrap();

        let result = widget.call("update", &[]).unwrap();
        assert_eq!(result, json!(true));
        assert_eq!(
            widget.trace,
            vec!["b:before", "a:before", "update", "a:after", "b:after"]
        );
    }

    #[test]
    fn test_each_hook_runs_once_per_call() {
        let mut widget = widget_with_update();
        widget.include(&tracing_module("a")).unwrap();
        widget.include(&tracing_module("b")).unwrap();

        widget.call("update", &[]).unwrap();
        widget.call("update", &[]).unwrap();
        let befores = widget.trace.iter().filter(|t| t.ends_with(":before")).count();
        assert_eq!(befores, 4);
    }

    #[test]
    fn test_before_result_is_ignored() {
        let mut widget = widget_with_update();
        let module = FnModule::new("noisy", |_| {
            MethodBundle::new().before("update", |w: &mut Widget, _| w.speed = 99)
        });
        widget.include(&module).unwrap();

        assert_eq!(widget.call("update", &[]).unwrap(), json!(true));
        assert_eq!(widget.speed, 99);
    }

    #[test]
    fn test_hook_on_missing_method_fails_without_side_effects() {
        let mut widget = widget_with_update();
        let module = FnModule::new("jumper", |_| {
            MethodBundle::new()
                .method("run", |_: &mut Widget, _| Value::Null)
                .before("jump", |_: &mut Widget, _| {})
        });

        let err = widget.include(&module).unwrap_err();
        assert_eq!(
            err,
            EngineError::MissingMethod {
                module: "jumper".into(),
                method: "jump".into()
            }
        );
        assert!(!widget.responds_to("run"));
        assert!(!widget.has_module("jumper"));
    }

    #[test]
    fn test_hook_may_target_method_from_same_bundle() {
        let mut widget = Widget::default();
        let module = FnModule::new("speedy", |_| {
            MethodBundle::new()
                .method("accelerate", |w: &mut Widget, args| {
                    w.speed += args.first().and_then(Value::as_i64).unwrap_or(1);
                    json!(w.speed)
                })
                .after("accelerate", |w: &mut Widget, _| w.trace.push("clamped".into()))
        });
        widget.include(&module).unwrap();

        assert_eq!(widget.call("accelerate", &[json!(4)]).unwrap(), json!(4));
        assert_eq!(widget.trace, vec!["clamped"]);
        assert_eq!(widget.method_table().hook_counts("accelerate"), Some((0, 1)));
    }

    #[test]
    fn test_redefining_method_drops_old_hooks() {
        let mut widget = widget_with_update();
        widget.include(&tracing_module("a")).unwrap();
        let replace = MethodBundle::new().method("update", |_: &mut Widget, _| json!(false));
        widget.extend("replacement", replace).unwrap();

        assert_eq!(widget.call("update", &[]).unwrap(), json!(false));
        assert!(widget.trace.is_empty());
    }

    #[test]
    fn test_call_unknown_method() {
        let mut widget = Widget::default();
        assert_eq!(
            widget.call("fly", &[]).unwrap_err(),
            EngineError::UnknownMethod("fly".into())
        );
    }

    #[test]
    fn test_registry_resolves_defaults_included_minus_excluded() {
        let mut registry = ModuleRegistry::new();
        registry
            .register(tracing_module("a"))
            .register(tracing_module("b"))
            .register(tracing_module("c"));

        let included = vec!["c".to_string()];
        let excluded = vec!["a".to_string()];
        let names: Vec<String> = registry
            .resolve(&["a", "b"], &included, &excluded)
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["b", "c"]);
    }

    #[test]
    fn test_registry_unknown_module_is_configuration_error() {
        let registry: ModuleRegistry<Widget> = ModuleRegistry::new();
        let err = registry.resolve::<String>(&["ghost"], &[], &[]).err().unwrap();
        assert!(err.is_configuration());
    }
}
