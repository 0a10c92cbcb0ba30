//! Named event dispatch
//!
//! Every entity and the world carry an [`EventDispatcher`]. Listeners are
//! called synchronously, in registration order, with the dispatching object
//! as receiver. The listener list is snapshotted when `trigger` starts:
//! listeners bound during dispatch first run on the next trigger, and
//! listeners unbound during dispatch still run this once.

use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;

/// Event names
///
/// Lifecycle events are variants; anything else goes through `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Event {
    Init,
    Create,
    Destroy,
    Step,
    Update,
    AfterUpdate,
    Remove,
    BeforeAdd,
    AfterAdd,
    BeforeDraw,
    Draw,
    AfterDraw,
    BeforeTransform,
    AfterTransform,
    Overlay,
    Custom(String),
}

impl Event {
    pub fn as_str(&self) -> &str {
        match self {
            Event::Init => "init",
            Event::Create => "create",
            Event::Destroy => "destroy",
            Event::Step => "step",
            Event::Update => "update",
            Event::AfterUpdate => "afterUpdate",
            Event::Remove => "remove",
            Event::BeforeAdd => "beforeAdd",
            Event::AfterAdd => "afterAdd",
            Event::BeforeDraw => "beforeDraw",
            Event::Draw => "draw",
            Event::AfterDraw => "afterDraw",
            Event::BeforeTransform => "beforeTransform",
            Event::AfterTransform => "afterTransform",
            Event::Overlay => "overlay",
            Event::Custom(name) => name,
        }
    }

    /// Parse an event name; unknown names become `Custom`
    pub fn from_name(name: &str) -> Self {
        match name {
            "init" => Event::Init,
            "create" => Event::Create,
            "destroy" => Event::Destroy,
            "step" => Event::Step,
            "update" => Event::Update,
            "afterUpdate" => Event::AfterUpdate,
            "remove" => Event::Remove,
            "beforeAdd" => Event::BeforeAdd,
            "afterAdd" => Event::AfterAdd,
            "beforeDraw" => Event::BeforeDraw,
            "draw" => Event::Draw,
            "afterDraw" => Event::AfterDraw,
            "beforeTransform" => Event::BeforeTransform,
            "afterTransform" => Event::AfterTransform,
            "overlay" => Event::Overlay,
            other => Event::Custom(other.to_string()),
        }
    }
}

impl Event {
    /// `Custom` spellings of lifecycle names resolve to their variant
    fn canonical(self) -> Self {
        match self {
            Event::Custom(name) => Event::from_name(&name),
            event => event,
        }
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        Event::from_name(name)
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event listener. Receives the dispatching object and the trigger arguments.
pub type Listener<T> = Rc<dyn Fn(&mut T, &[Value])>;

/// Handle returned by `bind`, used to unbind a single listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Per-object table of event listeners
pub struct EventDispatcher<T> {
    listeners: HashMap<Event, Vec<(ListenerId, Listener<T>)>>,
    next_id: u64,
}

impl<T> Default for EventDispatcher<T> {
    fn default() -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 1,
        }
    }
}

impl<T> std::fmt::Debug for EventDispatcher<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut events: Vec<_> = self
            .listeners
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(event, list)| (event.as_str().to_string(), list.len()))
            .collect();
        events.sort();
        f.debug_struct("EventDispatcher").field("listeners", &events).finish()
    }
}

impl<T> EventDispatcher<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; returns a handle for `unsubscribe`
    pub fn subscribe<F>(&mut self, event: impl Into<Event>, listener: F) -> ListenerId
    where
        F: Fn(&mut T, &[Value]) + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let listener: Listener<T> = Rc::new(listener);
        self.listeners
            .entry(event.into().canonical())
            .or_default()
            .push((id, listener));
        id
    }

    /// Remove one listener, or every listener of `event` when `id` is `None`.
    /// Returns how many listeners were removed.
    pub fn unsubscribe(&mut self, event: &Event, id: Option<ListenerId>) -> usize {
        let Some(list) = self.listeners.get_mut(&event.clone().canonical()) else {
            return 0;
        };
        let before = list.len();
        match id {
            Some(id) => list.retain(|(listener_id, _)| *listener_id != id),
            None => list.clear(),
        }
        before - list.len()
    }

    pub fn listener_count(&self, event: &Event) -> usize {
        self.listeners
            .get(&event.clone().canonical())
            .map(|list| list.len())
            .unwrap_or(0)
    }

    /// Listeners currently bound to `event`, in registration order
    pub fn snapshot(&self, event: &Event) -> Vec<Listener<T>> {
        self.listeners
            .get(&event.clone().canonical())
            .map(|list| list.iter().map(|(_, l)| Rc::clone(l)).collect())
            .unwrap_or_default()
    }
}

/// Objects that own an [`EventDispatcher`] over themselves
pub trait Bindable: Sized {
    fn dispatcher(&self) -> &EventDispatcher<Self>;
    fn dispatcher_mut(&mut self) -> &mut EventDispatcher<Self>;

    fn bind<F>(&mut self, event: impl Into<Event>, listener: F) -> ListenerId
    where
        F: Fn(&mut Self, &[Value]) + 'static,
    {
        self.dispatcher_mut().subscribe(event, listener)
    }

    /// Remove one listener, or all of them for this event when `id` is `None`
    fn unbind(&mut self, event: impl Into<Event>, id: Option<ListenerId>) -> usize {
        self.dispatcher_mut().unsubscribe(&event.into(), id)
    }

    /// Call every listener bound to `event`. Returns how many ran.
    fn trigger(&mut self, event: impl Into<Event>, args: &[Value]) -> usize {
        let event = event.into();
        let listeners = self.dispatcher().snapshot(&event);
        for listener in &listeners {
            listener(self, args);
        }
        listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Counter {
        value: i64,
        log: Vec<String>,
        events: EventDispatcher<Counter>,
    }

    impl Bindable for Counter {
        fn dispatcher(&self) -> &EventDispatcher<Self> {
            &self.events
        }

        fn dispatcher_mut(&mut self) -> &mut EventDispatcher<Self> {
            &mut self.events
        }
    }

    #[test]
    fn test_trigger_in_registration_order() {
        let mut counter = Counter::default();
        counter.bind("tick", |c: &mut Counter, _| c.log.push("first".into()));
        counter.bind("tick", |c: &mut Counter, _| c.log.push("second".into()));

        assert_eq!(counter.trigger("tick", &[]), 2);
        assert_eq!(counter.log, vec!["first", "second"]);
    }

    #[test]
    fn test_listener_receives_receiver_and_args() {
        let mut counter = Counter::default();
        counter.bind(Event::Update, |c: &mut Counter, args| {
            c.value += args[0].as_i64().unwrap_or(0);
        });

        counter.trigger(Event::Update, &[json!(5)]);
        counter.trigger(Event::Update, &[json!(3)]);
        assert_eq!(counter.value, 8);
    }

    #[test]
    fn test_trigger_without_listeners() {
        let mut counter = Counter::default();
        assert_eq!(counter.trigger("nobody", &[]), 0);
    }

    #[test]
    fn test_unbind_single_and_all() {
        let mut counter = Counter::default();
        let first = counter.bind("tick", |c: &mut Counter, _| c.value += 1);
        counter.bind("tick", |c: &mut Counter, _| c.value += 10);

        assert_eq!(counter.unbind("tick", Some(first)), 1);
        counter.trigger("tick", &[]);
        assert_eq!(counter.value, 10);

        assert_eq!(counter.unbind("tick", None), 1);
        counter.trigger("tick", &[]);
        assert_eq!(counter.value, 10);
    }

    #[test]
    fn test_bind_during_dispatch_runs_next_time() {
        let mut counter = Counter::default();
        counter.bind("tick", |c: &mut Counter, _| {
            c.value += 1;
            c.bind("tick", |c: &mut Counter, _| c.value += 100);
        });

        counter.trigger("tick", &[]);
        assert_eq!(counter.value, 1);

        counter.trigger("tick", &[]);
        assert_eq!(counter.value, 1 + 1 + 100);
    }

    #[test]
    fn test_unbind_during_dispatch_still_runs_snapshot() {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let mut counter = Counter::default();

        let log = Rc::clone(&calls);
        counter.bind("tick", move |c: &mut Counter, _| {
            log.borrow_mut().push("a");
            c.unbind("tick", None);
        });
        let log = Rc::clone(&calls);
        counter.bind("tick", move |_: &mut Counter, _| log.borrow_mut().push("b"));

        counter.trigger("tick", &[]);
        assert_eq!(*calls.borrow(), vec!["a", "b"]);

        counter.trigger("tick", &[]);
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn test_event_names_round_trip() {
        assert_eq!(Event::from_name("afterUpdate"), Event::AfterUpdate);
        assert_eq!(Event::from("boom"), Event::Custom("boom".into()));
        assert_eq!(Event::BeforeAdd.to_string(), "beforeAdd");
    }

    #[test]
    fn test_custom_spelling_of_lifecycle_event() {
        let mut counter = Counter::default();
        let id = counter.bind(Event::Custom("update".into()), |c: &mut Counter, _| c.value += 1);

        assert_eq!(counter.events.listener_count(&Event::Update), 1);
        assert_eq!(counter.trigger(Event::Update, &[]), 1);
        assert_eq!(counter.trigger(Event::Custom("update".into()), &[]), 1);
        assert_eq!(counter.value, 2);

        assert_eq!(counter.unbind(Event::Update, Some(id)), 1);
        assert_eq!(counter.trigger("update", &[]), 0);
    }
}
