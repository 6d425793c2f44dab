//! Test host views for integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use spark_view_update::{
    ChangeHandler, DirtyType, Observation, Property, PropertyTable, Result, View, ViewUpdate,
    ViewUpdateConfig, ViewUpdateDelegate,
};

type UpdateHook = Box<dyn Fn(&TestView)>;

/// A view that takes part in the update protocol and records every update.
pub struct TestView {
    pub view_update: ViewUpdate,
    pub properties: PropertyTable,
    pub title: Property<String>,
    pub width: Property<u32>,
    children: RefCell<Vec<Rc<dyn View>>>,
    parent: RefCell<Option<Weak<dyn View>>>,
    /// Flags visible at the start of each update.
    seen: RefCell<Vec<DirtyType>>,
    on_update: RefCell<Option<UpdateHook>>,
}

impl TestView {
    pub fn new() -> Rc<Self> {
        Self::with_config(ViewUpdateConfig::default())
    }

    pub fn with_config(config: ViewUpdateConfig) -> Rc<Self> {
        let view = Rc::new(Self {
            view_update: ViewUpdate::with_config(config),
            properties: PropertyTable::new(),
            title: Property::new(String::new()),
            width: Property::new(0),
            children: RefCell::new(Vec::new()),
            parent: RefCell::new(None),
            seen: RefCell::new(Vec::new()),
            on_update: RefCell::new(None),
        });
        view.properties.register_property("title", &view.title);
        view.properties.register_property("width", &view.width);
        view.view_update.set_delegate(&view);
        view
    }

    pub fn add_subview(self: &Rc<Self>, child: &Rc<TestView>) {
        let parent = Rc::downgrade(self);
        let parent: Weak<dyn View> = parent;
        *child.parent.borrow_mut() = Some(parent);
        self.children.borrow_mut().push(child.clone());
    }

    pub fn add_plain_subview(&self, child: &Rc<PlainView>) {
        self.children.borrow_mut().push(child.clone());
    }

    pub fn on_update(&self, hook: impl Fn(&TestView) + 'static) {
        *self.on_update.borrow_mut() = Some(Box::new(hook));
    }

    pub fn updates(&self) -> usize {
        self.seen.borrow().len()
    }

    pub fn seen(&self) -> Vec<DirtyType> {
        self.seen.borrow().clone()
    }

    pub fn last_seen(&self) -> Option<DirtyType> {
        self.seen.borrow().last().copied()
    }
}

impl View for TestView {
    fn subviews(&self) -> Vec<Rc<dyn View>> {
        self.children.borrow().clone()
    }

    fn superview(&self) -> Option<Rc<dyn View>> {
        self.parent.borrow().as_ref().and_then(|p| p.upgrade())
    }

    fn as_update_delegate(&self) -> Option<&dyn ViewUpdateDelegate> {
        Some(self)
    }
}

impl ViewUpdateDelegate for TestView {
    fn update_delegate(&self) -> &ViewUpdate {
        &self.view_update
    }

    fn update(&self) {
        self.seen.borrow_mut().push(self.view_update.dirty_flags());
        if let Some(hook) = self.on_update.borrow().as_ref() {
            hook(self);
        }
        self.view_update.view_did_update();
    }

    fn observe_key_path(&self, key_path: &str, on_change: ChangeHandler) -> Result<Observation> {
        self.properties.observe(key_path, on_change)
    }
}

/// A view that does not take part in the update protocol.
#[derive(Default)]
pub struct PlainView {
    children: RefCell<Vec<Rc<dyn View>>>,
}

impl PlainView {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add_subview(self: &Rc<Self>, child: &Rc<TestView>) {
        let parent = Rc::downgrade(self);
        let parent: Weak<dyn View> = parent;
        *child.parent.borrow_mut() = Some(parent);
        self.children.borrow_mut().push(child.clone());
    }
}

impl View for PlainView {
    fn subviews(&self) -> Vec<Rc<dyn View>> {
        self.children.borrow().clone()
    }
}
