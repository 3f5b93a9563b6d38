use super::{Link, LinkId, Template, TemplateId};

/// Listener notified of registry mutations.
///
/// Callbacks run synchronously, in mutation order, after the mutation has been
/// applied. Every method defaults to a no-op so observers implement only what
/// they care about.
pub trait RegistryObserver {
    /// A template was registered.
    fn template_added(&mut self, _template: &Template) {}

    /// A template was evicted.
    fn template_removed(&mut self, _template: &Template) {}

    /// A link was created.
    fn link_added(&mut self, _link: &Link) {}

    /// A link was removed.
    fn link_removed(&mut self, _link: &Link) {}

    /// A template's dirty flag changed.
    fn dirty_changed(&mut self, _template_id: TemplateId, _dirty: bool) {}

    /// A template's loaded-with-errors flag changed.
    fn loaded_with_errors_changed(&mut self, _template_id: TemplateId, _loaded_with_errors: bool) {}
}

/// Observer that records every notification as a [`RegistryEvent`].
///
/// Mostly useful in tests; share the event list with an `Rc` to inspect it
/// after handing the recorder to the registry.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    events: std::rc::Rc<std::cell::RefCell<Vec<RegistryEvent>>>,
}

/// A recorded registry notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// See [`RegistryObserver::template_added`]
    TemplateAdded(TemplateId),
    /// See [`RegistryObserver::template_removed`]
    TemplateRemoved(TemplateId),
    /// See [`RegistryObserver::link_added`]
    LinkAdded(LinkId),
    /// See [`RegistryObserver::link_removed`]
    LinkRemoved(LinkId),
    /// See [`RegistryObserver::dirty_changed`]
    DirtyChanged(TemplateId, bool),
    /// See [`RegistryObserver::loaded_with_errors_changed`]
    LoadedWithErrorsChanged(TemplateId, bool),
}

impl EventRecorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.events.borrow().clone()
    }

    fn record(&self, event: RegistryEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl RegistryObserver for EventRecorder {
    fn template_added(&mut self, template: &Template) {
        self.record(RegistryEvent::TemplateAdded(template.id()));
    }

    fn template_removed(&mut self, template: &Template) {
        self.record(RegistryEvent::TemplateRemoved(template.id()));
    }

    fn link_added(&mut self, link: &Link) {
        self.record(RegistryEvent::LinkAdded(link.id()));
    }

    fn link_removed(&mut self, link: &Link) {
        self.record(RegistryEvent::LinkRemoved(link.id()));
    }

    fn dirty_changed(&mut self, template_id: TemplateId, dirty: bool) {
        self.record(RegistryEvent::DirtyChanged(template_id, dirty));
    }

    fn loaded_with_errors_changed(&mut self, template_id: TemplateId, loaded_with_errors: bool) {
        self.record(RegistryEvent::LoadedWithErrorsChanged(template_id, loaded_with_errors));
    }
}
