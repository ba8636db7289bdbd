use std::fmt::{Debug, Formatter};
use std::sync::{Arc, RwLock};

use super::value::{FieldKind, FieldValue};
use crate::reactive::{SubscriptionId, read, write};

/// Invoked by an element after its value changed through user input.
pub type InputListener = Arc<dyn Fn() + Send + Sync>;

/// Shared handle to a bound element.
pub type ElementRef = Arc<dyn FieldElement>;

/// The input a field is bound to.
///
/// The controller never owns the element's lifecycle: it seeds the initial
/// value once, listens for input, reads the current value back according to
/// [`FieldElement::kind`] and moves focus to it when it holds the first
/// validation error. Listeners are keyed by the id the controller allocates,
/// so a rebind or an unregister can detach the listener it added.
pub trait FieldElement: Send + Sync {
    fn kind(&self) -> FieldKind;
    fn value(&self) -> String;
    fn checked(&self) -> bool;
    fn set_value(&self, value: &str);
    fn set_checked(&self, checked: bool);
    fn focus(&self);
    fn add_input_listener(&self, id: SubscriptionId, listener: InputListener);
    fn remove_input_listener(&self, id: SubscriptionId) -> bool;
}

/// An element bound to a field together with the listener the controller
/// attached to it.
#[derive(Clone)]
pub(super) struct BoundElement {
    pub(super) element: ElementRef,
    pub(super) listener: SubscriptionId,
}

impl BoundElement {
    pub(super) fn detach(&self) {
        self.element.remove_input_listener(self.listener);
    }
}

pub(super) fn read_element(element: &dyn FieldElement) -> FieldValue {
    match element.kind() {
        FieldKind::Checkbox => FieldValue::Bool(element.checked()),
        kind => kind.coerce_text(&element.value()),
    }
}

pub(super) fn seed_element(element: &dyn FieldElement, value: &FieldValue) {
    match element.kind() {
        FieldKind::Checkbox => element.set_checked(value.is_truthy()),
        FieldKind::Number | FieldKind::Text => element.set_value(&value.to_string()),
    }
}

pub(super) fn clear_element(element: &dyn FieldElement) {
    match element.kind() {
        FieldKind::Checkbox => element.set_checked(false),
        FieldKind::Number | FieldKind::Text => element.set_value(""),
    }
}

#[derive(Debug, Default)]
struct InputElementState {
    value: String,
    checked: bool,
    focused: bool,
    focus_count: usize,
}

/// In-memory element for headless hosts and tests.
///
/// [`InputElement::input`] and [`InputElement::toggle`] play the role of the
/// user typing or clicking: they update the element first and then fire the
/// input listeners, in registration order.
pub struct InputElement {
    kind: FieldKind,
    state: RwLock<InputElementState>,
    listeners: RwLock<Vec<(SubscriptionId, InputListener)>>,
}

impl InputElement {
    pub fn new(kind: FieldKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            state: RwLock::new(InputElementState::default()),
            listeners: RwLock::new(Vec::new()),
        })
    }

    pub fn text() -> Arc<Self> {
        Self::new(FieldKind::Text)
    }

    pub fn number() -> Arc<Self> {
        Self::new(FieldKind::Number)
    }

    pub fn checkbox() -> Arc<Self> {
        Self::new(FieldKind::Checkbox)
    }

    pub fn input(&self, raw: impl Into<String>) {
        write(&self.state).value = raw.into();
        self.dispatch_input();
    }

    pub fn toggle(&self, checked: bool) {
        write(&self.state).checked = checked;
        self.dispatch_input();
    }

    pub fn blur(&self) {
        write(&self.state).focused = false;
    }

    pub fn is_focused(&self) -> bool {
        read(&self.state).focused
    }

    pub fn focus_count(&self) -> usize {
        read(&self.state).focus_count
    }

    pub fn listener_count(&self) -> usize {
        read(&self.listeners).len()
    }

    fn dispatch_input(&self) {
        let listeners = read(&self.listeners)
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect::<Vec<_>>();
        for listener in listeners {
            listener();
        }
    }
}

impl FieldElement for InputElement {
    fn kind(&self) -> FieldKind {
        self.kind
    }

    fn value(&self) -> String {
        read(&self.state).value.clone()
    }

    fn checked(&self) -> bool {
        read(&self.state).checked
    }

    fn set_value(&self, value: &str) {
        write(&self.state).value = value.to_string();
    }

    fn set_checked(&self, checked: bool) {
        write(&self.state).checked = checked;
    }

    fn focus(&self) {
        let mut state = write(&self.state);
        state.focused = true;
        state.focus_count += 1;
    }

    fn add_input_listener(&self, id: SubscriptionId, listener: InputListener) {
        write(&self.listeners).push((id, listener));
    }

    fn remove_input_listener(&self, id: SubscriptionId) -> bool {
        let mut listeners = write(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }
}

impl Debug for InputElement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputElement")
            .field("kind", &self.kind)
            .field("state", &*read(&self.state))
            .field("listeners", &read(&self.listeners).len())
            .finish()
    }
}
