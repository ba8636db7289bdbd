use std::sync::Arc;

use tracing::{debug, warn};

use super::controller::{
    FieldKey, FieldsState, FormController, FormError, FormResult, ValidationRule, read_lock,
    write_lock,
};
use super::element::{BoundElement, ElementRef, read_element, seed_element};
use super::validation::{Check, PassMode, ValidatorEntry};
use crate::reactive::SubscriptionId;

/// Handle returned by the `register*` family. [`FieldRegistration::bind`]
/// attaches the element that backs the field.
#[derive(Clone)]
pub struct FieldRegistration {
    name: FieldKey,
    controller: FormController,
}

impl FieldRegistration {
    pub fn name(&self) -> FieldKey {
        self.name
    }

    /// Binds `element` to the field: stores the reference, seeds the
    /// element from the initial value and listens for input.
    ///
    /// Binding another element under the same name replaces the reference
    /// and detaches the listener from the replaced element. Binding the
    /// element that is already bound is a no-op: it neither adds a listener
    /// nor re-seeds the value.
    pub fn bind(&self, element: ElementRef) -> FormResult<()> {
        let inner = &self.controller.inner;
        let name = self.name;
        let listener = SubscriptionId::next();
        let previous = {
            let mut element_refs = write_lock(&inner.element_refs, "binding element")?;
            if element_refs
                .get(&name)
                .is_some_and(|bound| Arc::ptr_eq(&bound.element, &element))
            {
                return Ok(());
            }
            element_refs.insert(
                name,
                BoundElement {
                    element: element.clone(),
                    listener,
                },
            )
        };
        if let Some(previous) = previous {
            previous.detach();
        }

        if let Some(initial) = inner.initial_values.get(&name) {
            seed_element(element.as_ref(), initial);
        }

        let form = Arc::downgrade(inner);
        let target = Arc::downgrade(&element);
        element.add_input_listener(
            listener,
            Arc::new(move || {
                let (Some(inner), Some(element)) = (form.upgrade(), target.upgrade()) else {
                    return;
                };
                let controller = FormController { inner };
                if let Err(error) = controller.handle_input(name, &element) {
                    warn!(field = %name, %error, "input event could not be applied");
                }
            }),
        );

        debug!(field = %name, kind = ?element.kind(), "element bound");
        Ok(())
    }
}

impl FormController {
    /// Registers a field without validators, dropping any validator the
    /// field had from an earlier registration.
    pub fn register(&self, name: FieldKey) -> FormResult<FieldRegistration> {
        write_lock(&self.inner.rules, "clearing validation rule")?.remove(&name);
        write_lock(&self.inner.validators, "clearing validator entry")?.remove(name);
        Ok(self.registration(name))
    }

    /// Registers a field with validator expressions that were already
    /// evaluated by the caller. They are recorded once; calling again with
    /// freshly evaluated expressions replaces the entry.
    pub fn register_checks<I>(&self, name: FieldKey, checks: I) -> FormResult<FieldRegistration>
    where
        I: IntoIterator,
        I::Item: Into<Check>,
    {
        let entry = ValidatorEntry::from_checks(checks);
        write_lock(&self.inner.rules, "clearing validation rule")?.remove(&name);
        write_lock(&self.inner.validators, "recording validator entry")?.record(name, entry);
        Ok(self.registration(name))
    }

    /// Registers a field whose validator expressions are recomputed from the
    /// current values after every field write.
    pub fn register_with<F>(&self, name: FieldKey, rule: F) -> FormResult<FieldRegistration>
    where
        F: Fn(&FieldsState) -> Vec<Check> + Send + Sync + 'static,
    {
        let rule: ValidationRule = Arc::new(rule);
        let entry = ValidatorEntry::from_checks(rule(&self.inner.fields.snapshot()));
        write_lock(&self.inner.rules, "storing validation rule")?.insert(name, rule);
        write_lock(&self.inner.validators, "recording validator entry")?.record(name, entry);
        Ok(self.registration(name))
    }

    /// Detaches the element and forgets the validators of a field, then
    /// re-runs a silent pass so published errors and `is_valid` reflect the
    /// remaining fields. The field's value stays in the store.
    pub fn unregister(&self, name: FieldKey) -> FormResult<()> {
        let element = write_lock(&self.inner.element_refs, "unbinding element")?.remove(&name);
        if let Some(bound) = &element {
            bound.detach();
        }
        let entry = write_lock(&self.inner.validators, "removing validator entry")?.remove(name);
        let rule = write_lock(&self.inner.rules, "removing validation rule")?.remove(&name);
        if element.is_none() && entry.is_none() && rule.is_none() {
            return Err(FormError::UnknownField(name));
        }
        debug!(field = %name, "field unregistered");
        self.run_validation(PassMode::Silent)?;
        Ok(())
    }

    pub fn is_bound(&self, name: FieldKey) -> FormResult<bool> {
        Ok(read_lock(&self.inner.element_refs, "reading bound elements")?.contains_key(&name))
    }

    fn registration(&self, name: FieldKey) -> FieldRegistration {
        FieldRegistration {
            name,
            controller: self.clone(),
        }
    }

    fn handle_input(&self, name: FieldKey, element: &ElementRef) -> FormResult<()> {
        let is_current = read_lock(&self.inner.element_refs, "checking input source")?
            .get(&name)
            .is_some_and(|bound| Arc::ptr_eq(&bound.element, element));
        if !is_current {
            debug!(field = %name, "input from a detached element ignored");
            return Ok(());
        }

        self.inner.fields.set(name, read_element(element.as_ref()));
        self.refresh_rules()?;
        self.inner.meta.update(|meta| {
            meta.is_dirty = true;
            meta.dirty_fields.insert(name);
            meta.touched_fields.insert(name);
        });
        self.run_validation(PassMode::Silent)?;
        Ok(())
    }
}
