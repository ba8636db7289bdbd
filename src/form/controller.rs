use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::{Serialize, Serializer};
use tracing::{debug, error};

use super::element::{BoundElement, clear_element, seed_element};
use super::validation::{ActiveValidators, Check, PassMode};
use super::value::FieldValue;
use crate::reactive::{Signal, Store, SubscriptionId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<&'static str> for FieldKey {
    fn from(value: &'static str) -> Self {
        Self(value)
    }
}

impl Serialize for FieldKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0)
    }
}

/// Current field values. Fields without a value yet are absent.
pub type FieldsState = BTreeMap<FieldKey, FieldValue>;

/// Published error messages. Fields without an error are absent.
pub type FieldErrors = BTreeMap<FieldKey, String>;

pub type SubmitHandler =
    Arc<dyn Fn(FieldsState) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

pub(super) type ValidationRule = Arc<dyn Fn(&FieldsState) -> Vec<Check> + Send + Sync>;

/// When validation messages become visible through [`FormController::errors`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorDisplay {
    /// Every validation pass publishes its errors.
    #[default]
    Immediate,
    /// Passes before the first submit attempt only recompute validity.
    AfterSubmit,
}

/// What `submit_form` does while a previous submission is still in flight.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReentrantSubmit {
    #[default]
    Ignore,
    Allow,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FormOptions {
    pub error_display: ErrorDisplay,
    pub reentrant_submit: ReentrantSubmit,
    pub focus_first_error_on_submit: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            error_display: ErrorDisplay::Immediate,
            reentrant_submit: ReentrantSubmit::Ignore,
            focus_first_error_on_submit: true,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormMeta {
    pub is_dirty: bool,
    pub dirty_fields: BTreeSet<FieldKey>,
    pub touched_fields: BTreeSet<FieldKey>,
    pub submit_count: u32,
    pub is_valid: bool,
}

impl Default for FormMeta {
    fn default() -> Self {
        Self {
            is_dirty: false,
            dirty_fields: BTreeSet::new(),
            touched_fields: BTreeSet::new(),
            submit_count: 0,
            is_valid: true,
        }
    }
}

/// Aggregate read-only view over meta, errors and loading state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FormState {
    pub is_dirty: bool,
    pub dirty_fields: BTreeSet<FieldKey>,
    pub touched_fields: BTreeSet<FieldKey>,
    pub submit_count: u32,
    pub is_valid: bool,
    pub is_loading: bool,
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("field `{0}` is not registered")]
    UnknownField(FieldKey),
    #[error("failed to convert form values: {0}")]
    ModelConversion(String),
}

pub type FormResult<T> = Result<T, FormError>;

/// The submit event handed to [`FormController::submit_form`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

/// Construction-time configuration of a [`FormController`].
pub struct FormConfig {
    pub(super) on_submit: SubmitHandler,
    pub(super) initial_values: FieldsState,
    pub(super) options: FormOptions,
}

impl FormConfig {
    pub fn new<F, Fut>(on_submit: F) -> Self
    where
        F: Fn(FieldsState) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            on_submit: Arc::new(move |fields| on_submit(fields).boxed()),
            initial_values: FieldsState::new(),
            options: FormOptions::default(),
        }
    }

    pub fn with_sync_handler<F>(on_submit: F) -> Self
    where
        F: Fn(FieldsState) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(move |fields| futures::future::ready(on_submit(fields)))
    }

    pub fn initial_values(mut self, values: FieldsState) -> Self {
        self.initial_values = values;
        self
    }

    pub fn initial_value(mut self, key: FieldKey, value: impl Into<FieldValue>) -> Self {
        self.initial_values.insert(key, value.into());
        self
    }

    pub fn options(mut self, options: FormOptions) -> Self {
        self.options = options;
        self
    }
}

pub(super) struct FormInner {
    pub(super) options: FormOptions,
    pub(super) on_submit: SubmitHandler,
    pub(super) initial_values: FieldsState,
    pub(super) fields: Store<FieldKey, FieldValue>,
    pub(super) errors: Signal<FieldErrors>,
    pub(super) meta: Signal<FormMeta>,
    pub(super) loading: Signal<bool>,
    pub(super) element_refs: RwLock<BTreeMap<FieldKey, BoundElement>>,
    pub(super) validators: RwLock<ActiveValidators>,
    pub(super) rules: RwLock<BTreeMap<FieldKey, ValidationRule>>,
}

/// Owns the values, validation state and submission state of one form.
///
/// Clones share the same form. Elements bound through
/// [`FieldRegistration::bind`](super::FieldRegistration::bind) only keep a
/// weak handle back to the controller.
#[derive(Clone)]
pub struct FormController {
    pub(super) inner: Arc<FormInner>,
}

impl FormController {
    pub fn new(config: FormConfig) -> Self {
        let FormConfig {
            on_submit,
            initial_values,
            options,
        } = config;
        Self {
            inner: Arc::new(FormInner {
                options,
                on_submit,
                fields: Store::new(initial_values.clone()),
                initial_values,
                errors: Signal::new(FieldErrors::new()),
                meta: Signal::new(FormMeta::default()),
                loading: Signal::new(false),
                element_refs: RwLock::new(BTreeMap::new()),
                validators: RwLock::new(ActiveValidators::default()),
                rules: RwLock::new(BTreeMap::new()),
            }),
        }
    }

    pub fn options(&self) -> FormOptions {
        self.inner.options
    }

    pub fn fields(&self) -> FieldsState {
        self.inner.fields.snapshot()
    }

    pub fn field(&self, key: FieldKey) -> Option<FieldValue> {
        self.inner.fields.get(&key)
    }

    /// Programmatic write of one field. Registered rules are re-evaluated
    /// but no validation pass runs and the field is not marked touched.
    pub fn set_field(&self, key: FieldKey, value: impl Into<FieldValue>) -> FormResult<()> {
        self.inner.fields.set(key, value.into());
        self.refresh_rules()
    }

    /// Replaces every field value at once, leaving unchanged fields intact.
    /// Returns the keys whose value changed.
    pub fn replace_fields(&self, values: FieldsState) -> FormResult<Vec<FieldKey>> {
        let changed = self.inner.fields.reconcile(values);
        self.refresh_rules()?;
        Ok(changed)
    }

    pub fn errors(&self) -> FieldErrors {
        self.inner.errors.get()
    }

    pub fn error(&self, key: FieldKey) -> Option<String> {
        self.inner.errors.with(|errors| errors.get(&key).cloned())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.loading.get()
    }

    pub fn meta(&self) -> FormMeta {
        self.inner.meta.get()
    }

    pub fn form_state(&self) -> FormState {
        let FormMeta {
            is_dirty,
            dirty_fields,
            touched_fields,
            submit_count,
            is_valid,
        } = self.inner.meta.get();
        FormState {
            is_dirty,
            dirty_fields,
            touched_fields,
            submit_count,
            is_valid,
            is_loading: self.inner.loading.get(),
            errors: self.inner.errors.get(),
        }
    }

    pub fn subscribe_fields(
        &self,
        listener: impl Fn(&[FieldKey]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.fields.subscribe(listener)
    }

    pub fn subscribe_errors(
        &self,
        listener: impl Fn(&FieldErrors) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.errors.subscribe(listener)
    }

    pub fn subscribe_meta(
        &self,
        listener: impl Fn(&FormMeta) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.meta.subscribe(listener)
    }

    pub fn subscribe_loading(
        &self,
        listener: impl Fn(&bool) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.loading.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.fields.unsubscribe(id)
            || self.inner.errors.unsubscribe(id)
            || self.inner.meta.unsubscribe(id)
            || self.inner.loading.unsubscribe(id)
    }

    /// Handles the form's submit event.
    ///
    /// Always prevents the default submission and counts the attempt. The
    /// handler only runs when the focusing validation pass succeeds; its
    /// failures and panics are logged and swallowed, and the loading flag is
    /// cleared once it settles, or when this future is dropped.
    pub async fn submit_form(&self, event: &mut SubmitEvent) {
        event.prevent_default();
        self.inner
            .meta
            .update(|meta| meta.submit_count = meta.submit_count.saturating_add(1));

        if self.inner.options.reentrant_submit == ReentrantSubmit::Ignore && self.is_loading() {
            debug!("submit ignored while a previous submission is in flight");
            return;
        }

        let mode = if self.inner.options.focus_first_error_on_submit {
            PassMode::Focusing
        } else {
            PassMode::Silent
        };
        let is_valid = match self.run_validation(mode) {
            Ok(is_valid) => is_valid,
            Err(error) => {
                error!(%error, "validation pass failed during submit");
                return;
            }
        };
        if !is_valid {
            debug!(
                submit_count = self.inner.meta.with(|meta| meta.submit_count),
                "submit blocked by validation errors"
            );
            return;
        }

        let _loading = match self.inner.options.reentrant_submit {
            ReentrantSubmit::Allow => LoadingGuard::engage(&self.inner.loading),
            ReentrantSubmit::Ignore => match LoadingGuard::try_engage(&self.inner.loading) {
                Some(guard) => guard,
                None => {
                    debug!("submit ignored: a concurrent submission engaged loading first");
                    return;
                }
            },
        };
        let values = self.inner.fields.snapshot();
        let handler = self.inner.on_submit.clone();
        let outcome = match std::panic::catch_unwind(AssertUnwindSafe(|| handler(values))) {
            Ok(pending) => AssertUnwindSafe(pending).catch_unwind().await,
            Err(panic) => Err(panic),
        };
        match outcome {
            Ok(Ok(())) => debug!("submit handler completed"),
            Ok(Err(failure)) => error!(error = %failure, "submit handler failed"),
            Err(panic) => error!(panic = panic_message(&*panic), "submit handler panicked"),
        }
    }

    /// Restores the initial values into the store and every bound element and
    /// clears errors and meta state. The loading flag is left alone.
    pub fn reset(&self) -> FormResult<()> {
        self.inner
            .fields
            .reconcile(self.inner.initial_values.clone());

        let elements = read_lock(&self.inner.element_refs, "reading elements for reset")?
            .iter()
            .map(|(key, bound)| (*key, bound.element.clone()))
            .collect::<Vec<_>>();
        for (key, element) in elements {
            match self.inner.initial_values.get(&key) {
                Some(value) => seed_element(element.as_ref(), value),
                None => clear_element(element.as_ref()),
            }
        }

        self.inner.meta.set(FormMeta::default());
        self.inner.errors.set(FieldErrors::new());
        self.refresh_rules()
    }

    pub(super) fn publishes_errors(&self) -> bool {
        match self.inner.options.error_display {
            ErrorDisplay::Immediate => true,
            ErrorDisplay::AfterSubmit => self.inner.meta.with(|meta| meta.submit_count > 0),
        }
    }
}

struct LoadingGuard {
    loading: Signal<bool>,
}

impl LoadingGuard {
    fn engage(loading: &Signal<bool>) -> Self {
        loading.set(true);
        Self {
            loading: loading.clone(),
        }
    }

    /// Engages only when no other submission holds the flag.
    fn try_engage(loading: &Signal<bool>) -> Option<Self> {
        loading.compare_and_set(&false, true).then(|| Self {
            loading: loading.clone(),
        })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.loading.set(false);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}
