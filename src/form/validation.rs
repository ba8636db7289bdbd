use std::collections::BTreeMap;

use tracing::debug;

use super::controller::{
    FieldErrors, FieldKey, FieldsState, FormController, FormResult, read_lock, write_lock,
};

/// One validator expression as computed by the caller: a boolean (pass) or a
/// failure message.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Check {
    Bool(bool),
    Message(String),
}

impl Check {
    /// `Message(message)` when `failing` holds, `Bool(false)` otherwise.
    pub fn when(failing: bool, message: impl Into<String>) -> Self {
        if failing {
            Check::Message(message.into())
        } else {
            Check::Bool(false)
        }
    }
}

impl From<bool> for Check {
    fn from(value: bool) -> Self {
        Check::Bool(value)
    }
}

impl From<&str> for Check {
    fn from(value: &str) -> Self {
        Check::Message(value.to_string())
    }
}

impl From<String> for Check {
    fn from(value: String) -> Self {
        Check::Message(value)
    }
}

impl<S> From<Option<S>> for Check
where
    S: Into<String>,
{
    fn from(value: Option<S>) -> Self {
        match value {
            Some(message) => Check::Message(message.into()),
            None => Check::Bool(false),
        }
    }
}

/// The recorded outcome of a field's validator expressions.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ValidatorEntry {
    Passed(bool),
    Failed(String),
}

impl ValidatorEntry {
    /// Keeps the last message or `false` of the sequence; later entries
    /// replace earlier ones. A sequence holding only `true` records
    /// `Passed(true)`.
    pub fn from_checks<I>(checks: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Check>,
    {
        checks
            .into_iter()
            .filter_map(|check| match check.into() {
                Check::Message(message) => Some(ValidatorEntry::Failed(message)),
                Check::Bool(false) => Some(ValidatorEntry::Passed(false)),
                Check::Bool(true) => None,
            })
            .last()
            .unwrap_or(ValidatorEntry::Passed(true))
    }

    /// The failure message, if any. Empty messages count as a pass.
    pub fn message(&self) -> Option<&str> {
        match self {
            ValidatorEntry::Failed(message) if !message.is_empty() => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Validator entries in first-registration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ActiveValidators {
    entries: Vec<(FieldKey, ValidatorEntry)>,
}

impl ActiveValidators {
    pub fn record(&mut self, key: FieldKey, entry: ValidatorEntry) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, current)) => *current = entry,
            None => self.entries.push((key, entry)),
        }
    }

    pub fn remove(&mut self, key: FieldKey) -> Option<ValidatorEntry> {
        let index = self.entries.iter().position(|(existing, _)| *existing == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: FieldKey) -> Option<&ValidatorEntry> {
        self.entries
            .iter()
            .find_map(|(existing, entry)| (*existing == key).then_some(entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &ValidatorEntry)> {
        self.entries.iter().map(|(key, entry)| (*key, entry))
    }

    pub fn report(&self) -> ValidationReport {
        let mut errors = BTreeMap::new();
        let mut first_error = None;
        for (key, entry) in self.iter() {
            if let Some(message) = entry.message() {
                first_error.get_or_insert(key);
                errors.insert(key, message.to_string());
            }
        }
        ValidationReport {
            errors,
            first_error,
        }
    }
}

/// Result of one validation pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ValidationReport {
    pub errors: FieldErrors,
    /// First erroring field in registration order.
    pub first_error: Option<FieldKey>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PassMode {
    Silent,
    Focusing,
}

impl FormController {
    pub fn validator_entry(&self, key: FieldKey) -> FormResult<Option<ValidatorEntry>> {
        Ok(read_lock(&self.inner.validators, "reading validator entry")?
            .get(key)
            .cloned())
    }

    /// Runs a pass without publishing errors and focuses the first failing
    /// field. Returns whether an element received focus.
    pub fn focus_first_error(&self) -> FormResult<bool> {
        let first_error = read_lock(&self.inner.validators, "reading first error key")?
            .report()
            .first_error;
        match first_error {
            Some(key) => self.focus_field(key),
            None => Ok(false),
        }
    }

    pub(super) fn run_validation(&self, mode: PassMode) -> FormResult<bool> {
        let ValidationReport {
            errors,
            first_error,
        } = read_lock(&self.inner.validators, "running validation pass")?.report();
        let is_valid = errors.is_empty();

        if self.publishes_errors() {
            self.inner.errors.set(errors);
        }
        self.inner.meta.update(|meta| meta.is_valid = is_valid);

        if mode == PassMode::Focusing {
            if let Some(key) = first_error {
                self.focus_field(key)?;
            }
        }
        Ok(is_valid)
    }

    /// Re-evaluates every rule registered through `register_with` against
    /// the current field values and records the results.
    pub(super) fn refresh_rules(&self) -> FormResult<()> {
        let rules = read_lock(&self.inner.rules, "reading validation rules")?
            .iter()
            .map(|(key, rule)| (*key, rule.clone()))
            .collect::<Vec<_>>();
        if rules.is_empty() {
            return Ok(());
        }

        let fields: FieldsState = self.inner.fields.snapshot();
        let entries = rules
            .into_iter()
            .map(|(key, rule)| (key, ValidatorEntry::from_checks(rule(&fields))))
            .collect::<Vec<_>>();

        let mut validators = write_lock(&self.inner.validators, "recording rule results")?;
        for (key, entry) in entries {
            validators.record(key, entry);
        }
        Ok(())
    }

    fn focus_field(&self, key: FieldKey) -> FormResult<bool> {
        let element = read_lock(&self.inner.element_refs, "reading element for focus")?
            .get(&key)
            .map(|bound| bound.element.clone());
        match element {
            Some(element) => {
                element.focus();
                Ok(true)
            }
            None => {
                debug!(field = %key, "no element bound to focus");
                Ok(false)
            }
        }
    }
}
