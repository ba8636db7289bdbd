//! Field registration, validation and submission for a single form.
//!
//! A [`FormController`] owns the field values, the per-field validator
//! entries and the submission state. Fields are registered by name, bound to
//! a [`FieldElement`] and kept in sync through the element's input events;
//! [`FormController::submit_form`] validates and hands the values to the
//! configured submit handler.

mod binding;
mod controller;
mod element;
mod model;
mod validation;
mod value;


pub use binding::FieldRegistration;
pub use calmform_derive::FormModel;
pub use controller::{
    ErrorDisplay, FieldErrors, FieldKey, FieldsState, FormConfig, FormController, FormError,
    FormMeta, FormOptions, FormResult, FormState, ReentrantSubmit, SubmitEvent, SubmitHandler,
};
pub use element::{ElementRef, FieldElement, InputElement, InputListener};
pub use model::{FormModel, from_fields, to_fields};
pub use validation::{ActiveValidators, Check, PassMode, ValidationReport, ValidatorEntry};
pub use value::{FieldKind, FieldValue, parse_int};
