pub use crate::form::{
    Check, ErrorDisplay, FieldElement, FieldKey, FieldKind, FieldRegistration, FieldValue,
    FieldsState, FormConfig, FormController, FormModel, FormOptions, FormState, InputElement,
    ReentrantSubmit, SubmitEvent,
};
pub use crate::reactive::{Signal, Store, SubscriptionId};
