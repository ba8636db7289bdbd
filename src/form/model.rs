use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::controller::{FieldKey, FieldsState, FormConfig, FormController, FormError, FormResult};
use super::value::{FieldKind, FieldValue};

/// A struct whose fields map one-to-one onto form fields.
///
/// Usually implemented through `#[derive(FormModel)]`, which also generates a
/// `<Name>Fields` accessor with one `FieldKey` constructor per field.
pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;

    /// Every field with the kind of element that edits it.
    fn field_kinds() -> &'static [(FieldKey, FieldKind)];

    fn kind_of(key: FieldKey) -> Option<FieldKind> {
        Self::field_kinds()
            .iter()
            .find_map(|(field, kind)| (*field == key).then_some(*kind))
    }
}

/// Flattens a model into field values. `None` fields stay absent.
pub fn to_fields<T>(model: &T) -> FormResult<FieldsState>
where
    T: FormModel + Serialize,
{
    let value = serde_json::to_value(model)
        .map_err(|error| FormError::ModelConversion(error.to_string()))?;
    let Value::Object(mut object) = value else {
        return Err(FormError::ModelConversion(
            "model did not serialize to an object".to_string(),
        ));
    };

    let mut fields = FieldsState::new();
    for (key, kind) in T::field_kinds() {
        let value = match (kind, object.remove(key.as_str())) {
            (_, None | Some(Value::Null)) => continue,
            (FieldKind::Checkbox, Some(Value::Bool(checked))) => FieldValue::Bool(checked),
            (FieldKind::Number, Some(Value::Number(number))) => {
                FieldValue::Number(number.as_f64().unwrap_or(f64::NAN))
            }
            (FieldKind::Text, Some(Value::String(text))) => FieldValue::Text(text),
            (kind, Some(other)) => {
                return Err(FormError::ModelConversion(format!(
                    "field `{key}` holds {other} which does not fit a {kind:?} field"
                )));
            }
        };
        fields.insert(*key, value);
    }
    Ok(fields)
}

/// Builds a model from field values. Values of keys the model does not
/// declare are ignored; NaN numbers arrive as `null`.
pub fn from_fields<T>(fields: &FieldsState) -> FormResult<T>
where
    T: FormModel + DeserializeOwned,
{
    let mut object = Map::new();
    for (key, _) in T::field_kinds() {
        if let Some(value) = fields.get(key) {
            let value = serde_json::to_value(value)
                .map_err(|error| FormError::ModelConversion(error.to_string()))?;
            object.insert(key.as_str().to_string(), value);
        }
    }
    serde_json::from_value(Value::Object(object))
        .map_err(|error| FormError::ModelConversion(error.to_string()))
}

impl FormConfig {
    /// Like [`FormConfig::new`], handing the submit handler a typed model.
    /// A conversion failure counts as a handler failure.
    pub fn for_model<T, F, Fut>(on_submit: F) -> Self
    where
        T: FormModel + DeserializeOwned + Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::new(move |fields: FieldsState| {
            let pending = from_fields::<T>(&fields).map(&on_submit);
            async move {
                match pending {
                    Ok(submitted) => submitted.await,
                    Err(error) => Err(error.into()),
                }
            }
        })
    }

    pub fn initial_model<T>(self, model: &T) -> FormResult<Self>
    where
        T: FormModel + Serialize,
    {
        Ok(self.initial_values(to_fields(model)?))
    }
}

impl FormController {
    pub fn values_as<T>(&self) -> FormResult<T>
    where
        T: FormModel + DeserializeOwned,
    {
        from_fields(&self.fields())
    }
}
