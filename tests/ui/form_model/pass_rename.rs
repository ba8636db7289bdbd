use calmform::form::{FieldValue, FormModel, from_fields, to_fields};
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Serialize, Deserialize, calmform::form::FormModel)]
struct Profile {
    #[serde(rename = "displayName")]
    display_name: String,
    #[serde(default)]
    age: u32,
}

fn main() {
    let fields = Profile::fields();
    assert_eq!(fields.display_name().as_str(), "displayName");

    let profile = Profile {
        display_name: "Ada".to_string(),
        age: 36,
    };
    let values = to_fields(&profile).expect("to fields");
    assert_eq!(
        values.get(&fields.display_name()),
        Some(&FieldValue::from("Ada"))
    );
    assert_eq!(from_fields::<Profile>(&values).expect("from fields"), profile);
}
