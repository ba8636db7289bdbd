use calmform::form::{FieldKind, FormModel};

#[allow(dead_code)]
#[derive(calmform::form::FormModel)]
struct Settings {
    nickname: Option<String>,
    retries: u8,
    ratio: Option<f32>,
    r#type: String,
    notify: bool,
}

fn main() {
    let fields = Settings::fields();
    assert_eq!(Settings::kind_of(fields.nickname()), Some(FieldKind::Text));
    assert_eq!(Settings::kind_of(fields.retries()), Some(FieldKind::Number));
    assert_eq!(Settings::kind_of(fields.ratio()), Some(FieldKind::Number));
    assert_eq!(Settings::kind_of(fields.notify()), Some(FieldKind::Checkbox));
    assert_eq!(fields.r#type().as_str(), "type");
}
