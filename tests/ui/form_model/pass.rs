use calmform::form::FormModel;

#[derive(Clone, calmform::form::FormModel)]
struct DemoForm {
    email: String,
}

fn main() {
    let fields = DemoForm::fields();
    assert_eq!(fields.email().as_str(), "email");
    assert_eq!(DemoForm::field_kinds().len(), 1);
}
