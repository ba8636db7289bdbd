// Lets `#[derive(FormModel)]` expand to `::calmform` paths inside this crate.
extern crate self as calmform;

pub mod form;
pub mod prelude;
pub mod reactive;
