#![allow(dead_code)]

use serde::Serialize;

#[derive(Serialize, calmform::form::FormModel)]
#[serde(rename_all = "camelCase")]
struct Profile {
    display_name: String,
}

fn main() {}
