#![allow(dead_code)]

#[derive(calmform::form::FormModel)]
struct Draft<T> {
    value: T,
}

fn main() {}
