#![allow(dead_code)]

#[derive(calmform::form::FormModel)]
enum Plan {
    Free,
    Team,
}

fn main() {}
