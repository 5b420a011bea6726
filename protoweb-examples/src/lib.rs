//! Example service for `protoweb`.

pub mod hello;
