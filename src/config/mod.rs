// Configuration surface
#![allow(dead_code)]

mod loader;

pub use loader::ReducerConfig;
