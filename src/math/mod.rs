pub mod matrix;

pub use matrix::{Matrix3, Vec3};
