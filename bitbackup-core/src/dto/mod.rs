//! Data Transfer Objects
//!
//! Wire shapes of provider API responses that are not domain entities in
//! their own right.

pub mod page;
