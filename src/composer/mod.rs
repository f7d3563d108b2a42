//! HTTP surface of the fixed-layout PDF composer.

pub mod routes;
