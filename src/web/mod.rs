//! HTTP front door: form pages and the chart image endpoint.

pub mod handlers;
pub mod pages;
