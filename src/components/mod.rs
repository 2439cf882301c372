pub mod mirror;
pub mod preview;
pub mod static_view;
pub mod tools;
