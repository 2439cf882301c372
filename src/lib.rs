//! MaskView: interactive mask editing over an image, mirrored live into
//! secondary windows.

#[macro_use]
pub mod logger;
pub mod app;
pub mod canvas;
pub mod components;
pub mod interaction;
pub mod io;
pub mod ops;
pub mod settings;
