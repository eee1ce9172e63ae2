//! Windowless OpenGL contexts on top of EGL
//!
//! An [`OffscreenContext`] acquires the default EGL display, selects the first configuration
//! able to render into pixel buffers with desktop OpenGL, creates a core profile context of the
//! requested version and makes it current on the calling thread. No window system surface is
//! ever bound, so the context can only render into framebuffer objects.
//!
//! `libEGL.so.1` is loaded at runtime on first use.
//!
//! EGL reports errors through a per-thread slot instead of return values. Every fallible call
//! is followed by a read of that slot, and a recorded code becomes a [`DriverError`] naming the
//! call, wrapped into the [`Error`] variant of the step that failed.

pub mod context;
pub use self::context::{GlAttributes, OffscreenContext};
mod error;
pub use self::error::*;

#[allow(non_camel_case_types, dead_code, unused_mut, non_upper_case_globals)]
pub mod ffi;

mod display;

#[cfg(test)]
pub(crate) mod test;
