#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]
// Allow acronyms like EGL
#![allow(clippy::upper_case_acronyms)]

//! # offscreen-egl: windowless OpenGL through EGL
//!
//! This crate creates OpenGL core profile contexts that are not attached to any window,
//! for rendering into framebuffer objects and reading the result back.
//!
//! ```no_run
//! use offscreen_egl::egl::OffscreenContext;
//!
//! let context = OffscreenContext::new(4, 6)?;
//! assert!(context.is_current());
//! # Ok::<(), offscreen_egl::egl::Error>(())
//! ```
//!
//! ## Structure of the crate
//!
//! - [`egl`] owns the display connection and rendering context and translates EGL error codes.
//! - [`gl`] (feature `renderer_gl`) loads the OpenGL entry points of a context and provides the
//!   raw shader compile and link primitives.
//!
//! ### Threads
//!
//! A context is current on exactly one thread. [`OffscreenContext`](egl::OffscreenContext) is
//! therefore neither `Send` nor `Sync`, and making another context current on the same thread
//! replaces the previous binding.
//!
//! ### Logging
//!
//! This crate makes extensive use of [`tracing`] for its internal logging.
//! Messages reported by the EGL implementation through `EGL_KHR_debug` are forwarded as well.

pub mod egl;
#[cfg(feature = "renderer_gl")]
pub mod gl;
