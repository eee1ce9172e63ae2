use super::ffi::{self, EGLEntryPoints, EGLint};
use std::fmt;

/// Errors that can occur while creating or driving an [`OffscreenContext`](super::OffscreenContext)
///
/// Every variant that wraps an `Option<DriverError>` carries `None` when the driver
/// signalled failure through its return value without recording an error code.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// `libEGL.so.1` could not be loaded
    #[error("Failed to load libEGL: {0}")]
    EglNotAvailable(#[source] libloading::Error),
    /// Unable to obtain the default EGL display
    #[error("Unable to obtain the default EGL display. Err: {}", Reported(.0))]
    DisplayUnavailable(#[source] Option<DriverError>),
    /// `eglInitialize` rejected the display connection
    #[error("Failed to initialize EGL. Err: {}", Reported(.0))]
    InitializationFailed(#[source] Option<DriverError>),
    /// No configuration supports pixel buffer surfaces and the OpenGL API
    #[error("No EGL configuration supports offscreen OpenGL rendering. Err: {}", Reported(.0))]
    ConfigurationUnavailable(#[source] Option<DriverError>),
    /// The OpenGL API could not be bound
    #[error("The EGL implementation does not support the OpenGL API. Err: {}", Reported(.0))]
    ApiBindingFailed(#[source] Option<DriverError>),
    /// The requested version/profile combination was rejected
    #[error("Failed to create an OpenGL core profile context. Err: {}", Reported(.0))]
    ContextCreationFailed(#[source] Option<DriverError>),
    /// The context could not be bound to (or released from) the calling thread
    #[error("`eglMakeCurrent` failed: {}", Reported(.0))]
    MakeCurrentFailed(#[source] Option<DriverError>),
    /// Any other failing driver call
    #[error(transparent)]
    Driver(#[from] DriverError),
}

struct Reported<'a>(&'a Option<DriverError>);

impl fmt::Display for Reported<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(err) => err.fmt(f),
            None => f.write_str("no error code reported"),
        }
    }
}

/// Raw EGL error
///
/// Displays as the symbolic name of the code, e.g. `EGL_BAD_MATCH`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EGLError {
    /// EGL is not initialized, or could not be initialized, for the specified EGL display connection.
    #[error("EGL_NOT_INITIALIZED")]
    NotInitialized,
    /// EGL cannot access a requested resource (for example a context is bound in another thread).
    #[error("EGL_BAD_ACCESS")]
    BadAccess,
    /// EGL failed to allocate resources for the requested operation.
    #[error("EGL_BAD_ALLOC")]
    BadAlloc,
    /// An unrecognized attribute or attribute value was passed in the attribute list.
    #[error("EGL_BAD_ATTRIBUTE")]
    BadAttribute,
    /// An EGLContext argument does not name a valid EGL rendering context.
    #[error("EGL_BAD_CONTEXT")]
    BadContext,
    /// An EGLConfig argument does not name a valid EGL frame buffer configuration.
    #[error("EGL_BAD_CONFIG")]
    BadConfig,
    /// The current surface of the calling thread is no longer valid.
    #[error("EGL_BAD_CURRENT_SURFACE")]
    BadCurrentSurface,
    /// An EGLDisplay argument does not name a valid EGL display connection.
    #[error("EGL_BAD_DISPLAY")]
    BadDisplay,
    /// An EGLSurface argument does not name a valid surface configured for GL rendering.
    #[error("EGL_BAD_SURFACE")]
    BadSurface,
    /// Arguments are inconsistent (for example an unsupported context version was requested).
    #[error("EGL_BAD_MATCH")]
    BadMatch,
    /// One or more argument values are invalid.
    #[error("EGL_BAD_PARAMETER")]
    BadParameter,
    /// A NativePixmapType argument does not refer to a valid native pixmap.
    #[error("EGL_BAD_NATIVE_PIXMAP")]
    BadNativePixmap,
    /// A NativeWindowType argument does not refer to a valid native window.
    #[error("EGL_BAD_NATIVE_WINDOW")]
    BadNativeWindow,
    /// A power management event has occurred. All contexts must be recreated.
    #[error("EGL_CONTEXT_LOST")]
    ContextLost,
    /// An unknown error
    #[error("unknown error: {0}")]
    Unknown(EGLint),
}

impl From<EGLint> for EGLError {
    fn from(value: EGLint) -> Self {
        match value as u32 {
            ffi::egl::NOT_INITIALIZED => EGLError::NotInitialized,
            ffi::egl::BAD_ACCESS => EGLError::BadAccess,
            ffi::egl::BAD_ALLOC => EGLError::BadAlloc,
            ffi::egl::BAD_ATTRIBUTE => EGLError::BadAttribute,
            ffi::egl::BAD_CONTEXT => EGLError::BadContext,
            ffi::egl::BAD_CONFIG => EGLError::BadConfig,
            ffi::egl::BAD_CURRENT_SURFACE => EGLError::BadCurrentSurface,
            ffi::egl::BAD_DISPLAY => EGLError::BadDisplay,
            ffi::egl::BAD_SURFACE => EGLError::BadSurface,
            ffi::egl::BAD_MATCH => EGLError::BadMatch,
            ffi::egl::BAD_PARAMETER => EGLError::BadParameter,
            ffi::egl::BAD_NATIVE_PIXMAP => EGLError::BadNativePixmap,
            ffi::egl::BAD_NATIVE_WINDOW => EGLError::BadNativeWindow,
            ffi::egl::CONTEXT_LOST => EGLError::ContextLost,
            _ => EGLError::Unknown(value),
        }
    }
}

impl EGLError {
    /// The numeric code reported by the driver
    pub fn code(&self) -> EGLint {
        (match *self {
            EGLError::NotInitialized => ffi::egl::NOT_INITIALIZED,
            EGLError::BadAccess => ffi::egl::BAD_ACCESS,
            EGLError::BadAlloc => ffi::egl::BAD_ALLOC,
            EGLError::BadAttribute => ffi::egl::BAD_ATTRIBUTE,
            EGLError::BadContext => ffi::egl::BAD_CONTEXT,
            EGLError::BadConfig => ffi::egl::BAD_CONFIG,
            EGLError::BadCurrentSurface => ffi::egl::BAD_CURRENT_SURFACE,
            EGLError::BadDisplay => ffi::egl::BAD_DISPLAY,
            EGLError::BadSurface => ffi::egl::BAD_SURFACE,
            EGLError::BadMatch => ffi::egl::BAD_MATCH,
            EGLError::BadParameter => ffi::egl::BAD_PARAMETER,
            EGLError::BadNativePixmap => ffi::egl::BAD_NATIVE_PIXMAP,
            EGLError::BadNativeWindow => ffi::egl::BAD_NATIVE_WINDOW,
            EGLError::ContextLost => ffi::egl::CONTEXT_LOST,
            EGLError::Unknown(code) => return code,
        }) as EGLint
    }
}

/// A failed driver call: the name of the call and the error it left behind.
///
/// The label is diagnostic only.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{label}: {error}")]
pub struct DriverError {
    label: &'static str,
    error: EGLError,
}

impl DriverError {
    /// The driver call that failed
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// The translated error code
    pub fn error(&self) -> EGLError {
        self.error
    }
}

/// Reads and clears the last EGL error, failing unless it is `EGL_SUCCESS`.
pub(crate) fn check_error(egl: &dyn EGLEntryPoints, label: &'static str) -> Result<(), DriverError> {
    match egl.get_error() {
        code if code as u32 == ffi::egl::SUCCESS => Ok(()),
        code => Err(DriverError {
            label,
            error: EGLError::from(code),
        }),
    }
}

pub(crate) fn wrap_egl_call<R, F: FnOnce() -> R>(
    egl: &dyn EGLEntryPoints,
    label: &'static str,
    call: F,
) -> Result<R, DriverError> {
    let res = call();
    check_error(egl, label).map(|()| res)
}
