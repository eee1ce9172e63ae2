//! EGL context related structs

use super::{
    display::EGLDisplayHandle,
    ffi::{self, EGLEntryPoints, LibEGL},
    wrap_egl_call, Error,
};
use libc::c_void;
use std::{ffi::CString, fmt, ptr};
use tracing::{debug, error, info, info_span, instrument, trace, warn};

/// Attributes to use when creating an OpenGL context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlAttributes {
    /// The OpenGL version being requested, `(4, 6)` requests an OpenGL 4.6 core profile context.
    pub version: (u8, u8),
    /// Whether to enable the debug flag of the context.
    ///
    /// Debug contexts are usually slower but give better error reporting.
    /// Only honoured on EGL 1.5 and newer.
    pub debug: bool,
}

impl GlAttributes {
    /// Attributes for a non-debug context of the given version
    pub fn new(major: u8, minor: u8) -> GlAttributes {
        GlAttributes {
            version: (major, minor),
            debug: false,
        }
    }
}

/// A windowless OpenGL core profile context.
///
/// The context owns its display connection and is created current on the calling thread.
/// Dropping it unbinds it (if it is still current) and then releases the display.
///
/// There is exactly one owner per context: the type is neither `Clone` nor `Copy`,
/// and it is neither `Send` nor `Sync`, as the current binding belongs to one thread.
pub struct OffscreenContext {
    context: ffi::egl::types::EGLContext,
    display: EGLDisplayHandle,
    attributes: GlAttributes,
    pub(crate) span: tracing::Span,
}

impl OffscreenContext {
    /// Creates a new OpenGL `major.minor` core profile context on the default display
    /// and makes it current on the calling thread.
    pub fn new(major: u8, minor: u8) -> Result<OffscreenContext, Error> {
        OffscreenContext::with_attributes(GlAttributes::new(major, minor))
    }

    /// Creates a new context from the given [`GlAttributes`] and makes it current on the calling thread.
    pub fn with_attributes(attributes: GlAttributes) -> Result<OffscreenContext, Error> {
        let egl = LibEGL::get()?;
        OffscreenContext::create(egl, attributes)
    }

    pub(crate) fn create(
        egl: &'static dyn EGLEntryPoints,
        attributes: GlAttributes,
    ) -> Result<OffscreenContext, Error> {
        let span = info_span!("backend_egl", version = ?attributes.version);
        let _guard = span.enter();

        let display = EGLDisplayHandle::open_default(egl)?;
        let config = display.choose_config()?;
        display.bind_opengl_api()?;

        let egl_version = display.egl_version;
        let (major, minor) = attributes.version;
        let mut context_attributes = Vec::with_capacity(9);

        if egl_version >= (1, 5) || display.has_extension("EGL_KHR_create_context") {
            trace!("Setting CONTEXT_MAJOR_VERSION to {}", major);
            context_attributes.push(ffi::egl::CONTEXT_MAJOR_VERSION as i32);
            context_attributes.push(major as i32);
            trace!("Setting CONTEXT_MINOR_VERSION to {}", minor);
            context_attributes.push(ffi::egl::CONTEXT_MINOR_VERSION as i32);
            context_attributes.push(minor as i32);
            trace!("Setting CONTEXT_OPENGL_PROFILE_MASK to CORE");
            context_attributes.push(ffi::egl::CONTEXT_OPENGL_PROFILE_MASK as i32);
            context_attributes.push(ffi::egl::CONTEXT_OPENGL_CORE_PROFILE_BIT as i32);

            if attributes.debug {
                if egl_version >= (1, 5) {
                    trace!("Setting CONTEXT_OPENGL_DEBUG to TRUE");
                    context_attributes.push(ffi::egl::CONTEXT_OPENGL_DEBUG as i32);
                    context_attributes.push(ffi::egl::TRUE as i32);
                } else {
                    trace!("Debug contexts require EGL 1.5, ignoring debug flag");
                }
            }
        } else {
            error!(
                "EGL {:?} without EGL_KHR_create_context cannot request an OpenGL version",
                egl_version
            );
            return Err(Error::ContextCreationFailed(None));
        }

        context_attributes.push(ffi::egl::NONE as i32);

        trace!("Creating EGL context...");
        let context = wrap_egl_call(egl, "eglCreateContext", || unsafe {
            egl.create_context(*display, config, &context_attributes)
        })
        .map_err(|err| Error::ContextCreationFailed(Some(err)))?;
        if context == ffi::egl::NO_CONTEXT {
            return Err(Error::ContextCreationFailed(None));
        }
        info!("EGL context created");

        if egl_version < (1, 5) && !display.has_extension("EGL_KHR_surfaceless_context") {
            warn!("EGL_KHR_surfaceless_context is not supported, binding without a surface may fail");
        }

        drop(_guard);
        let context = OffscreenContext {
            context,
            display,
            attributes,
            span,
        };
        context.make_current()?;

        Ok(context)
    }

    /// Makes this context the current context of the calling thread, with no surface bound.
    ///
    /// Replaces whatever context was current before.
    #[instrument(level = "trace", parent = &self.span, skip(self))]
    pub fn make_current(&self) -> Result<(), Error> {
        self.bind(self.context)
    }

    /// Returns true if this context is the current one in the calling thread.
    pub fn is_current(&self) -> bool {
        unsafe { self.display.egl().get_current_context() == self.context }
    }

    /// Unbinds this context from the calling thread, if set.
    ///
    /// This does nothing if this context is not the current context
    #[instrument(level = "trace", parent = &self.span, skip(self))]
    pub fn unbind(&self) -> Result<(), Error> {
        if self.is_current() {
            self.bind(ffi::egl::NO_CONTEXT)?;
        }
        Ok(())
    }

    fn bind(&self, context: ffi::egl::types::EGLContext) -> Result<(), Error> {
        let egl = self.display.egl();
        let ret = wrap_egl_call(egl, "eglMakeCurrent", || unsafe {
            egl.make_current(*self.display, ffi::egl::NO_SURFACE, ffi::egl::NO_SURFACE, context)
        })
        .map_err(|err| Error::MakeCurrentFailed(Some(err)))?;
        if ret != ffi::egl::TRUE {
            return Err(Error::MakeCurrentFailed(None));
        }
        Ok(())
    }

    /// The attributes this context was created with
    pub fn attributes(&self) -> GlAttributes {
        self.attributes
    }

    /// The EGL version reported by the display, which may differ from the loaded library's.
    pub fn egl_version(&self) -> (i32, i32) {
        self.display.egl_version
    }

    /// Extensions supported by the display
    pub fn extensions(&self) -> &[String] {
        &self.display.extensions
    }

    /// Returns the address of an OpenGL function.
    ///
    /// Null if the symbol is unknown. The result does not guarantee an extension is actually
    /// supported by this context.
    pub fn get_proc_address(&self, symbol: &str) -> *const c_void {
        match CString::new(symbol) {
            Ok(symbol) => unsafe { self.display.egl().get_proc_address(&symbol) },
            Err(_) => ptr::null(),
        }
    }
}

impl fmt::Debug for OffscreenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffscreenContext")
            .field("context", &self.context)
            .field("display", &self.display)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl Drop for OffscreenContext {
    fn drop(&mut self) {
        let _guard = self.span.enter();
        // The context has to be released before the display is terminated.
        if let Err(err) = self.unbind() {
            warn!("Failed to unbind EGL context on drop: {}", err);
        }
        debug!("Dropping EGL context");
        // `display` is dropped after this, terminating it if this was its last user
    }
}
