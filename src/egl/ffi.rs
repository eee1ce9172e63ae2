#![allow(missing_docs)]

use super::Error;
use libc::{c_char, c_long, c_void};
use libloading::Library;
use once_cell::sync::OnceCell;
use std::{borrow::Cow, ffi::CStr, ptr};
use tracing::{debug, error, info, warn};

pub type khronos_utime_nanoseconds_t = khronos_uint64_t;
pub type khronos_uint64_t = u64;
pub type khronos_ssize_t = c_long;
pub type EGLint = i32;
pub type EGLchar = c_char;
pub type EGLLabelKHR = *const c_void;
pub type EGLNativeDisplayType = NativeDisplayType;
pub type EGLNativePixmapType = NativePixmapType;
pub type EGLNativeWindowType = NativeWindowType;
pub type NativeDisplayType = *const c_void;
pub type NativePixmapType = *const c_void;
pub type NativeWindowType = *const c_void;

/// `EGL_DEFAULT_DISPLAY`
pub const DEFAULT_DISPLAY: NativeDisplayType = ptr::null();

const LIBEGL_NAME: &str = "libEGL.so.1";

/// Module containing raw egl function bindings
#[allow(clippy::all, missing_debug_implementations)]
pub mod egl {
    use super::*;

    include!(concat!(env!("OUT_DIR"), "/egl_bindings.rs"));

    // EGL_KHR_debug, not covered by the generated bindings
    pub const DEBUG_MSG_CRITICAL_KHR: types::EGLenum = 0x33B9;
    pub const DEBUG_MSG_ERROR_KHR: types::EGLenum = 0x33BA;
    pub const DEBUG_MSG_WARN_KHR: types::EGLenum = 0x33BB;
    pub const DEBUG_MSG_INFO_KHR: types::EGLenum = 0x33BC;

    pub type EGLDEBUGPROCKHR = Option<
        extern "system" fn(
            error: types::EGLenum,
            command: *const EGLchar,
            id: EGLint,
            thread: EGLLabelKHR,
            obj: EGLLabelKHR,
            message: *const EGLchar,
        ),
    >;

    pub type DebugMessageControlKHR =
        unsafe extern "system" fn(EGLDEBUGPROCKHR, *const types::EGLAttrib) -> types::EGLint;
}

use self::egl::types::{EGLBoolean, EGLConfig, EGLContext, EGLDisplay, EGLSurface, EGLenum};

extern "system" fn egl_debug_log(
    severity: EGLenum,
    command: *const EGLchar,
    _id: EGLint,
    _thread: EGLLabelKHR,
    _obj: EGLLabelKHR,
    message: *const EGLchar,
) {
    let _ = std::panic::catch_unwind(move || unsafe {
        let message_utf8 = if !message.is_null() {
            CStr::from_ptr(message).to_string_lossy()
        } else {
            Cow::Borrowed("")
        };
        let command_utf8 = if !command.is_null() {
            CStr::from_ptr(command).to_string_lossy()
        } else {
            Cow::Borrowed("")
        };
        match severity {
            egl::DEBUG_MSG_CRITICAL_KHR | egl::DEBUG_MSG_ERROR_KHR => {
                error!("[EGL] {}: {}", command_utf8, message_utf8)
            }
            egl::DEBUG_MSG_WARN_KHR => warn!("[EGL] {}: {}", command_utf8, message_utf8),
            egl::DEBUG_MSG_INFO_KHR => info!("[EGL] {}: {}", command_utf8, message_utf8),
            _ => debug!("[EGL] {}: {}", command_utf8, message_utf8),
        };
    });
}

/// The subset of EGL entry points the offscreen context is built on.
///
/// All calls report failures through the per-thread error slot read by
/// [`get_error`](EGLEntryPoints::get_error), exactly like the C API.
pub(crate) trait EGLEntryPoints {
    unsafe fn get_display(&self, native: EGLNativeDisplayType) -> EGLDisplay;
    unsafe fn initialize(&self, display: EGLDisplay, major: &mut EGLint, minor: &mut EGLint) -> EGLBoolean;
    unsafe fn choose_config(
        &self,
        display: EGLDisplay,
        attributes: &[EGLint],
        configs: &mut [EGLConfig],
        num_configs: &mut EGLint,
    ) -> EGLBoolean;
    unsafe fn bind_api(&self, api: EGLenum) -> EGLBoolean;
    unsafe fn create_context(&self, display: EGLDisplay, config: EGLConfig, attributes: &[EGLint]) -> EGLContext;
    unsafe fn make_current(
        &self,
        display: EGLDisplay,
        draw: EGLSurface,
        read: EGLSurface,
        context: EGLContext,
    ) -> EGLBoolean;
    unsafe fn get_current_context(&self) -> EGLContext;
    unsafe fn terminate(&self, display: EGLDisplay) -> EGLBoolean;
    unsafe fn query_string(&self, display: EGLDisplay, name: EGLint) -> *const c_char;
    unsafe fn get_proc_address(&self, symbol: &CStr) -> *const c_void;
    /// Reads and clears the last error of the calling thread.
    fn get_error(&self) -> EGLint;
}

/// `libEGL.so.1`, loaded once per process.
pub(crate) struct LibEGL {
    egl: egl::Egl,
    _lib: Library,
}

// The loaded entry points are plain function pointers into a library that is never unloaded.
unsafe impl Send for LibEGL {}
unsafe impl Sync for LibEGL {}

static LIBEGL: OnceCell<LibEGL> = OnceCell::new();

impl LibEGL {
    /// Loads libEGL symbols, if not loaded already.
    pub(crate) fn get() -> Result<&'static LibEGL, Error> {
        LIBEGL.get_or_try_init(|| unsafe { LibEGL::load() })
    }

    unsafe fn load() -> Result<LibEGL, Error> {
        let lib = Library::new(LIBEGL_NAME).map_err(Error::EglNotAvailable)?;
        let egl = egl::Egl::load_with(|sym| match lib.get::<*mut c_void>(sym.as_bytes()) {
            Ok(x) => *x as *const _,
            Err(_) => ptr::null(),
        });

        // Without EGL 1.5 or EGL_EXT_client_extensions this reports EGL_BAD_DISPLAY,
        // which is cleared here so it does not leak into the next checked call.
        let p = egl.QueryString(egl::NO_DISPLAY, egl::EXTENSIONS as i32);
        let _ = egl.GetError();
        let client_extensions = if p.is_null() {
            Vec::new()
        } else {
            split_extensions(CStr::from_ptr(p))
        };
        debug!("EGL No-Display Extensions: {:?}", client_extensions);

        if client_extensions.iter().any(|ext| ext == "EGL_KHR_debug") {
            let control = egl.GetProcAddress(b"eglDebugMessageControlKHR\0".as_ptr() as *const c_char);
            if !control.is_null() {
                let control = std::mem::transmute::<_, egl::DebugMessageControlKHR>(control);
                let debug_attribs = [
                    egl::DEBUG_MSG_CRITICAL_KHR as isize,
                    egl::TRUE as isize,
                    egl::DEBUG_MSG_ERROR_KHR as isize,
                    egl::TRUE as isize,
                    egl::DEBUG_MSG_WARN_KHR as isize,
                    egl::TRUE as isize,
                    egl::DEBUG_MSG_INFO_KHR as isize,
                    egl::TRUE as isize,
                    egl::NONE as isize,
                ];
                // we do not check for success, because there is not much we can do otherwise.
                control(Some(egl_debug_log), debug_attribs.as_ptr());
                let _ = egl.GetError();
            }
        }

        Ok(LibEGL { egl, _lib: lib })
    }
}

impl EGLEntryPoints for LibEGL {
    unsafe fn get_display(&self, native: EGLNativeDisplayType) -> EGLDisplay {
        self.egl.GetDisplay(native)
    }

    unsafe fn initialize(&self, display: EGLDisplay, major: &mut EGLint, minor: &mut EGLint) -> EGLBoolean {
        self.egl.Initialize(display, major, minor)
    }

    unsafe fn choose_config(
        &self,
        display: EGLDisplay,
        attributes: &[EGLint],
        configs: &mut [EGLConfig],
        num_configs: &mut EGLint,
    ) -> EGLBoolean {
        self.egl.ChooseConfig(
            display,
            attributes.as_ptr(),
            configs.as_mut_ptr(),
            configs.len() as EGLint,
            num_configs,
        )
    }

    unsafe fn bind_api(&self, api: EGLenum) -> EGLBoolean {
        self.egl.BindAPI(api)
    }

    unsafe fn create_context(&self, display: EGLDisplay, config: EGLConfig, attributes: &[EGLint]) -> EGLContext {
        self.egl
            .CreateContext(display, config, egl::NO_CONTEXT, attributes.as_ptr())
    }

    unsafe fn make_current(
        &self,
        display: EGLDisplay,
        draw: EGLSurface,
        read: EGLSurface,
        context: EGLContext,
    ) -> EGLBoolean {
        self.egl.MakeCurrent(display, draw, read, context)
    }

    unsafe fn get_current_context(&self) -> EGLContext {
        self.egl.GetCurrentContext()
    }

    unsafe fn terminate(&self, display: EGLDisplay) -> EGLBoolean {
        self.egl.Terminate(display)
    }

    unsafe fn query_string(&self, display: EGLDisplay, name: EGLint) -> *const c_char {
        self.egl.QueryString(display, name)
    }

    unsafe fn get_proc_address(&self, symbol: &CStr) -> *const c_void {
        self.egl.GetProcAddress(symbol.as_ptr()) as *const c_void
    }

    fn get_error(&self) -> EGLint {
        unsafe { self.egl.GetError() }
    }
}

pub(crate) fn split_extensions(list: &CStr) -> Vec<String> {
    list.to_string_lossy()
        .split(' ')
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_string())
        .collect()
}
