//! In-memory EGL implementation driving the context logic in tests.

use super::ffi::{
    egl::{
        self,
        types::{EGLBoolean, EGLConfig, EGLContext, EGLDisplay, EGLSurface, EGLenum},
    },
    EGLEntryPoints, EGLNativeDisplayType, EGLint,
};
use libc::{c_char, c_void};
use std::{
    cell::{Cell, RefCell},
    ffi::CStr,
    ptr,
};

/// Entry points invoked on a [`FakeEGL`], in order.
///
/// `MakeCurrent` carries the id of the bound context, `0` for none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    GetDisplay,
    Initialize,
    ChooseConfig,
    BindApi,
    CreateContext,
    MakeCurrent(usize),
    Terminate,
    QueryString,
}

#[derive(Debug)]
pub(crate) struct FakeEGL {
    pub no_display: bool,
    pub fail_initialize: Option<u32>,
    pub no_configs: bool,
    pub fail_bind_api: Option<u32>,
    pub fail_make_current: Option<u32>,
    pub max_version: (i32, i32),
    pub egl_version: (i32, i32),
    /// nul terminated, space separated
    pub extensions: &'static str,

    pub(crate) calls: RefCell<Vec<Call>>,
    pub(crate) error: Cell<EGLint>,
    pub(crate) initialized: Cell<bool>,
    pub(crate) current: Cell<usize>,
    pub(crate) contexts: RefCell<Vec<usize>>,
    pub(crate) next_context: Cell<usize>,
    pub(crate) context_attributes: RefCell<Vec<EGLint>>,
    pub(crate) fail_next_make_current: Cell<Option<u32>>,
}

impl Default for FakeEGL {
    fn default() -> Self {
        FakeEGL {
            no_display: false,
            fail_initialize: None,
            no_configs: false,
            fail_bind_api: None,
            fail_make_current: None,
            max_version: (4, 6),
            egl_version: (1, 5),
            extensions: "EGL_KHR_create_context EGL_KHR_surfaceless_context\0",
            calls: RefCell::new(Vec::new()),
            error: Cell::new(egl::SUCCESS as EGLint),
            initialized: Cell::new(false),
            current: Cell::new(0),
            contexts: RefCell::new(Vec::new()),
            next_context: Cell::new(1),
            context_attributes: RefCell::new(Vec::new()),
            fail_next_make_current: Cell::new(None),
        }
    }
}

impl FakeEGL {
    /// Contexts keep a `'static` reference to their entry points.
    pub fn leak(self) -> &'static FakeEGL {
        Box::leak(Box::new(self))
    }

    pub fn set_error(&self, code: u32) {
        self.error.set(code as EGLint);
    }

    pub fn fail_next_make_current(&self, code: u32) {
        self.fail_next_make_current.set(Some(code));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Id of the current context, `0` for none
    pub fn current(&self) -> usize {
        self.current.get()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn last_context_attributes(&self) -> Vec<EGLint> {
        self.context_attributes.borrow().clone()
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn fail(&self, code: u32) -> EGLBoolean {
        self.set_error(code);
        egl::FALSE
    }

    fn display(&self) -> EGLDisplay {
        self as *const FakeEGL as EGLDisplay
    }

    fn attribute(attributes: &[EGLint], name: u32) -> Option<EGLint> {
        attributes
            .chunks(2)
            .take_while(|pair| pair[0] != egl::NONE as EGLint)
            .find(|pair| pair[0] == name as EGLint)
            .map(|pair| pair[1])
    }
}

impl EGLEntryPoints for FakeEGL {
    unsafe fn get_display(&self, _native: EGLNativeDisplayType) -> EGLDisplay {
        self.record(Call::GetDisplay);
        if self.no_display {
            egl::NO_DISPLAY
        } else {
            self.display()
        }
    }

    unsafe fn initialize(&self, display: EGLDisplay, major: &mut EGLint, minor: &mut EGLint) -> EGLBoolean {
        self.record(Call::Initialize);
        if display != self.display() {
            return self.fail(egl::BAD_DISPLAY);
        }
        if let Some(code) = self.fail_initialize {
            return self.fail(code);
        }
        self.initialized.set(true);
        *major = self.egl_version.0;
        *minor = self.egl_version.1;
        egl::TRUE
    }

    unsafe fn choose_config(
        &self,
        _display: EGLDisplay,
        attributes: &[EGLint],
        configs: &mut [EGLConfig],
        num_configs: &mut EGLint,
    ) -> EGLBoolean {
        self.record(Call::ChooseConfig);
        if !self.initialized.get() {
            return self.fail(egl::NOT_INITIALIZED);
        }
        let offscreen = FakeEGL::attribute(attributes, egl::SURFACE_TYPE)
            .map_or(false, |v| v & egl::PBUFFER_BIT as EGLint != 0);
        if self.no_configs || !offscreen || configs.is_empty() {
            *num_configs = 0;
        } else {
            configs[0] = 0x1 as EGLConfig;
            *num_configs = 1;
        }
        egl::TRUE
    }

    unsafe fn bind_api(&self, api: EGLenum) -> EGLBoolean {
        self.record(Call::BindApi);
        if let Some(code) = self.fail_bind_api {
            return self.fail(code);
        }
        if api != egl::OPENGL_API {
            return self.fail(egl::BAD_PARAMETER);
        }
        egl::TRUE
    }

    unsafe fn create_context(&self, _display: EGLDisplay, config: EGLConfig, attributes: &[EGLint]) -> EGLContext {
        self.record(Call::CreateContext);
        *self.context_attributes.borrow_mut() = attributes.to_vec();
        if !self.initialized.get() {
            self.set_error(egl::NOT_INITIALIZED);
            return egl::NO_CONTEXT;
        }
        if config.is_null() {
            self.set_error(egl::BAD_CONFIG);
            return egl::NO_CONTEXT;
        }
        let major = FakeEGL::attribute(attributes, egl::CONTEXT_MAJOR_VERSION).unwrap_or(1);
        let minor = FakeEGL::attribute(attributes, egl::CONTEXT_MINOR_VERSION).unwrap_or(0);
        if (major, minor) > self.max_version {
            self.set_error(egl::BAD_MATCH);
            return egl::NO_CONTEXT;
        }
        let id = self.next_context.get();
        self.next_context.set(id + 1);
        self.contexts.borrow_mut().push(id);
        id as EGLContext
    }

    unsafe fn make_current(
        &self,
        _display: EGLDisplay,
        _draw: EGLSurface,
        _read: EGLSurface,
        context: EGLContext,
    ) -> EGLBoolean {
        let id = context as usize;
        self.record(Call::MakeCurrent(id));
        if let Some(code) = self.fail_next_make_current.take().or(self.fail_make_current) {
            return self.fail(code);
        }
        if !self.initialized.get() {
            return self.fail(egl::NOT_INITIALIZED);
        }
        if id != 0 && !self.contexts.borrow().contains(&id) {
            return self.fail(egl::BAD_CONTEXT);
        }
        self.current.set(id);
        egl::TRUE
    }

    unsafe fn get_current_context(&self) -> EGLContext {
        self.current.get() as EGLContext
    }

    unsafe fn terminate(&self, _display: EGLDisplay) -> EGLBoolean {
        self.record(Call::Terminate);
        self.initialized.set(false);
        self.contexts.borrow_mut().clear();
        egl::TRUE
    }

    unsafe fn query_string(&self, _display: EGLDisplay, name: EGLint) -> *const c_char {
        self.record(Call::QueryString);
        let value: &'static [u8] = match name as u32 {
            egl::VENDOR => b"Fake\0",
            egl::VERSION => b"1.5 Fake\0",
            egl::CLIENT_APIS => b"OpenGL OpenGL_ES\0",
            egl::EXTENSIONS => self.extensions.as_bytes(),
            _ => {
                self.set_error(egl::BAD_PARAMETER);
                return ptr::null();
            }
        };
        value.as_ptr() as *const c_char
    }

    unsafe fn get_proc_address(&self, _symbol: &CStr) -> *const c_void {
        ptr::null()
    }

    fn get_error(&self) -> EGLint {
        self.error.replace(egl::SUCCESS as EGLint)
    }
}
