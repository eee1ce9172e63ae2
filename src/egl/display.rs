//! Ownership of an initialized EGL display connection

use super::{
    ffi::{self, egl::types::EGLConfig, EGLEntryPoints, EGLint},
    wrap_egl_call, Error,
};
use libc::c_int;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    ffi::CStr,
    fmt,
    ops::Deref,
    ptr,
    sync::{Mutex, PoisonError},
};
use tracing::{debug, info, trace, warn};

/// Number of live [`EGLDisplayHandle`]s per initialized display.
///
/// `eglGetDisplay` hands out the same display for every request of the default display,
/// and `eglTerminate` invalidates every context created on it. The lock is held across
/// initialize/count and count/terminate so both sequences are atomic.
static INITIALIZED: Lazy<Mutex<HashMap<usize, usize>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Wrapper around [`ffi::EGLDisplay`](ffi::egl::types::EGLDisplay) that terminates the display
/// connection once the last handle to it is dropped.
pub(crate) struct EGLDisplayHandle {
    handle: ffi::egl::types::EGLDisplay,
    egl: &'static dyn EGLEntryPoints,
    pub(crate) egl_version: (i32, i32),
    pub(crate) extensions: Vec<String>,
}

impl EGLDisplayHandle {
    /// Acquires and initializes the default display of the process.
    pub(crate) fn open_default(egl: &'static dyn EGLEntryPoints) -> Result<EGLDisplayHandle, Error> {
        let display = wrap_egl_call(egl, "eglGetDisplay", || unsafe { egl.get_display(ffi::DEFAULT_DISPLAY) })
            .map_err(|err| Error::DisplayUnavailable(Some(err)))?;
        if display == ffi::egl::NO_DISPLAY {
            return Err(Error::DisplayUnavailable(None));
        }

        let egl_version = {
            let mut registry = INITIALIZED.lock().unwrap_or_else(PoisonError::into_inner);

            let mut major: EGLint = 0;
            let mut minor: EGLint = 0;
            let ret = wrap_egl_call(egl, "eglInitialize", || unsafe {
                egl.initialize(display, &mut major, &mut minor)
            })
            .map_err(|err| Error::InitializationFailed(Some(err)))?;
            if ret != ffi::egl::TRUE {
                return Err(Error::InitializationFailed(None));
            }

            *registry.entry(display as usize).or_insert(0) += 1;
            (major, minor)
        };
        // From here on dropping the handle releases the display again.
        let mut handle = EGLDisplayHandle {
            handle: display,
            egl,
            egl_version,
            extensions: Vec::new(),
        };

        info!("EGL Initialized");
        info!("EGL Version: {:?}", egl_version);
        if let Some(vendor) = handle.query_string(ffi::egl::VENDOR)? {
            info!("EGL Vendor: {:?}", vendor);
        }
        if let Some(apis) = handle.query_string(ffi::egl::CLIENT_APIS)? {
            info!("EGL Client APIs: {:?}", apis);
        }

        // the list of extensions supported by the client once initialized is different from the
        // list of extensions obtained without a display
        handle.extensions = match handle.query_string(ffi::egl::EXTENSIONS)? {
            Some(list) => list
                .split(' ')
                .filter(|ext| !ext.is_empty())
                .map(|ext| ext.to_string())
                .collect(),
            None => Vec::new(),
        };
        debug!("EGL Extensions: {:?}", handle.extensions);

        Ok(handle)
    }

    fn query_string(&self, name: u32) -> Result<Option<String>, Error> {
        let p = wrap_egl_call(self.egl, "eglQueryString", || unsafe {
            self.egl.query_string(self.handle, name as EGLint)
        })?;
        if p.is_null() {
            Ok(None)
        } else {
            Ok(Some(unsafe { CStr::from_ptr(p) }.to_string_lossy().into_owned()))
        }
    }

    pub(crate) fn has_extension(&self, extension: &str) -> bool {
        self.extensions.iter().any(|ext| ext == extension)
    }

    /// Selects the first configuration that supports pixel buffer surfaces and desktop OpenGL.
    ///
    /// The configuration is only needed to create the context and is not kept.
    pub(crate) fn choose_config(&self) -> Result<EGLConfig, Error> {
        let descriptor = {
            let mut out: Vec<c_int> = Vec::with_capacity(5);

            trace!("Setting SURFACE_TYPE to PBUFFER");
            out.push(ffi::egl::SURFACE_TYPE as c_int);
            out.push(ffi::egl::PBUFFER_BIT as c_int);
            trace!("Setting RENDERABLE_TYPE to OPENGL");
            out.push(ffi::egl::RENDERABLE_TYPE as c_int);
            out.push(ffi::egl::OPENGL_BIT as c_int);

            out.push(ffi::egl::NONE as c_int);
            out
        };

        let mut configs: [EGLConfig; 1] = [ptr::null()];
        let mut num_configs = 0;
        let ret = wrap_egl_call(self.egl, "eglChooseConfig", || unsafe {
            self.egl
                .choose_config(self.handle, &descriptor, &mut configs, &mut num_configs)
        })
        .map_err(|err| Error::ConfigurationUnavailable(Some(err)))?;
        if ret != ffi::egl::TRUE || num_configs == 0 {
            return Err(Error::ConfigurationUnavailable(None));
        }

        Ok(configs[0])
    }

    /// Binds desktop OpenGL as the client API of the calling thread.
    pub(crate) fn bind_opengl_api(&self) -> Result<(), Error> {
        let ret = wrap_egl_call(self.egl, "eglBindAPI", || unsafe {
            self.egl.bind_api(ffi::egl::OPENGL_API)
        })
        .map_err(|err| Error::ApiBindingFailed(Some(err)))?;
        if ret != ffi::egl::TRUE {
            return Err(Error::ApiBindingFailed(None));
        }
        Ok(())
    }

    pub(crate) fn egl(&self) -> &'static dyn EGLEntryPoints {
        self.egl
    }
}

impl Deref for EGLDisplayHandle {
    type Target = ffi::egl::types::EGLDisplay;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl fmt::Debug for EGLDisplayHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EGLDisplayHandle")
            .field("handle", &self.handle)
            .field("egl_version", &self.egl_version)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl Drop for EGLDisplayHandle {
    fn drop(&mut self) {
        let mut registry = INITIALIZED.lock().unwrap_or_else(PoisonError::into_inner);
        let key = self.handle as usize;
        let remaining = match registry.get_mut(&key) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => 0,
        };
        if remaining > 0 {
            trace!("Display still referenced {} times, not terminating", remaining);
            return;
        }
        registry.remove(&key);

        // ignore errors on drop
        if let Err(err) = wrap_egl_call(self.egl, "eglTerminate", || unsafe { self.egl.terminate(self.handle) }) {
            warn!("Failed to terminate EGL display: {}", err);
        } else {
            debug!("EGL display terminated");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::egl::{test::FakeEGL, test::Call, EGLError};

    #[test]
    fn open_reads_version_and_extensions() {
        let egl = FakeEGL::default().leak();
        let handle = EGLDisplayHandle::open_default(egl).unwrap();
        assert_eq!(handle.egl_version, (1, 5));
        assert!(handle.has_extension("EGL_KHR_surfaceless_context"));
        assert!(!handle.has_extension("EGL_KHR_surfaceless"));
    }

    #[test]
    fn missing_display_is_unavailable() {
        let egl = FakeEGL {
            no_display: true,
            ..FakeEGL::default()
        }
        .leak();
        assert!(matches!(
            EGLDisplayHandle::open_default(egl),
            Err(Error::DisplayUnavailable(None))
        ));
        assert_eq!(egl.calls(), vec![Call::GetDisplay]);
    }

    #[test]
    fn rejected_handshake_fails_initialization() {
        let egl = FakeEGL {
            fail_initialize: Some(ffi::egl::NOT_INITIALIZED),
            ..FakeEGL::default()
        }
        .leak();
        match EGLDisplayHandle::open_default(egl) {
            Err(Error::InitializationFailed(Some(err))) => {
                assert_eq!(err.label(), "eglInitialize");
                assert_eq!(err.error(), EGLError::NotInitialized);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        // nothing was initialized, so nothing is terminated
        assert!(!egl.calls().contains(&Call::Terminate));
    }

    #[test]
    fn no_matching_config() {
        let egl = FakeEGL {
            no_configs: true,
            ..FakeEGL::default()
        }
        .leak();
        let handle = EGLDisplayHandle::open_default(egl).unwrap();
        assert!(matches!(
            handle.choose_config(),
            Err(Error::ConfigurationUnavailable(None))
        ));
    }

    #[test]
    fn shared_display_is_terminated_by_last_handle() {
        let egl = FakeEGL::default().leak();
        let first = EGLDisplayHandle::open_default(egl).unwrap();
        let second = EGLDisplayHandle::open_default(egl).unwrap();
        assert_eq!(*first, *second);

        drop(first);
        assert!(!egl.calls().contains(&Call::Terminate));
        drop(second);
        assert_eq!(egl.calls().last(), Some(&Call::Terminate));
        assert!(!egl.is_initialized());
    }
}
