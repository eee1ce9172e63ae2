use std::{ffi::CStr, os::raw::c_char};

use scan_fmt::scan_fmt;

use super::{
    ffi::{self, Gl},
    GlError,
};
use crate::egl::OffscreenContext;

/// An OpenGL version as reported by `GL_VERSION`
///
/// Versions order by major, then minor.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct GlVersion {
    /// Major version
    pub major: i32,
    /// Minor version
    pub minor: i32,
}

impl GlVersion {
    /// Create a version from its components
    pub const fn new(major: i32, minor: i32) -> Self {
        GlVersion { major, minor }
    }

    /// Queries the version of the driver behind `gl`.
    ///
    /// `gl` has to be loaded from `context`, which has to be current on the calling thread.
    pub fn query(context: &OffscreenContext, gl: &Gl) -> Result<GlVersion, GlError> {
        if !context.is_current() {
            return Err(GlError::ContextNotCurrent);
        }
        let ptr = unsafe { gl.GetString(ffi::VERSION) } as *const c_char;
        if ptr.is_null() {
            return Err(GlError::VersionUnavailable);
        }
        let version = unsafe { CStr::from_ptr(ptr) };
        GlVersion::try_from(version).map_err(|_| GlError::UnknownVersion(version.to_string_lossy().into_owned()))
    }
}

impl std::fmt::Display for GlVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl TryFrom<&CStr> for GlVersion {
    type Error = scan_fmt::parse::ScanError;

    fn try_from(value: &CStr) -> Result<Self, Self::Error> {
        let value = value.to_string_lossy();
        let (major, minor) = match scan_fmt!(&value, "{d}.{d}", i32, i32) {
            Ok(version) => version,
            // GLES drivers prefix the version
            Err(_) => scan_fmt!(&value, "OpenGL ES {d}.{d}", i32, i32)?,
        };
        Ok(GlVersion::new(major, minor))
    }
}
