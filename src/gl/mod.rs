//! Desktop OpenGL entry points for an [`OffscreenContext`]
//!
//! Only the raw primitives are provided: loading the function pointers through EGL,
//! and compiling and linking shader objects. Everything else is up to the caller.

use std::{ffi::CStr, os::raw::c_char};
use tracing::{error, info, info_span, warn};

use crate::egl::OffscreenContext;

mod version;
pub use self::version::GlVersion;

#[allow(clippy::all, missing_docs, missing_debug_implementations)]
pub mod ffi {
    include!(concat!(env!("OUT_DIR"), "/gl_bindings.rs"));
}

pub use self::ffi::Gl;

/// Error returned by the OpenGL primitives
#[derive(thiserror::Error, Debug)]
pub enum GlError {
    /// Function pointers can only be loaded while the context is current
    #[error("The context is not current on this thread")]
    ContextNotCurrent,
    /// Required GL functions could not be loaded
    #[error("Failed to load GL functions from EGL")]
    GLFunctionLoaderError,
    /// An error occured while creating the shader object.
    #[error("An error occured while creating the shader object.")]
    CreateShaderObject,
    /// A shader could not be compiled
    #[error("Failed to compile {kind} shader:\n{log}")]
    ShaderCompileError {
        /// Stage of the shader
        kind: &'static str,
        /// Compiler info log
        log: String,
    },
    /// The driver did not report a `GL_VERSION`
    #[error("The driver did not report a GL_VERSION")]
    VersionUnavailable,
    /// `GL_VERSION` could not be parsed
    #[error("Unrecognized GL_VERSION: {0:?}")]
    UnknownVersion(String),
    /// A program could not be linked
    #[error("Failed to link program:\n{0}")]
    ProgramLinkError(String),
}

/// Loads the OpenGL function pointers of a context.
///
/// The context has to be current on the calling thread.
pub fn load(context: &OffscreenContext) -> Result<Gl, GlError> {
    let span = info_span!(parent: &context.span, "renderer_gl");
    let _guard = span.enter();

    if !context.is_current() {
        return Err(GlError::ContextNotCurrent);
    }

    let gl = Gl::load_with(|s| context.get_proc_address(s));
    if !gl.GetString.is_loaded() {
        return Err(GlError::GLFunctionLoaderError);
    }

    let version = unsafe {
        let version_ptr = gl.GetString(ffi::VERSION) as *const c_char;
        if version_ptr.is_null() {
            return Err(GlError::VersionUnavailable);
        }
        let version = CStr::from_ptr(version_ptr);
        info!("GL Version: {:?}", version);
        let vendor_ptr = gl.GetString(ffi::VENDOR) as *const c_char;
        if !vendor_ptr.is_null() {
            info!("GL Vendor: {:?}", CStr::from_ptr(vendor_ptr));
        }
        let renderer_ptr = gl.GetString(ffi::RENDERER) as *const c_char;
        if !renderer_ptr.is_null() {
            info!("GL Renderer: {:?}", CStr::from_ptr(renderer_ptr));
        }
        version
    };

    match GlVersion::try_from(version) {
        Ok(version) => {
            let (major, minor) = context.attributes().version;
            if version < GlVersion::new(major as i32, minor as i32) {
                warn!("Driver reports OpenGL {}, below the requested {}.{}", version, major, minor);
            }
        }
        Err(err) => warn!("Failed to parse the OpenGL version: {}", err),
    }

    Ok(gl)
}

fn shader_kind(kind: ffi::types::GLenum) -> &'static str {
    match kind {
        ffi::VERTEX_SHADER => "vertex",
        ffi::FRAGMENT_SHADER => "fragment",
        ffi::GEOMETRY_SHADER => "geometry",
        ffi::COMPUTE_SHADER => "compute",
        ffi::TESS_CONTROL_SHADER => "tessellation control",
        ffi::TESS_EVALUATION_SHADER => "tessellation evaluation",
        _ => "unknown",
    }
}

/// Compiles a shader object of the given `kind`.
///
/// On failure the shader object is deleted and the info log is returned.
///
/// # Safety
///
/// The context `gl` was loaded from has to be current on the calling thread.
pub unsafe fn compile_shader(gl: &Gl, kind: ffi::types::GLenum, src: &str) -> Result<ffi::types::GLuint, GlError> {
    let shader = gl.CreateShader(kind);
    if shader == 0 {
        return Err(GlError::CreateShaderObject);
    }

    gl.ShaderSource(
        shader,
        1,
        &src.as_ptr() as *const *const u8 as *const *const ffi::types::GLchar,
        &(src.len() as i32) as *const _,
    );
    gl.CompileShader(shader);

    let mut status = ffi::FALSE as i32;
    gl.GetShaderiv(shader, ffi::COMPILE_STATUS, &mut status as *mut _);
    if status == ffi::FALSE as i32 {
        let mut max_len = 0;
        gl.GetShaderiv(shader, ffi::INFO_LOG_LENGTH, &mut max_len as *mut _);

        let mut log = Vec::with_capacity(max_len.max(0) as usize);
        let mut len = 0;
        gl.GetShaderInfoLog(shader, max_len, &mut len as *mut _, log.as_mut_ptr() as *mut _);
        log.set_len(len.clamp(0, max_len.max(0)) as usize);

        let log = String::from_utf8_lossy(&log).into_owned();
        error!("[GL] {}", log);

        gl.DeleteShader(shader);
        return Err(GlError::ShaderCompileError {
            kind: shader_kind(kind),
            log,
        });
    }

    Ok(shader)
}

/// Links the given shader objects into a program.
///
/// The shaders are detached again after linking, but not deleted.
/// On failure the program is deleted and the info log is returned.
///
/// # Safety
///
/// The context `gl` was loaded from has to be current on the calling thread.
pub unsafe fn link_program(gl: &Gl, shaders: &[ffi::types::GLuint]) -> Result<ffi::types::GLuint, GlError> {
    let program = gl.CreateProgram();
    for shader in shaders {
        gl.AttachShader(program, *shader);
    }
    gl.LinkProgram(program);
    for shader in shaders {
        gl.DetachShader(program, *shader);
    }

    let mut status = ffi::FALSE as i32;
    gl.GetProgramiv(program, ffi::LINK_STATUS, &mut status as *mut _);
    if status == ffi::FALSE as i32 {
        let mut max_len = 0;
        gl.GetProgramiv(program, ffi::INFO_LOG_LENGTH, &mut max_len as *mut _);

        let mut log = Vec::with_capacity(max_len.max(0) as usize);
        let mut len = 0;
        gl.GetProgramInfoLog(program, max_len, &mut len as *mut _, log.as_mut_ptr() as *mut _);
        log.set_len(len.clamp(0, max_len.max(0)) as usize);

        let log = String::from_utf8_lossy(&log).into_owned();
        error!("[GL] {}", log);

        gl.DeleteProgram(program);
        return Err(GlError::ProgramLinkError(log));
    }

    Ok(program)
}
