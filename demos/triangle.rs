//! Renders a single coloured triangle without a window and writes it to a PNG file.

use std::{mem, path::PathBuf, ptr};

use clap::Parser;
use offscreen_egl::{
    egl::{GlAttributes, OffscreenContext},
    gl::{self, ffi, Gl},
};
use tracing::info;

/// Largest accepted framebuffer edge, the common `GL_MAX_TEXTURE_SIZE`
const MAX_SIZE: i64 = 16384;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenGL version to request, at least 3.3
    #[arg(long, default_value = "4.6", value_parser = gl_version_from_string)]
    gl_version: (u8, u8),
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..=MAX_SIZE))]
    width: u32,
    #[arg(long, default_value_t = 300, value_parser = clap::value_parser!(u32).range(1..=MAX_SIZE))]
    height: u32,
    /// Where to write the rendered image
    #[arg(short, long, default_value = "test.png")]
    output: PathBuf,
    /// Request a debug context
    #[arg(long)]
    debug: bool,
}

fn gl_version_from_string(input: &str) -> Result<(u8, u8), String> {
    let (major, minor) = input
        .split_once('.')
        .ok_or_else(|| format!("expected <major>.<minor>, got {:?}", input))?;
    let version = (
        major.parse::<u8>().map_err(|err| err.to_string())?,
        minor.parse::<u8>().map_err(|err| err.to_string())?,
    );
    if version < (3, 3) {
        return Err("OpenGL 3.3 or newer is required".into());
    }
    Ok(version)
}

#[repr(C)]
struct Vertex {
    xy: [f32; 2],
    rgb: [f32; 3],
}

const VERTICES: [Vertex; 3] = [
    Vertex {
        xy: [-0.5, -0.5],
        rgb: [1.0, 0.0, 0.0],
    },
    Vertex {
        xy: [0.5, -0.5],
        rgb: [0.0, 1.0, 0.0],
    },
    Vertex {
        xy: [0.0, 0.75],
        rgb: [0.0, 0.0, 1.0],
    },
];

const VERTEX_SHADER: &str = r#"
layout (location = 0) in vec2 pos;
layout (location = 1) in vec3 col;

smooth out vec3 fragCol;

void main() {
    gl_Position = vec4(pos, 0.0, 1.0);
    fragCol = col;
}
"#;

const FRAGMENT_SHADER: &str = r#"
smooth in vec3 fragCol;

out vec4 outCol;

void main() {
    outCol = vec4(fragCol, 1.0);
}
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().compact().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().compact().init();
    }

    let cli = Cli::parse();
    let (major, minor) = cli.gl_version;
    let context = OffscreenContext::with_attributes(GlAttributes {
        version: (major, minor),
        debug: cli.debug,
    })?;
    let gl = gl::load(&context)?;
    info!("Rendering {}x{} with OpenGL {}.{}", cli.width, cli.height, major, minor);

    let header = format!("#version {}{}0 core\n", major, minor);
    let pixels = unsafe { render(&gl, cli.width as i32, cli.height as i32, &header)? };

    let mut image = image::RgbaImage::from_raw(cli.width, cli.height, pixels)
        .ok_or("read back buffer does not match the image size")?;
    // GL rows start at the bottom
    image::imageops::flip_vertical_in_place(&mut image);
    image.save(&cli.output)?;
    info!("Wrote {}", cli.output.display());

    Ok(())
}

unsafe fn render(gl: &Gl, width: i32, height: i32, header: &str) -> Result<Vec<u8>, gl::GlError> {
    gl.Viewport(0, 0, width, height);
    gl.ClearColor(0.4, 0.4, 0.4, 1.0);
    gl.PixelStorei(ffi::UNPACK_ALIGNMENT, 1);
    gl.PixelStorei(ffi::PACK_ALIGNMENT, 1);

    let mut tex = 0;
    gl.GenTextures(1, &mut tex);
    gl.BindTexture(ffi::TEXTURE_2D, tex);
    gl.TexImage2D(
        ffi::TEXTURE_2D,
        0,
        ffi::RGBA as i32,
        width,
        height,
        0,
        ffi::RGBA,
        ffi::UNSIGNED_BYTE,
        ptr::null(),
    );
    gl.TexParameteri(ffi::TEXTURE_2D, ffi::TEXTURE_MIN_FILTER, ffi::LINEAR as i32);
    gl.TexParameteri(ffi::TEXTURE_2D, ffi::TEXTURE_MAG_FILTER, ffi::LINEAR as i32);
    gl.BindTexture(ffi::TEXTURE_2D, 0);

    let mut fbo = 0;
    gl.GenFramebuffers(1, &mut fbo);
    gl.BindFramebuffer(ffi::FRAMEBUFFER, fbo);
    gl.FramebufferTexture2D(ffi::FRAMEBUFFER, ffi::COLOR_ATTACHMENT0, ffi::TEXTURE_2D, tex, 0);

    let mut vao = 0;
    gl.GenVertexArrays(1, &mut vao);
    gl.BindVertexArray(vao);

    let mut vbo = 0;
    gl.GenBuffers(1, &mut vbo);
    gl.BindBuffer(ffi::ARRAY_BUFFER, vbo);
    gl.BufferData(
        ffi::ARRAY_BUFFER,
        mem::size_of_val(&VERTICES) as isize,
        VERTICES.as_ptr() as *const _,
        ffi::STATIC_DRAW,
    );
    let stride = mem::size_of::<Vertex>() as i32;
    gl.EnableVertexAttribArray(0);
    gl.VertexAttribPointer(0, 2, ffi::FLOAT, ffi::FALSE, stride, ptr::null());
    gl.EnableVertexAttribArray(1);
    gl.VertexAttribPointer(
        1,
        3,
        ffi::FLOAT,
        ffi::FALSE,
        stride,
        mem::size_of::<[f32; 2]>() as *const _,
    );
    gl.BindBuffer(ffi::ARRAY_BUFFER, 0);

    let vertex = gl::compile_shader(gl, ffi::VERTEX_SHADER, &format!("{}{}", header, VERTEX_SHADER))?;
    let fragment = match gl::compile_shader(gl, ffi::FRAGMENT_SHADER, &format!("{}{}", header, FRAGMENT_SHADER)) {
        Ok(fragment) => fragment,
        Err(err) => {
            gl.DeleteShader(vertex);
            return Err(err);
        }
    };
    let program = gl::link_program(gl, &[vertex, fragment]);
    gl.DeleteShader(vertex);
    gl.DeleteShader(fragment);
    let program = program?;

    gl.UseProgram(program);
    gl.Clear(ffi::COLOR_BUFFER_BIT);
    gl.DrawArrays(ffi::TRIANGLES, 0, 3);

    let mut pixels = vec![0u8; width as usize * height as usize * 4];
    gl.BindTexture(ffi::TEXTURE_2D, tex);
    gl.GetTexImage(
        ffi::TEXTURE_2D,
        0,
        ffi::RGBA,
        ffi::UNSIGNED_BYTE,
        pixels.as_mut_ptr() as *mut _,
    );
    gl.BindTexture(ffi::TEXTURE_2D, 0);

    gl.UseProgram(0);
    gl.DeleteProgram(program);
    gl.DeleteBuffers(1, &vbo);
    gl.DeleteVertexArrays(1, &vao);
    gl.BindFramebuffer(ffi::FRAMEBUFFER, 0);
    gl.DeleteFramebuffers(1, &fbo);
    gl.DeleteTextures(1, &tex);

    Ok(pixels)
}
