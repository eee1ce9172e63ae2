use gl_generator::{Api, Fallbacks, Profile, Registry};
use std::{env, fs::File, path::PathBuf};

fn gl_generate() {
    let dest = PathBuf::from(&env::var("OUT_DIR").unwrap());

    let mut file = File::create(dest.join("egl_bindings.rs")).unwrap();
    Registry::new(
        Api::Egl,
        (1, 5),
        Profile::Core,
        Fallbacks::All,
        ["EGL_KHR_create_context", "EGL_KHR_surfaceless_context"],
    )
    .write_bindings(gl_generator::StructGenerator, &mut file)
    .unwrap();

    if env::var_os("CARGO_FEATURE_RENDERER_GL").is_some() {
        let mut file = File::create(dest.join("gl_bindings.rs")).unwrap();
        Registry::new(Api::Gl, (4, 6), Profile::Core, Fallbacks::All, [])
            .write_bindings(gl_generator::StructGenerator, &mut file)
            .unwrap();
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    gl_generate();
}
