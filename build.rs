// Build script for MenuBar
// Embeds Windows resources (manifest, icon)

fn main() {
    // Only run on Windows
    #[cfg(target_os = "windows")]
    {
        let rc_path = std::path::Path::new("resources/menubar.rc");
        if rc_path.exists() {
            embed_resource::compile("resources/menubar.rc", embed_resource::NONE);
        }

        // AppBar messages, notify icons and service control
        println!("cargo:rustc-link-lib=user32");
        println!("cargo:rustc-link-lib=gdi32");
        println!("cargo:rustc-link-lib=shell32");
        println!("cargo:rustc-link-lib=advapi32");
    }

    println!("cargo:rerun-if-changed=resources/");
    println!("cargo:rerun-if-changed=build.rs");
}
