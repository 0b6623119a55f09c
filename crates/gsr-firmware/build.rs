//! Build script: linker scripts and build-time device identity.
//!
//! The advertised device name can be overridden from a `.env` file next to
//! this crate (or the environment) with `GSR_DEVICE_NAME`.

const DEFAULT_DEVICE_NAME: &str = "ESP32_GSR";

fn main() {
    // A missing .env is fine; the default name is used
    let _ = dotenvy::dotenv();

    let device_name =
        std::env::var("GSR_DEVICE_NAME").unwrap_or_else(|_| DEFAULT_DEVICE_NAME.to_string());
    println!("cargo:rustc-env=GSR_DEVICE_NAME={device_name}");
    println!("cargo:rerun-if-env-changed=GSR_DEVICE_NAME");
    println!("cargo:rerun-if-changed=.env");

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
