//! Integration tests for the pxl crates.
//!
//! End-to-end checks that exercise `pxl-core`, `pxl-math` and `pxl-ops`
//! together. Set `RUST_LOG=pxl_ops=debug` to see engine logs.

use pxl_core::{Buffer2D, Rgba8};

/// Installs a `RUST_LOG`-driven subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Deterministic test card: gradients with a checker overlay.
pub fn test_card(width: u32, height: u32) -> Buffer2D<Rgba8> {
    let mut buf = Buffer2D::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let checker = if (x / 4 + y / 4) % 2 == 0 { 0 } else { 60 };
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            buf.set(x, y, [r, g, checker + 100, 255]);
        }
    }
    buf
}
