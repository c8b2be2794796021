//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `bookswap_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("bookswap_core ping={}", bookswap_core::ping());
    println!("bookswap_core version={}", bookswap_core::core_version());
}
