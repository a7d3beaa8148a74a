use serde::Serialize;

mod build_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

/// Build provenance, reported once at startup.
#[derive(Copy, Clone, Debug, Serialize)]
pub struct ApplicationMetadata {
    pub version: &'static str,
    pub firmware_version: &'static str,
    pub rust_version: &'static str,
    pub profile: &'static str,
    pub git_dirty: bool,
    pub features: &'static str,
}

impl Default for ApplicationMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationMetadata {
    pub fn new() -> Self {
        Self {
            version: build_info::PKG_VERSION,
            firmware_version: build_info::GIT_VERSION.unwrap_or("Unspecified"),
            rust_version: build_info::RUSTC_VERSION,
            profile: build_info::PROFILE,
            git_dirty: build_info::GIT_DIRTY.unwrap_or(false),
            features: build_info::FEATURES_STR,
        }
    }
}
