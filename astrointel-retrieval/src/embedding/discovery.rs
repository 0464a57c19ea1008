//! Model path discovery utilities
//!
//! Finds the directory fastembed downloads and caches ONNX models in.

use std::path::{Path, PathBuf};

/// Find the model cache directory with priority:
/// 1. Explicit override (CLI flag)
/// 2. ASTROINTEL_MODELS_PATH environment variable
/// 3. FASTEMBED_CACHE_PATH environment variable (fastembed's own convention)
/// 4. User home directory (~/.astrointel/models)
/// 5. `.fastembed_cache` in the working directory
pub fn find_models_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        log::info!("Using models directory: {}", path.display());
        return path.to_path_buf();
    }

    if let Some(path) = non_empty_env("ASTROINTEL_MODELS_PATH") {
        log::info!("Using ASTROINTEL_MODELS_PATH: {}", path.display());
        return path;
    }

    if let Some(path) = non_empty_env("FASTEMBED_CACHE_PATH") {
        log::info!("Using FASTEMBED_CACHE_PATH: {}", path.display());
        return path;
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        let user_path = PathBuf::from(home).join(".astrointel").join("models");
        log::info!("Using user models directory: {}", user_path.display());
        return user_path;
    }

    PathBuf::from(".fastembed_cache")
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    std::env::var_os(key)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}
