use ort::execution_providers::ExecutionProviderDispatch;

/// Name of the accelerator tried first on this platform.
pub fn preferred_provider_name() -> &'static str {
    if cfg!(target_os = "macos") {
        "CoreML"
    } else if cfg!(target_os = "windows") {
        "DirectML"
    } else {
        "CPU"
    }
}

/// Execution providers to register on a new session, most preferred first.
///
/// ONNX Runtime silently falls back to CPU when a listed provider cannot be
/// initialized, so an empty list means CPU only.
pub fn preferred_execution_providers() -> Vec<ExecutionProviderDispatch> {
    log::debug!("Preferred execution provider: {}", preferred_provider_name());

    #[cfg(target_os = "macos")]
    {
        vec![ort::execution_providers::CoreMLExecutionProvider::default().build()]
    }
    #[cfg(target_os = "windows")]
    {
        vec![ort::execution_providers::DirectMLExecutionProvider::default().build()]
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_list_matches_platform() {
        let providers = preferred_execution_providers();
        if preferred_provider_name() == "CPU" {
            assert!(providers.is_empty());
        } else {
            assert_eq!(providers.len(), 1);
        }
    }
}
