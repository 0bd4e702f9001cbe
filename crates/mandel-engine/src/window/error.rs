use thiserror::Error;

/// Failures while bringing the harness up. All of them are fatal.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("event loop failed")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window")]
    Window(#[source] winit::error::OsError),

    #[error("graphics initialization failed: {0:#}")]
    Graphics(anyhow::Error),

    #[error("application startup failed: {0:#}")]
    Startup(anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_context_chain_is_kept_in_message() {
        let err = InitError::Graphics(
            anyhow::anyhow!("no adapter").context("failed to find a GPU adapter"),
        );
        let msg = err.to_string();
        assert!(msg.contains("failed to find a GPU adapter"), "{msg}");
        assert!(msg.contains("no adapter"), "{msg}");
    }

    #[test]
    fn startup_error_names_phase() {
        let err = InitError::Startup(anyhow::anyhow!("shader catalogue empty"));
        assert!(err.to_string().starts_with("application startup failed"));
    }
}
