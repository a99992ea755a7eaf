use thiserror::Error;

/// Content or configuration mismatch detected while wiring the viewer.
///
/// Setup errors abort the wiring step as a whole; the viewer keeps rendering
/// whatever loaded, but the controls stay inert.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("required node `{name}` is missing from the model")]
    MissingNode { name: String },
    #[error("the playlist does not contain any tracks")]
    EmptyPlaylist,
    #[error("setup was requested before a model finished loading")]
    ModelNotLoaded,
}

/// Failure to load a model or media asset. Recoverable; prior state is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to load asset `{id}`: {message}")]
    Asset { id: String, message: String },
    #[error("asset `{id}` is empty")]
    Empty { id: String },
    #[error("failed to load model: {message}")]
    Model { message: String },
}

impl LoadError {
    /// Wraps an arbitrary error chain for the given asset identifier.
    pub fn asset(id: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::Asset {
            id: id.into(),
            message: format!("{err:#}"),
        }
    }

    /// Wraps a model parsing or fetching failure.
    pub fn model(err: &anyhow::Error) -> Self {
        Self::Model {
            message: format!("{err:#}"),
        }
    }
}

/// Raised when the host drives a frame before the viewer can render one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RenderGuardError {
    #[error("scene is not ready yet")]
    SceneNotReady,
    #[error("viewer has been disposed")]
    Disposed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn load_error_keeps_context_chain() {
        let err = Err::<(), _>(anyhow!("no such file"))
            .context("reading Audio/a.mp3")
            .unwrap_err();
        let load = LoadError::asset("Audio/a.mp3", &err);
        let text = load.to_string();
        assert!(text.contains("Audio/a.mp3"));
        assert!(text.contains("no such file"));
    }

    #[test]
    fn missing_node_names_the_node() {
        let err = SetupError::MissingNode {
            name: "PlayButton".into(),
        };
        assert_eq!(
            err.to_string(),
            "required node `PlayButton` is missing from the model"
        );
    }
}
