use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Configuration(String),
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    Extraction(String),
    #[error("{0}")]
    Remote(String),
}

impl FlowError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Input(_) => "input",
            Self::Configuration(_) => "configuration",
            Self::Io(_) => "io",
            Self::Extraction(_) => "extraction",
            Self::Remote(_) => "remote",
        }
    }

    pub fn configuration(err: anyhow::Error) -> Self {
        Self::Configuration(chain_message(&err))
    }

    pub fn io(err: anyhow::Error) -> Self {
        Self::Io(chain_message(&err))
    }

    pub fn extraction(err: anyhow::Error) -> Self {
        Self::Extraction(chain_message(&err))
    }

    pub fn remote(err: anyhow::Error) -> Self {
        Self::Remote(chain_message(&err))
    }
}

/// Flattens an anyhow chain into one line: `outer: cause: root`.
pub fn chain_message(err: &anyhow::Error) -> String {
    err.chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}
