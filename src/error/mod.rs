use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Intent names must carry the reserved prefix so the request pipeline can tell them apart
    /// from native DOM events.
    #[error("intent name `{name}` does not start with `{prefix}`")]
    InvalidIntentName { name: String, prefix: String },

    #[error("element `{0}` not found")]
    MissingElement(String),

    #[error("could not read file from `{input}`: {message}")]
    FileRead { input: String, message: String },

    /// A browser binding threw; the exception is stringified.
    #[error("js: {0}")]
    Js(String),

    #[error("config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
