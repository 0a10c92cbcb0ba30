//! Engine error type
//!
//! Composition and lookup failures are surfaced immediately to the caller.
//! Degenerate geometry is never an error (see `sim::collision`).

/// Error type for composition, lookup and data handling
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A `before`/`after` hook targets a method that does not exist yet
    MissingMethod { module: String, method: String },
    /// A module name is not present in the registry
    UnknownModule(String),
    /// An operation needs a module that was not composed in
    ModuleNotIncluded(String),
    /// Entity data names a class with no registered constructor
    UnknownClass(String),
    /// Late-bound call to a method nobody registered
    UnknownMethod(String),
    /// No entity with this id in the world
    UnknownEntity(u32),
    /// Entity data or settings could not be (de)serialized
    InvalidData(String),
    /// Settings file could not be read
    Io(String),
}

impl EngineError {
    /// Errors raised while composing an entity or world
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EngineError::MissingMethod { .. }
                | EngineError::UnknownModule(_)
                | EngineError::ModuleNotIncluded(_)
        )
    }

    /// Errors raised when a name or id fails to resolve
    pub fn is_lookup(&self) -> bool {
        matches!(
            self,
            EngineError::UnknownClass(_) | EngineError::UnknownMethod(_) | EngineError::UnknownEntity(_)
        )
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MissingMethod { module, method } => write!(
                f,
                "Configuration error: module `{}` hooks `{}`, which does not exist",
                module, method
            ),
            EngineError::UnknownModule(name) => {
                write!(f, "Configuration error: `{}` is not a valid module", name)
            }
            EngineError::ModuleNotIncluded(name) => {
                write!(f, "Configuration error: module `{}` is not included", name)
            }
            EngineError::UnknownClass(name) => write!(f, "Lookup error: no class named `{}`", name),
            EngineError::UnknownMethod(name) => write!(f, "Lookup error: no method named `{}`", name),
            EngineError::UnknownEntity(id) => write!(f, "Lookup error: no entity with id {}", id),
            EngineError::InvalidData(msg) => write!(f, "Invalid data: {}", msg),
            EngineError::Io(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::InvalidData(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Io(e.to_string())
    }
}

/// Convenience alias for engine results
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let missing = EngineError::MissingMethod {
            module: "jumper".into(),
            method: "jump".into(),
        };
        assert!(missing.is_configuration());
        assert!(!missing.is_lookup());

        assert!(EngineError::UnknownClass("Boss".into()).is_lookup());
        assert!(!EngineError::InvalidData("bad".into()).is_configuration());
    }

    #[test]
    fn test_error_display_names_the_culprit() {
        let err = EngineError::UnknownModule("Selector".into());
        assert!(err.to_string().contains("Selector"));
    }

    #[test]
    fn test_from_serde_error() {
        let err: EngineError = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, EngineError::InvalidData(_)));
    }
}
