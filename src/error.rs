use web_sys::{
    wasm_bindgen::{JsCast, JsValue},
    DomException,
};

/// Type alias for convenience
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all errors from this crate
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Not running in a browser window or worker
    #[error("Not running in a browser window or worker")]
    NotInBrowser,

    /// IndexedDB is disabled
    #[error("IndexedDB is disabled")]
    IndexedDbDisabled,

    /// The kind was not declared when the storage was created
    #[error("Unknown kind {0:?}")]
    UnknownKind(String),

    /// Operation is not supported by the browser
    #[error("Operation is not supported by the browser")]
    OperationNotSupported,

    /// Operation is not allowed by the user agent
    #[error("Operation is not allowed by the user agent")]
    OperationNotAllowed,

    /// Provided key is not valid, or the record has no valid `id`
    #[error("Provided key is not valid")]
    InvalidKey,

    /// Requested version is older than existing version
    #[error("Requested version is older than existing version")]
    VersionTooOld,

    /// The requested function cannot be called from this context
    #[error("The requested function cannot be called from this context")]
    InvalidCall,

    /// The provided arguments are invalid
    #[error("The provided arguments are invalid")]
    InvalidArgument,

    /// Cannot create something that already exists
    #[error("Cannot create something that already exists")]
    AlreadyExists,

    /// Cannot change something that does not exists
    #[error("Cannot change something that does not exists")]
    DoesNotExist,

    /// Database is closed
    #[error("Database is closed")]
    DatabaseIsClosed,

    /// Object store was removed
    #[error("Object store was removed")]
    ObjectStoreWasRemoved,

    /// Transaction is read-only
    #[error("Transaction is read-only")]
    ReadOnly,

    /// Unable to clone
    #[error("Unable to clone")]
    FailedClone,

    /// The browser ran out of storage space for this origin
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// The transaction aborted without committing
    #[error("Transaction aborted")]
    TransactionAborted,

    /// Converting a record or key to or from a JavaScript value failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Any other error reported by IndexedDB
    #[error("{name}: {message}")]
    Engine { name: String, message: String },
}

impl Error {
    /// Map the name of a `DOMException` that has no operation-specific meaning
    pub(crate) fn from_name(name: &str, message: String) -> Error {
        match name {
            "NotSupportedError" => Error::OperationNotSupported,
            "NotAllowedError" => Error::OperationNotAllowed,
            "VersionError" => Error::VersionTooOld,
            "QuotaExceededError" => Error::QuotaExceeded,
            "AbortError" => Error::TransactionAborted,
            "DataError" => Error::InvalidKey,
            "DataCloneError" => Error::FailedClone,
            "ReadOnlyError" => Error::ReadOnly,
            "ConstraintError" => Error::AlreadyExists,
            "NotFoundError" => Error::DoesNotExist,
            _ => Error::Engine {
                name: name.to_owned(),
                message,
            },
        }
    }

    pub(crate) fn from_dom_exception(err: DomException) -> Error {
        Error::from_name(&err.name(), err.message())
    }

    pub(crate) fn from_js_value(v: JsValue) -> Error {
        match v.dyn_into::<DomException>() {
            Ok(err) => Error::from_dom_exception(err),
            Err(v) => Error::Engine {
                name: String::from("Error"),
                message: format!("{v:?}"),
            },
        }
    }

    pub(crate) fn from_js_event(evt: web_sys::Event) -> Error {
        match crate::utils::err_from_event(evt) {
            Some(err) => Error::from_dom_exception(err),
            None => Error::TransactionAborted,
        }
    }
}

impl From<serde_wasm_bindgen::Error> for Error {
    fn from(err: serde_wasm_bindgen::Error) -> Error {
        Error::Serialization(err.to_string())
    }
}

pub(crate) fn name(v: &JsValue) -> Option<String> {
    v.dyn_ref::<DomException>().map(|v| v.name())
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn known_names_map_to_dedicated_variants() {
        assert!(matches!(
            Error::from_name("QuotaExceededError", String::new()),
            Error::QuotaExceeded
        ));
        assert!(matches!(
            Error::from_name("DataError", String::new()),
            Error::InvalidKey
        ));
        assert!(matches!(
            Error::from_name("AbortError", String::new()),
            Error::TransactionAborted
        ));
    }

    #[test]
    fn unknown_names_are_carried_through() {
        let err = Error::from_name("UnknownError", String::from("disk on fire"));
        match &err {
            Error::Engine { name, message } => {
                assert_eq!(name, "UnknownError");
                assert_eq!(message, "disk on fire");
            }
            other => panic!("unexpected variant {other:?}"),
        }
        assert_eq!(err.to_string(), "UnknownError: disk on fire");
    }

    #[test]
    fn unknown_kind_names_the_kind() {
        assert_eq!(
            Error::UnknownKind(String::from("another kind")).to_string(),
            "Unknown kind \"another kind\""
        );
    }
}
