use crate::transaction::TransactionBuilder;
use web_sys::{js_sys::JsString, IdbDatabase, IdbObjectStoreParameters};

/// Connection to one storage's database, holding one object store per kind
///
/// Wraps [`IDBDatabase`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase).
#[derive(Debug)]
pub struct Database {
    sys: IdbDatabase,
}

impl Database {
    pub(crate) fn from_sys(sys: IdbDatabase) -> Database {
        Database { sys }
    }

    /// The storage name this connection was opened with
    ///
    /// Internally, this uses [`IDBDatabase::name`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/name).
    pub fn name(&self) -> String {
        self.sys.name()
    }

    /// The kinds this database holds, as its object store names in sorted order
    ///
    /// Internally, this uses [`IDBDatabase::objectStoreNames`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/objectStoreNames).
    pub fn object_store_names(&self) -> Vec<String> {
        let names = self.sys.object_store_names();
        (0..names.length())
            .map(|i| {
                names
                    .get(i)
                    .expect("DOMStringList did not contain as many elements as its length")
            })
            .collect()
    }

    /// Declare a new kind, to be created by [`ObjectStoreBuilder::create`]
    ///
    /// Only valid from the `on_create` callback of [`Factory::open`](crate::Factory::open), while
    /// the database is being created. Anywhere else, `create` fails with [`Error::InvalidCall`](crate::Error::InvalidCall).
    ///
    /// Internally, this uses [`IDBDatabase::createObjectStore`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/createObjectStore).
    pub fn build_object_store<'a>(&self, name: &'a str) -> ObjectStoreBuilder<'a> {
        ObjectStoreBuilder {
            db: self.sys.clone(),
            name,
            options: IdbObjectStoreParameters::new(),
        }
    }

    /// Prepare a transaction over the kinds named in `stores`
    ///
    /// The transaction is read-only unless [`TransactionBuilder::rw`] is called, and only starts on
    /// [`TransactionBuilder::run`]. Naming a kind this database lacks makes `run` fail with
    /// [`Error::DoesNotExist`](crate::Error::DoesNotExist).
    pub fn transaction(&self, stores: &[&str]) -> TransactionBuilder {
        TransactionBuilder::from_names(self.sys.clone(), stores)
    }

    /// Close this connection
    ///
    /// Idempotent. Transactions already running still finish, new ones fail with
    /// [`Error::DatabaseIsClosed`](crate::Error::DatabaseIsClosed). Deleting the database waits
    /// for every connection to be closed.
    ///
    /// Internally, this uses [`IDBDatabase::close`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/close).
    pub fn close(&self) {
        self.sys.close();
    }
}

/// Pending creation of one kind's object store
pub struct ObjectStoreBuilder<'a> {
    db: IdbDatabase,
    name: &'a str,
    options: IdbObjectStoreParameters,
}

impl<'a> ObjectStoreBuilder<'a> {
    /// Create the object store
    ///
    /// Fails with [`Error::AlreadyExists`](crate::Error::AlreadyExists) if a kind of that name was
    /// already created, which aborts the whole database creation once propagated.
    ///
    /// Internally, this uses [`IDBDatabase::createObjectStore`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/createObjectStore).
    pub fn create(self) -> crate::Result<()> {
        self.db
            .create_object_store_with_optional_parameters(self.name, &self.options)
            .map_err(
                |err| match error_name!(&err) {
                    Some("InvalidStateError") => crate::Error::InvalidCall,
                    Some("TransactionInactiveError") => panic!("Tried to create an object store with the `versionchange` transaction having already aborted"),
                    Some("ConstraintError") => crate::Error::AlreadyExists,
                    Some("InvalidAccessError") => crate::Error::InvalidArgument,
                    _ => crate::Error::from_js_value(err),
                },
            )
            .map(|_| ())
    }

    /// Key records by their `path` attribute, [`ID_FIELD`](crate::ID_FIELD) for storage kinds
    ///
    /// Without one, [`ObjectStore::put`](crate::ObjectStore::put) fails with
    /// [`Error::InvalidKey`](crate::Error::InvalidKey), as it never passes a key of its own.
    ///
    /// Internally, this [sets this setting](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/createObjectStore#keypath).
    pub fn key_path(self, path: &str) -> Self {
        self.options.set_key_path(&JsString::from(path));
        self
    }
}
