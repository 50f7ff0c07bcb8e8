use crate::{Database, Error, Factory, Kinds, Result};
use serde::{de::DeserializeOwned, Serialize};
use web_sys::wasm_bindgen::JsValue;

/// The attribute every record is keyed by
pub const ID_FIELD: &str = "id";

/// Open the storage `name`, creating it with the given kinds if it does not exist yet
///
/// `kinds` can be a single kind name or a sequence of kind names. Each kind becomes one object
/// store, whose records are keyed by their [`ID_FIELD`] attribute.
///
/// Kinds are only declared when the storage is first created: opening an existing storage keeps
/// its kinds as they are, whatever `kinds` says. Use [`Storage::kinds`] to see what is available.
pub async fn create(name: &str, kinds: impl Into<Kinds>) -> Result<Storage> {
    Storage::open(&Factory::get()?, name, kinds.into()).await
}

/// Delete the storage `name`, with all its kinds and records
///
/// Deleting a storage that does not exist succeeds. Deletion waits until all handles to the
/// storage are closed, so [`Storage::close`] them first.
pub async fn remove(name: &str) -> Result<()> {
    Factory::get()?.delete_database(name).await
}

/// Handle to one open storage
///
/// Every operation runs in its own short-lived transaction over the one kind it targets. An
/// operation either fully applies or not at all, and reports the first error it met. Records
/// that are not found are `Ok(None)`, not errors.
///
/// The underlying connection is closed when the handle is dropped.
#[derive(Debug)]
pub struct Storage {
    db: Database,
    name: String,
    kinds: Vec<String>,
}

impl Storage {
    async fn open(factory: &Factory, name: &str, kinds: Kinds) -> Result<Storage> {
        let db = factory
            .open(name, move |evt| async move {
                let db = evt.database();
                for kind in &kinds {
                    db.build_object_store(kind).key_path(ID_FIELD).create()?;
                }
                Ok(())
            })
            .await?;
        let storage = Storage {
            name: db.name(),
            kinds: db.object_store_names(),
            db,
        };
        tracing::debug!(name = %storage.name, kinds = ?storage.kinds, "opened storage");
        Ok(storage)
    }

    /// The name of this storage
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The kinds available in this storage, in sorted order
    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    /// Close this handle
    ///
    /// Calling this more than once does nothing. Operations started after closing fail with
    /// [`Error::DatabaseIsClosed`].
    pub fn close(&self) {
        tracing::debug!(name = %self.name, "closing storage");
        self.db.close();
    }

    /// Insert `record` into `kind`, replacing any record with the same `id`
    pub async fn put<T>(&self, kind: &str, record: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        self.check_kind(kind)?;
        let value = to_js(record)?;
        tracing::trace!(kind, "put");

        let store = kind.to_owned();
        self.db
            .transaction(&[kind])
            .rw()
            .run(move |t| async move { t.object_store(&store)?.put(&value).await })
            .await
    }

    /// Retrieve the record of `kind` whose `id` is `id`
    pub async fn get<T, K>(&self, kind: &str, id: &K) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        K: Serialize + ?Sized,
    {
        self.check_kind(kind)?;
        let key = to_js(id)?;
        tracing::trace!(kind, "get");

        let store = kind.to_owned();
        let value = self
            .db
            .transaction(&[kind])
            .run(move |t| async move { t.object_store(&store)?.get(&key).await })
            .await?;
        value.map(from_js::<T>).transpose()
    }

    /// Remove the record of `kind` whose `id` is `id`, if there is one
    pub async fn delete<K>(&self, kind: &str, id: &K) -> Result<()>
    where
        K: Serialize + ?Sized,
    {
        self.check_kind(kind)?;
        let key = to_js(id)?;
        tracing::trace!(kind, "delete");

        let store = kind.to_owned();
        self.db
            .transaction(&[kind])
            .rw()
            .run(move |t| async move { t.object_store(&store)?.delete(&key).await })
            .await
    }

    /// Remove and return the record of `kind` with the smallest `id`
    ///
    /// Ids are compared the way IndexedDB orders keys: numbers sort before strings, numbers
    /// compare numerically and strings compare by UTF-16 code unit. So with string ids, `"10"`
    /// comes before `"2"`.
    ///
    /// Finding, reading and deleting the record all happen in one transaction, so two concurrent
    /// calls never return the same record. If the record cannot be read as a `T`, it stays in
    /// `kind`.
    pub async fn take<T>(&self, kind: &str) -> Result<Option<T>>
    where
        T: 'static + DeserializeOwned,
    {
        self.check_kind(kind)?;
        tracing::trace!(kind, "take");

        let store = kind.to_owned();
        self.db
            .transaction(&[kind])
            .rw()
            .run(move |t| async move {
                let store = t.object_store(&store)?;
                // getAllKeys lists in ascending key order
                let Some(smallest) = store.get_all_keys(Some(1)).await?.into_iter().next() else {
                    return Ok(None);
                };
                // Must convert before the delete: a failure here aborts the transaction
                let value = store.get(&smallest).await?.map(from_js::<T>).transpose()?;
                store.delete(&smallest).await?;
                Ok(value)
            })
            .await
    }

    fn check_kind(&self, kind: &str) -> Result<()> {
        if self.kinds.iter().any(|k| k == kind) {
            Ok(())
        } else {
            Err(Error::UnknownKind(kind.to_owned()))
        }
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        self.db.close();
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}
