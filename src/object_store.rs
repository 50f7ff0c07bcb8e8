use crate::{
    transaction::transaction_request,
    utils::{array_to_vec, map_delete_err, map_get_err, map_put_err, none_if_undefined},
};
use futures_util::future::{Either, FutureExt};
use std::future::Future;
use web_sys::{wasm_bindgen::JsValue, IdbObjectStore};

/// Wrapper for [`IDBObjectStore`](https://developer.mozilla.org/en-US/docs/Web/API/IDBObjectStore),
/// for use in transactions
///
/// Each method sends its request right away, and the returned future resolves with the
/// request's result. Errors raised while sending the request are returned through the future
/// too, so that all failures are handled the same way.
#[derive(Debug)]
pub struct ObjectStore {
    sys: IdbObjectStore,
}

impl ObjectStore {
    pub(crate) fn from_sys(sys: IdbObjectStore) -> ObjectStore {
        ObjectStore { sys }
    }

    /// Add the value `value` to this object store, overwriting any value with the same key
    ///
    /// The key is read from `value` through the object store's key path.
    ///
    /// Internally, this uses [`IDBObjectStore::put`](https://developer.mozilla.org/en-US/docs/Web/API/IDBObjectStore/put).
    pub fn put(&self, value: &JsValue) -> impl Future<Output = crate::Result<()>> {
        match self.sys.put(value) {
            Ok(put_req) => Either::Right(
                transaction_request(put_req).map(|res| res.map(|_| ()).map_err(map_put_err)),
            ),
            Err(e) => Either::Left(std::future::ready(Err(map_put_err(e)))),
        }
    }

    /// Get the object with key `key`
    ///
    /// Internally, this uses [`IDBObjectStore::get`](https://developer.mozilla.org/en-US/docs/Web/API/IDBObjectStore/get).
    pub fn get(&self, key: &JsValue) -> impl Future<Output = crate::Result<Option<JsValue>>> {
        match self.sys.get(key) {
            Ok(get_req) => Either::Right(
                transaction_request(get_req)
                    .map(|res| res.map(none_if_undefined).map_err(map_get_err)),
            ),
            Err(err) => Either::Left(std::future::ready(Err(map_get_err(err)))),
        }
    }

    /// Delete the object with key `key`
    ///
    /// Unfortunately, the IndexedDB API does not indicate whether an object was actually deleted.
    ///
    /// Internally, this uses [`IDBObjectStore::delete`](https://developer.mozilla.org/en-US/docs/Web/API/IDBObjectStore/delete).
    pub fn delete(&self, key: &JsValue) -> impl Future<Output = crate::Result<()>> {
        match self.sys.delete(key) {
            Ok(delete_req) => Either::Right(
                transaction_request(delete_req)
                    .map(|res| res.map(|_| ()).map_err(map_delete_err)),
            ),
            Err(e) => Either::Left(std::future::ready(Err(map_delete_err(e)))),
        }
    }

    /// List the keys in the object store in ascending key order, with a maximum number of results of `limit`
    ///
    /// Internally, this uses [`IDBObjectStore::getAllKeys`](https://developer.mozilla.org/en-US/docs/Web/API/IDBObjectStore/getAllKeys).
    pub fn get_all_keys(
        &self,
        limit: Option<u32>,
    ) -> impl Future<Output = crate::Result<Vec<JsValue>>> {
        let get_req = match limit {
            None => self.sys.get_all_keys(),
            Some(limit) => self
                .sys
                .get_all_keys_with_key_and_limit(&JsValue::UNDEFINED, limit),
        };
        match get_req {
            Ok(get_req) => Either::Right(
                transaction_request(get_req).map(|res| res.map(array_to_vec).map_err(map_get_err)),
            ),
            Err(err) => Either::Left(std::future::ready(Err(map_get_err(err)))),
        }
    }
}
