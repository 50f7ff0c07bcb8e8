use crate::{
    utils::{err_from_event, str_slice_to_array, transaction_outcome},
    ObjectStore,
};
use futures_channel::oneshot;
use futures_util::future::{self, Either};
use std::future::Future;
use web_sys::{
    wasm_bindgen::{JsCast, JsValue},
    IdbDatabase, IdbRequest, IdbTransaction, IdbTransactionMode,
};

pub(crate) mod driver;

/// Wrapper for [`IDBTransaction`](https://developer.mozilla.org/en-US/docs/Web/API/IDBTransaction)
#[derive(Debug)]
pub struct Transaction {
    sys: IdbTransaction,
}

impl Transaction {
    pub(crate) fn from_sys(sys: IdbTransaction) -> Transaction {
        Transaction { sys }
    }

    pub(crate) fn as_sys(&self) -> &IdbTransaction {
        &self.sys
    }

    /// Returns an [`ObjectStore`] that can be used to operate on data in this transaction
    ///
    /// Internally, this uses [`IDBTransaction::objectStore`](https://developer.mozilla.org/en-US/docs/Web/API/IDBTransaction/objectStore).
    pub fn object_store(&self, name: &str) -> crate::Result<ObjectStore> {
        Ok(ObjectStore::from_sys(self.sys.object_store(name).map_err(
            |err| match error_name!(&err) {
                Some("NotFoundError") => crate::Error::DoesNotExist,
                Some("InvalidStateError") => crate::Error::TransactionAborted,
                _ => crate::Error::from_js_value(err),
            },
        )?))
    }
}

/// Helper to build a transaction
pub struct TransactionBuilder {
    db: IdbDatabase,
    stores: JsValue,
    mode: IdbTransactionMode,
}

impl TransactionBuilder {
    pub(crate) fn from_names(db: IdbDatabase, names: &[&str]) -> TransactionBuilder {
        TransactionBuilder {
            db,
            stores: str_slice_to_array(names).into(),
            mode: IdbTransactionMode::Readonly,
        }
    }

    /// Allow writes in this transaction
    ///
    /// Without this, the transaction will only be allowed reads, and will error upon trying to
    /// write objects.
    pub fn rw(mut self) -> Self {
        self.mode = IdbTransactionMode::Readwrite;
        self
    }

    /// Actually execute the transaction
    ///
    /// The `transaction` argument defines what will be run in the transaction. Note that due to
    /// limitations of the IndexedDb API, the future returned by `transaction` cannot call `.await`
    /// on any future except the ones provided by the [`Transaction`] itself. This function will
    /// do its best to detect these cases to abort the transaction and panic, but you should avoid
    /// doing so anyway.
    ///
    /// If `transaction` returns an `Ok` value, then the transaction will be committed. If it
    /// returns an `Err` value, then it will be aborted. Either way, this only resolves once
    /// IndexedDB reported the end of the transaction, and an `Ok` body can still turn into an
    /// `Err` if the commit itself fails.
    ///
    /// Note that you should avoid sending requests that you do not await. If you do, it is hard
    /// to say whether the transaction will commit or abort, due to both the IndexedDB and the
    /// `wasm-bindgen` semantics.
    ///
    /// Note that transactions cannot be nested.
    ///
    /// Internally, this uses [`IDBDatabase::transaction`](https://developer.mozilla.org/en-US/docs/Web/API/IDBDatabase/transaction).
    pub async fn run<Fun, RetFut, Ret>(self, transaction: Fun) -> crate::Result<Ret>
    where
        Fun: 'static + FnOnce(Transaction) -> RetFut,
        RetFut: 'static + Future<Output = crate::Result<Ret>>,
        Ret: 'static,
    {
        let t = self
            .db
            .transaction_with_str_sequence_and_mode(&self.stores, self.mode)
            .map_err(|err| match error_name!(&err) {
                Some("InvalidStateError") => crate::Error::DatabaseIsClosed,
                Some("NotFoundError") => crate::Error::DoesNotExist,
                Some("InvalidAccessError") => crate::Error::InvalidArgument,
                _ => crate::Error::from_js_value(err),
            })?;
        let outcome = transaction_outcome(&t);
        let (tx, rx) = oneshot::channel();
        let fut = {
            let t = t.clone();
            async move {
                let res = transaction(Transaction::from_sys(t.clone())).await;
                let return_value = match &res {
                    Ok(_) => Ok(()),
                    Err(_) => Err(()),
                };
                if tx.send(res).is_err() {
                    // Transaction was cancelled by being dropped, abort it
                    let _ = t.abort();
                }
                return_value
            }
        };
        driver::run(t, fut);
        let res = rx.await;
        if driver::POLLED_FORBIDDEN_THING.get() {
            panic!("Transaction blocked without any request under way");
        }
        let res = res.expect("Transaction never completed");

        // The body already decided; wait for IndexedDB to agree before answering
        let outcome = outcome.await;
        match (res, outcome) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(e)) => Err(e),
            (Ok(ret), Ok(())) => Ok(ret),
        }
    }
}

pub(crate) async fn transaction_request(req: IdbRequest) -> Result<JsValue, JsValue> {
    let (success_tx, success_rx) = oneshot::channel();
    let (error_tx, error_rx) = oneshot::channel();

    // Keep the callbacks alive until execution completed
    let _callbacks = driver::add_request(req, success_tx, error_tx);

    let res = match future::select(success_rx, error_rx).await {
        Either::Left((res, _)) => Ok(res.unwrap()),
        Either::Right((res, _)) => Err(res.unwrap()),
    };

    res.map_err(|evt| {
        err_from_event(evt)
            .map(JsValue::from)
            .unwrap_or(JsValue::UNDEFINED)
    })
    .map(|evt| {
        evt.target()
            .expect("Trying to parse a request result from an event that has no target")
            .dyn_into::<IdbRequest>()
            .expect("Trying to parse a request result from an event that is not from an IDBRequest")
            .result()
            .expect("Failed retrieving the result of successful IDBRequest")
    })
}
