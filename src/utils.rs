use futures_channel::oneshot;
use futures_util::future::{self, Either};
use std::future::Future;
use web_sys::{
    js_sys::{Array, Function, JsString},
    wasm_bindgen::{closure::Closure, JsCast, JsValue},
    DomException, IdbRequest, IdbTransaction,
};

pub(crate) async fn generic_request(req: IdbRequest) -> Result<web_sys::Event, web_sys::Event> {
    let (success_tx, success_rx) = oneshot::channel();
    let (error_tx, error_rx) = oneshot::channel();

    let on_success = Closure::once(move |v| success_tx.send(v));
    let on_error = Closure::once(move |v| error_tx.send(v));

    req.set_onsuccess(Some(on_success.as_ref().dyn_ref::<Function>().unwrap()));
    req.set_onerror(Some(on_error.as_ref().dyn_ref::<Function>().unwrap()));

    match future::select(success_rx, error_rx).await {
        Either::Left((res, _)) => Ok(res.unwrap()),
        Either::Right((res, _)) => Err(res.unwrap()),
    }
}

/// Wait for `transaction` to either commit or abort
///
/// The listeners are registered right away, so that the returned future observes the outcome
/// even if it is only polled after the transaction has already finished.
pub(crate) fn transaction_outcome(
    transaction: &IdbTransaction,
) -> impl Future<Output = crate::Result<()>> {
    let (complete_tx, complete_rx) = oneshot::channel();
    let (abort_tx, abort_rx) = oneshot::channel();

    let on_complete = Closure::once(move |v: web_sys::Event| complete_tx.send(v));
    let on_abort = Closure::once(move |v: web_sys::Event| abort_tx.send(v));

    transaction.set_oncomplete(Some(on_complete.as_ref().dyn_ref::<Function>().unwrap()));
    transaction.set_onabort(Some(on_abort.as_ref().dyn_ref::<Function>().unwrap()));

    let transaction = transaction.clone();
    async move {
        // Keep the callbacks alive until one of them fired
        let _callbacks = (on_complete, on_abort);
        match future::select(complete_rx, abort_rx).await {
            Either::Left(_) => Ok(()),
            Either::Right(_) => {
                let err = transaction
                    .error()
                    .map(crate::Error::from_dom_exception)
                    .unwrap_or(crate::Error::TransactionAborted);
                tracing::warn!(error = %err, "transaction aborted");
                Err(err)
            }
        }
    }
}

/// Retrieve the error carried by the request that fired `evt`
pub(crate) fn err_from_event(evt: web_sys::Event) -> Option<DomException> {
    evt.target()
        .expect("Trying to parse indexed_kinds::Error from an event that has no target")
        .dyn_into::<IdbRequest>()
        .expect("Trying to parse indexed_kinds::Error from an event that is not from an IDBRequest")
        .error()
        .expect("Failed retrieving the error of a failed IDBRequest")
}

pub(crate) fn none_if_undefined(v: JsValue) -> Option<JsValue> {
    if v.is_undefined() {
        None
    } else {
        Some(v)
    }
}

pub(crate) fn array_to_vec(v: JsValue) -> Vec<JsValue> {
    let array = v
        .dyn_into::<Array>()
        .expect("Value was not of the expected Array type");
    array.iter().collect()
}

pub(crate) fn str_slice_to_array(s: &[&str]) -> Array {
    s.iter().map(|v| JsValue::from(JsString::from(*v))).collect()
}

pub(crate) fn map_put_err(err: JsValue) -> crate::Error {
    match error_name!(&err) {
        Some("ReadOnlyError") => crate::Error::ReadOnly,
        Some("TransactionInactiveError") => {
            panic!("Tried putting into an ObjectStore while the transaction was inactive")
        }
        Some("DataError") => crate::Error::InvalidKey,
        Some("InvalidStateError") => crate::Error::ObjectStoreWasRemoved,
        Some("DataCloneError") => crate::Error::FailedClone,
        _ => crate::Error::from_js_value(err),
    }
}

pub(crate) fn map_delete_err(err: JsValue) -> crate::Error {
    match error_name!(&err) {
        Some("ReadOnlyError") => crate::Error::ReadOnly,
        Some("InvalidStateError") => crate::Error::ObjectStoreWasRemoved,
        Some("TransactionInactiveError") => {
            panic!("Tried deleting from an ObjectStore while the transaction was inactive")
        }
        Some("DataError") => crate::Error::InvalidKey,
        _ => crate::Error::from_js_value(err),
    }
}

pub(crate) fn map_get_err(err: JsValue) -> crate::Error {
    match error_name!(&err) {
        Some("InvalidStateError") => crate::Error::ObjectStoreWasRemoved,
        Some("TransactionInactiveError") => {
            panic!("Tried getting from an ObjectStore while the transaction was inactive")
        }
        Some("DataError") => crate::Error::InvalidKey,
        _ => crate::Error::from_js_value(err),
    }
}
