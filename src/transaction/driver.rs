//! Driving a transaction body from IndexedDB's own callbacks
//!
//! IndexedDB commits a transaction as soon as control returns to the event loop with no request
//! pending. So the body is never handed to an executor: it is polled once when the transaction
//! starts, then once more from inside each request's `success`/`error` callback. A body that
//! returns `Pending` with no request in flight is waiting on something else and gets aborted.
//!
//! This is the part of the crate that most deserves an audit.

use futures_channel::oneshot;
use futures_util::task::noop_waker;
use scoped_tls::scoped_thread_local;
use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll},
};
use web_sys::{
    js_sys::Function,
    wasm_bindgen::{closure::Closure, JsCast},
    IdbRequest, IdbTransaction,
};

type Body = Pin<Box<dyn 'static + Future<Output = Result<(), ()>>>>;

struct Driver {
    transaction: IdbTransaction,
    inflight_requests: Cell<usize>,
    body: RefCell<Body>,
}

scoped_thread_local!(static CURRENT: Rc<Driver>);
thread_local!(pub(crate) static POLLED_FORBIDDEN_THING: Cell<bool> = const { Cell::new(false) });

impl Driver {
    fn abort(&self) {
        // Aborting twice, or after commit, only fails with InvalidStateError
        let _ = self.transaction.abort();
    }

    fn request_started(&self) {
        self.inflight_requests.set(self.inflight_requests.get() + 1);
    }

    fn request_finished(&self) {
        self.inflight_requests.set(self.inflight_requests.get() - 1);
    }
}

fn poll_body(driver: &Rc<Driver>) {
    CURRENT.set(driver, || {
        // Run the body until its next await on a request
        let res = {
            let mut body = driver.body.borrow_mut();
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                body.as_mut()
                    .poll(&mut Context::from_waker(&noop_waker()))
            }))
        };

        // wasm is panic=abort today, but if unwinding ever works the transaction must not commit
        let res = match res {
            Ok(res) => res,
            Err(err) => {
                driver.abort();
                std::panic::resume_unwind(err);
            }
        };

        match res {
            Poll::Pending if driver.inflight_requests.get() == 0 => {
                // Awaiting something that is not a request: IndexedDB would auto-commit
                driver.abort();
                POLLED_FORBIDDEN_THING.set(true);
                panic!("Transaction blocked without any request under way");
            }
            Poll::Pending | Poll::Ready(Ok(())) => (),
            Poll::Ready(Err(())) => driver.abort(),
        }
    });
}

fn send_or_abort<T>(driver: &Driver, tx: oneshot::Sender<T>, value: T) {
    if tx.send(value).is_err() {
        // Nobody awaits this request any longer
        driver.abort();
    }
}

/// Start running `body` as the contents of `transaction`
pub fn run<Fut>(transaction: IdbTransaction, body: Fut)
where
    Fut: 'static + Future<Output = Result<(), ()>>,
{
    let driver = Rc::new(Driver {
        transaction,
        inflight_requests: Cell::new(0),
        body: RefCell::new(Box::pin(body)),
    });
    poll_body(&driver);
}

/// Hook `req` into the transaction currently being polled
///
/// Must be called while a body is being polled. The returned value holds the callbacks and must
/// be kept alive until one of the channels received its event.
pub fn add_request(
    req: IdbRequest,
    success_tx: oneshot::Sender<web_sys::Event>,
    error_tx: oneshot::Sender<web_sys::Event>,
) -> impl Sized {
    CURRENT.with(move |driver| {
        driver.request_started();

        let on_success = Closure::once({
            let driver = driver.clone();
            move |evt: web_sys::Event| {
                driver.request_finished();
                send_or_abort(&driver, success_tx, evt);
                poll_body(&driver);
            }
        });

        let on_error = Closure::once({
            let driver = driver.clone();
            move |evt: web_sys::Event| {
                driver.request_finished();
                send_or_abort(&driver, error_tx, evt.clone());
                poll_body(&driver);
                // The body saw the error: let it decide whether the transaction aborts
                evt.prevent_default();
            }
        });

        req.set_onsuccess(Some(on_success.as_ref().dyn_ref::<Function>().unwrap()));
        req.set_onerror(Some(on_error.as_ref().dyn_ref::<Function>().unwrap()));

        (on_success, on_error)
    })
}
