use crate::{transaction::driver, utils::generic_request, Database, Transaction};
use futures_channel::oneshot;
use futures_util::{
    future::{self, Either},
    pin_mut,
};
use std::future::Future;
use web_sys::{
    js_sys::{self, Function},
    wasm_bindgen::{closure::Closure, JsCast},
    IdbDatabase, IdbFactory, IdbOpenDbRequest, IdbVersionChangeEvent, WorkerGlobalScope,
};

/// Entry point to the browser's databases, one per storage name
///
/// Wraps [`IDBFactory`](https://developer.mozilla.org/en-US/docs/Web/API/IDBFactory).
#[derive(Debug)]
pub struct Factory {
    sys: IdbFactory,
}

impl Factory {
    /// Retrieve the global `Factory`, from a window or from a worker
    ///
    /// Fails with [`Error::NotInBrowser`](crate::Error::NotInBrowser) outside both, and with
    /// [`Error::IndexedDbDisabled`](crate::Error::IndexedDbDisabled) when the browser refuses
    /// access, as private browsing modes sometimes do.
    ///
    /// This internally uses [`indexedDB`](https://developer.mozilla.org/en-US/docs/Web/API/indexedDB).
    pub fn get() -> crate::Result<Factory> {
        let indexed_db = if let Some(window) = web_sys::window() {
            window.indexed_db()
        } else if let Ok(worker_scope) = js_sys::global().dyn_into::<WorkerGlobalScope>() {
            worker_scope.indexed_db()
        } else {
            return Err(crate::Error::NotInBrowser);
        };

        let sys = indexed_db
            .map_err(|_| crate::Error::IndexedDbDisabled)?
            .ok_or(crate::Error::IndexedDbDisabled)?;

        Ok(Factory { sys })
    }

    /// Delete the database `name` with all its object stores
    ///
    /// A missing database counts as deleted. Resolves only once every open connection to it was
    /// closed.
    ///
    /// This internally uses [`IDBFactory::deleteDatabase`](https://developer.mozilla.org/en-US/docs/Web/API/IDBFactory/deleteDatabase)
    pub async fn delete_database(&self, name: &str) -> crate::Result<()> {
        tracing::debug!(name, "deleting database");
        generic_request(
            self.sys
                .delete_database(name)
                .map_err(crate::Error::from_js_value)?
                .into(),
        )
        .await
        .map(|_| ())
        .map_err(crate::Error::from_js_event)
    }

    /// Open the database `name` at its current version, creating it if it does not exist yet
    ///
    /// `on_create` is only called when the database did not exist before, from within the
    /// `versionchange` transaction that creates it. If it returns an error, the creation is
    /// rolled back and the error is returned.
    ///
    /// This internally uses [`IDBFactory::open`](https://developer.mozilla.org/en-US/docs/Web/API/IDBFactory/open)
    /// as well as the methods from [`IDBOpenDBRequest`](https://developer.mozilla.org/en-US/docs/Web/API/IDBOpenDBRequest)
    pub async fn open<Fun, RetFut>(&self, name: &str, on_create: Fun) -> crate::Result<Database>
    where
        Fun: 'static + FnOnce(VersionChangeEvent) -> RetFut,
        RetFut: 'static + Future<Output = crate::Result<()>>,
    {
        let open_req = self.sys.open(name).map_err(crate::Error::from_js_value)?;

        let (upgrade_tx, upgrade_rx) = oneshot::channel();
        let on_upgrade_needed = Closure::once(move |evt: IdbVersionChangeEvent| {
            let evt = VersionChangeEvent::from_sys(evt);
            tracing::debug!(
                name = %evt.database().name(),
                old_version = evt.old_version(),
                "creating database"
            );
            let transaction = evt.transaction().as_sys().clone();
            let fut = {
                let transaction = transaction.clone();
                async move {
                    let res = on_create(evt).await;
                    let return_value = match &res {
                        Ok(_) => Ok(()),
                        Err(_) => Err(()),
                    };
                    if upgrade_tx.send(res).is_err() {
                        // Opening request was cancelled by dropping, abort the transaction
                        let _ = transaction.abort();
                    }
                    return_value
                }
            };
            driver::run(transaction, fut);
        });
        open_req.set_onupgradeneeded(Some(
            on_upgrade_needed.as_ref().dyn_ref::<Function>().unwrap(),
        ));

        let completion_fut = generic_request(open_req.clone().into());
        pin_mut!(completion_fut);

        let res = future::select(upgrade_rx, completion_fut).await;
        if driver::POLLED_FORBIDDEN_THING.get() {
            panic!("Transaction blocked without any request under way");
        }

        match res {
            Either::Right((completion, _)) => {
                completion.map_err(crate::Error::from_js_event)?;
            }
            Either::Left((upgrade_res, completion_fut)) => {
                let upgrade_res = upgrade_res.expect("Closure dropped before its end of scope");
                // The request still fires once the upgrade transaction is over, either way
                let completion = completion_fut.await;
                upgrade_res?;
                completion.map_err(crate::Error::from_js_event)?;
            }
        }

        let db = open_req
            .result()
            .map_err(crate::Error::from_js_value)?
            .dyn_into::<IdbDatabase>()
            .expect("Result of successful IDBOpenDBRequest is not an IDBDatabase");

        Ok(Database::from_sys(db))
    }
}

/// What `on_create` receives while [`Factory::open`] creates a database
///
/// Wraps [`IDBVersionChangeEvent`](https://developer.mozilla.org/en-US/docs/Web/API/IDBVersionChangeEvent).
#[derive(Debug)]
pub struct VersionChangeEvent {
    sys: IdbVersionChangeEvent,
    db: Database,
    transaction: Transaction,
}

impl VersionChangeEvent {
    fn from_sys(sys: IdbVersionChangeEvent) -> VersionChangeEvent {
        let db_req = sys
            .target()
            .expect("IDBVersionChangeEvent had no target")
            .dyn_into::<IdbOpenDbRequest>()
            .expect("IDBVersionChangeEvent target was not an IDBOpenDBRequest");
        let db_sys = db_req
            .result()
            .expect("IDBOpenDBRequest had no result in its on_upgrade_needed handler")
            .dyn_into::<IdbDatabase>()
            .expect("IDBOpenDBRequest result was not an IDBDatabase");
        let transaction_sys = db_req
            .transaction()
            .expect("IDBOpenDBRequest had no associated transaction");
        VersionChangeEvent {
            sys,
            db: Database::from_sys(db_sys),
            transaction: Transaction::from_sys(transaction_sys),
        }
    }

    /// Always `0`, since `on_create` only runs for databases that did not exist
    ///
    /// Internally, this uses [`IDBVersionChangeEvent::oldVersion`](https://developer.mozilla.org/en-US/docs/Web/API/IDBVersionChangeEvent/oldVersion)
    pub fn old_version(&self) -> u32 {
        self.sys.old_version() as u32
    }

    /// The database under creation, on which to declare object stores
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// The `versionchange` transaction the creation runs in
    ///
    /// It commits once `on_create` returns `Ok`, and is aborted otherwise.
    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }
}
