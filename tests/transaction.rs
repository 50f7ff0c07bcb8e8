use indexed_kinds::{Database, Error, Factory, ID_FIELD};
use serde::Serialize;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::wasm_bindgen::JsValue;

wasm_bindgen_test_configure!(run_in_browser);

#[derive(Serialize)]
struct Item {
    id: &'static str,
}

#[derive(Serialize)]
struct Anonymous {
    value: &'static str,
}

fn js(value: &impl Serialize) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap()
}

async fn fresh(name: &str) -> Database {
    let factory = Factory::get().unwrap();
    factory.delete_database(name).await.unwrap();
    factory
        .open(name, |evt| async move {
            evt.database()
                .build_object_store("data")
                .key_path(ID_FIELD)
                .create()
        })
        .await
        .unwrap()
}

async fn stored_keys(db: &Database) -> Vec<JsValue> {
    db.transaction(&["data"])
        .run(|t| async move { t.object_store("data")?.get_all_keys(None).await })
        .await
        .unwrap()
}

#[wasm_bindgen_test]
async fn commits_when_the_body_succeeds() {
    let db = fresh("tx-commit").await;
    let res = db
        .transaction(&["data"])
        .rw()
        .run(|t| async move {
            let data = t.object_store("data")?;
            data.put(&js(&Item { id: "b" })).await?;
            data.put(&js(&Item { id: "a" })).await?;
            Ok(42)
        })
        .await
        .unwrap();
    assert_eq!(res, 42);
    assert_eq!(
        stored_keys(&db).await,
        vec![JsValue::from("a"), JsValue::from("b")]
    );
    db.close();
}

#[wasm_bindgen_test]
async fn auto_rollback() {
    let db = fresh("tx-rollback").await;

    let res = db
        .transaction(&["data"])
        .rw()
        .run(|t| async move {
            t.object_store("data")?.put(&js(&Item { id: "foo" })).await?;
            t.object_store("data")?.put(&js(&Item { id: "bar" })).await?;
            if true {
                // Something went wrong!
                return Err(Error::InvalidCall);
            }
            Ok(())
        })
        .await;
    assert!(matches!(res, Err(Error::InvalidCall)));

    db.transaction(&["data"])
        .rw()
        .run(|t| async move { t.object_store("data")?.put(&js(&Item { id: "baz" })).await })
        .await
        .unwrap();

    assert_eq!(stored_keys(&db).await, vec![JsValue::from("baz")]);
    db.close();
}

#[wasm_bindgen_test]
async fn failed_request_rolls_back_earlier_writes() {
    let db = fresh("tx-failed-request").await;

    let res = db
        .transaction(&["data"])
        .rw()
        .run(|t| async move {
            let data = t.object_store("data")?;
            data.put(&js(&Item { id: "1" })).await?;
            data.put(&js(&Anonymous { value: "no id" })).await?;
            Ok(())
        })
        .await;
    assert!(matches!(res, Err(Error::InvalidKey)));
    assert!(stored_keys(&db).await.is_empty());
    db.close();
}

#[wasm_bindgen_test]
async fn ignored_errors_do_not_abort() {
    let db = fresh("tx-ignored-error").await;

    db.transaction(&["data"])
        .rw()
        .run(|t| async move {
            let data = t.object_store("data")?;
            assert!(matches!(
                data.put(&js(&Anonymous { value: "no id" })).await,
                Err(Error::InvalidKey)
            ));
            data.put(&js(&Item { id: "1" })).await?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(stored_keys(&db).await, vec![JsValue::from("1")]);
    db.close();
}

#[wasm_bindgen_test]
async fn read_only_transactions_cannot_write() {
    let db = fresh("tx-read-only").await;

    let res = db
        .transaction(&["data"])
        .run(|t| async move { t.object_store("data")?.put(&js(&Item { id: "1" })).await })
        .await;
    assert!(matches!(res, Err(Error::ReadOnly)));
    assert!(stored_keys(&db).await.is_empty());
    db.close();
}

#[wasm_bindgen_test]
async fn get_and_delete_within_one_transaction() {
    let db = fresh("tx-get-delete").await;

    let found = db
        .transaction(&["data"])
        .rw()
        .run(|t| async move {
            let data = t.object_store("data")?;
            data.put(&js(&Item { id: "1" })).await?;
            let found = data.get(&JsValue::from("1")).await?;
            data.delete(&JsValue::from("1")).await?;
            let missing = data.get(&JsValue::from("1")).await?;
            assert!(missing.is_none());
            Ok(found)
        })
        .await
        .unwrap();
    assert!(found.is_some());
    assert!(stored_keys(&db).await.is_empty());
    db.close();
}

#[wasm_bindgen_test]
async fn limited_key_listing_returns_the_smallest_keys() {
    let db = fresh("tx-key-limit").await;

    let keys = db
        .transaction(&["data"])
        .rw()
        .run(|t| async move {
            let data = t.object_store("data")?;
            for id in ["c", "a", "b"] {
                data.put(&js(&Item { id })).await?;
            }
            data.get_all_keys(Some(2)).await
        })
        .await
        .unwrap();
    assert_eq!(keys, vec![JsValue::from("a"), JsValue::from("b")]);
    db.close();
}

#[wasm_bindgen_test]
async fn unknown_object_stores_are_rejected() {
    let db = fresh("tx-unknown-store").await;

    let res = db
        .transaction(&["missing"])
        .run(|_| async move { Ok(()) })
        .await;
    assert!(matches!(res, Err(Error::DoesNotExist)));
    db.close();
}

#[wasm_bindgen_test]
async fn closed_databases_reject_transactions() {
    let db = fresh("tx-closed").await;
    db.close();
    db.close();

    let res = db
        .transaction(&["data"])
        .run(|_| async move { Ok(()) })
        .await;
    assert!(matches!(res, Err(Error::DatabaseIsClosed)));
}
