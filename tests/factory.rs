use indexed_kinds::{Error, Factory, VersionChangeEvent, ID_FIELD};
use std::{cell::Cell, rc::Rc};
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::wasm_bindgen::JsValue;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
async fn delete_of_missing_database_succeeds() {
    let factory = Factory::get().unwrap();
    factory.delete_database("foo").await.unwrap();
}

#[wasm_bindgen_test]
async fn on_create_only_runs_for_new_databases() {
    let factory = Factory::get().unwrap();
    factory.delete_database("bar").await.unwrap();

    let calls = Rc::new(Cell::new(0));
    let db = factory
        .open("bar", {
            let calls = calls.clone();
            move |evt: VersionChangeEvent| async move {
                calls.set(calls.get() + 1);
                assert_eq!(evt.old_version(), 0);
                let db = evt.database();
                db.build_object_store("objects").key_path(ID_FIELD).create()?;
                db.build_object_store("things").create()?;
                Ok(())
            }
        })
        .await
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(db.name(), "bar");
    assert_eq!(db.object_store_names(), &["objects", "things"]);
    db.close();

    let db = factory
        .open("bar", {
            let calls = calls.clone();
            move |_: VersionChangeEvent| async move {
                calls.set(calls.get() + 1);
                Ok(())
            }
        })
        .await
        .unwrap();
    assert_eq!(calls.get(), 1);
    assert_eq!(db.object_store_names(), &["objects", "things"]);
    db.close();
}

#[wasm_bindgen_test]
async fn failed_creation_is_rolled_back() {
    let factory = Factory::get().unwrap();
    factory.delete_database("baz").await.unwrap();

    let res = factory
        .open("baz", |evt| async move {
            let db = evt.database();
            db.build_object_store("data").create()?;
            db.build_object_store("data").create()?;
            Ok(())
        })
        .await;
    assert!(matches!(res, Err(Error::AlreadyExists)));

    let db = factory.open("baz", |_| async move { Ok(()) }).await.unwrap();
    assert!(db.object_store_names().is_empty());
    db.close();
}

#[wasm_bindgen_test]
async fn object_stores_are_only_declared_at_creation() {
    let factory = Factory::get().unwrap();
    factory.delete_database("qux").await.unwrap();

    let db = factory
        .open("qux", |evt| async move {
            evt.database().build_object_store("keyless").create()
        })
        .await
        .unwrap();
    assert!(matches!(
        db.build_object_store("late").create(),
        Err(Error::InvalidCall)
    ));

    let res = db
        .transaction(&["keyless"])
        .rw()
        .run(|t| async move {
            t.object_store("keyless")?
                .put(&JsValue::from("record"))
                .await
        })
        .await;
    assert!(matches!(res, Err(Error::InvalidKey)));
    db.close();
}
