#![allow(dead_code)]

use std::sync::{Arc, Once};
use serde_json::{json, Value};
use docdex::schema::profile::profile_schema;
use docdex::{Collection, Config, Database, Document, Filter, QueryOptions};

static TRACING: Once = Once::new();

/// Routes engine logs to the test writer; set RUST_LOG to see them
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn open_profiles(config: Config) -> (Database, Arc<Collection>) {
    init_tracing();
    let db = Database::open(config).expect("open database");
    let profiles = db.create_collection(profile_schema()).expect("create profiles");
    (db, profiles)
}

pub fn profiles() -> (Database, Arc<Collection>) {
    open_profiles(Config::default())
}

/// Minimal valid profile input with a derived email
pub fn profile(username: &str) -> Value {
    json!({
        "username": username,
        "email": format!("{}@x.com", username),
    })
}

/// `profile` merged with extra fields
pub fn profile_with(username: &str, extra: Value) -> Value {
    let mut base = profile(username);
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    base
}

pub fn find(collection: &Collection, filter: &Filter) -> Vec<Document> {
    collection
        .find(filter, &QueryOptions::new())
        .expect("query")
        .into_documents()
}

pub fn usernames(docs: &[Document]) -> Vec<String> {
    docs.iter()
        .map(|d| d.text("username").unwrap_or_default().to_string())
        .collect()
}
