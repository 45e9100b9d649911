/// Docdex API demo
///
/// Walks through the profile collection:
/// - create documents and see uniqueness enforced
/// - list by tag and name, search by text and location
/// - update, delete, explain and statistics

use docdex::api::requests::{ListFilters, SearchFilters};
use docdex::api::service::ProfileService;
use docdex::{Config, Database, Filter, GeoPoint, QueryOptions};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("Opening database...");
    let db = Database::open(Config::default())?;
    let service = ProfileService::new(&db)?;

    println!("\nCREATE");
    let inputs = [
        json!({
            "username": "ferris", "email": "ferris@rust.dev",
            "firstName": "Ferris", "lastName": "Crab",
            "tags": ["rust", "crab"], "status": "active",
            "description": "Open source maintainer who loves Rust",
            "location": {"type": "Point", "coordinates": [2.3522, 48.8566]},
        }),
        json!({
            "username": "gopher", "email": "gopher@go.dev",
            "tags": ["go"], "status": "active",
            "description": "open source Go developer",
            "location": {"coordinates": [2.2945, 48.8584]},
        }),
        json!({
            "username": "ada", "email": "ada@engine.org",
            "firstName": "Ada", "lastName": "Lovelace",
            "tags": ["math", "rust"],
            "description": "notes on the analytical engine",
        }),
        // Rejected: username already used
        json!({"username": "ferris", "email": "other@rust.dev"}),
    ];
    for input in &inputs {
        let response = service.create_document(input);
        println!("  {} {}", response.status_code(), serde_json::to_string(&response)?);
    }

    println!("\nLIST");
    let rustaceans = service.list_documents(&ListFilters::from_query_pairs([("tag", "rust")]))?;
    println!("  tag=rust: {} profiles", rustaceans.count);
    let active = service.list_documents(&ListFilters::from_query_pairs([("status", "active")]))?;
    println!("  status=active: {} profiles", active.count);

    println!("\nSEARCH");
    let text = SearchFilters::from_query_pairs([("text", "\"open source\" -go")])?;
    for doc in service.search_documents(&text)?.data {
        println!("  text match: {}", doc.text("username").unwrap_or_default());
    }
    let near = SearchFilters::from_query_pairs([("lng", "2.35"), ("lat", "48.85"), ("distance", "6000")])?;
    for doc in service.search_documents(&near)?.data {
        println!("  near Paris: {}", doc.text("username").unwrap_or_default());
    }

    println!("\nUPDATE / DELETE");
    let profiles = service.collection();
    let ada = Filter::builder().eq("firstName", "Ada").eq("lastName", "Lovelace").build()?;
    println!("  plan: {}", profiles.explain(&ada)?);
    if let Some(doc) = profiles.find(&ada, &QueryOptions::new())?.into_documents().pop() {
        profiles.update(doc.id, &json!({"status": "active"}))?;
        println!("  activated {}", doc.id);
        profiles.delete(doc.id)?;
        println!("  deleted {}", doc.id);
    }

    let close_by = Filter::builder()
        .near("location", GeoPoint::new(2.35, 48.85)?, 10_000.0)
        .build()?;
    for hit in profiles.find(&close_by, &QueryOptions::new())? {
        println!(
            "  {} at {:.0} m",
            hit.document.text("username").unwrap_or_default(),
            hit.distance.unwrap_or_default()
        );
    }

    println!("\nSTATS");
    println!("{}", serde_json::to_string_pretty(&db.stats())?);

    db.close();
    Ok(())
}
