mod common;

use serde_json::json;
use common::{find, profile_with, profiles, usernames};
use docdex::{AccessPath, Filter, GeoPoint};

#[test]
fn multikey_document_matches_each_tag_independently() {
    let (_db, profiles) = profiles();
    profiles.insert(&profile_with("ab", json!({"tags": ["a", "b"]}))).unwrap();
    profiles.insert(&profile_with("b", json!({"tags": ["b"]}))).unwrap();

    let a = Filter::builder().eq("tags", "a").build().unwrap();
    let b = Filter::builder().eq("tags", "b").build().unwrap();
    assert_eq!(usernames(&find(&profiles, &a)), vec!["ab"]);
    assert_eq!(usernames(&find(&profiles, &b)), vec!["ab", "b"]);

    let plan = profiles.explain(&a).unwrap();
    assert!(matches!(plan.access, AccessPath::MultikeyLookup { ref index, .. } if index == "tags_1"));
}

#[test]
fn tag_membership_clause_unions_elements() {
    let (_db, profiles) = profiles();
    profiles.insert(&profile_with("red", json!({"tags": ["red"]}))).unwrap();
    profiles.insert(&profile_with("blue", json!({"tags": ["blue"]}))).unwrap();
    profiles.insert(&profile_with("green", json!({"tags": ["green"]}))).unwrap();

    let filter = Filter::builder().is_in("tags", ["green", "red"]).build().unwrap();
    assert_eq!(usernames(&find(&profiles, &filter)), vec!["red", "green"]);
}

#[test]
fn compound_lookup_is_independent_of_insertion_order() {
    let people = [("ada", "lovelace"), ("ada", "byron"), ("alan", "turing"), ("ada", "lovelace")];

    let run = |order: &[usize]| {
        let (_db, profiles) = profiles();
        for &i in order {
            let (first, last) = people[i];
            profiles
                .insert(&profile_with(&format!("p{}", i), json!({"firstName": first, "lastName": last})))
                .unwrap();
        }
        let exact = Filter::builder().eq("firstName", "ada").eq("lastName", "lovelace").build().unwrap();
        let prefix = Filter::builder().eq("firstName", "ada").build().unwrap();

        let mut exact_hits = usernames(&find(&profiles, &exact));
        let mut prefix_hits = usernames(&find(&profiles, &prefix));
        exact_hits.sort();
        prefix_hits.sort();
        (exact_hits, prefix_hits)
    };

    let forward = run(&[0, 1, 2, 3]);
    let backward = run(&[3, 2, 1, 0]);
    assert_eq!(forward, backward);
    assert_eq!(forward.0, vec!["p0", "p3"]);
    assert_eq!(forward.1, vec!["p0", "p1", "p3"]);
}

#[test]
fn compound_plan_uses_full_key_when_both_fields_given() {
    let (_db, profiles) = profiles();
    let filter = Filter::builder().eq("lastName", "turing").eq("firstName", "alan").build().unwrap();
    let plan = profiles.explain(&filter).unwrap();
    match plan.access {
        AccessPath::IndexLookup { index, prefixes, .. } => {
            assert_eq!(index, "firstName_1_lastName_1");
            assert_eq!(prefixes[0].len(), 2);
        }
        other => panic!("expected compound lookup, got {:?}", other),
    }
    assert!(plan.residual.is_empty());
}

#[test]
fn partial_index_tracks_status_changes() {
    let (_db, profiles) = profiles();
    let doc = profiles.insert(&profile_with("sleepy", json!({"status": "inactive"}))).unwrap();

    let status_index = |profiles: &docdex::Collection| {
        profiles.stats().indexes.into_iter().find(|i| i.name == "status_1").unwrap()
    };
    assert_eq!(status_index(profiles.as_ref()).documents, 0);

    let active = Filter::builder().eq("status", "active").build().unwrap();
    let plan = profiles.explain(&active).unwrap();
    assert!(matches!(plan.access, AccessPath::IndexLookup { ref index, .. } if index == "status_1"));
    assert!(find(&profiles, &active).is_empty());

    profiles.update(doc.id, &json!({"status": "active"})).unwrap();
    assert_eq!(status_index(profiles.as_ref()).documents, 1);
    assert_eq!(usernames(&find(&profiles, &active)), vec!["sleepy"]);

    profiles.update(doc.id, &json!({"status": "inactive"})).unwrap();
    assert_eq!(status_index(profiles.as_ref()).documents, 0);
    assert!(find(&profiles, &active).is_empty());
}

#[test]
fn inactive_lookup_falls_back_to_scan_and_still_finds_documents() {
    let (_db, profiles) = profiles();
    profiles.insert(&profile_with("a", json!({"status": "inactive"}))).unwrap();
    profiles.insert(&profile_with("b", json!({"status": "active"}))).unwrap();

    let inactive = Filter::builder().eq("status", "inactive").build().unwrap();
    assert_eq!(profiles.explain(&inactive).unwrap().access, AccessPath::FullScan);
    assert_eq!(usernames(&find(&profiles, &inactive)), vec!["a"]);
}

#[test]
fn delete_removes_exactly_the_documents_entries() {
    let (_db, profiles) = profiles();
    let gone = profiles
        .insert(&profile_with("gone", json!({
            "tags": ["a", "b"],
            "firstName": "x",
            "description": "vanishing text",
            "status": "active",
            "location": {"coordinates": [1, 1]},
        })))
        .unwrap();
    profiles.insert(&profile_with("kept", json!({"tags": ["b"], "status": "active"}))).unwrap();
    let before = profiles.stats();

    profiles.delete(gone.id).unwrap();

    let after = profiles.stats();
    let by_name = |stats: &docdex::core::stats::CollectionStats, name: &str| {
        stats.indexes.iter().find(|i| i.name == name).map(|i| (i.documents, i.entries)).unwrap()
    };
    assert_eq!(by_name(&before, "tags_1"), (2, 3));
    assert_eq!(by_name(&after, "tags_1"), (1, 1));
    assert_eq!(by_name(&after, "description_text").0, 0);
    assert_eq!(by_name(&after, "location_2dsphere").0, 0);
    assert_eq!(by_name(&after, "status_1"), (1, 1));

    let b = Filter::builder().eq("tags", "b").build().unwrap();
    assert_eq!(usernames(&find(&profiles, &b)), vec!["kept"]);
}

#[test]
fn update_moves_tag_text_and_location_entries() {
    let (_db, profiles) = profiles();
    let doc = profiles
        .insert(&profile_with("mover", json!({
            "tags": ["old"],
            "description": "gardening enthusiast",
            "location": {"coordinates": [0.0, 0.0]},
        })))
        .unwrap();
    profiles.insert(&profile_with("stayer", json!({"tags": ["old"], "description": "gardening"}))).unwrap();

    profiles
        .update(doc.id, &json!({
            "tags": ["new", "fresh"],
            "description": "astronomy nights",
            "location": {"coordinates": [30.0, 45.0]},
        }))
        .unwrap();

    let query = |filter: Filter| usernames(&find(&profiles, &filter));
    let near = |lng: f64, lat: f64| {
        Filter::builder().near("location", GeoPoint::new(lng, lat).unwrap(), 1_000.0).build().unwrap()
    };

    assert_eq!(query(Filter::builder().eq("tags", "old").build().unwrap()), vec!["stayer"]);
    assert_eq!(query(Filter::builder().eq("tags", "fresh").build().unwrap()), vec!["mover"]);
    assert_eq!(query(Filter::builder().text("gardening").build().unwrap()), vec!["stayer"]);
    assert_eq!(query(Filter::builder().text("astronomy").build().unwrap()), vec!["mover"]);
    assert!(query(near(0.0, 0.0)).is_empty());
    assert_eq!(query(near(30.0, 45.0)), vec!["mover"]);

    let tags = profiles.stats().indexes.into_iter().find(|i| i.name == "tags_1").unwrap();
    assert_eq!((tags.documents, tags.entries), (2, 3));
}
