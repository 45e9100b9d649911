mod common;

use std::collections::BTreeSet;
use proptest::prelude::*;
use serde_json::json;
use common::{find, profile_with, profiles, usernames};
use docdex::Filter;

const TAGS: &[&str] = &["red", "green", "blue", "gold"];
const FIRST: &[&str] = &["ada", "alan", "grace"];
const LAST: &[&str] = &["lovelace", "turing", "hopper"];

fn tag_sets() -> impl Strategy<Value = Vec<Vec<usize>>> {
    prop::collection::vec(prop::collection::vec(0..TAGS.len(), 0..4), 1..12)
}

fn names() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0..FIRST.len(), 0..LAST.len()), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn tag_queries_match_exactly_the_documents_holding_the_tag(sets in tag_sets()) {
        let (_db, profiles) = profiles();
        for (i, set) in sets.iter().enumerate() {
            let tags: Vec<&str> = set.iter().map(|t| TAGS[*t]).collect();
            profiles.insert(&profile_with(&format!("u{}", i), json!({"tags": tags}))).unwrap();
        }

        for (t, tag) in TAGS.iter().enumerate() {
            let expected: Vec<String> = sets.iter()
                .enumerate()
                .filter(|(_, set)| set.contains(&t))
                .map(|(i, _)| format!("u{}", i))
                .collect();
            let filter = Filter::builder().eq("tags", *tag).build().unwrap();
            prop_assert_eq!(usernames(&find(&profiles, &filter)), expected);
        }
    }

    #[test]
    fn compound_results_ignore_insertion_order(people in names(), seed in any::<u64>()) {
        let mut order: Vec<usize> = (0..people.len()).collect();
        // Deterministic shuffle driven by the generated seed
        let mut state = seed;
        for i in (1..order.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            order.swap(i, (state >> 33) as usize % (i + 1));
        }

        let query = |sequence: &[usize]| -> BTreeSet<(String, String)> {
            let (_db, profiles) = profiles();
            for &i in sequence {
                let (f, l) = people[i];
                profiles
                    .insert(&profile_with(&format!("p{}", i), json!({"firstName": FIRST[f], "lastName": LAST[l]})))
                    .unwrap();
            }
            let filter = Filter::builder().eq("firstName", FIRST[0]).build().unwrap();
            find(&profiles, &filter)
                .iter()
                .map(|d| (d.text("username").unwrap().to_string(), d.text("lastName").unwrap().to_string()))
                .collect()
        };

        let natural: Vec<usize> = (0..people.len()).collect();
        prop_assert_eq!(query(&natural), query(&order));
    }
}
