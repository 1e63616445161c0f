use super::*;

fn keys<V>(cache: &BoundedCache<&'static str, V>) -> Vec<&'static str> {
    cache.entries.iter().map(|(k, _)| *k).collect()
}

#[test]
fn fourth_insert_evicts_oldest() {
    let mut cache = BoundedCache::new(3);
    cache.add("A", 1);
    cache.add("B", 2);
    cache.add("C", 3);
    cache.add("D", 4);
    assert!(!cache.contains(&"A"));
    assert!(cache.contains(&"D"));
    assert_eq!(cache.len(), 3);
    assert_eq!(keys(&cache), vec!["D", "C", "B"]);
}

#[test]
fn hit_promotes_by_one_slot_only() {
    let mut cache = BoundedCache::new(3);
    cache.add("A", 1);
    cache.add("B", 2);
    cache.add("C", 3);
    assert_eq!(keys(&cache), vec!["C", "B", "A"]);

    assert_eq!(cache.get(&"A"), 1);
    assert_eq!(keys(&cache), vec!["C", "A", "B"]);

    // A single hit is not enough to protect "A" from the next insertion cycle.
    cache.add("D", 4);
    assert_eq!(keys(&cache), vec!["D", "C", "A"]);

    assert_eq!(cache.get(&"A"), 1);
    assert_eq!(cache.get(&"A"), 1);
    assert_eq!(keys(&cache), vec!["A", "D", "C"]);
}

#[test]
fn miss_returns_default_without_mutation() {
    let mut cache: BoundedCache<&'static str, String> = BoundedCache::new(2);
    cache.add("A", "x".to_owned());
    cache.add("B", "y".to_owned());
    assert_eq!(cache.get(&"Z"), String::new());
    assert_eq!(keys(&cache), vec!["B", "A"]);
}

#[test]
fn re_adding_key_replaces_and_moves_to_front() {
    let mut cache = BoundedCache::new(3);
    cache.add("A", 1);
    cache.add("B", 2);
    cache.add("A", 10);
    assert_eq!(cache.len(), 2);
    assert_eq!(keys(&cache), vec!["A", "B"]);
    assert_eq!(cache.get(&"A"), 10);
}

#[test]
fn zero_capacity_never_stores() {
    let mut cache = BoundedCache::new(0);
    cache.add("A", 1);
    assert!(cache.is_empty());
    assert!(!cache.contains(&"A"));
}

#[test]
fn get_mut_allows_in_place_updates() {
    let mut cache = BoundedCache::new(2);
    cache.add("A", vec![1]);
    cache.get_mut(&"A").unwrap().push(2);
    assert_eq!(cache.get(&"A"), vec![1, 2]);
    cache.clear();
    assert!(cache.get_mut(&"A").is_none());
    assert_eq!(cache.capacity(), 2);
}
