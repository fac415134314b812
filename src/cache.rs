use lazy_static::lazy_static;
use lru::LruCache;
use std::sync::Mutex;

use crate::overpass::Place;

lazy_static! {
    static ref PLACE_CACHE: Mutex<LruCache<String, Vec<Place>>> = {
        let cache_size = std::num::NonZeroUsize::new(100).unwrap(); // Adjust the cache size as needed
        Mutex::new(LruCache::new(cache_size))
    };
}

pub fn check_cache(query: &str) -> Option<Vec<Place>> {
    let mut cache = PLACE_CACHE.lock().unwrap();
    cache.get(query).cloned()
}

pub fn insert_into_cache(query: String, places: Vec<Place>) {
    let mut cache = PLACE_CACHE.lock().unwrap();
    cache.put(query, places);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::Category;

    #[test]
    fn round_trips_places() {
        let places = vec![Place {
            name: "Edeka".to_string(),
            lon: 11.57,
            lat: 48.13,
            category: Category::Supermarket,
        }];

        insert_into_cache("cache-test-query".to_string(), places.clone());
        assert_eq!(check_cache("cache-test-query"), Some(places));
        assert_eq!(check_cache("cache-test-missing"), None);
    }
}
