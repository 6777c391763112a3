//! Property tests for wildcard matching and destination deduplication.

use proptest::prelude::*;

use exchange_router::routing::{Envelope, TopicPattern};
use exchange_router::{Broker, ExchangeKind};

fn word() -> impl Strategy<Value = String> {
    "[a-z]{1,4}"
}

fn words() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(word(), 0..6)
}

fn key_of(words: &[String]) -> String {
    words.join(".")
}

proptest! {
    #[test]
    fn prop_hash_matches_every_key(key in words()) {
        let pattern = TopicPattern::parse("#").unwrap();
        prop_assert!(pattern.matches(&key_of(&key)));
    }

    #[test]
    fn prop_literal_pattern_matches_itself(key in words()) {
        let key = key_of(&key);
        let pattern = TopicPattern::parse(&key).unwrap();
        prop_assert!(pattern.matches(&key));
    }

    #[test]
    fn prop_stars_match_exactly_that_many_words(key in words(), stars in 1usize..6) {
        let pattern = vec!["*"; stars].join(".");
        let pattern = TopicPattern::parse(&pattern).unwrap();
        prop_assert_eq!(pattern.matches(&key_of(&key)), key.len() == stars);
    }

    #[test]
    fn prop_star_substitution_preserves_match(
        key in prop::collection::vec(word(), 1..6),
        index in any::<prop::sample::Index>(),
    ) {
        let mut pattern = key.clone();
        pattern[index.index(key.len())] = "*".to_string();
        let pattern = TopicPattern::parse(&key_of(&pattern)).unwrap();
        prop_assert!(pattern.matches(&key_of(&key)));
    }

    #[test]
    fn prop_hash_absorbs_prefix_and_suffix(prefix in words(), rest in words()) {
        let mut full = prefix.clone();
        full.extend(rest.iter().cloned());
        let key = key_of(&full);

        let mut leading = prefix.clone();
        leading.push("#".to_string());
        prop_assert!(TopicPattern::parse(&key_of(&leading)).unwrap().matches(&key));

        let mut trailing = vec!["#".to_string()];
        trailing.extend(rest.iter().cloned());
        prop_assert!(TopicPattern::parse(&key_of(&trailing)).unwrap().matches(&key));
    }

    #[test]
    fn prop_fanout_ignores_routing_key(key in ".{0,20}", queues in 1usize..8) {
        let broker = Broker::default();
        for i in 0..queues {
            broker.bind("amq.fanout", &format!("q{i}"), "", None).unwrap();
        }
        let dests = broker.publish("amq.fanout", &Envelope::new(key)).unwrap();
        prop_assert_eq!(dests.len(), queues);
    }

    #[test]
    fn prop_destinations_are_deduplicated(key in prop::collection::vec(word(), 1..5)) {
        let broker = Broker::default();
        broker.declare_exchange("t", ExchangeKind::Topic).unwrap();
        let key = key_of(&key);
        for pattern in ["#", "#.#", key.as_str(), "*.#", "#.*"] {
            broker.bind("t", "only", pattern, None).unwrap();
        }
        let dests = broker.publish("t", &Envelope::new(key)).unwrap();
        prop_assert_eq!(dests.iter().collect::<Vec<_>>(), vec!["only"]);
    }
}
