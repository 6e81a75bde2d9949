//! Needs a broker on localhost:29092, run with `--ignored`.
mod common;

use std::time::{SystemTime, UNIX_EPOCH};

use common::*;

use kjoin::config::StoreConfig;
use kjoin::format::JSON;
use kjoin::store::ChangelogStore;
use kjoin::{joiner, Config, JoinPolicy, KVStore};

fn cfg() -> Config {
    Config::new()
        .set("bootstrap.servers", "localhost:29092")
        .set("auto.offset.reset", "earliest")
}

fn fresh_store_name() -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
    format!("join_waitlist-{}", nanos)
}

type Waitlist = ChangelogStore<JSON<u64>, JSON<Thing>>;

#[tokio::test]
#[ignore]
async fn partial_groups_survive_restore() {
    init();
    let cfg = cfg();
    let name = fresh_store_name();

    // First start: the changelog topic doesn't exist until restore creates it.
    let store = Waitlist::restore(&cfg, StoreConfig::new(&name, 0)).await.unwrap();
    assert!(store.is_empty());
    let waitlist = joiner(
        JoinPolicy::new(|t: &Thing| t.thing_id, merge_things, things_both_there),
        store,
    )
    .unwrap();
    assert_eq!(waitlist.process(Thing::one(1, "one fish")).await.unwrap(), None);
    assert_eq!(waitlist.process(Thing::one(2, "sam")).await.unwrap(), None);
    waitlist.store().delete(&2).await.unwrap();

    let restored = Waitlist::restore(&cfg, StoreConfig::new(&name, 0)).await.unwrap();
    assert_eq!(restored.len(), 1);
    assert_eq!(restored.get(&1).await.unwrap(), Some(Thing::one(1, "one fish")));
    assert_eq!(restored.get(&2).await.unwrap(), None);

    let resumed = joiner(
        JoinPolicy::new(|t: &Thing| t.thing_id, merge_things, things_both_there),
        restored,
    )
    .unwrap();
    let done = resumed.process(Thing::two(1, "two fish")).await.unwrap();
    assert!(done.map(|t| things_both_there(&t)).unwrap_or(false));
}
