use futures::stream::{self, TryStreamExt};
use serde::{Deserialize, Serialize};

use kjoin::store::InMemory;
use kjoin::{joiner, JoinPolicy, JoinStreamExt, JoinedStreamExt, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SuessThing {
    thing_id: u64,
    thing_one: Option<String>,
    thing_two: Option<String>,
}

fn merge_things(incoming: SuessThing, accumulated: SuessThing) -> SuessThing {
    SuessThing {
        thing_id: incoming.thing_id,
        thing_one: incoming.thing_one.or(accumulated.thing_one),
        thing_two: incoming.thing_two.or(accumulated.thing_two),
    }
}

fn things_both_there(thing: &SuessThing) -> bool {
    thing.thing_one.is_some() && thing.thing_two.is_some()
}

fn part(thing_id: u64, one: Option<&str>, two: Option<&str>) -> SuessThing {
    SuessThing {
        thing_id,
        thing_one: one.map(str::to_string),
        thing_two: two.map(str::to_string),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), StoreError> {
    std::env::set_var("RUST_LOG", "kjoin=trace,suess=info");
    env_logger::init();

    let policy = JoinPolicy::new(|t: &SuessThing| t.thing_id, merge_things, things_both_there)
        .on_complete(|t: SuessThing| {
            log::info!("Doing things with: {:?}", t);
            t.thing_id
        })
        .on_incomplete(|t| log::info!("INSUFFICIENT: {:?}", t));
    let suess = match joiner(policy, InMemory::new()) {
        Ok(suess) => suess,
        Err(e) => {
            log::error!("{}", e);
            return Ok(());
        }
    };

    // Two producers, each contributing half of every thing.
    let topic = stream::iter(vec![
        part(1, Some("one fish"), None),
        part(2, Some("sam"), None),
        part(1, None, Some("two fish")),
        part(2, None, Some("I am")),
    ]);

    let done: Vec<u64> = topic.join_with(&suess).completed().try_collect().await?;
    log::info!("Completed things {:?}", done);
    Ok(())
}
