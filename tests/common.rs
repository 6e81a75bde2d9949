#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// One part of a thing, fanned out to two producers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thing {
    pub thing_id: u64,
    pub thing_one: Option<String>,
    pub thing_two: Option<String>,
}

impl Thing {
    pub fn one(thing_id: u64, v: &str) -> Thing {
        Thing { thing_id, thing_one: Some(v.to_string()), thing_two: None }
    }

    pub fn two(thing_id: u64, v: &str) -> Thing {
        Thing { thing_id, thing_one: None, thing_two: Some(v.to_string()) }
    }
}

pub fn merge_things(incoming: Thing, accumulated: Thing) -> Thing {
    Thing {
        thing_id: incoming.thing_id,
        thing_one: incoming.thing_one.or(accumulated.thing_one),
        thing_two: incoming.thing_two.or(accumulated.thing_two),
    }
}

pub fn things_both_there(thing: &Thing) -> bool {
    thing.thing_one.is_some() && thing.thing_two.is_some()
}

/// Accumulator distinct from the message type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stored {
    pub thing: Thing,
    pub parts: usize,
}

impl From<Thing> for Stored {
    fn from(thing: Thing) -> Self {
        Stored { thing, parts: 1 }
    }
}

/// Shared call counter for spying on policy functions.
#[derive(Clone, Default)]
pub struct Calls(Rc<Cell<usize>>);

impl Calls {
    pub fn hit(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn count(&self) -> usize {
        self.0.get()
    }
}
