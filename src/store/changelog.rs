use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::{Mutex, MutexGuard, PoisonError};

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::{Offset, TopicPartitionList};

use crate::config::{Config, StoreConfig};
use crate::error::StoreError;
use crate::format::Format;
use crate::store::KVStore;

/// Whether a failed metadata lookup means the changelog has no records yet.
fn missing_changelog(err: &KafkaError) -> bool {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::UnknownTopicOrPartition)
        | Some(RDKafkaErrorCode::UnknownTopic)
        | Some(RDKafkaErrorCode::UnknownPartition) => true,
        _ => false,
    }
}

/// Creates the compacted changelog topic, with enough partitions to hold
/// `cfg.partition`. An existing topic is left as it is.
async fn ensure_topic(config: &Config, cfg: &StoreConfig) -> Result<(), StoreError> {
    let admin: AdminClient<DefaultClientContext> = config.0.create()?;
    let topic = NewTopic::new(&cfg.topic, cfg.partition + 1, TopicReplication::Fixed(cfg.replication))
        .set("cleanup.policy", "compact");
    let options = AdminOptions::new().operation_timeout(Some(cfg.timeout));
    for result in admin.create_topics(&[topic], &options).await? {
        match result {
            Ok(name) => info!("Created changelog topic {}", name),
            Err((_, RDKafkaErrorCode::TopicAlreadyExists)) => {}
            Err((name, code)) => {
                error!("Creating changelog topic {} failed: {}", name, code);
                return Err(StoreError::Kafka(KafkaError::AdminOp(code)));
            }
        }
    }
    Ok(())
}

/// Reads one changelog partition from the beginning.
struct ChangelogConsumer {
    cfg: StoreConfig,
    base: StreamConsumer,
}

impl ChangelogConsumer {
    fn new(config: &Config, cfg: &StoreConfig) -> Result<Self, StoreError> {
        let group = format!("{}-restore", cfg.topic);
        let config = config
            .clone()
            .set_group(&group)
            .set("enable.auto.commit", "false");
        let base: StreamConsumer = config.0.create()?;

        let mut list = TopicPartitionList::new();
        list.add_partition_offset(&cfg.topic, cfg.partition, Offset::Beginning)?;
        base.assign(&list)?;

        Ok(ChangelogConsumer { cfg: cfg.clone(), base })
    }

    /// Replays records up to the high watermark seen when called. Later records
    /// can only come from this instance's own writes.
    async fn replay<KF, VF>(&self, state: &mut HashMap<KF::Item, VF::Item>) -> Result<usize, StoreError>
        where KF: Format,
              VF: Format,
              KF::Item: Hash + Eq
    {
        let (low, high) = match self.base.fetch_watermarks(&self.cfg.topic, self.cfg.partition, self.cfg.timeout) {
            Ok(watermarks) => watermarks,
            Err(e) if missing_changelog(&e) => {
                trace!("Changelog {} not visible yet, starting empty", self.cfg.topic);
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };
        trace!("Loading changelog {} [{}, {})", self.cfg.topic, low, high);
        let mut applied = 0;
        if high <= low {
            return Ok(applied);
        }
        loop {
            let message = self.base.recv().await?;
            if message.partition() != self.cfg.partition {
                return Err(StoreError::Restore(format!(
                    "record from partition {} while restoring partition {}",
                    message.partition(),
                    self.cfg.partition
                )));
            }
            let key = match message.key() {
                Some(key) => KF::deserialize(key)?,
                None => {
                    return Err(StoreError::Restore(format!(
                        "keyless record at offset {}",
                        message.offset()
                    )))
                }
            };
            match message.payload() {
                Some(payload) => {
                    state.insert(key, VF::deserialize(payload)?);
                }
                None => {
                    state.remove(&key);
                }
            }
            applied += 1;
            if message.offset() + 1 >= high {
                return Ok(applied);
            }
        }
    }
}

/// Store materialized from a compacted changelog topic.
///
/// Every write goes to the changelog first and only lands in the local map
/// once the broker acknowledged it, so a failed `put` leaves the previous
/// value in place.
pub struct ChangelogStore<KF: Format, VF: Format> {
    cfg: StoreConfig,
    producer: FutureProducer,
    state: Mutex<HashMap<KF::Item, VF::Item>>,
    _marker: PhantomData<(KF, VF)>,
}

impl<KF, VF> ChangelogStore<KF, VF>
    where KF: Format,
          VF: Format,
          KF::Item: Hash + Eq
{
    pub async fn restore(config: &Config, cfg: StoreConfig) -> Result<Self, StoreError> {
        ensure_topic(config, &cfg).await?;
        let mut state = HashMap::new();
        let applied = ChangelogConsumer::new(config, &cfg)?
            .replay::<KF, VF>(&mut state)
            .await?;
        info!(
            "Restored {} keys from {} records of {}/{}",
            state.len(),
            applied,
            cfg.topic,
            cfg.partition
        );

        let producer: FutureProducer = config.0.create()?;
        Ok(ChangelogStore {
            cfg,
            producer,
            state: Mutex::new(state),
            _marker: PhantomData,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<KF::Item, VF::Item>>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Number of keys held, read through a poisoned lock.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn send(&self, key: &[u8], value: Option<&[u8]>) -> Result<(), StoreError> {
        let mut record = FutureRecord::<[u8], [u8]>::to(&self.cfg.topic)
            .partition(self.cfg.partition)
            .key(key);
        record.payload = value;
        self.producer
            .send(record, self.cfg.timeout)
            .await
            .map(|_| ())
            .map_err(|(e, _)| StoreError::Kafka(e))
    }
}

#[async_trait(? Send)]
impl<KF, VF> KVStore<KF::Item, VF::Item> for ChangelogStore<KF, VF>
    where KF: Format,
          VF: Format,
          KF::Item: Hash + Eq,
          VF::Item: Clone
{
    async fn get(&self, key: &KF::Item) -> Result<Option<VF::Item>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn put(&self, key: KF::Item, value: VF::Item) -> Result<Option<VF::Item>, StoreError> {
        let k = KF::serialize(&key)?;
        let v = VF::serialize(&value)?;
        trace!("Changelog put on {}/{}", self.cfg.topic, self.cfg.partition);
        self.send(&k, Some(&v)).await?;
        Ok(self.lock()?.insert(key, value))
    }

    async fn delete(&self, key: &KF::Item) -> Result<Option<VF::Item>, StoreError> {
        let k = KF::serialize(key)?;
        trace!("Changelog tombstone on {}/{}", self.cfg.topic, self.cfg.partition);
        self.send(&k, None).await?;
        Ok(self.lock()?.remove(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_topic_reads_as_empty_changelog() {
        assert!(missing_changelog(&KafkaError::MetadataFetch(RDKafkaErrorCode::UnknownTopicOrPartition)));
        assert!(missing_changelog(&KafkaError::MetadataFetch(RDKafkaErrorCode::UnknownTopic)));
        assert!(missing_changelog(&KafkaError::MetadataFetch(RDKafkaErrorCode::UnknownPartition)));
    }

    #[test]
    fn other_failures_are_not_an_empty_changelog() {
        assert!(!missing_changelog(&KafkaError::MetadataFetch(RDKafkaErrorCode::BrokerTransportFailure)));
        assert!(!missing_changelog(&KafkaError::MetadataFetch(RDKafkaErrorCode::OperationTimedOut)));
        assert!(!missing_changelog(&KafkaError::Canceled));
    }
}
