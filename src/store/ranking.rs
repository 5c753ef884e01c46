use crate::error::{Error, Result};
use crate::store::record::{OrderBy, UrlRecord};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

const COMMAND_BUFFER: usize = 100;

/// Index key for the by-count view. Lexicographic `Ord` over
/// (count, last_seen, url) means reverse iteration yields descending count
/// with ties resolved by the most recent `last_seen`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct CountKey {
    count: u64,
    last_seen: DateTime<Utc>,
    url: String,
}

/// Index key for the by-recency view: descending `last_seen`, ties resolved
/// by higher count.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RecencyKey {
    last_seen: DateTime<Utc>,
    count: u64,
    url: String,
}

/// The record table plus both ranking views. Owned by exactly one actor task;
/// never touched concurrently. The index sets are derived from the table and
/// kept in lockstep: every mutation removes the old keys, applies the change,
/// and inserts the new keys, so no query can observe a half-applied update.
#[derive(Default)]
struct RankingState {
    records: HashMap<String, UrlRecord>,
    by_count: BTreeSet<CountKey>,
    by_recency: BTreeSet<RecencyKey>,
}

impl RankingState {
    fn count_key(record: &UrlRecord) -> CountKey {
        CountKey {
            count: record.count,
            last_seen: record.last_seen,
            url: record.url.clone(),
        }
    }

    fn recency_key(record: &UrlRecord) -> RecencyKey {
        RecencyKey {
            last_seen: record.last_seen,
            count: record.count,
            url: record.url.clone(),
        }
    }

    /// Applies one fetch outcome. A failure for a URL with no existing record
    /// is discarded: unverified URLs are not tracked until proven reachable.
    fn apply(&mut self, url: &str, success: bool, latency_ms: u64, now: DateTime<Utc>) {
        if let Some(record) = self.records.get_mut(url) {
            log::debug!("store: updating existing url: {}", url);
            self.by_count.remove(&Self::count_key(record));
            self.by_recency.remove(&Self::recency_key(record));

            if success {
                record.successes += 1;
                record.last_latency_ms = latency_ms;
            } else {
                record.failures += 1;
            }
            record.count += 1;
            record.last_seen = now;

            self.by_count.insert(Self::count_key(record));
            self.by_recency.insert(Self::recency_key(record));
        } else if success {
            log::debug!("store: adding new url: {}", url);
            let record = UrlRecord::new(url.to_string(), latency_ms, now);
            self.by_count.insert(Self::count_key(&record));
            self.by_recency.insert(Self::recency_key(&record));
            self.records.insert(url.to_string(), record);
        } else {
            log::debug!("store: discarding failure for untracked url: {}", url);
        }
    }

    /// Read-only top-N selection: reverse iteration over the relevant index
    /// set. Leaves both views untouched.
    fn top(&self, n: usize, order: OrderBy) -> Result<Vec<UrlRecord>> {
        if n == 0 {
            return Err(Error::InvalidArgument(
                "top-n must be positive".to_string(),
            ));
        }

        let urls: Vec<&str> = match order {
            OrderBy::Count => self
                .by_count
                .iter()
                .rev()
                .take(n)
                .map(|k| k.url.as_str())
                .collect(),
            OrderBy::Recency => self
                .by_recency
                .iter()
                .rev()
                .take(n)
                .map(|k| k.url.as_str())
                .collect(),
        };

        Ok(urls
            .into_iter()
            .filter_map(|url| self.records.get(url).cloned())
            .collect())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

enum Command {
    Update {
        url: String,
        success: bool,
        latency_ms: u64,
        reply: oneshot::Sender<()>,
    },
    Top {
        n: usize,
        order: OrderBy,
        reply: oneshot::Sender<Result<Vec<UrlRecord>>>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
}

fn handle_command(state: &mut RankingState, command: Command) {
    match command {
        Command::Update {
            url,
            success,
            latency_ms,
            reply,
        } => {
            state.apply(&url, success, latency_ms, Utc::now());
            let _ = reply.send(());
        }
        Command::Top { n, order, reply } => {
            let _ = reply.send(state.top(n, order));
        }
        Command::Len { reply } => {
            let _ = reply.send(state.len());
        }
    }
}

struct StoreControl {
    stop: Option<oneshot::Sender<()>>,
    actor: Option<JoinHandle<()>>,
}

/// Handle to the ranking store actor. All mutations and ranked reads funnel
/// through one command channel consumed by a single task, so both views stay
/// linearizable with respect to the acknowledged command stream.
#[derive(Clone)]
pub struct RankingStore {
    tx: mpsc::Sender<Command>,
    control: Arc<Mutex<StoreControl>>,
}

impl RankingStore {
    /// Spawns the actor task and returns a cloneable handle.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::channel(COMMAND_BUFFER);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let actor = tokio::spawn(async move {
            let mut state = RankingState::default();
            loop {
                tokio::select! {
                    command = rx.recv() => match command {
                        Some(command) => handle_command(&mut state, command),
                        None => break,
                    },
                    _ = &mut stop_rx => {
                        // Refuse new commands, then drain what was accepted.
                        rx.close();
                        while let Some(command) = rx.recv().await {
                            handle_command(&mut state, command);
                        }
                        break;
                    }
                }
            }
            log::debug!("store: actor exiting");
        });

        Self {
            tx,
            control: Arc::new(Mutex::new(StoreControl {
                stop: Some(stop_tx),
                actor: Some(actor),
            })),
        }
    }

    /// Applies one fetch outcome. Returns once the mutation is visible to
    /// subsequent `top` queries.
    pub async fn update(&self, url: &str, success: bool, latency_ms: u64) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Update {
                url: url.to_string(),
                success,
                latency_ms,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::StoreClosed)?;
        reply_rx.await.map_err(|_| Error::StoreClosed)
    }

    /// Returns at most `n` records in the given order. Non-destructive:
    /// repeated calls with no intervening update return identical results.
    pub async fn top(&self, n: usize, order: OrderBy) -> Result<Vec<UrlRecord>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Top {
                n,
                order,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::StoreClosed)?;
        reply_rx.await.map_err(|_| Error::StoreClosed)?
    }

    /// Number of tracked URLs.
    pub async fn len(&self) -> Result<usize> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Len { reply: reply_tx })
            .await
            .map_err(|_| Error::StoreClosed)?;
        reply_rx.await.map_err(|_| Error::StoreClosed)
    }

    /// Stops the actor. Commands already accepted are still processed; calls
    /// made afterwards observe `StoreClosed`. Idempotent.
    pub async fn shutdown(&self) {
        log::info!("store: attempting graceful shutdown");
        let (stop, actor) = {
            let mut guard = self.control.lock().await;
            (guard.stop.take(), guard.actor.take())
        };
        if let Some(stop) = stop {
            let _ = stop.send(());
        }
        if let Some(actor) = actor {
            let _ = actor.await;
        }
        log::info!("store: shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn counter_invariant_holds_after_mixed_updates() {
        let mut state = RankingState::default();
        state.apply("http://a.test", true, 100, at(1));
        state.apply("http://a.test", false, 0, at(2));
        state.apply("http://a.test", true, 80, at(3));
        state.apply("http://a.test", false, 0, at(4));

        let record = state.records.get("http://a.test").unwrap();
        assert_eq!(record.count, 4);
        assert_eq!(record.successes, 2);
        assert_eq!(record.failures, 2);
        assert_eq!(record.count, record.successes + record.failures);
    }

    #[test]
    fn failure_for_unknown_url_creates_no_record() {
        let mut state = RankingState::default();
        state.apply("http://ghost.test", false, 0, at(1));

        assert_eq!(state.len(), 0);
        assert!(state.top(10, OrderBy::Count).unwrap().is_empty());
        assert!(state.top(10, OrderBy::Recency).unwrap().is_empty());
    }

    #[test]
    fn failure_updates_last_seen_but_not_latency() {
        let mut state = RankingState::default();
        state.apply("http://a.test", true, 100, at(1));
        state.apply("http://a.test", false, 0, at(2));

        let record = state.records.get("http://a.test").unwrap();
        assert_eq!(record.last_latency_ms, 100);
        assert_eq!(record.last_seen, at(2));
    }

    #[test]
    fn top_is_non_destructive() {
        let mut state = RankingState::default();
        state.apply("http://a.test", true, 100, at(1));
        state.apply("http://b.test", true, 50, at(2));

        let first = state.top(2, OrderBy::Count).unwrap();
        let second = state.top(2, OrderBy::Count).unwrap();
        assert_eq!(first, second);

        // An unrelated update must not evict previously listed entries.
        state.apply("http://c.test", true, 10, at(3));
        let third = state.top(3, OrderBy::Count).unwrap();
        assert!(third.iter().any(|r| r.url == "http://a.test"));
        assert!(third.iter().any(|r| r.url == "http://b.test"));
        assert!(third.iter().any(|r| r.url == "http://c.test"));
    }

    #[test]
    fn top_orders_by_count_with_recency_tiebreak() {
        let mut state = RankingState::default();
        // Counts end up [5, 3, 3, 1]; the two 3s differ in last_seen.
        for i in 0..5 {
            state.apply("http://five.test", true, 10, at(10 + i));
        }
        for i in 0..3 {
            state.apply("http://three-old.test", true, 10, at(20 + i));
        }
        for i in 0..3 {
            state.apply("http://three-new.test", true, 10, at(30 + i));
        }
        state.apply("http://one.test", true, 10, at(40));

        let top = state.top(4, OrderBy::Count).unwrap();
        let urls: Vec<&str> = top.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "http://five.test",
                "http://three-new.test",
                "http://three-old.test",
                "http://one.test"
            ]
        );
    }

    #[test]
    fn top_orders_by_recency_with_count_tiebreak() {
        let mut state = RankingState::default();
        state.apply("http://a.test", true, 10, at(1));
        state.apply("http://b.test", true, 10, at(2));
        // Same timestamp: a has count 2, b has count 1.
        state.apply("http://a.test", true, 10, at(5));
        state.apply("http://c.test", true, 10, at(5));

        let top = state.top(3, OrderBy::Recency).unwrap();
        let urls: Vec<&str> = top.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["http://a.test", "http://c.test", "http://b.test"]
        );
    }

    #[test]
    fn top_returns_fewer_when_store_is_small() {
        let mut state = RankingState::default();
        state.apply("http://a.test", true, 10, at(1));
        assert_eq!(state.top(100, OrderBy::Count).unwrap().len(), 1);
    }

    #[test]
    fn top_rejects_zero_n() {
        let state = RankingState::default();
        assert!(matches!(
            state.top(0, OrderBy::Count),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn end_to_end_ordering_scenario() {
        let mut state = RankingState::default();
        state.apply("http://a.test", true, 100, at(1));
        state.apply("http://b.test", true, 50, at(2));
        state.apply("http://a.test", true, 120, at(3));

        let by_count = state.top(2, OrderBy::Count).unwrap();
        assert_eq!(by_count[0].url, "http://a.test");
        assert_eq!(by_count[0].count, 2);
        assert_eq!(by_count[1].url, "http://b.test");
        assert_eq!(by_count[1].count, 1);

        let by_recency = state.top(2, OrderBy::Recency).unwrap();
        assert_eq!(by_recency[0].url, "http://a.test");
        assert_eq!(by_recency[1].url, "http://b.test");
    }

    #[tokio::test]
    async fn concurrent_updates_to_one_url_are_all_applied() {
        let store = RankingStore::spawn();
        store.update("http://a.test", true, 10).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update("http://a.test", i % 2 == 0, 10).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let top = store.top(1, OrderBy::Count).await.unwrap();
        assert_eq!(top[0].count, 51);
        assert_eq!(top[0].successes + top[0].failures, 51);
    }

    #[tokio::test]
    async fn update_is_visible_to_subsequent_top() {
        let store = RankingStore::spawn();
        store.update("http://a.test", true, 42).await.unwrap();

        let top = store.top(1, OrderBy::Count).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].last_latency_ms, 42);
        assert_eq!(store.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn calls_after_shutdown_observe_store_closed() {
        let store = RankingStore::spawn();
        store.update("http://a.test", true, 10).await.unwrap();

        store.shutdown().await;

        assert!(matches!(
            store.update("http://a.test", true, 10).await,
            Err(Error::StoreClosed)
        ));
        assert!(matches!(
            store.top(1, OrderBy::Count).await,
            Err(Error::StoreClosed)
        ));
        // Shutdown is idempotent.
        store.shutdown().await;
    }
}
