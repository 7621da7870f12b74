//! Keyed async tasks that report back as actions
//!
//! Every task resolves to exactly one [`Action`] sent on the controller's
//! channel, unless it is cancelled first. Spawning with a key that is
//! already running cancels the earlier task; the debounced variant waits
//! before starting so rapid re-spawns only run the last one.
//!
//! Prediction tasks use a key per issued lookup (coordinate key plus epoch),
//! so they never cancel each other.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::action::Action;
use crate::cache::Epoch;
use crate::coordinate::CoordinateKey;

/// Identifies a task for cancellation and replacement.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TaskKey(String);

impl TaskKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Key for the remote call of one issued lookup
    pub fn prediction(key: &CoordinateKey, epoch: Epoch) -> Self {
        Self(format!("prediction:{}@{}", key, epoch.value()))
    }

    /// Key shared by all location searches
    pub fn search() -> Self {
        Self::new("search")
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for TaskKey {
    fn from(s: &'static str) -> Self {
        Self::new(s)
    }
}

pub struct TaskManager {
    tasks: HashMap<TaskKey, AbortHandle>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl TaskManager {
    pub fn new(action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            tasks: HashMap::new(),
            action_tx,
        }
    }

    /// Spawn a task, cancelling any existing task with the same key.
    pub fn spawn<F>(&mut self, key: impl Into<TaskKey>, future: F) -> &mut Self
    where
        F: Future<Output = Action> + Send + 'static,
    {
        let key = key.into();
        self.cancel(&key);

        let tx = self.action_tx.clone();
        let handle = tokio::spawn(async move {
            let action = future.await;
            // Receiver dropped means the controller is gone
            let _ = tx.send(action);
        });

        tracing::trace!(task = %key, "spawned task");
        self.tasks.insert(key, handle.abort_handle());
        self
    }

    /// Spawn after `duration`; re-spawning the key before then restarts the wait.
    pub fn debounce<F>(&mut self, key: impl Into<TaskKey>, duration: Duration, future: F) -> &mut Self
    where
        F: Future<Output = Action> + Send + 'static,
    {
        self.spawn(key, async move {
            tokio::time::sleep(duration).await;
            future.await
        })
    }

    /// Cancel a task by key. No-op if the key is unknown.
    pub fn cancel(&mut self, key: &TaskKey) {
        if let Some(handle) = self.tasks.remove(key) {
            handle.abort();
        }
    }

    /// Abort every task; none of them will report back.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.tasks.drain() {
            handle.abort();
        }
    }

    /// Forget finished tasks and return how many are still running.
    pub fn running(&mut self) -> usize {
        self.tasks.retain(|_, handle| !handle.is_finished());
        self.tasks.len()
    }

    /// Whether `key` is spawned and not yet finished
    pub fn is_running(&self, key: &TaskKey) -> bool {
        self.tasks
            .get(key)
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn running_keys(&self) -> impl Iterator<Item = &TaskKey> {
        self.tasks
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(key, _)| key)
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Lookup, PredictionCache};
    use crate::coordinate::Coordinate;
    use crate::prediction::PredictionRecord;

    fn issue(cache: &mut PredictionCache, coordinate: Coordinate) -> Epoch {
        match cache.lookup(coordinate) {
            Lookup::Issued { epoch } => epoch,
            other => panic!("expected an issued lookup, got {:?}", other),
        }
    }

    fn loaded(key: CoordinateKey, epoch: Epoch) -> Action {
        Action::PredictionDidLoad {
            key,
            epoch,
            record: PredictionRecord::default(),
        }
    }

    fn searched(query: &str) -> Action {
        Action::SearchDidLoad {
            query: query.to_string(),
            places: vec![],
        }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Action>) -> Action {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("no action arrived")
            .expect("channel closed")
    }

    #[test]
    fn test_task_keys() {
        let key = Coordinate::new(19.1, 72.9).key();
        assert_eq!(
            TaskKey::prediction(&key, Epoch::default()).name(),
            "prediction:19.100000,72.900000@0"
        );
        assert_eq!(TaskKey::from("search"), TaskKey::search());
    }

    #[tokio::test]
    async fn test_prediction_task_reports_its_lookup() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        let mut cache = PredictionCache::new();
        let c = Coordinate::new(19.076, 72.8777);
        let epoch = issue(&mut cache, c);

        tasks.spawn(TaskKey::prediction(&c.key(), epoch), async move {
            loaded(c.key(), epoch)
        });

        match next(&mut rx).await {
            Action::PredictionDidLoad { key, epoch: got, .. } => {
                assert_eq!(key, c.key());
                assert_eq!(got, epoch);
            }
            other => panic!("unexpected action {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_new_generation_does_not_cancel_old_lookup() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        let mut cache = PredictionCache::new();
        let c = Coordinate::new(19.1, 72.9);

        let old = issue(&mut cache, c);
        cache.clear_generation([c.key()]);
        let new = issue(&mut cache, c);
        assert_ne!(TaskKey::prediction(&c.key(), old), TaskKey::prediction(&c.key(), new));

        for epoch in [old, new] {
            tasks.spawn(TaskKey::prediction(&c.key(), epoch), async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                loaded(c.key(), epoch)
            });
        }
        assert_eq!(tasks.running(), 2);

        let mut epochs = Vec::new();
        for _ in 0..2 {
            if let Action::PredictionDidLoad { epoch, .. } = next(&mut rx).await {
                epochs.push(epoch.value());
            }
        }
        epochs.sort();
        assert_eq!(epochs, vec![old.value(), new.value()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_debounce_runs_last_query_only() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        let debounce = Duration::from_millis(300);

        for query in ["B", "Ba", "Bandra"] {
            tasks.debounce(TaskKey::search(), debounce, async move { searched(query) });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        match next(&mut rx).await {
            Action::SearchDidLoad { query, .. } => assert_eq!(query, "Bandra"),
            other => panic!("unexpected action {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_search_never_reports() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);

        tasks.debounce(TaskKey::search(), Duration::from_millis(300), async {
            searched("Colaba")
        });
        assert!(tasks.is_running(&TaskKey::search()));

        tasks.cancel(&TaskKey::search());
        assert_eq!(tasks.running(), 0);

        let result = tokio::time::timeout(Duration::from_secs(1), rx.recv()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_cancel_all_stops_predictions_and_search() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        let c = Coordinate::new(19.2, 72.95);
        let key = TaskKey::prediction(&c.key(), Epoch::default());

        tasks.spawn(key.clone(), async move {
            std::future::pending::<()>().await;
            loaded(c.key(), Epoch::default())
        });
        tasks.debounce(TaskKey::search(), Duration::from_secs(10), async {
            searched("Worli")
        });

        let mut keys: Vec<_> = tasks.running_keys().map(TaskKey::name).collect();
        keys.sort();
        assert_eq!(keys, vec![key.name(), "search"]);

        tasks.cancel_all();
        assert_eq!(tasks.running(), 0);
    }

    #[tokio::test]
    async fn test_running_forgets_finished_tasks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = TaskManager::new(tx);
        let c = Coordinate::new(19.0, 72.8);

        tasks.spawn(TaskKey::prediction(&c.key(), Epoch::default()), async move {
            loaded(c.key(), Epoch::default())
        });
        next(&mut rx).await;
        // the send happens just before the task completes
        while tasks.running() > 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(tasks.running_keys().count(), 0);
    }
}
