// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph-thread action queue and background task runner.
//!
//! The graph is owned by one thread. Background work runs on a tokio
//! runtime, at most `max_background_tasks` at a time, and hands its result
//! back as a queued action. Queued actions only ever see the graph inside
//! [`Dispatcher::drain`] or [`Dispatcher::wait`], on the owning thread.

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::node::{Edit, NodeId};
use crate::nodes::{FileFilter, FileNode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};

/// Work queued to run against the graph
pub type GraphAction = Box<dyn FnOnce(&mut Graph) + Send>;

/// Dispatcher settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Background tasks allowed to run at once
    pub max_background_tasks: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_background_tasks: 8,
        }
    }
}

/// Error from the dispatcher
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The dispatcher no longer accepts actions
    #[error("dispatcher has shut down")]
    Closed,

    /// The background runtime could not be started
    #[error("failed to start background runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Cloneable handle for queueing graph actions from any thread
#[derive(Clone)]
pub struct DispatchHandle {
    tx: mpsc::UnboundedSender<GraphAction>,
}

impl DispatchHandle {
    /// Queue an action to run on the graph thread
    pub fn queue(
        &self,
        action: impl FnOnce(&mut Graph) + Send + 'static,
    ) -> std::result::Result<(), DispatchError> {
        self.tx
            .send(Box::new(action))
            .map_err(|_| DispatchError::Closed)
    }
}

impl fmt::Debug for DispatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchHandle")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Owns the background runtime and the graph-thread queue
pub struct Dispatcher {
    runtime: tokio::runtime::Runtime,
    permits: Arc<Semaphore>,
    tx: mpsc::UnboundedSender<GraphAction>,
    rx: mpsc::UnboundedReceiver<GraphAction>,
    /// Background tasks whose completion has not run yet
    pending: Arc<AtomicUsize>,
}

impl Dispatcher {
    /// Start a dispatcher
    pub fn new(config: DispatcherConfig) -> std::result::Result<Self, DispatchError> {
        let limit = config.max_background_tasks.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(limit.min(4))
            .max_blocking_threads(limit)
            .thread_name("wireflow-worker")
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        tracing::debug!(max_background_tasks = limit, "dispatcher started");
        Ok(Self {
            runtime,
            permits: Arc::new(Semaphore::new(limit)),
            tx,
            rx,
            pending: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Handle for queueing actions from other threads
    pub fn handle(&self) -> DispatchHandle {
        DispatchHandle {
            tx: self.tx.clone(),
        }
    }

    /// Run `work` in the background, then `complete` with its output on the
    /// graph thread
    pub fn run_async<W, T, C>(&self, work: W, complete: C)
    where
        W: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
        C: FnOnce(&mut Graph, T) + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        let pending = Arc::clone(&self.pending);
        let tx = self.tx.clone();
        pending.fetch_add(1, Ordering::AcqRel);

        self.runtime.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let output = tokio::task::spawn_blocking(work).await;
            let action: GraphAction = Box::new(move |graph| {
                pending.fetch_sub(1, Ordering::AcqRel);
                match output {
                    Ok(value) => complete(graph, value),
                    Err(err) => tracing::warn!(error = %err, "background task failed"),
                }
            });
            if tx.send(action).is_err() {
                tracing::debug!("dispatcher closed before a background task finished");
            }
        });
    }

    /// Run every queued action; returns how many ran
    pub fn drain(&mut self, graph: &mut Graph) -> usize {
        let mut ran = 0;
        while let Ok(action) = self.rx.try_recv() {
            action(graph);
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, "drained graph actions");
        }
        ran
    }

    /// Block until every background task has completed, running actions as
    /// they arrive
    pub fn wait(&mut self, graph: &mut Graph) -> usize {
        let mut ran = self.drain(graph);
        while self.in_flight() > 0 {
            match self.runtime.block_on(self.rx.recv()) {
                Some(action) => {
                    action(graph);
                    ran += 1;
                }
                None => break,
            }
        }
        ran + self.drain(graph)
    }

    /// Background tasks whose completion has not run yet
    pub fn in_flight(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// Stop the runtime, dropping anything still queued
    pub fn shutdown(self) {
        let dropped = self.in_flight();
        self.runtime.shutdown_timeout(Duration::from_secs(1));
        tracing::debug!(dropped, "dispatcher shut down");
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("in_flight", &self.in_flight())
            .field("available_permits", &self.permits.available_permits())
            .finish_non_exhaustive()
    }
}

/// Something that can ask the user for a file, blocking until they answer
pub trait FileChooser: Send + Sync {
    /// Returns the chosen path, or `None` when the user cancels
    fn choose(&self, filters: &[FileFilter]) -> Option<PathBuf>;
}

/// Start choosing a file for a File node.
///
/// The choice runs in the background and is applied to the node when the
/// dispatcher is drained. Returns `false` when the node is already busy.
pub fn open_file(
    graph: &mut Graph,
    node: NodeId,
    dispatcher: &Dispatcher,
    chooser: Arc<dyn FileChooser>,
) -> Result<bool> {
    graph.entry(node)?;
    let file = graph.node_as_mut::<FileNode>(node).ok_or_else(|| {
        GraphError::InvariantViolation(format!("{node:?} is not a file node"))
    })?;
    if !file.begin_choose() {
        return Ok(false);
    }
    let filters = file.filters().to_vec();

    dispatcher.run_async(
        move || chooser.choose(&filters),
        move |graph, chosen| {
            if let Err(err) = graph.edit(node, Edit::FileChosen(chosen)) {
                tracing::warn!(node = ?node, error = %err, "could not apply file choice");
            }
        },
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::nodes::OutputNode;
    use crate::socket::{SinkRef, SourceRef};
    use crate::value::Value;
    use std::sync::atomic::AtomicBool;

    struct Fixed(Option<PathBuf>);

    impl FileChooser for Fixed {
        fn choose(&self, _filters: &[FileFilter]) -> Option<PathBuf> {
            self.0.clone()
        }
    }

    #[test]
    fn test_completion_runs_only_when_drained() {
        let mut dispatcher = Dispatcher::new(DispatcherConfig::default()).unwrap();
        let mut graph = Graph::new();
        let ran = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&ran);
        dispatcher.run_async(
            || 41 + 1,
            move |graph, answer| {
                assert_eq!(answer, 42);
                graph.add_node(NodeKind::Output, [0.0, 0.0]);
                flag.store(true, Ordering::SeqCst);
            },
        );
        std::thread::sleep(Duration::from_millis(50));
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(graph.node_count(), 0);

        assert_eq!(dispatcher.wait(&mut graph), 1);
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(dispatcher.in_flight(), 0);
        dispatcher.shutdown();
    }

    #[test]
    fn test_handle_queues_actions() {
        let mut dispatcher = Dispatcher::new(DispatcherConfig {
            max_background_tasks: 2,
        })
        .unwrap();
        let mut graph = Graph::new();
        let handle = dispatcher.handle();
        std::thread::spawn(move || {
            handle
                .queue(|graph| {
                    graph.add_node(NodeKind::Input, [0.0, 0.0]);
                })
                .unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(dispatcher.drain(&mut graph), 1);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_open_file_applies_choice() {
        let mut dispatcher = Dispatcher::new(DispatcherConfig::default()).unwrap();
        let mut graph = Graph::new();
        let file = graph.add_node(NodeKind::File, [0.0, 0.0]);
        let output = graph.add_node(NodeKind::Output, [100.0, 0.0]);
        graph
            .connect(SourceRef::new(file, 0), SinkRef::new(output, 0))
            .unwrap();

        let chooser = Arc::new(Fixed(Some(PathBuf::from("scores.csv"))));
        assert!(open_file(&mut graph, file, &dispatcher, chooser.clone()).unwrap());
        // a second request while the first is in flight is ignored
        assert!(!open_file(&mut graph, file, &dispatcher, chooser).unwrap());

        dispatcher.wait(&mut graph);
        let shown = graph.node_as::<OutputNode>(output).unwrap();
        assert_eq!(shown.value(), Some(&Value::Text("scores.csv".to_string())));
        assert!(!graph.node_as::<FileNode>(file).unwrap().is_choosing());
    }

    #[test]
    fn test_open_file_rejects_other_kinds() {
        let dispatcher = Dispatcher::new(DispatcherConfig::default()).unwrap();
        let mut graph = Graph::new();
        let input = graph.add_node(NodeKind::Input, [0.0, 0.0]);
        let err = open_file(&mut graph, input, &dispatcher, Arc::new(Fixed(None))).unwrap_err();
        assert!(err.is_invariant_violation());
    }
}
