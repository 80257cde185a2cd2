//! The engine context.
//!
//! One [`Engine`] per host process owns every buffer, flag and registry.
//! The host hands it each commit through [`Engine::on_commit`]; remote
//! queries reach it through [`crate::protocol`]. Nothing here is global.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, info, warn};
use std::cell::Cell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};
use treescope_common::{
    ConsoleEntry, LogLevel, MatchedRecord, Measure, NetworkEntry, NodeDetails, RenderRecord,
    RenderReport, SnapshotNode, StateChangeRecord,
};

use crate::accessor;
use crate::analysis::build_report;
use crate::buffers::{
    BufferKind, ConsoleQuery, EventBuffers, NetworkQuery, RenderQuery, StateChangeQuery,
};
use crate::config::EngineConfig;
use crate::domain::{CommitId, Elapsed, PendingError, RendererId, Timestamp};
use crate::geometry::{GeometryBackend, MeasureCompletion};
use crate::host::{HostTree, NativeHandle};
use crate::network::{
    Interception, InterceptorChain, MockRegistry, OutboundRequest, RequestInterceptor,
};
use crate::pending::PendingRequests;
use crate::selector;
use crate::serializer::Serializer;
use crate::tracking::{process_commit, CommitStamp, ComponentFilter, ProfileOptions};

/// Source of record timestamps.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or_default();
        Timestamp(ms)
    }
}

/// A clock that only moves when told to. Used for replays and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    #[must_use]
    pub fn starting_at(ms: f64) -> Self {
        Self { now: Cell::new(ms) }
    }

    pub fn advance(&self, ms: f64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.now.get())
    }
}

impl<C: Clock> Clock for std::rc::Rc<C> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

struct ProfilingSession {
    filter: ComponentFilter,
    started: Timestamp,
}

pub struct Engine {
    config: EngineConfig,
    buffers: EventBuffers,
    mocks: MockRegistry,
    interceptors: InterceptorChain,
    clock: Box<dyn Clock>,
    commit: CommitId,
    profiling: Option<ProfilingSession>,
    /// Start and stop of the most recent profiling session
    last_session: Option<(Timestamp, Timestamp)>,
    subscribers: Vec<Sender<RenderRecord>>,
    measurements: PendingRequests<Option<Measure>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, Box::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(config: EngineConfig, clock: Box<dyn Clock>) -> Self {
        Self {
            buffers: EventBuffers::new(&config.buffers),
            mocks: MockRegistry::new(),
            interceptors: InterceptorChain::new(),
            clock,
            commit: CommitId::default(),
            profiling: None,
            last_session: None,
            subscribers: Vec::new(),
            measurements: PendingRequests::new(config.measure_timeout()),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn buffers(&self) -> &EventBuffers {
        &self.buffers
    }

    /// Commits processed so far
    #[must_use]
    pub fn last_commit(&self) -> CommitId {
        self.commit
    }

    // ------------------------------------------------------------------
    // Commit processing and profiling
    // ------------------------------------------------------------------

    /// Host commit callback. Never panics; a failing commit is logged and dropped.
    pub fn on_commit(&mut self, renderer: RendererId, tree: &HostTree) -> CommitId {
        self.commit = self.commit.next();
        let stamp = CommitStamp { commit: self.commit, timestamp: self.clock.now() };
        let filter = self.profiling.as_ref().map(|p| &p.filter);

        let processed = catch_unwind(AssertUnwindSafe(|| {
            process_commit(
                tree,
                stamp,
                filter,
                &self.config.capture,
                self.config.max_traversal_depth,
            )
        }));
        let output = match processed {
            Ok(output) => output,
            Err(_) => {
                warn!("{} from {renderer} panicked during tracking and was dropped", self.commit);
                return self.commit;
            }
        };

        debug!(
            "{} from {renderer}: {} renders, {} state changes, {} skipped nodes",
            self.commit,
            output.renders.len(),
            output.state_changes.len(),
            output.failures
        );
        for record in output.state_changes {
            self.buffers.push_state_change(record);
        }
        for record in output.renders {
            self.publish(&record);
            self.buffers.push_render(record);
        }
        self.commit
    }

    /// Start classifying renders. Clears previously recorded renders.
    pub fn start_profiling(&mut self, options: &ProfileOptions) {
        self.buffers.clear(BufferKind::Renders);
        let started = self.clock.now();
        self.profiling = Some(ProfilingSession { filter: ComponentFilter::from(options), started });
        self.last_session = None;
        info!("Profiling started");
    }

    /// Stop classifying renders and return the final report.
    /// Recorded renders stay queryable until the next start.
    pub fn stop_profiling(&mut self) -> RenderReport {
        if let Some(session) = self.profiling.take() {
            self.last_session = Some((session.started, self.clock.now()));
            info!("Profiling stopped after {} commits", self.commit.0);
        }
        self.render_report()
    }

    #[must_use]
    pub fn is_profiling(&self) -> bool {
        self.profiling.is_some()
    }

    #[must_use]
    pub fn render_report(&self) -> RenderReport {
        let elapsed = match (&self.profiling, self.last_session) {
            (Some(session), _) => self.clock.now().since(session.started),
            (None, Some((started, stopped))) => stopped.since(started),
            (None, None) => Elapsed::default(),
        };
        build_report(self.buffers.renders.iter(), elapsed)
    }

    /// Receive every render record as it is classified.
    ///
    /// Records are dropped for a subscriber whose channel is full; a
    /// subscriber whose receiver is gone is removed.
    pub fn subscribe_renders(&mut self, capacity: usize) -> Receiver<RenderRecord> {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        self.subscribers.push(sender);
        receiver
    }

    fn publish(&mut self, record: &RenderRecord) {
        self.subscribers.retain(|subscriber| match subscriber.try_send(record.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                debug!("Render subscriber is full, dropping record for {}", record.component);
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Render subscriber disconnected");
                false
            }
        });
    }

    // ------------------------------------------------------------------
    // Buffers
    // ------------------------------------------------------------------

    pub fn record_console(&mut self, level: LogLevel, message: impl Into<String>) -> u64 {
        let now = self.clock.now();
        self.buffers.push_console(now.0, level, message)
    }

    /// Store a network record. A missing (zero) timestamp is replaced with the current time.
    pub fn record_network(&mut self, mut entry: NetworkEntry) -> u64 {
        if entry.timestamp <= 0.0 {
            entry.timestamp = self.clock.now().0;
        }
        self.buffers.push_network(entry)
    }

    #[must_use]
    pub fn console(&self, query: &ConsoleQuery) -> Vec<ConsoleEntry> {
        self.buffers.console(query)
    }

    #[must_use]
    pub fn network(&self, query: &NetworkQuery) -> Vec<NetworkEntry> {
        self.buffers.network(query)
    }

    #[must_use]
    pub fn state_changes(&self, query: &StateChangeQuery) -> Vec<StateChangeRecord> {
        self.buffers.state_changes(query)
    }

    #[must_use]
    pub fn renders(&self, query: &RenderQuery) -> Vec<RenderRecord> {
        self.buffers.renders(query)
    }

    pub fn clear_buffer(&mut self, kind: BufferKind) {
        self.buffers.clear(kind);
    }

    pub fn clear_buffers(&mut self) {
        self.buffers.clear_all();
    }

    // ------------------------------------------------------------------
    // Tree queries
    // ------------------------------------------------------------------

    fn serializer<'a>(&self, tree: &'a HostTree, geometry: &'a dyn GeometryBackend) -> Serializer<'a> {
        Serializer::new(tree, geometry, self.config.max_traversal_depth)
            .with_capture(self.config.capture)
    }

    /// Every node matching `selector`; an invalid selector matches nothing.
    #[must_use]
    pub fn query_selector(
        &self,
        tree: &HostTree,
        geometry: &dyn GeometryBackend,
        selector: &str,
    ) -> Vec<MatchedRecord> {
        selector::query(&self.serializer(tree, geometry), selector)
    }

    #[must_use]
    pub fn snapshot(
        &self,
        tree: &HostTree,
        geometry: &dyn GeometryBackend,
        depth: usize,
    ) -> Option<SnapshotNode> {
        self.serializer(tree, geometry).snapshot(depth)
    }

    #[must_use]
    pub fn inspect(
        &self,
        tree: &HostTree,
        geometry: &dyn GeometryBackend,
        uid: &str,
    ) -> Option<NodeDetails> {
        let id = accessor::find_by_uid(tree, uid, self.config.max_traversal_depth)?;
        self.serializer(tree, geometry).details(id)
    }

    /// Measure the node addressed by `uid`, falling back to the backend's
    /// asynchronous path when no synchronous layout is available.
    ///
    /// Resolves to `None` if the node is unknown, nothing can be measured,
    /// or the backend does not answer within the configured timeout.
    pub async fn measure_async(
        &self,
        tree: &HostTree,
        geometry: &dyn GeometryBackend,
        uid: &str,
    ) -> Option<Measure> {
        let serializer = self.serializer(tree, geometry);
        let id = accessor::find_by_uid(tree, uid, self.config.max_traversal_depth)?;
        if let Some(measure) = serializer.measure(id) {
            return Some(measure);
        }

        let path = accessor::path_of(tree, id)?;
        let target = serializer.measure_target(id, &path)?;
        let handle = tree.get(target.node)?.native.as_ref()?;

        match self.request_measure(geometry, handle).await {
            Ok(measure) => measure,
            Err(e) => {
                debug!("Measurement of {uid} failed: {e}");
                None
            }
        }
    }

    /// Hand `handle` to the backend's asynchronous path and wait for the answer.
    async fn request_measure(
        &self,
        geometry: &dyn GeometryBackend,
        handle: &NativeHandle,
    ) -> Result<Option<Measure>, PendingError> {
        let pending = self.measurements.register();
        let completion = MeasureCompletion::new(pending.id, self.measurements.clone());
        if !geometry.request_measure(handle, completion) {
            self.measurements.cancel(pending.id);
            return Err(PendingError::Refused(pending.id));
        }
        self.measurements.wait(pending).await
    }

    // ------------------------------------------------------------------
    // Network mocks
    // ------------------------------------------------------------------

    #[must_use]
    pub fn mocks(&self) -> &MockRegistry {
        &self.mocks
    }

    pub fn mocks_mut(&mut self) -> &mut MockRegistry {
        &mut self.mocks
    }

    /// Consulted after the mock registry.
    pub fn add_interceptor(&mut self, interceptor: Box<dyn RequestInterceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Decide whether an outbound request is answered locally. A local
    /// answer is recorded in the network buffer as a mocked request.
    pub fn intercept_request(&mut self, request: &OutboundRequest) -> Interception {
        let mut answer = self.mocks.intercept(request);
        if answer == Interception::Proceed {
            answer = self.interceptors.intercept(request);
        }

        if let Interception::Respond { source, response } = &answer {
            #[allow(clippy::cast_precision_loss)]
            let delay = response.delay as f64;
            self.record_network(NetworkEntry {
                id: 0,
                timestamp: self.clock.now().0,
                method: request.method.clone(),
                url: request.url.clone(),
                status: Some(response.status),
                duration_ms: Some(delay),
                mocked: true,
                mock_id: Some(source.clone()),
                error: None,
            });
        }
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FrameGeometry, NoGeometry};
    use crate::host::{Hook, NativeHandle, Node, NodeKind};
    use crate::network::MockSpec;
    use std::cell::RefCell;
    use std::rc::Rc;
    use treescope_common::{RenderKind, Trigger};

    fn engine_with_clock() -> (Engine, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::starting_at(1_000.0));
        let engine = Engine::with_clock(EngineConfig::default(), Box::new(Rc::clone(&clock)));
        (engine, clock)
    }

    /// Commit 1 mounts Counter; commit 2 re-renders it with new state.
    fn two_commits() -> (HostTree, HostTree) {
        let mut first = HostTree::new();
        let root = first.add_root(Node::new(NodeKind::Root, "Root"));
        first.add_child(root, Node::function("Counter").with_hook(Hook::state(0)));

        let mut second = HostTree::new();
        let root = second.add_root(Node::new(NodeKind::Root, "Root"));
        let old = second.add(Node::function("Counter").with_hook(Hook::state(0)));
        let mut counter = Node::function("Counter").with_hook(Hook::state(1));
        counter.performed_work = true;
        let counter = second.add_child(root, counter);
        second.set_alternate(counter, old);
        (first, second)
    }

    #[test]
    fn test_profiling_lifecycle() {
        let (mut engine, clock) = engine_with_clock();
        let (first, second) = two_commits();

        // Not profiling: state changes only
        engine.on_commit(RendererId(1), &second);
        assert_eq!(engine.state_changes(&StateChangeQuery::default()).len(), 1);
        assert!(engine.renders(&RenderQuery::default()).is_empty());

        engine.start_profiling(&ProfileOptions::default());
        engine.on_commit(RendererId(1), &first);
        clock.advance(2_000.0);
        engine.on_commit(RendererId(1), &second);

        let renders = engine.renders(&RenderQuery::default());
        let kinds: Vec<(RenderKind, Trigger)> = renders.iter().map(|r| (r.kind, r.trigger)).collect();
        assert_eq!(kinds, vec![(RenderKind::Mount, Trigger::Parent), (RenderKind::Update, Trigger::State)]);
        assert_eq!(renders[1].commit_id, 3);

        let report = engine.stop_profiling();
        assert!(!engine.is_profiling());
        assert_eq!(report.total_renders, 2);
        assert_eq!(report.total_commits, 2);
        assert_eq!(report.elapsed, "2.0s");

        // Restarting clears the previous session
        engine.start_profiling(&ProfileOptions::default());
        assert_eq!(engine.render_report().total_renders, 0);
    }

    #[test]
    fn test_subscribers_receive_renders() {
        let (mut engine, _) = engine_with_clock();
        let (first, _) = two_commits();
        let receiver = engine.subscribe_renders(1);
        let dropped = engine.subscribe_renders(1);
        drop(dropped);

        engine.start_profiling(&ProfileOptions::default());
        engine.on_commit(RendererId(1), &first);
        engine.on_commit(RendererId(1), &first);

        // Capacity 1: the second record was dropped for this subscriber
        assert_eq!(receiver.try_iter().count(), 1);
        assert_eq!(engine.subscribers.len(), 1);
        assert_eq!(engine.renders(&RenderQuery::default()).len(), 2);
    }

    #[test]
    fn test_intercept_records_mocked_request() {
        let (mut engine, _) = engine_with_clock();
        engine.mocks_mut().add(MockSpec::new("/users"));

        let answer = engine.intercept_request(&OutboundRequest::new("GET", "https://api.test/users"));
        assert!(matches!(answer, Interception::Respond { .. }));
        let answer = engine.intercept_request(&OutboundRequest::new("GET", "https://api.test/feed"));
        assert_eq!(answer, Interception::Proceed);

        let entries = engine.network(&NetworkQuery::default());
        assert_eq!(entries.len(), 1);
        assert!(entries[0].mocked);
        assert_eq!(entries[0].mock_id.as_deref(), Some("mock_1"));
        assert_eq!(entries[0].timestamp, 1_000.0);
    }

    #[test]
    fn test_console_timestamps_from_clock() {
        let (mut engine, clock) = engine_with_clock();
        engine.record_console(LogLevel::Info, "first");
        clock.advance(5.0);
        engine.record_console(LogLevel::Warn, "second");

        let q = ConsoleQuery { since: Some(1_000.0), ..Default::default() };
        let entries = engine.console(&q);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "second");
    }

    fn measurable_tree() -> HostTree {
        let mut tree = HostTree::new();
        let root = tree.add_root(Node::new(NodeKind::Root, "Root"));
        let card = tree.add_child(root, Node::function("Card").with_prop("testID", "card"));
        tree.add_child(
            card,
            Node::host("View").with_native(NativeHandle { tag: 9, frame: None, scrollable: false }),
        );
        tree
    }

    /// Accepts async requests and completes them when the test says so.
    #[derive(Default)]
    struct DeferredGeometry {
        waiting: RefCell<Vec<MeasureCompletion>>,
    }

    impl GeometryBackend for DeferredGeometry {
        fn measure_sync(&self, _handle: &NativeHandle) -> Option<Measure> {
            None
        }

        fn request_measure(&self, _handle: &NativeHandle, completion: MeasureCompletion) -> bool {
            self.waiting.borrow_mut().push(completion);
            true
        }
    }

    #[tokio::test]
    async fn test_measure_async_completes() {
        let engine = Engine::default();
        let tree = measurable_tree();
        let geometry = DeferredGeometry::default();
        let frame = Measure { x: 0.0, y: 0.0, width: 4.0, height: 4.0, page_x: 0.0, page_y: 0.0 };

        let measuring = engine.measure_async(&tree, &geometry, "card");
        let complete = async {
            tokio::task::yield_now().await;
            let completion = geometry.waiting.borrow_mut().pop();
            completion.is_some_and(|c| c.complete(Some(frame)))
        };
        let (measure, delivered) = tokio::join!(measuring, complete);
        assert!(delivered);
        assert_eq!(measure, Some(frame));
    }

    #[tokio::test(start_paused = true)]
    async fn test_measure_async_times_out() {
        let engine = Engine::default();
        let tree = measurable_tree();
        let geometry = DeferredGeometry::default();
        assert_eq!(engine.measure_async(&tree, &geometry, "card").await, None);
        assert!(engine.measurements.is_empty());
    }

    #[tokio::test]
    async fn test_measure_async_without_backend_support() {
        let engine = Engine::default();
        let tree = measurable_tree();
        assert_eq!(engine.measure_async(&tree, &NoGeometry, "card").await, None);
        assert_eq!(engine.measure_async(&tree, &FrameGeometry, "missing").await, None);
        assert!(engine.measurements.is_empty());
    }

    #[tokio::test]
    async fn test_refused_measure_request_is_an_error() {
        let engine = Engine::default();
        let handle = NativeHandle { tag: 9, frame: None, scrollable: false };
        let result = engine.request_measure(&NoGeometry, &handle).await;
        assert!(matches!(result, Err(PendingError::Refused(_))));
        assert!(engine.measurements.is_empty());
    }
}
