use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::{
    sync::{Mutex, OwnedSemaphorePermit, Semaphore, mpsc},
    task::JoinHandle,
};
use tokio_util::{sync::CancellationToken, task::TaskTracker};
use tracing::{Instrument, debug, error, info, info_span, warn};

use arena_types::errors::{AppError, ApplicationError};

use crate::{
    config::Config,
    events::{EventHandlerContext, EventRegistry, GameEvent},
};

/// Producer side of the event queue. Never blocks: a saturated queue is
/// reported as `EventQueueFull`.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<GameEvent>,
}

/// A reserved queue slot. Dropping it releases the slot unused.
pub struct EventSlot<'a> {
    permit: mpsc::Permit<'a, GameEvent>,
}

impl EventSlot<'_> {
    pub fn send(self, event: GameEvent) {
        self.permit.send(event);
    }
}

impl EventSender {
    pub fn try_enqueue(&self, event: GameEvent) -> Result<(), ApplicationError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AppError::EventQueueFull.into(),
            mpsc::error::TrySendError::Closed(_) => AppError::EventProcessorStopped.into(),
        })
    }

    /// Reserves room for one event so the caller can mutate state knowing
    /// the matching event will be accepted.
    pub fn try_reserve(&self) -> Result<EventSlot<'_>, ApplicationError> {
        self.tx
            .try_reserve()
            .map(|permit| EventSlot { permit })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => AppError::EventQueueFull.into(),
                mpsc::error::TrySendError::Closed(_) => AppError::EventProcessorStopped.into(),
            })
    }

    /// Number of events waiting to be dispatched.
    pub fn queued(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Fixed pool of workers fed by a bounded queue.
///
/// A single dispatcher takes a worker slot first and only then dequeues the
/// next event, so while every worker is busy events stay in the queue and
/// producers see `EventQueueFull` once it fills up.
pub struct EventProcessor {
    workers: usize,
    sender: EventSender,
    receiver: Mutex<Option<mpsc::Receiver<GameEvent>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
    registry: Arc<dyn EventRegistry>,
    context: Arc<EventHandlerContext>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    in_flight: Arc<AtomicUsize>,
}

impl EventProcessor {
    pub fn new(
        config: &Config,
        registry: Arc<dyn EventRegistry>,
        context: Arc<EventHandlerContext>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.event_queue_size.max(1));
        Self {
            workers: config.event_workers.max(1),
            sender: EventSender { tx },
            receiver: Mutex::new(Some(rx)),
            dispatcher: Mutex::new(None),
            registry,
            context,
            cancel: CancellationToken::new(),
            tracker: TaskTracker::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Events currently being handled by a worker.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn queued(&self) -> usize {
        self.sender.queued()
    }

    /// Spawns the dispatcher. Calling it again is a no-op.
    pub async fn start(&self) {
        let Some(rx) = self.receiver.lock().await.take() else {
            warn!("Event processor already started or stopped");
            return;
        };

        let dispatcher = Dispatcher {
            slots: Arc::new(Semaphore::new(self.workers)),
            registry: self.registry.clone(),
            context: self.context.clone(),
            cancel: self.cancel.clone(),
            tracker: self.tracker.clone(),
            in_flight: self.in_flight.clone(),
        };

        let handle = tokio::spawn(dispatcher.run(rx));
        *self.dispatcher.lock().await = Some(handle);
        info!(workers = self.workers, "Event processor started");
    }

    /// Stops accepting events and waits for in-flight workers to finish.
    pub async fn stop(&self) {
        self.cancel.cancel();

        // Never started: close the queue so producers stop enqueueing.
        if let Some(mut rx) = self.receiver.lock().await.take() {
            rx.close();
        }

        let dispatcher = self.dispatcher.lock().await.take();
        if let Some(handle) = dispatcher {
            if let Err(e) = handle.await {
                error!("Event dispatcher terminated abnormally: {}", e);
            }
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!("Event processor stopped");
    }
}

struct Dispatcher {
    slots: Arc<Semaphore>,
    registry: Arc<dyn EventRegistry>,
    context: Arc<EventHandlerContext>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    in_flight: Arc<AtomicUsize>,
}

impl Dispatcher {
    async fn run(self, mut rx: mpsc::Receiver<GameEvent>) {
        loop {
            let permit = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                permit = self.slots.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            self.spawn_worker(permit, event);
        }

        rx.close();
        let mut discarded = 0usize;
        while let Ok(event) = rx.try_recv() {
            debug!(event_id = %event.id, kind = %event.kind(), "Discarding queued event");
            discarded += 1;
        }
        if discarded > 0 {
            warn!(discarded, "Event processor stopped with unprocessed events");
        }
    }

    fn spawn_worker(&self, permit: OwnedSemaphorePermit, event: GameEvent) {
        let registry = self.registry.clone();
        let context = self.context.clone();
        let guard = InFlightGuard::new(self.in_flight.clone());
        let span = info_span!(
            "game_event",
            event_id = %event.id,
            match_id = %event.match_id,
            kind = %event.kind()
        );

        self.tracker.spawn(
            async move {
                let _permit = permit;
                let _guard = guard;
                process_event(registry.as_ref(), &context, &event).await;
            }
            .instrument(span),
        );
    }
}

/// Failures are logged and swallowed: the producing call has already
/// returned and there is no retry.
async fn process_event(
    registry: &dyn EventRegistry,
    ctx: &EventHandlerContext,
    event: &GameEvent,
) {
    let handler = match registry.get_handler(event) {
        Ok(handler) => handler,
        Err(e) => {
            warn!("Skipping event without handler: {}", e);
            return;
        }
    };

    match handler.handle(ctx, event).await {
        Ok(()) => debug!("Event processed"),
        Err(e) => error!("Event {} has failed: {}", event.id, e),
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn new(counter: Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
