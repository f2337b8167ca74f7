use std::sync::Arc;

use tokio::sync::{Mutex, oneshot};

use crate::location::{AuthorizationStatus, LocationFix, LocationProvider, ProviderEvent};

/// Message handed back when the platform reports location access as
/// denied or restricted
const NOT_ENABLED_MSG: &str = "Location services are not enabled, allow location use in the settings of this app in order to use location services.";

/// Message handed back when the provider drops its event channel without ever
/// delivering a terminal event
const PROVIDER_GONE_MSG: &str = "Location provider closed its event stream.";

/// Terminal value of one acquisition attempt, delivered exactly once
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionResult {
    Success(LocationFix),
    Failure(String),
}

/// Result of [distance_to]
#[derive(Debug, Clone, PartialEq)]
pub enum DistanceResult {
    Success {
        /// The fix the distance was measured from
        location: LocationFix,
        /// Great-circle distance to the destination in meters
        meters: f64,
    },
    Failure(String),
}

type Completion = Box<dyn FnOnce(AcquisitionResult) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    AwaitingAuthorization,
    Streaming,
    Completed,
}

/// The in-flight acquisition. The completion is `take`n exactly once, so any
/// event arriving after the terminal one is discarded.
struct Pending {
    phase: Phase,
    on_result: Option<Completion>,
}

/// One-shot wrapper around a [LocationProvider]: acquires the positioning
/// permission if the user hasn't been prompted yet, starts the hardware
/// stream, takes the first fix, stops the stream, and reports through a
/// single completion.
///
/// Each instance runs at most one acquisition and holds its own provider
/// subscription, so concurrent acquisitions are fully independent.
pub struct SingleLocationAcquirer<P: LocationProvider> {
    provider: Arc<P>,
    pending: Mutex<Pending>,
}

impl<P: LocationProvider> SingleLocationAcquirer<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            pending: Mutex::new(Pending {
                phase: Phase::Idle,
                on_result: None,
            }),
        }
    }

    /// Start the acquisition. Returns immediately; `on_result` is invoked
    /// exactly once from the event pump once a terminal event arrives.
    ///
    /// The spawned pump owns a clone of `self`, which keeps the acquirer
    /// alive until the completion has run. Callers are free to drop their
    /// handle right away.
    pub fn acquire(self: &Arc<Self>, on_result: impl FnOnce(AcquisitionResult) + Send + 'static) {
        // Subscribe before spawning so no event can slip past the pump
        let mut events = self.provider.subscribe();
        let this = self.clone();

        tokio::spawn(async move {
            if this.begin(Box::new(on_result)).await {
                return;
            }

            while let Some(event) = events.recv().await {
                if this.handle_event(event).await {
                    return;
                }
            }

            this.complete(AcquisitionResult::Failure(PROVIDER_GONE_MSG.to_string()))
                .await;
        });
    }

    /// Run the initial transition out of [Phase::Idle]. Returns whether the
    /// acquisition is already terminal.
    async fn begin(&self, on_result: Completion) -> bool {
        {
            let mut pending = self.pending.lock().await;
            if pending.phase != Phase::Idle {
                drop(pending);
                on_result(AcquisitionResult::Failure(
                    "This acquirer has already been used.".to_string(),
                ));
                return true;
            }
            pending.phase = Phase::AwaitingAuthorization;
            pending.on_result = Some(on_result);
        }

        let status = self.provider.authorization_status();

        if status.is_blocked() {
            self.complete(AcquisitionResult::Failure(NOT_ENABLED_MSG.to_string()))
                .await;
            return true;
        }

        if status.is_authorized() {
            self.start_streaming().await;
        } else if status == AuthorizationStatus::NotDetermined {
            self.provider.request_permission();
        }
        // Any other status: stay put until an authorization change arrives

        false
    }

    /// Consume one provider event. Returns whether the acquisition is
    /// terminal afterwards.
    async fn handle_event(&self, event: ProviderEvent) -> bool {
        match event {
            ProviderEvent::AuthorizationChanged(status) if status.is_blocked() => {
                self.complete(AcquisitionResult::Failure(NOT_ENABLED_MSG.to_string()))
                    .await;
                true
            }
            ProviderEvent::AuthorizationChanged(status) => {
                if status.is_authorized() {
                    self.start_streaming().await;
                }
                // NotDetermined or a status we don't act on: keep waiting
                self.phase().await == Phase::Completed
            }
            ProviderEvent::LocationsUpdated(fixes) => {
                if self.phase().await == Phase::Streaming {
                    // Only the first fix of a batch counts
                    if let Some(fix) = fixes.first().copied() {
                        self.complete(AcquisitionResult::Success(fix)).await;
                        return true;
                    }
                }
                self.phase().await == Phase::Completed
            }
            ProviderEvent::Error(message) => {
                self.complete(AcquisitionResult::Failure(message)).await;
                true
            }
        }
    }

    async fn start_streaming(&self) {
        {
            let mut pending = self.pending.lock().await;
            if pending.phase != Phase::AwaitingAuthorization {
                return;
            }
            pending.phase = Phase::Streaming;
        }
        self.provider.start_updates();
    }

    /// Deliver the terminal result. Stops the stream if it was running and
    /// fires the completion; a no-op when the acquisition already completed.
    async fn complete(&self, result: AcquisitionResult) {
        let on_result = {
            let mut pending = self.pending.lock().await;
            if pending.phase == Phase::Streaming {
                self.provider.stop_updates();
            }
            pending.phase = Phase::Completed;
            pending.on_result.take()
        };

        if let Some(on_result) = on_result {
            on_result(result);
        }
    }

    async fn phase(&self) -> Phase {
        self.pending.lock().await.phase
    }
}

/// Acquire a single fix through a fresh [SingleLocationAcquirer]. Every call
/// is fully independent; the acquirer lives on inside its event pump until
/// the result is in, then gets reclaimed.
pub async fn fetch_single_location<P: LocationProvider>(provider: Arc<P>) -> AcquisitionResult {
    let (tx, rx) = oneshot::channel();
    let acquirer = Arc::new(SingleLocationAcquirer::new(provider));

    acquirer.acquire(move |result| {
        tx.send(result).ok();
    });

    match rx.await {
        Ok(result) => result,
        // The pump can only vanish without completing when the runtime is
        // shutting down
        Err(_) => AcquisitionResult::Failure("Location acquisition ended without a result.".to_string()),
    }
}

/// Acquire a single fix and measure the great-circle distance from it to
/// `destination`
pub async fn distance_to<P: LocationProvider>(
    provider: Arc<P>,
    destination: LocationFix,
) -> DistanceResult {
    match fetch_single_location(provider).await {
        AcquisitionResult::Success(location) => DistanceResult::Success {
            meters: location.distance_meters(&destination),
            location,
        },
        AcquisitionResult::Failure(message) => DistanceResult::Failure(message),
    }
}
