//! Event loop
//!
//! A single task owns the aggregation state and handles one event at a time
//! from the input channels, the cleanup ticker and the shutdown signal.

use crate::config::ProcessorConfig;
use crate::domain::GuardianSetState;
use crate::error::{ProcessorError, ProcessorResult};
use crate::ports::inbound::ProcessorReceivers;
use crate::service::{ProcessorDependencies, ProcessorService};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// The aggregation processor: service state plus its inputs.
pub struct Processor {
    service: ProcessorService,
    receivers: ProcessorReceivers,
    shutdown: watch::Receiver<bool>,
}

impl Processor {
    /// Build a processor. `guardian_set_state` is published to on every
    /// guardian set update; `shutdown` stops the loop once it reads `true`
    /// or its sender is dropped.
    pub fn new(
        config: ProcessorConfig,
        deps: ProcessorDependencies,
        receivers: ProcessorReceivers,
        guardian_set_state: Arc<GuardianSetState>,
        shutdown: watch::Receiver<bool>,
    ) -> ProcessorResult<Self> {
        config.validate()?;
        Ok(Self {
            service: ProcessorService::new(config, deps, guardian_set_state),
            receivers,
            shutdown,
        })
    }

    /// Run until shutdown. Always returns `Err(ProcessorError::Cancelled)`.
    pub async fn run(self) -> ProcessorResult<()> {
        let Processor {
            mut service,
            mut receivers,
            mut shutdown,
        } = self;

        if *shutdown.borrow_and_update() {
            return Err(ProcessorError::Cancelled);
        }

        let period = service.config().cleanup_interval;
        let mut cleanup = interval_at(Instant::now() + period, period);
        cleanup.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut open = OpenInputs::default();

        info!(
            guardian = %hex::encode(service.our_address()),
            cleanup_interval = ?period,
            "[processor] started"
        );

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow_and_update() {
                        info!("[processor] shutting down");
                        return Err(ProcessorError::Cancelled);
                    }
                }

                update = receivers.guardian_sets.recv(), if open.guardian_sets => match update {
                    Some(guardian_set) => service.handle_guardian_set_update(guardian_set),
                    None => mark_closed(&mut open.guardian_sets, "guardian_sets"),
                },

                publication = receivers.observations.recv(), if open.observations => match publication {
                    Some(publication) => log_failure(
                        "message_publication",
                        service.handle_message_publication(publication, Instant::now()).await,
                    ),
                    None => mark_closed(&mut open.observations, "observations"),
                },

                vaa = receivers.injections.recv(), if open.injections => match vaa {
                    Some(vaa) => log_failure(
                        "injection",
                        service.handle_injection(vaa, Instant::now()).await,
                    ),
                    None => mark_closed(&mut open.injections, "injections"),
                },

                observation = receivers.signed_observations.recv(), if open.signed_observations => match observation {
                    Some(observation) => log_failure(
                        "signed_observation",
                        service.handle_signed_observation(observation, Instant::now()).await,
                    ),
                    None => mark_closed(&mut open.signed_observations, "signed_observations"),
                },

                message = receivers.signed_vaas.recv(), if open.signed_vaas => match message {
                    Some(message) => log_failure(
                        "signed_vaa_with_quorum",
                        service.handle_signed_vaa_with_quorum(message).await,
                    ),
                    None => mark_closed(&mut open.signed_vaas, "signed_vaas"),
                },

                _ = cleanup.tick() => {
                    service.handle_cleanup(Instant::now());
                }
            }
        }
    }
}

/// Which input channels still have senders.
struct OpenInputs {
    guardian_sets: bool,
    observations: bool,
    injections: bool,
    signed_observations: bool,
    signed_vaas: bool,
}

impl Default for OpenInputs {
    fn default() -> Self {
        Self {
            guardian_sets: true,
            observations: true,
            injections: true,
            signed_observations: true,
            signed_vaas: true,
        }
    }
}

fn mark_closed(open: &mut bool, input: &'static str) {
    *open = false;
    warn!(input, "[processor] input channel closed");
}

fn log_failure(input: &'static str, result: ProcessorResult<()>) {
    let Err(e) = result else {
        return;
    };

    if e.is_untrusted_input() {
        debug!(input, error = %e, "[processor] dropped invalid input");
    } else if matches!(e, ProcessorError::NoGuardianSet) {
        warn!(input, "[processor] dropping input, no guardian set known yet");
    } else {
        error!(input, error = %e, "[processor] failed to handle input");
    }
}
