//! Background stage chain of a run.
//!
//! Each run gets one task that walks the stages in order, sleeping between
//! them, and reports exactly one [`StageEvent`] per stage. Every event is
//! tagged with the run it belongs to so the orchestrator can drop results
//! that arrive after a restart.

use crate::config::SimulationConfig;
use crate::locator::{locate_or_fallback, ping_or_fallback, Locator};
use crate::orchestrator::{AppEvent, ChainRequest, Completion, StageEvent};
use crate::signal::{
    settled_download, upload_baseline, FinalSample, RandomSource, RngSource,
};
use log::{debug, error};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::sleep;

/// Handle to a spawned chain and its supervisor.
#[derive(Debug)]
pub struct ChainHandle {
    run: u64,
    chain: AbortHandle,
    supervisor: JoinHandle<()>,
}

impl ChainHandle {
    pub fn run(&self) -> u64 {
        self.run
    }

    /// Stop the chain. No further events are sent for its run.
    pub fn abort(&self) {
        self.chain.abort();
        self.supervisor.abort();
    }
}

impl Drop for ChainHandle {
    fn drop(&mut self) {
        self.abort();
    }
}

/// Spawn the chain for `request`. A supervisor task turns an abnormal end
/// of the chain into a [`StageEvent::Fault`].
pub fn spawn_chain<L: Locator>(
    locator: Arc<L>,
    config: SimulationConfig,
    request: ChainRequest,
    events: UnboundedSender<AppEvent>,
) -> ChainHandle {
    let chain = tokio::spawn(run_chain(locator, config, request, events.clone()));
    let abort = chain.abort_handle();

    let supervisor = tokio::spawn(async move {
        match chain.await {
            Ok(()) => debug!("Run {}: chain finished", request.run),
            Err(e) if e.is_cancelled() => {
                debug!("Run {}: chain cancelled", request.run)
            }
            Err(e) => {
                error!("Run {}: chain stopped abnormally: {}", request.run, e);
                let _ = events.send(AppEvent::Stage {
                    run: request.run,
                    event: StageEvent::Fault(
                        "the background test stopped unexpectedly".to_string(),
                    ),
                });
            }
        }
    });

    ChainHandle { run: request.run, chain: abort, supervisor }
}

/// Walk every stage of one run. Returns early once nobody listens.
pub async fn run_chain<L: Locator>(
    locator: Arc<L>,
    config: SimulationConfig,
    request: ChainRequest,
    events: UnboundedSender<AppEvent>,
) {
    let run = request.run;
    let mut random = RngSource::seeded(request.seed);
    let report = |event: StageEvent| {
        debug!("Run {}: reporting {:?}", run, event);
        events.send(AppEvent::Stage { run, event }).is_ok()
    };

    let label = locate_or_fallback(
        locator.as_ref(),
        config.locate_timeout,
        random.next_seed(),
    )
    .await;
    if !report(StageEvent::ServerLocated(label)) {
        return;
    }

    sleep(config.ping_delay).await;
    let ping =
        ping_or_fallback(locator.as_ref(), config.ping_timeout, random.next_seed())
            .await;
    if !report(StageEvent::PingMeasured(ping)) {
        return;
    }

    sleep(config.download_settle).await;
    if !report(StageEvent::DownloadSettled(settled_download(random.next_seed()))) {
        return;
    }

    sleep(config.upload_settle).await;
    if !report(StageEvent::UploadSampled(upload_baseline(random.next_seed()))) {
        return;
    }

    let sample = FinalSample::draw(&mut random);
    let server = locate_or_fallback(
        locator.as_ref(),
        config.locate_timeout,
        random.next_seed(),
    )
    .await;

    report(StageEvent::Completed(Completion {
        download: sample.download,
        upload: sample.upload,
        ping: sample.ping,
        server,
    }));
}
