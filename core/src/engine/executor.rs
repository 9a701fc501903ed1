//! Engine event loop

use crate::config::{EngineConfig, EnumerationMode};
use crate::error::{EngineError, EngineResult};
use crate::progress::{ProgressSnapshot, ProgressTracker, RateGovernor};
use crate::request::RequestTemplate;
use crate::response::{FuzzResult, ResponseStat};
use crate::traits::{Enumerator, Transport};

use super::multiplex::{Completion, Multiplexer};
use super::pool::{ContextPool, SlotState};

use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Drives a fuzzing run: admit -> poll -> drain -> rebase -> repeat
///
/// Everything runs on the task that awaits [`Engine::run`]. The context
/// pool bounds how many requests are in flight, the rate governor and the
/// request delay hold admissions back, and the multiplexer is the only
/// place the loop waits.
pub struct Engine {
    config: EngineConfig,
    template: RequestTemplate,
    enumerator: Box<dyn Enumerator>,
    transport: Arc<dyn Transport>,
    pool: ContextPool,
    multiplexer: Multiplexer,
    governor: RateGovernor,
    rng: StdRng,
    /// Earliest instant the delay allows the next admission
    next_admission_at: Option<Instant>,
}

impl Engine {
    /// Create an engine; prefer [`super::EngineBuilder`]
    pub fn new(
        config: EngineConfig,
        template: RequestTemplate,
        enumerator: Box<dyn Enumerator>,
        transport: Arc<dyn Transport>,
        rng: StdRng,
    ) -> Self {
        let pool = ContextPool::new(config.concurrency);
        let governor = RateGovernor::new(config.rate_limit, config.rate_window());
        Self {
            config,
            template,
            enumerator,
            transport,
            pool,
            multiplexer: Multiplexer::new(),
            governor,
            rng,
            next_admission_at: None,
        }
    }

    /// Requests the run will issue
    pub fn total_requests(&self) -> u64 {
        self.enumerator.total_count()
    }

    /// Maximum requests in flight
    pub fn concurrency(&self) -> usize {
        self.pool.capacity()
    }

    /// Run until every tuple has been sent and every response handled
    ///
    /// `on_result` receives each transport failure and each response that
    /// passes the filters. Returns the final counters.
    ///
    /// # Errors
    /// Only internal invariant violations abort a run; transport failures
    /// are reported through `on_result` and counted.
    pub async fn run<F>(mut self, mut on_result: F) -> EngineResult<ProgressSnapshot>
    where
        F: FnMut(&FuzzResult<'_>),
    {
        let started = Instant::now();
        let mut progress = ProgressTracker::new(self.enumerator.total_count(), started);
        let mut completions: Vec<Completion> = Vec::with_capacity(self.pool.capacity());
        let mut last_report = started;
        let progress_interval = self.config.progress_interval();

        tracing::info!(
            transport = self.transport.name(),
            mode = %self.enumerator.mode(),
            total = progress.total_requests,
            concurrency = self.pool.capacity(),
            rate_limit = ?self.config.rate_limit,
            "Starting run"
        );

        loop {
            if self.enumerator.is_exhausted() && self.pool.in_use() == 0 {
                break;
            }

            self.admit(&mut progress)?;

            let wait = self.poll_wait(Instant::now());
            self.multiplexer.poll_once(wait).await;
            self.multiplexer.drain_completed(&mut completions);
            for completion in completions.drain(..) {
                self.complete(completion, &mut progress, &mut on_result)?;
            }

            let now = Instant::now();
            self.governor.rebase(&mut progress, now);

            if now.duration_since(last_report) >= progress_interval {
                last_report = now;
                tracing::info!(
                    completed = progress.completed,
                    total = progress.total_requests,
                    percent = progress.percent_complete(),
                    errors = progress.errors,
                    reported = progress.reported,
                    in_flight = self.pool.in_use(),
                    rps = progress.requests_per_second(now),
                    "Progress"
                );
            }
        }

        let snapshot = progress.snapshot(Instant::now());
        tracing::info!(
            total = snapshot.total_requests,
            completed = snapshot.completed,
            errors = snapshot.errors,
            reported = snapshot.reported,
            elapsed_ms = snapshot.elapsed_ms,
            rps = snapshot.requests_per_second,
            "Run finished"
        );

        Ok(snapshot)
    }

    /// Submit requests while tuples remain, the governor and delay agree,
    /// and a slot is free
    fn admit(&mut self, progress: &mut ProgressTracker) -> EngineResult<()> {
        let singular = self.enumerator.mode() == EnumerationMode::Singular;
        let options = self.config.submit_options();

        loop {
            let now = Instant::now();
            if self.enumerator.is_exhausted()
                || !self.delay_elapsed(now)
                || !self.governor.admission_allowed(progress, now)
            {
                break;
            }
            let Some(handle) = self.pool.acquire_free() else {
                break;
            };
            let ctx = self
                .pool
                .get_mut(handle)
                .ok_or_else(|| EngineError::internal("acquired slot is not addressable"))?;

            if !self.enumerator.next_into(&mut ctx.fuzz_values) {
                self.pool.release(handle);
                break;
            }
            self.template
                .render_into(&ctx.fuzz_values, singular, &mut ctx.request);
            ctx.sequence = progress.record_admission();
            ctx.submitted_at = Some(now);

            let future = self.transport.submit(&ctx.request, &options);
            tracing::debug!(
                sequence = ctx.sequence,
                slot = handle.slot(),
                url = %ctx.request.url,
                "Request admitted"
            );
            self.multiplexer.register(handle, future, options.timeout);

            if let Some(delay) = self.config.delay {
                self.next_admission_at = Some(now + delay.sample(&mut self.rng));
            }
        }

        Ok(())
    }

    fn delay_elapsed(&self, now: Instant) -> bool {
        !matches!(self.next_admission_at, Some(at) if now < at)
    }

    /// How long the multiplexer may wait before the loop needs to admit again
    fn poll_wait(&self, now: Instant) -> Duration {
        let interval = self.config.poll_interval();
        match self.next_admission_at {
            Some(at) if !self.enumerator.is_exhausted() && !self.pool.is_saturated() => {
                interval.min(at.saturating_duration_since(now))
            }
            _ => interval,
        }
    }

    /// Record a finished request, report it if it qualifies, free its slot
    fn complete<F>(
        &mut self,
        completion: Completion,
        progress: &mut ProgressTracker,
        on_result: &mut F,
    ) -> EngineResult<()>
    where
        F: FnMut(&FuzzResult<'_>),
    {
        let ctx = self.pool.find_by_handle(completion.handle)?;

        ctx.stat = match completion.result {
            Ok(response) => ResponseStat::from_body(
                response.status,
                &response.body,
                response.elapsed.as_millis() as u64,
            ),
            Err(e) => {
                tracing::warn!(
                    sequence = ctx.sequence,
                    url = %ctx.request.url,
                    error = %e,
                    "Request failed"
                );
                ResponseStat::from_error(e.to_string(), completion.elapsed.as_millis() as u64)
            }
        };
        ctx.state = SlotState::Completed;

        let is_error = ctx.stat.is_error();
        progress.record_completion(is_error);

        let report = is_error || self.config.filters.passes(&ctx.stat);
        tracing::debug!(
            sequence = ctx.sequence,
            code = ctx.stat.code,
            size = ctx.stat.size_bytes,
            duration_ms = ctx.stat.duration_ms,
            report,
            "Request completed"
        );

        if report {
            progress.record_reported();
            on_result(&FuzzResult {
                sequence: ctx.sequence,
                url: &ctx.request.url,
                fuzz_values: &ctx.fuzz_values,
                stat: &ctx.stat,
                timestamp: chrono::Utc::now(),
            });
        }

        self.pool.release(completion.handle);
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("transport", &self.transport.name())
            .field("mode", &self.enumerator.mode())
            .field("total_requests", &self.enumerator.total_count())
            .field("pool", &self.pool.capacity())
            .field("governor", &self.governor)
            .field("multiplexer", &self.multiplexer)
            .finish()
    }
}
