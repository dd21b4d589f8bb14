//! Applies processor capture notifications to tasks, extra-work requests
//! and tips.
//!
//! Every handler is idempotent on the hold session: a replayed capture
//! finds the session already applied and changes nothing. Events that
//! cannot be applied are stored for manual reconciliation and acknowledged
//! so the processor stops redelivering them.

use super::domain::{SettlementOutcome, UnreconciledEvent};
use crate::activity::domain::{ActivityEntry, ActivityEvent};
use crate::activity::services::ActivityRecorder;
use crate::chat::domain::ChatThread;
use crate::error::MarketplaceResult;
use crate::payments::domain::{
    CaptureApplication, CaptureEvent, ChargeId, HoldPurpose, PaymentReference, ProcessorEvent,
};
use crate::payments::ports::PaymentProcessor;
use crate::persistence::MarketplaceStore;
use crate::task::domain::TaskParty;
use crate::task::ports::HireCommit;
use mockable::Clock;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Capture settlement service.
pub struct SettlementService<S, P, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    processor: Arc<P>,
    clock: Arc<C>,
    activity: ActivityRecorder<S>,
}

impl<S, P, C> SettlementService<S, P, C>
where
    S: MarketplaceStore,
    P: PaymentProcessor,
    C: Clock + Send + Sync,
{
    /// Creates a settlement service.
    #[must_use]
    pub fn new(store: Arc<S>, processor: Arc<P>, clock: Arc<C>) -> Self {
        let activity = ActivityRecorder::new(Arc::clone(&store));
        Self {
            store,
            processor,
            clock,
            activity,
        }
    }

    /// Applies a verified processor event.
    ///
    /// # Errors
    ///
    /// Returns the repository error when a write fails, including a lost
    /// revision race; the processor will redeliver the event.
    pub async fn handle(&self, event: ProcessorEvent) -> MarketplaceResult<SettlementOutcome> {
        match event {
            ProcessorEvent::Capture(capture) => self.handle_capture(&capture).await,
            ProcessorEvent::Malformed {
                event_id,
                reason,
                payload,
            } => {
                let record =
                    UnreconciledEvent::unparsed(event_id, reason.clone(), payload, &*self.clock);
                self.set_aside(record).await?;
                Ok(SettlementOutcome::Dropped {
                    purpose: None,
                    reason,
                })
            }
            ProcessorEvent::Other {
                event_id,
                event_type,
            } => {
                debug!(%event_id, %event_type, "ignoring processor event");
                Ok(SettlementOutcome::Ignored { event_type })
            }
        }
    }

    /// Applies a captured hold, routed on its purpose.
    ///
    /// # Errors
    ///
    /// Returns the repository error when a write fails.
    pub async fn handle_capture(
        &self,
        event: &CaptureEvent,
    ) -> MarketplaceResult<SettlementOutcome> {
        let purpose = event.metadata.purpose;
        let applied = match purpose {
            HoldPurpose::Hire => self.apply_hire(event).await?,
            HoldPurpose::ExtraWork => self.apply_extra_work(event).await?,
            HoldPurpose::Tip => self.apply_tip(event).await?,
        };
        match applied {
            Ok(CaptureApplication::Applied) => {
                info!(
                    event_id = %event.event_id,
                    session_id = %event.session_id,
                    task_id = %event.metadata.task_id,
                    %purpose,
                    "capture applied"
                );
                Ok(SettlementOutcome::Applied(purpose))
            }
            Ok(CaptureApplication::Replayed) => {
                debug!(event_id = %event.event_id, session_id = %event.session_id, "capture already applied");
                Ok(SettlementOutcome::Replayed(purpose))
            }
            Err(reason) => {
                let record = UnreconciledEvent::from_capture(event, reason.clone(), &*self.clock);
                self.set_aside(record).await?;
                Ok(SettlementOutcome::Dropped {
                    purpose: Some(purpose),
                    reason,
                })
            }
        }
    }

    async fn set_aside(&self, record: UnreconciledEvent) -> MarketplaceResult<()> {
        warn!(
            event_id = %record.event_id,
            reason = %record.reason,
            "processor event set aside for manual reconciliation"
        );
        self.store.record_unreconciled(&record).await?;
        let mut entry = ActivityEntry::new(ActivityEvent::WebhookEventDropped, &*self.clock)
            .with_details(json!({
                "eventId": record.event_id,
                "sessionId": record.session_id,
                "purpose": record.purpose,
                "reason": record.reason,
            }));
        if let Some(task_id) = record.task_id {
            entry = entry.with_task(task_id);
        }
        self.activity.record(entry).await;
        Ok(())
    }

    async fn charge_for(&self, payment: Option<&PaymentReference>) -> Option<ChargeId> {
        let reference = payment?;
        match self.processor.latest_charge(reference).await {
            Ok(charge) => charge,
            Err(err) => {
                warn!(payment = %reference, error = %err, "charge lookup failed; storing capture without it");
                None
            }
        }
    }

    async fn apply_hire(
        &self,
        event: &CaptureEvent,
    ) -> MarketplaceResult<Result<CaptureApplication, String>> {
        let metadata = &event.metadata;
        let Some(mut task) = self.store.find_task(metadata.task_id).await? else {
            return Ok(Err(format!("task {} not found", metadata.task_id)));
        };
        let Some(helper_id) = metadata.helper_id else {
            return Ok(Err("hire capture without a helper".to_owned()));
        };
        let Some(helper) = self.store.find_user(helper_id).await? else {
            return Ok(Err(format!("helper {helper_id} not found")));
        };

        let charge = self.charge_for(event.payment.as_ref()).await;
        let at = self.clock.utc();
        let expected_revision = task.revision();
        let application = match task.confirm_hire(
            &event.session_id,
            TaskParty::snapshot(&helper, "Helper"),
            event.payment.clone(),
            charge,
            at,
        ) {
            Ok(application) => application,
            Err(err) => return Ok(Err(err.to_string())),
        };
        if application == CaptureApplication::Replayed {
            return Ok(Ok(application));
        }

        let thread = ChatThread::open(task.id(), task.poster_id(), helper_id, at);
        let commit = HireCommit {
            task,
            expected_revision,
            thread,
            at,
        };
        self.store.commit_hire(&commit).await?;

        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::HireConfirmed, &*self.clock)
                    .with_actor(commit.task.poster_id())
                    .with_task(commit.task.id())
                    .with_details(json!({
                        "helperId": helper_id,
                        "sessionId": event.session_id,
                        "threadId": commit.thread.id(),
                    })),
            )
            .await;
        Ok(Ok(application))
    }

    async fn apply_extra_work(
        &self,
        event: &CaptureEvent,
    ) -> MarketplaceResult<Result<CaptureApplication, String>> {
        let Some(request_id) = event.metadata.extra_work_id else {
            return Ok(Err("extra-work capture without a request id".to_owned()));
        };
        let Some(mut request) = self.store.find_extra_work(request_id).await? else {
            return Ok(Err(format!("extra-work request {request_id} not found")));
        };
        let expected_status = request.status();
        let application = match request.confirm_payment(
            &event.session_id,
            event.payment.clone(),
            self.clock.utc(),
        ) {
            Ok(application) => application,
            Err(err) => return Ok(Err(err.to_string())),
        };
        if application == CaptureApplication::Replayed {
            return Ok(Ok(application));
        }

        self.store
            .commit_extra_work_payment(&request, expected_status)
            .await?;

        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::ExtraWorkPaid, &*self.clock)
                    .with_task(request.task_id())
                    .with_details(json!({
                        "extraWorkRequestId": request_id,
                        "amount": request.amount(),
                        "sessionId": event.session_id,
                    })),
            )
            .await;
        Ok(Ok(application))
    }

    async fn apply_tip(
        &self,
        event: &CaptureEvent,
    ) -> MarketplaceResult<Result<CaptureApplication, String>> {
        let metadata = &event.metadata;
        let Some(mut task) = self.store.find_task(metadata.task_id).await? else {
            return Ok(Err(format!("task {} not found", metadata.task_id)));
        };
        let expected_revision = task.revision();
        let application =
            match task.confirm_tip(&event.session_id, event.payment.clone(), self.clock.utc()) {
                Ok(application) => application,
                Err(err) => return Ok(Err(err.to_string())),
            };
        if application == CaptureApplication::Replayed {
            return Ok(Ok(application));
        }

        self.store.update_task(&task, expected_revision).await?;

        self.activity
            .record(
                ActivityEntry::new(ActivityEvent::TipPaid, &*self.clock)
                    .with_actor(task.poster_id())
                    .with_task(task.id())
                    .with_details(json!({
                        "amount": metadata.tip_amount,
                        "sessionId": event.session_id,
                    })),
            )
            .await;
        Ok(Ok(application))
    }
}
