//! Diesel schema for marketplace persistence.

diesel::table! {
    /// Registered and stub users.
    users (id) {
        /// User identifier.
        id -> Uuid,
        /// Normalized email; unique when present.
        #[max_length = 320]
        email -> Nullable<Varchar>,
        /// Email confirmed by a login code.
        email_verified -> Bool,
        /// Display name.
        name -> Nullable<Varchar>,
        /// Contact phone.
        phone -> Nullable<Varchar>,
        /// Phone verification flag.
        phone_verified -> Bool,
        /// Default discovery ZIP code.
        default_zip_code -> Nullable<Varchar>,
        /// Connected payee account.
        payee_account_id -> Nullable<Varchar>,
        /// Profile photo URL.
        profile_photo_url -> Nullable<Varchar>,
        /// Completed jobs as helper.
        completed_jobs_count -> Int4,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Issued login codes.
    otp_codes (id) {
        /// Code identifier.
        id -> Uuid,
        /// Recipient email.
        #[max_length = 320]
        email -> Varchar,
        /// Six-digit code.
        #[max_length = 16]
        code -> Varchar,
        /// Expiry timestamp.
        expires_at -> Timestamptz,
        /// Consumed flag.
        used -> Bool,
        /// Issue timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks with their discovery columns and a JSON document for the rest.
    tasks (id) {
        /// Task identifier.
        id -> Uuid,
        /// Posting user.
        poster_id -> Uuid,
        /// Hired helper.
        helper_id -> Nullable<Uuid>,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Category.
        #[max_length = 50]
        category -> Varchar,
        /// Discovery ZIP code.
        #[max_length = 20]
        zip_code -> Varchar,
        /// Helper must bring tools.
        tools_required -> Bool,
        /// Poster provides tools.
        tools_provided -> Bool,
        /// Unique in-person confirmation code.
        #[max_length = 16]
        confirmation_code -> Varchar,
        /// Price prompt already shown.
        price_prompt_shown -> Bool,
        /// When the price prompt falls due; null once acknowledged.
        price_prompt_due_at -> Nullable<Timestamptz>,
        /// Remaining task state.
        document -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Discovery expiry.
        expires_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Optimistic concurrency revision.
        revision -> Int8,
    }
}

diesel::table! {
    /// Helper offers on tasks.
    offers (id) {
        /// Offer identifier.
        id -> Uuid,
        /// Task offered on.
        task_id -> Uuid,
        /// Offering helper.
        helper_id -> Uuid,
        /// Helper name snapshot.
        helper_name -> Varchar,
        /// Helper photo snapshot.
        helper_photo_url -> Nullable<Varchar>,
        /// Free-text note.
        note -> Nullable<Text>,
        /// Counter-price in cents.
        proposed_price_cents -> Nullable<Int8>,
        /// Offer status.
        #[max_length = 50]
        status -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Poster/helper chat threads, one per hired task.
    chat_threads (id) {
        /// Thread identifier.
        id -> Uuid,
        /// Task the thread belongs to.
        task_id -> Uuid,
        /// Poster participant.
        poster_id -> Uuid,
        /// Helper participant.
        helper_id -> Uuid,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Thread expiry.
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// Chat messages.
    chat_messages (id) {
        /// Message identifier.
        id -> Uuid,
        /// Owning thread.
        thread_id -> Uuid,
        /// Sender.
        sender_id -> Uuid,
        /// Sender name snapshot.
        sender_name -> Varchar,
        /// Message text.
        text -> Nullable<Text>,
        /// Attached image.
        image_url -> Nullable<Varchar>,
        /// Marked as completion proof.
        is_proof -> Bool,
        /// Post timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Extra-work requests raised by helpers.
    extra_work_requests (id) {
        /// Request identifier.
        id -> Uuid,
        /// Task the work belongs to.
        task_id -> Uuid,
        /// Requesting helper.
        helper_id -> Uuid,
        /// Amount in cents.
        amount_cents -> Int8,
        /// Reason given by the helper.
        reason -> Text,
        /// Supporting photo URLs.
        photo_urls -> Jsonb,
        /// Request status.
        #[max_length = 50]
        status -> Varchar,
        /// Checkout session once accepted.
        hold_session_id -> Nullable<Varchar>,
        /// Captured payment.
        payment_reference -> Nullable<Varchar>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Accept/decline timestamp.
        responded_at -> Nullable<Timestamptz>,
        /// Capture timestamp.
        paid_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Disputes over hired tasks.
    disputes (id) {
        /// Dispute identifier.
        id -> Uuid,
        /// Disputed task.
        task_id -> Uuid,
        /// Opening party.
        initiator_id -> Uuid,
        /// Opening party's role.
        #[max_length = 20]
        initiator_role -> Varchar,
        /// Stated reason.
        reason -> Text,
        /// Poster evidence URLs.
        poster_photo_urls -> Jsonb,
        /// Helper evidence URLs.
        helper_photo_urls -> Jsonb,
        /// Dispute status.
        #[max_length = 50]
        status -> Varchar,
        /// Operator resolution.
        resolution -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Resolution timestamp.
        resolved_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only audit trail.
    activity_log (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Event name.
        #[max_length = 64]
        event -> Varchar,
        /// Acting user.
        actor_id -> Nullable<Uuid>,
        /// Related task.
        task_id -> Nullable<Uuid>,
        /// Related offer.
        offer_id -> Nullable<Uuid>,
        /// Structured detail.
        details -> Jsonb,
        /// Event timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Capture notifications that could not be applied.
    unreconciled_events (id) {
        /// Record identifier.
        id -> Uuid,
        /// Processor event identifier.
        event_id -> Varchar,
        /// Captured session.
        session_id -> Nullable<Varchar>,
        /// Task named by the event.
        task_id -> Nullable<Uuid>,
        /// Purpose the event claimed.
        #[max_length = 20]
        purpose -> Nullable<Varchar>,
        /// Why it was set aside.
        reason -> Text,
        /// Raw event payload.
        payload -> Jsonb,
        /// Receipt timestamp.
        received_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    users,
    otp_codes,
    tasks,
    offers,
    chat_threads,
    chat_messages,
    extra_work_requests,
    disputes,
    activity_log,
    unreconciled_events,
);
