//! Form bodies in the processor's bracketed-key encoding.

use crate::payments::domain::{HoldRequest, OnboardingUrls, PayeeAccountId, PayeeAccountRequest};
use url::form_urlencoded;

/// Ordered form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct FormBody {
    fields: Vec<(String, String)>,
}

impl FormBody {
    fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    #[cfg(test)]
    fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == key)
            .map(|(_, value)| value.as_str())
    }

    pub(super) fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter())
            .finish()
    }
}

pub(super) fn payee_account(request: &PayeeAccountRequest) -> FormBody {
    let mut body = FormBody::default();
    body.push("type", "express");
    if let Some(email) = &request.email {
        body.push("email", email.as_str());
    }
    body.push("capabilities[transfers][requested]", "true");
    body.push("capabilities[card_payments][requested]", "true");
    body
}

pub(super) fn onboarding_link(account: &PayeeAccountId, urls: &OnboardingUrls) -> FormBody {
    let mut body = FormBody::default();
    body.push("account", account.as_str());
    body.push("refresh_url", urls.refresh_url.as_str());
    body.push("return_url", urls.return_url.as_str());
    body.push("type", "account_onboarding");
    body
}

pub(super) fn checkout_session(request: &HoldRequest) -> FormBody {
    let mut body = FormBody::default();
    body.push("mode", "payment");
    body.push("line_items[0][quantity]", "1");
    body.push("line_items[0][price_data][currency]", request.currency.as_str());
    body.push(
        "line_items[0][price_data][unit_amount]",
        request.amount.cents().to_string(),
    );
    body.push(
        "line_items[0][price_data][product_data][name]",
        request.product_name.as_str(),
    );
    if !request.description.is_empty() {
        body.push(
            "line_items[0][price_data][product_data][description]",
            request.description.as_str(),
        );
    }
    if let Some(transfer) = &request.transfer {
        if let Some(fee) = transfer.platform_fee {
            body.push(
                "payment_intent_data[application_fee_amount]",
                fee.cents().to_string(),
            );
        }
        body.push(
            "payment_intent_data[transfer_data][destination]",
            transfer.destination.as_str(),
        );
    }
    for (key, value) in request.metadata.to_pairs() {
        body.push(format!("metadata[{key}]"), value);
    }
    body.push("success_url", request.success_url.as_str());
    body.push("cancel_url", request.cancel_url.as_str());
    body
}

#[cfg(test)]
mod tests {
    use super::{checkout_session, payee_account};
    use crate::ids::{TaskId, UserId};
    use crate::payments::domain::{
        HoldMetadata, HoldRequest, HoldTransfer, Money, PayeeAccountId, PayeeAccountRequest,
    };
    use rstest::{fixture, rstest};

    #[fixture]
    fn hire_hold() -> HoldRequest {
        HoldRequest {
            amount: Money::from_cents(10_000),
            currency: "usd".to_owned(),
            product_name: "Move a couch".to_owned(),
            description: "Task payment".to_owned(),
            transfer: Some(HoldTransfer {
                destination: PayeeAccountId::new("acct_123").expect("valid account"),
                platform_fee: Some(Money::from_cents(1_500)),
            }),
            metadata: HoldMetadata::hire(TaskId::new(), UserId::new(), UserId::new()),
            success_url: "https://app.test/payment/success".to_owned(),
            cancel_url: "https://app.test/payment/cancel".to_owned(),
        }
    }

    #[rstest]
    fn checkout_carries_amount_fee_and_destination(hire_hold: HoldRequest) {
        let body = checkout_session(&hire_hold);
        assert_eq!(body.get("line_items[0][price_data][unit_amount]"), Some("10000"));
        assert_eq!(body.get("payment_intent_data[application_fee_amount]"), Some("1500"));
        assert_eq!(
            body.get("payment_intent_data[transfer_data][destination]"),
            Some("acct_123")
        );
        assert_eq!(body.get("metadata[type]"), Some("hire"));
    }

    #[rstest]
    fn checkout_without_transfer_keeps_funds_on_platform(mut hire_hold: HoldRequest) {
        hire_hold.transfer = None;
        let body = checkout_session(&hire_hold);
        assert_eq!(body.get("payment_intent_data[application_fee_amount]"), None);
        assert_eq!(body.get("payment_intent_data[transfer_data][destination]"), None);
    }

    #[rstest]
    fn brackets_are_percent_encoded(hire_hold: HoldRequest) {
        let encoded = checkout_session(&hire_hold).encode();
        assert!(encoded.contains("line_items%5B0%5D%5Bquantity%5D=1"));
    }

    #[rstest]
    fn payee_account_requests_transfers() {
        let body = payee_account(&PayeeAccountRequest {
            email: Some("helper@example.com".to_owned()),
        });
        assert_eq!(body.get("type"), Some("express"));
        assert_eq!(body.get("email"), Some("helper@example.com"));
        assert_eq!(body.get("capabilities[transfers][requested]"), Some("true"));
    }
}
