mod checksum;
pub use checksum::{sign_payload, signing_string, verify_payload};
mod error;
pub use error::{PaymentError, PaymentResult};
mod service;
pub use service::{
    PaymentRequest, PaymentStats, SUCCESS_CODE, WebhookPayload, cancel_payment, create_payment,
    process_webhook, stats,
};
