use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    model::{
        CrudRepository, ModelManager,
        entity::{Course, CourseRevenue, Payment, PaymentCreate, PaymentStatus, PaymentTotals},
    },
    payment::{PaymentError, PaymentResult, checksum::verify_payload},
    web::AuthenticatedUser,
};

pub const SUCCESS_CODE: &str = "00";
const TOP_COURSES: i64 = 5;

#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct PaymentRequest {
    pub course_id: Uuid,
    pub amount: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WebhookPayload {
    pub code: String,
    pub desc: String,
    pub success: bool,
    #[schema(value_type = Object)]
    pub data: Map<String, Value>,
    pub signature: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PaymentStats {
    pub totals: PaymentTotals,
    pub top_courses: Vec<CourseRevenue>,
}

fn generate_order_code() -> i64 {
    rand::rng().random_range(100_000_000..9_007_199_254)
}

pub async fn create_payment(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    request: PaymentRequest,
    currency: &str,
) -> PaymentResult<Payment> {
    let course = Course::find_by_id(mm, actor, request.course_id)
        .await?
        .ok_or(PaymentError::CourseNotFound)?;

    let amount = request.amount.unwrap_or(course.cost());
    if amount <= 0 {
        return Err(PaymentError::InvalidAmount);
    }

    let payment = Payment::create(
        mm,
        actor,
        PaymentCreate {
            order_code: generate_order_code(),
            user_id: actor.user_id(),
            course_id: course.id(),
            amount,
            currency: currency.to_string(),
            description: course.title().to_string(),
        },
    )
    .await?;

    info!(order_code = payment.order_code(), amount, "payment created");
    Ok(payment)
}

fn order_code_of(data: &Map<String, Value>) -> PaymentResult<i64> {
    match data.get("order_code") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or(PaymentError::MissingField("order_code"))
}

fn amount_of(data: &Map<String, Value>) -> Option<i64> {
    match data.get("amount") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Settles the payment named by a signed gateway notification. Payments that
/// are no longer pending come back unchanged.
#[tracing::instrument(skip_all)]
pub async fn process_webhook(
    mm: &ModelManager,
    payload: &WebhookPayload,
    checksum_key: &str,
) -> PaymentResult<Payment> {
    if !verify_payload(checksum_key, &payload.data, &payload.signature)? {
        warn!("rejected webhook with an invalid signature");
        return Err(PaymentError::InvalidSignature);
    }

    let actor = AuthenticatedUser::admin();
    let order_code = order_code_of(&payload.data)?;
    let payment = Payment::find_by_order_code(mm, &actor, order_code)
        .await?
        .ok_or(PaymentError::NotFound)?;

    if payment.status() != PaymentStatus::Pending {
        return Ok(payment);
    }

    let code = payload.data.get("code").and_then(Value::as_str);
    let status = if code == Some(SUCCESS_CODE) && amount_of(&payload.data) == Some(payment.amount())
    {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Cancelled
    };

    let settled = match payment.settle(mm, &actor, status).await? {
        Some(settled) => settled,
        // settled concurrently
        None => Payment::find_by_id(mm, &actor, payment.id())
            .await?
            .ok_or(PaymentError::NotFound)?,
    };

    info!(order_code, status = settled.status().as_str(), "payment settled");
    Ok(settled)
}

pub async fn cancel_payment(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    payment_id: Uuid,
) -> PaymentResult<Payment> {
    let payment = Payment::find_by_id(mm, actor, payment_id)
        .await?
        .ok_or(PaymentError::NotFound)?;
    if payment.user_id() != actor.user_id() && !actor.is_admin() {
        return Err(PaymentError::Forbidden);
    }

    payment
        .settle(mm, actor, PaymentStatus::Cancelled)
        .await?
        .ok_or(PaymentError::NotPending)
}

pub async fn stats(mm: &ModelManager, actor: &AuthenticatedUser) -> PaymentResult<PaymentStats> {
    Ok(PaymentStats {
        totals: Payment::totals(mm, actor).await?,
        top_courses: Payment::top_courses(mm, actor, TOP_COURSES).await?,
    })
}
