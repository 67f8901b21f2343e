use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    auth::hmac_sha256_hex,
    certificate::{
        CertificateError, CertificateResult,
        canonical::{cert_hash, is_cert_hash},
        metadata::{CertificateMetadata, Issuer, generate_cert_code},
        verify::{TrustLevel, Verification, VerificationSummary, verify_certificate},
    },
    model::{
        CrudRepository, DatabaseResult, ModelManager,
        entity::{Certificate, CertificateCreate, Course, TestAttempt, TestEntity, UserEntity},
    },
    web::AuthenticatedUser,
};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct VerifiedCertificate {
    pub certificate: Certificate,
    pub verification: Verification,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CertificateOverview {
    pub certificates: Vec<VerifiedCertificate>,
    pub summary: VerificationSummary,
}

impl CertificateOverview {
    fn new(certificates: Vec<Certificate>, signing_key: &str) -> Self {
        let certificates: Vec<VerifiedCertificate> = certificates
            .into_iter()
            .map(|certificate| VerifiedCertificate {
                verification: verify_certificate(&certificate, signing_key),
                certificate,
            })
            .collect();
        let summary = VerificationSummary::from_levels(
            certificates.iter().map(|c| &c.verification.trust_level),
        );
        Self {
            certificates,
            summary,
        }
    }
}

pub async fn has_passed_final_test(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    course_id: Uuid,
) -> DatabaseResult<bool> {
    let Some(test) = TestEntity::find_final_for_course(mm, actor, course_id).await? else {
        return Ok(false);
    };

    let attempts = TestAttempt::list_by_user(mm, actor, user_id).await?;
    Ok(attempts
        .iter()
        .filter(|a| a.test_id() == test.id())
        .filter_map(|a| a.score())
        .any(|score| score >= test.passing_score()))
}

#[tracing::instrument(skip(mm, actor, issuer, signing_key))]
pub async fn issue_certificate(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    course_id: Uuid,
    issuer: &Issuer<'_>,
    signing_key: &str,
) -> CertificateResult<Certificate> {
    let course = Course::find_by_id(mm, actor, course_id)
        .await?
        .ok_or(CertificateError::CourseNotFound)?;
    let learner = UserEntity::find_by_id(mm, actor, user_id)
        .await?
        .ok_or(CertificateError::LearnerNotFound)?;

    if Certificate::find_for_user_course(mm, actor, user_id, course_id)
        .await?
        .is_some()
    {
        return Err(CertificateError::Duplicate);
    }

    let issue_date = Utc::now();
    let cert_code = generate_cert_code(&issue_date);
    let metadata = CertificateMetadata::build(&cert_code, &learner, &course, issuer, &issue_date, None);
    let canonical = metadata.canonical()?;
    let signature = hmac_sha256_hex(signing_key, &canonical)?;

    let certificate = Certificate::create(
        mm,
        actor,
        CertificateCreate {
            cert_hash: cert_hash(&canonical),
            cert_code,
            user_id,
            course_id,
            metadata: serde_json::to_value(&metadata)?,
            signature,
            signed_by: issuer.wallet_address.to_lowercase(),
            issue_date,
            expire_date: None,
        },
    )
    .await?;

    info!(
        cert_code = certificate.cert_code(),
        %user_id,
        %course_id,
        "certificate issued"
    );
    Ok(certificate)
}

pub async fn request_certificate(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    course_id: Uuid,
    issuer: &Issuer<'_>,
    signing_key: &str,
) -> CertificateResult<Certificate> {
    if !actor.is_admin() {
        if actor.user_id() != user_id {
            return Err(CertificateError::NotEligible);
        }
        if !has_passed_final_test(mm, actor, user_id, course_id).await? {
            return Err(CertificateError::NotEligible);
        }
    }
    issue_certificate(mm, actor, user_id, course_id, issuer, signing_key).await
}

fn accept(certificate: Certificate, signing_key: &str) -> CertificateResult<VerifiedCertificate> {
    let verification = verify_certificate(&certificate, signing_key);
    if verification.trust_level == TrustLevel::Rejected {
        return Err(CertificateError::Rejected(
            verification.reason.unwrap_or_default(),
        ));
    }
    Ok(VerifiedCertificate {
        certificate,
        verification,
    })
}

pub async fn find_by_code(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    code: &str,
    signing_key: &str,
) -> CertificateResult<VerifiedCertificate> {
    let certificate = Certificate::find_by_code(mm, actor, code.trim())
        .await?
        .ok_or(CertificateError::NotFound)?;
    accept(certificate, signing_key)
}

pub async fn find_by_hash(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    hash: &str,
    signing_key: &str,
) -> CertificateResult<VerifiedCertificate> {
    let hash = hash.trim();
    if !is_cert_hash(hash) {
        return Err(CertificateError::InvalidHash);
    }
    let certificate = Certificate::find_by_hash(mm, actor, hash)
        .await?
        .ok_or(CertificateError::NotFound)?;
    accept(certificate, signing_key)
}

pub async fn overview_for_user(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    user_id: Uuid,
    signing_key: &str,
) -> CertificateResult<CertificateOverview> {
    let certificates = Certificate::list_for_user(mm, actor, user_id).await?;
    Ok(CertificateOverview::new(certificates, signing_key))
}

pub async fn overview_all(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    signing_key: &str,
) -> CertificateResult<CertificateOverview> {
    let certificates = Certificate::all(mm, actor).await?;
    Ok(CertificateOverview::new(certificates, signing_key))
}
