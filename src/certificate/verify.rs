use serde::{Deserialize, Serialize};

use crate::{
    auth::verify_hmac_sha256_hex,
    certificate::{canonical::canonical_json, canonical::cert_hash, metadata::CertificateMetadata},
    grading::round2,
    model::entity::Certificate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    Trusted,
    Warning,
    Rejected,
    Unknown,
}

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct TrustStatus {
    pub code: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub severity: &'static str,
}

impl TrustLevel {
    pub fn status(&self) -> TrustStatus {
        let (code, label, color, severity) = match self {
            Self::Trusted => ("VERIFIED", "Verified & Trusted", "#22c55e", "success"),
            Self::Warning => (
                "VERIFIED_WITH_WARNING",
                "Verified with warnings",
                "#f59e0b",
                "warning",
            ),
            Self::Rejected => ("INVALID", "Invalid Certificate", "#ef4444", "error"),
            Self::Unknown => ("VERIFICATION_FAILED", "Cannot Verify", "#6b7280", "error"),
        };
        TrustStatus {
            code,
            label,
            color,
            severity,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct Verification {
    pub trust_level: TrustLevel,
    pub status: TrustStatus,
    pub warnings: Vec<String>,
    pub reason: Option<String>,
}

impl Verification {
    fn new(trust_level: TrustLevel, warnings: Vec<String>, reason: Option<String>) -> Self {
        Self {
            trust_level,
            status: trust_level.status(),
            warnings,
            reason,
        }
    }

    fn rejected(reason: &str) -> Self {
        Self::new(TrustLevel::Rejected, vec![], Some(reason.to_string()))
    }
}

pub fn verify_certificate(certificate: &Certificate, signing_key: &str) -> Verification {
    let Some(raw) = certificate.metadata() else {
        return Verification::new(
            TrustLevel::Unknown,
            vec![],
            Some("Metadata is missing".to_string()),
        );
    };

    let Some(signature) = certificate.signature().filter(|s| !s.is_empty()) else {
        return Verification::rejected("Missing signature fields");
    };

    let Ok(canonical) = canonical_json(raw) else {
        return Verification::rejected("Metadata cannot be serialized");
    };

    match verify_hmac_sha256_hex(signing_key, &canonical, signature) {
        Ok(true) => {}
        Ok(false) => return Verification::rejected("Signature mismatch - payload altered"),
        Err(e) => {
            return Verification::new(TrustLevel::Unknown, vec![], Some(e.to_string()));
        }
    }

    let mut warnings = Vec::new();

    if !cert_hash(&canonical).eq_ignore_ascii_case(certificate.cert_hash()) {
        warnings.push("Stored hash does not match the signed metadata".to_string());
    }

    match serde_json::from_value::<CertificateMetadata>(raw.clone()) {
        Ok(metadata) => {
            if metadata.cert_code != certificate.cert_code() {
                warnings.push("Certificate code differs from the signed metadata".to_string());
            }
            if metadata.student.id != certificate.user_id() {
                warnings.push("Learner differs from the signed metadata".to_string());
            }
            if metadata.course.id != certificate.course_id() {
                warnings.push("Course differs from the signed metadata".to_string());
            }
            if metadata.validity.is_revoked != certificate.is_revoked() {
                warnings.push("Revocation status differs from the signed metadata".to_string());
            }
            if let Some(signer) = certificate.signed_by() {
                if !signer.eq_ignore_ascii_case(&metadata.issuer.wallet_address) {
                    warnings.push("Signer is not the issuer named in the metadata".to_string());
                }
            }
        }
        Err(_) => warnings.push("Metadata does not follow the certificate format".to_string()),
    }

    if warnings.is_empty() {
        Verification::new(TrustLevel::Trusted, warnings, None)
    } else {
        Verification::new(TrustLevel::Warning, warnings, None)
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct VerificationSummary {
    pub total: usize,
    pub trusted: usize,
    pub warning: usize,
    pub rejected: usize,
    /// `trusted / total * 100`, two decimals.
    pub health_score: f64,
}

impl VerificationSummary {
    pub fn from_levels<'a>(levels: impl IntoIterator<Item = &'a TrustLevel>) -> Self {
        let (mut trusted, mut warning, mut rejected) = (0, 0, 0);
        for level in levels {
            match level {
                TrustLevel::Trusted => trusted += 1,
                TrustLevel::Warning => warning += 1,
                TrustLevel::Rejected | TrustLevel::Unknown => rejected += 1,
            }
        }
        let total = trusted + warning + rejected;
        let health_score = if total == 0 {
            0.0
        } else {
            round2(trusted as f64 / total as f64 * 100.0)
        };
        Self {
            total,
            trusted,
            warning,
            rejected,
            health_score,
        }
    }
}
