mod canonical;
pub use canonical::{canonical_json, cert_hash, is_cert_hash};
mod error;
pub use error::{CertificateError, CertificateResult};
mod metadata;
pub use metadata::{CertificateMetadata, Issuer, generate_cert_code};
mod service;
pub use service::{
    CertificateOverview, VerifiedCertificate, find_by_code, find_by_hash, has_passed_final_test,
    issue_certificate, overview_all, overview_for_user, request_certificate,
};
mod verify;
pub use verify::{TrustLevel, TrustStatus, Verification, VerificationSummary, verify_certificate};
