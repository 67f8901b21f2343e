use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    certificate::canonical::{canonical_json, cert_hash},
    model::entity::{Course, UserEntity},
};

pub const METADATA_VERSION: &str = "1.0";
pub const METADATA_TYPE: &str = "studyhub-certificate";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct MetadataStudent {
    pub id: Uuid,
    pub wallet_address: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct MetadataCourse {
    pub id: Uuid,
    pub title: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct MetadataIssuer {
    pub wallet_address: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct MetadataValidity {
    pub issue_date: String,
    pub expire_date: Option<String>,
    pub is_revoked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct MetadataChain {
    pub network: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct CertificateMetadata {
    pub version: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub cert_code: String,
    pub student: MetadataStudent,
    pub course: MetadataCourse,
    pub issuer: MetadataIssuer,
    pub validity: MetadataValidity,
    pub blockchain: MetadataChain,
}

pub struct Issuer<'a> {
    pub name: &'a str,
    pub wallet_address: &'a str,
    pub network: &'a str,
}

impl From<&'static crate::config::Certificate> for Issuer<'static> {
    fn from(config: &'static crate::config::Certificate) -> Self {
        Self {
            name: config.issuer_name(),
            wallet_address: config.issuer_wallet(),
            network: config.network(),
        }
    }
}

fn iso(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `SH-YYYYMMDD-XXXXXXXX`, the suffix being random upper-case hex.
pub fn generate_cert_code(date: &DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random();
    format!("SH-{}-{:08X}", date.format("%Y%m%d"), suffix)
}

impl CertificateMetadata {
    pub fn build(
        cert_code: &str,
        student: &UserEntity,
        course: &Course,
        issuer: &Issuer<'_>,
        issue_date: &DateTime<Utc>,
        expire_date: Option<&DateTime<Utc>>,
    ) -> Self {
        Self {
            version: METADATA_VERSION.to_string(),
            kind: METADATA_TYPE.to_string(),
            cert_code: cert_code.to_string(),
            student: MetadataStudent {
                id: student.id(),
                wallet_address: student.wallet_address().map(str::to_lowercase),
                name: student.full_name().to_string(),
            },
            course: MetadataCourse {
                id: course.id(),
                title: course.title().to_string(),
                category: course.category().to_string(),
            },
            issuer: MetadataIssuer {
                wallet_address: issuer.wallet_address.to_lowercase(),
                name: issuer.name.to_string(),
            },
            validity: MetadataValidity {
                issue_date: iso(issue_date),
                expire_date: expire_date.map(iso),
                is_revoked: false,
            },
            blockchain: MetadataChain {
                network: issuer.network.to_string(),
            },
        }
    }

    pub fn canonical(&self) -> Result<String, serde_json::Error> {
        canonical_json(&serde_json::to_value(self)?)
    }

    pub fn hash(&self) -> Result<String, serde_json::Error> {
        Ok(cert_hash(&self.canonical()?))
    }
}
