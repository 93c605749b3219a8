//! Public stray-animal-data proxy client.
//!
//! Thin read-only adapter over the public shelter API: region codes,
//! breed codes and abandoned-animal listings. The upstream wraps every
//! payload in a `response.body.items.item` envelope, which this module
//! unwraps before handing rows to the API layer.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream kind code for dogs, pinned on the listing endpoint.
const DOG_UPKIND_CODE: &str = "417000";

#[derive(Debug, Clone)]
pub struct ShelterConfig {
    pub base_url: Url,
    pub service_key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ShelterError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream error {code}: {message}")]
    Upstream { code: String, message: String },
    #[error("invalid endpoint path: {0}")]
    BadPath(url::ParseError),
}

/// Province-level region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidoItem {
    #[serde(rename = "orgCd")]
    pub org_cd: String,
    #[serde(rename = "orgdownNm")]
    pub orgdown_nm: String,
}

/// District within a province.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigunguItem {
    #[serde(rename = "uprCd")]
    pub upr_cd: String,
    #[serde(rename = "orgCd")]
    pub org_cd: String,
    #[serde(rename = "orgdownNm")]
    pub orgdown_nm: String,
}

/// Breed code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KindItem {
    #[serde(rename = "kindCd")]
    pub kind_cd: String,
    pub knm: String,
}

/// One stray-animal listing. Field names follow the upstream payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrayAnimal {
    pub desertion_no: String,
    #[serde(default)]
    pub filename: Option<String>,
    pub happen_dt: String,
    pub happen_place: String,
    pub kind_cd: String,
    #[serde(default)]
    pub color_cd: Option<String>,
    pub age: String,
    pub weight: String,
    pub notice_no: String,
    pub notice_sdt: String,
    pub notice_edt: String,
    #[serde(default)]
    pub popfile: Option<String>,
    pub process_state: String,
    pub sex_cd: String,
    pub neuter_yn: String,
    #[serde(default)]
    pub special_mark: Option<String>,
    pub care_nm: String,
    pub care_tel: String,
    pub care_addr: String,
    pub org_nm: String,
    #[serde(default)]
    pub charge_nm: Option<String>,
    #[serde(default)]
    pub officetel: Option<String>,
}

/// Query filters accepted by the listing endpoint, passed straight through.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingQuery {
    pub upr_cd: Option<String>,
    pub org_cd: Option<String>,
    pub care_reg_no: Option<String>,
    pub state: Option<String>,
    pub bgnde: Option<String>,
    pub endde: Option<String>,
    pub kind: Option<String>,
    pub neuter_yn: Option<String>,
    pub page_no: Option<String>,
    pub num_of_rows: Option<String>,
}

// Upstream envelope.

#[derive(Deserialize)]
struct Envelope<T> {
    response: EnvelopeResponse<T>,
}

#[derive(Deserialize)]
struct EnvelopeResponse<T> {
    header: EnvelopeHeader,
    #[serde(default = "EnvelopeBody::empty")]
    body: EnvelopeBody<T>,
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    #[serde(rename = "resultCode")]
    result_code: String,
    #[serde(rename = "resultMsg")]
    result_msg: String,
}

#[derive(Deserialize)]
struct EnvelopeBody<T> {
    #[serde(default = "EnvelopeItems::empty")]
    items: EnvelopeItems<T>,
}

impl<T> EnvelopeBody<T> {
    fn empty() -> Self {
        Self {
            items: EnvelopeItems::empty(),
        }
    }
}

#[derive(Deserialize)]
struct EnvelopeItems<T> {
    #[serde(default = "Vec::new")]
    item: Vec<T>,
}

impl<T> EnvelopeItems<T> {
    fn empty() -> Self {
        Self { item: Vec::new() }
    }
}

/// Client for the public shelter API.
pub struct ShelterClient {
    config: ShelterConfig,
    http: reqwest::Client,
}

impl ShelterClient {
    pub fn new(config: ShelterConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");
        Self { config, http }
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    /// Province list.
    pub async fn sido(&self) -> Result<Vec<SidoItem>, ShelterError> {
        self.fetch("sido", &[("numOfRows", "100"), ("pageNo", "1")])
            .await
    }

    /// Districts within a province.
    pub async fn sigungu(&self, upr_cd: &str) -> Result<Vec<SigunguItem>, ShelterError> {
        self.fetch("sigungu", &[("upr_cd", upr_cd)]).await
    }

    /// Breed codes for a kind.
    pub async fn kinds(&self, up_kind_cd: &str) -> Result<Vec<KindItem>, ShelterError> {
        self.fetch("kind", &[("up_kind_cd", up_kind_cd)]).await
    }

    /// Abandoned-animal listings, dogs only.
    pub async fn listings(&self, query: &ListingQuery) -> Result<Vec<StrayAnimal>, ShelterError> {
        let mut params: Vec<(&str, &str)> = vec![("upkind", DOG_UPKIND_CODE)];
        let pairs = [
            ("upr_cd", &query.upr_cd),
            ("org_cd", &query.org_cd),
            ("care_reg_no", &query.care_reg_no),
            ("state", &query.state),
            ("bgnde", &query.bgnde),
            ("endde", &query.endde),
            ("kind", &query.kind),
            ("neuter_yn", &query.neuter_yn),
            ("pageNo", &query.page_no),
            ("numOfRows", &query.num_of_rows),
        ];
        for (name, value) in pairs {
            if let Some(value) = value {
                params.push((name, value.as_str()));
            }
        }
        self.fetch("abandonmentPublic", &params).await
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<T>, ShelterError> {
        let base = self.config.base_url.as_str().trim_end_matches('/');
        let url = Url::parse(&format!("{}/{}", base, path)).map_err(ShelterError::BadPath)?;

        let envelope: Envelope<T> = self
            .http
            .get(url)
            .query(&[
                ("serviceKey", self.config.service_key.as_str()),
                ("_type", "json"),
            ])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let header = envelope.response.header;
        // "00" is the upstream success code.
        if header.result_code != "00" {
            return Err(ShelterError::Upstream {
                code: header.result_code,
                message: header.result_msg,
            });
        }

        Ok(envelope.response.body.items.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_unwraps_items() {
        let payload = r#"{
            "response": {
                "header": {"reqNo": 1, "resultCode": "00", "resultMsg": "NORMAL SERVICE."},
                "body": {"items": {"item": [
                    {"orgCd": "6110000", "orgdownNm": "Seoul"}
                ]}, "numOfRows": 100, "pageNo": 1, "totalCount": 1}
            }
        }"#;
        let envelope: Envelope<SidoItem> = serde_json::from_str(payload).unwrap();
        assert_eq!(envelope.response.body.items.item.len(), 1);
        assert_eq!(envelope.response.body.items.item[0].org_cd, "6110000");
    }

    #[test]
    fn test_envelope_tolerates_empty_body() {
        let payload = r#"{
            "response": {
                "header": {"resultCode": "00", "resultMsg": "NORMAL SERVICE."},
                "body": {"numOfRows": 0, "pageNo": 1, "totalCount": 0}
            }
        }"#;
        let envelope: Envelope<StrayAnimal> = serde_json::from_str(payload).unwrap();
        assert!(envelope.response.body.items.item.is_empty());
    }
}
