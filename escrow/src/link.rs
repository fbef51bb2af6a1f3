use crate::error::{EscrowError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;
use tiplink_escrow_serde::pubkey;

/// Issues receiver TipLinks bound to an email address, and looks the address back up.
/// The link itself never leaves the service; callers only see its public key.
#[async_trait]
pub trait ReceiverLinkService: Send + Sync {
    async fn create_receiver_link(&self, email: &str) -> Result<Pubkey>;

    async fn receiver_email(&self, receiver_link: &Pubkey) -> Result<String>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedLink {
    #[serde(with = "pubkey")]
    public_key: Pubkey,
}

#[derive(Deserialize)]
struct LinkEmail {
    email: String,
}

/// [ReceiverLinkService] backed by the TipLink enclave HTTP API.
pub struct EnclaveClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl EnclaveClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::Client::new(),
        }
    }

    fn create_url(&self) -> String {
        format!("{}/api/v1/generated-tiplinks/create", self.base_url)
    }

    fn email_url(&self, receiver_link: &Pubkey) -> String {
        format!(
            "{}/api/v1/generated-tiplinks/{}/email",
            self.base_url, receiver_link
        )
    }

    async fn read<T: for<'de> Deserialize<'de>>(
        url: String,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(EscrowError::LinkServiceStatus {
                status: status.as_u16(),
                url,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl ReceiverLinkService for EnclaveClient {
    async fn create_receiver_link(&self, email: &str) -> Result<Pubkey> {
        let url = self.create_url();
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&json!({ "email": email }))
            .send()
            .await?;
        let created: CreatedLink = Self::read(url, response).await?;
        Ok(created.public_key)
    }

    async fn receiver_email(&self, receiver_link: &Pubkey) -> Result<String> {
        let url = self.email_url(receiver_link);
        let response = self
            .http
            .get(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let found: LinkEmail = Self::read(url, response).await?;
        Ok(found.email)
    }
}
