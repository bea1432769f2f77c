// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// BLOCK EXPLORER VERIFICATION (Etherscan-compatible API)
//
// 1. POST module=contract&action=verifysourcecode -> GUID
// 2. GET  module=contract&action=checkverifystatus&guid=... until it settles
//
// "Already Verified" from either step counts as success.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::{print_error, print_info, print_success};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use vsbt_core::{Address, CollectionConfig, ConstructorArgs, NetworkKind};

pub const DEFAULT_COMPILER_VERSION: &str = "v0.8.17+commit.8df45f5f";
const POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_POLLS: u32 = 24;

/// Verification inputs shared by `deploy` and `verify`.
#[derive(clap::Args, Debug, Clone)]
pub struct VerifyOptions {
    /// Standard-JSON compiler input submitted as the contract source
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Block explorer API key
    #[arg(long, env = "VSBT_EXPLORER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Full solc version string as the explorer expects it
    #[arg(long, default_value = DEFAULT_COMPILER_VERSION)]
    pub compiler_version: String,
}

/// Etherscan response envelope: `{"status":"1","message":"OK","result":...}`
#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerResponse {
    pub status: String,
    pub message: String,
    #[serde(default)]
    pub result: serde_json::Value,
}

impl ExplorerResponse {
    fn result_text(&self) -> String {
        match &self.result {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    /// Submission accepted; poll with this GUID
    Submitted(String),
    Pending,
    Verified,
    AlreadyVerified,
    Failed(String),
}

fn is_already_verified(text: &str) -> bool {
    text.to_ascii_lowercase().contains("already verified")
}

/// Interpret the reply to `verifysourcecode`.
pub fn interpret_submission(resp: &ExplorerResponse) -> VerifyStatus {
    let text = resp.result_text();
    if is_already_verified(&text) {
        VerifyStatus::AlreadyVerified
    } else if resp.status == "1" && !text.is_empty() {
        VerifyStatus::Submitted(text)
    } else {
        VerifyStatus::Failed(format!("{}: {}", resp.message, text))
    }
}

/// Interpret the reply to `checkverifystatus`.
pub fn interpret_status(resp: &ExplorerResponse) -> VerifyStatus {
    let text = resp.result_text();
    let lower = text.to_ascii_lowercase();
    if lower.contains("pending") {
        VerifyStatus::Pending
    } else if is_already_verified(&text) {
        VerifyStatus::AlreadyVerified
    } else if resp.status == "1" || lower.starts_with("pass") {
        VerifyStatus::Verified
    } else {
        VerifyStatus::Failed(text)
    }
}

/// Form fields of the `verifysourcecode` request. The misspelled
/// `constructorArguements` key is what the explorer API expects.
pub fn submission_form(
    config: &CollectionConfig,
    address: &Address,
    source_code: &str,
    compiler_version: &str,
    api_key: &str,
) -> Vec<(&'static str, String)> {
    let args = ConstructorArgs::from_config(config);
    vec![
        ("apikey", api_key.to_string()),
        ("module", "contract".to_string()),
        ("action", "verifysourcecode".to_string()),
        ("contractaddress", address.to_string()),
        ("sourceCode", source_code.to_string()),
        ("codeformat", "solidity-standard-json-input".to_string()),
        (
            "contractname",
            format!("contracts/{0}.sol:{0}", config.contract_name),
        ),
        ("compilerversion", compiler_version.to_string()),
        ("constructorArguements", args.abi_encode()),
    ]
}

pub struct ExplorerClient {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ExplorerClient {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn submit(
        &self,
        form: &[(&'static str, String)],
    ) -> Result<ExplorerResponse, Box<dyn std::error::Error>> {
        let response = self.client.post(&self.api_url).form(form).send().await?;
        if !response.status().is_success() {
            return Err(format!("Explorer returned HTTP {}", response.status()).into());
        }
        Ok(response.json().await?)
    }

    pub async fn check_status(&self, guid: &str) -> Result<ExplorerResponse, Box<dyn std::error::Error>> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("apikey", self.api_key.as_str()),
                ("module", "contract"),
                ("action", "checkverifystatus"),
                ("guid", guid),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(format!("Explorer returned HTTP {}", response.status()).into());
        }
        Ok(response.json().await?)
    }
}

/// Submit the source and poll until the explorer reaches a verdict.
pub async fn verify_contract(
    config: &CollectionConfig,
    network: NetworkKind,
    address: &Address,
    options: &VerifyOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_path = options
        .source
        .as_deref()
        .ok_or("Verification needs --source <standard-json input>")?;
    let api_key = options
        .api_key
        .as_deref()
        .filter(|k| !k.is_empty())
        .ok_or("Verification needs an explorer API key (VSBT_EXPLORER_API_KEY)")?;
    let source_code = read_source(source_path)?;

    let explorer = &config.network(network).block_explorer;
    let client = ExplorerClient::new(&explorer.api_url, api_key);
    print_info(&format!("Submitting {} to {}...", address, explorer.name));

    let form = submission_form(config, address, &source_code, &options.compiler_version, api_key);
    let guid = match interpret_submission(&client.submit(&form).await?) {
        VerifyStatus::Submitted(guid) => guid,
        VerifyStatus::AlreadyVerified => {
            print_success("Contract is already verified");
            return Ok(());
        }
        VerifyStatus::Failed(reason) => {
            print_error(&format!("Verification rejected: {}", reason));
            return Err(reason.into());
        }
        other => return Err(format!("Unexpected submission reply: {:?}", other).into()),
    };
    debug!("Verification GUID: {}", guid);

    for attempt in 1..=MAX_POLLS {
        tokio::time::sleep(POLL_INTERVAL).await;
        match interpret_status(&client.check_status(&guid).await?) {
            VerifyStatus::Pending => {
                print_info(&format!("Pending in queue ({}/{})", attempt, MAX_POLLS));
            }
            VerifyStatus::Verified | VerifyStatus::AlreadyVerified => {
                print_success(&format!(
                    "Contract verified: {}",
                    explorer.contract_url(address)
                ));
                return Ok(());
            }
            VerifyStatus::Failed(reason) => {
                print_error(&format!("Verification failed: {}", reason));
                return Err(reason.into());
            }
            VerifyStatus::Submitted(_) => warn!("Unexpected status reply for {}", guid),
        }
    }
    Err(format!("Verification still pending after {} polls (GUID {})", MAX_POLLS, guid).into())
}

fn read_source(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read source '{}': {}", path.display(), e))?;
    serde_json::from_str::<serde_json::Value>(&source)
        .map_err(|e| format!("Source '{}' is not JSON: {}", path.display(), e))?;
    Ok(source)
}

pub async fn handle(
    config: &CollectionConfig,
    network: NetworkKind,
    address: &Address,
    options: &VerifyOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    verify_contract(config, network, address, options).await
}
