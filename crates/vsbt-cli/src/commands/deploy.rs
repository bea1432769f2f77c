// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// DEPLOY - construct the VSTB contract from the collection config, persist
// the chain state, then hand off to explorer verification.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::commands::common::parse_address;
use crate::commands::verify::{self, VerifyOptions};
use crate::{print_info, print_success};
use colored::*;
use log::info;
use std::path::Path;
use vsbt_core::{Address, CollectionConfig, ConstructorArgs, NetworkKind};
use vsbt_vm::{ChainError, ContractInit, LocalChain, SaleParams, VsbtInit};

pub struct DeployRequest {
    pub from: String,
    pub skip_verify: bool,
    pub verify: VerifyOptions,
}

/// Deploy with the constructor arguments derived from `config`.
pub fn deploy_collection(
    chain: &LocalChain,
    config: &CollectionConfig,
    deployer: Address,
) -> Result<Address, ChainError> {
    let args = ConstructorArgs::from_config(config);
    let init = VsbtInit::from_args(&args, SaleParams::from(&config.sale));
    chain.deploy(deployer, ContractInit::Vsbt(init))
}

pub async fn handle(
    config: &CollectionConfig,
    network: NetworkKind,
    state_path: &Path,
    request: DeployRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    let deployer = parse_address(&request.from)?;
    let net = config.network(network);
    print_info(&format!(
        "Deploying {} to {} (chain id {})...",
        config.contract_name, net.name, net.chain_id
    ));

    let chain = LocalChain::open(state_path)?;
    let address = deploy_collection(&chain, config, deployer)?;
    chain.save_to_file(state_path)?;
    info!("Chain state written to {}", state_path.display());

    print_success(&format!("Contract deployed to: {}", address.to_string().green()));
    println!("  {} {}", "Explorer:".bold(), net.contract_url(&address));

    if request.skip_verify {
        print_info("Verification skipped (--skip-verify)");
        return Ok(());
    }
    if request.verify.source.is_none() {
        print_info("No --source given; run `vsbt-cli verify` once the build input is available");
        return Ok(());
    }

    print_info("Verification for contract...");
    verify::verify_contract(config, network, &address, &request.verify).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsbt_core::AddressExt;
    use vsbt_vm::{Query, VsbtQuery};

    #[test]
    fn test_deploy_collection_uses_config() {
        let chain = LocalChain::new();
        let mut config = CollectionConfig::default();
        config.sale.initial_cost_wei = 5;
        let deployer = Address::from_label("deployer");

        let address = deploy_collection(&chain, &config, deployer).unwrap();

        let view = |q: VsbtQuery| chain.view(&address, Query::Vsbt(q)).unwrap();
        assert_eq!(view(VsbtQuery::Name).as_text(), Some("VODA SBT"));
        assert_eq!(view(VsbtQuery::Symbol).as_text(), Some("VSTB"));
        assert_eq!(view(VsbtQuery::Owner).as_address(), Some(deployer));
        assert_eq!(view(VsbtQuery::BnbCost).as_uint(), Some(5));
        assert_eq!(view(VsbtQuery::StableCost).as_uint(), Some(10));
        assert_eq!(view(VsbtQuery::Paused).as_bool(), Some(false));
    }

    #[tokio::test]
    async fn test_deploy_persists_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("chain.json");
        let config = CollectionConfig::default();
        let request = DeployRequest {
            from: "0x729816eD59Ac14C3Fced1051d80c89eeDA7eF54d".to_string(),
            skip_verify: true,
            verify: VerifyOptions {
                source: None,
                api_key: None,
                compiler_version: verify::DEFAULT_COMPILER_VERSION.to_string(),
            },
        };

        handle(&config, NetworkKind::Testnet, &state, request).await.unwrap();

        let chain = LocalChain::load_from_file(&state).unwrap();
        assert_eq!(chain.contract_addresses().unwrap().len(), 1);
    }
}
