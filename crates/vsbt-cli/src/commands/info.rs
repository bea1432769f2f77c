use crate::print_info;
use colored::*;
use std::path::Path;
use vsbt_core::units::format_ether;
use vsbt_core::{Address, CollectionConfig, NetworkKind};
use vsbt_vm::{ChainError, LocalChain, Query, ReturnValue, VsbtQuery};

/// Snapshot of the contract's global state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSummary {
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub stable_cost: u128,
    pub bnb_cost: u128,
    pub paused: bool,
    pub total_supply: u128,
    pub base_token_uri: String,
    pub balance: u128,
    pub deployed_at_block: u64,
}

pub fn collect_summary(chain: &LocalChain, address: &Address) -> Result<ContractSummary, ChainError> {
    let info = chain.contract_info(address)?;
    let view = |q: VsbtQuery| chain.view(address, Query::Vsbt(q));
    let text = |v: ReturnValue| v.as_text().unwrap_or_default().to_string();

    Ok(ContractSummary {
        name: text(view(VsbtQuery::Name)?),
        symbol: text(view(VsbtQuery::Symbol)?),
        owner: view(VsbtQuery::Owner)?.as_address().unwrap_or(Address::ZERO),
        stable_cost: view(VsbtQuery::StableCost)?.as_uint().unwrap_or(0),
        bnb_cost: view(VsbtQuery::BnbCost)?.as_uint().unwrap_or(0),
        paused: view(VsbtQuery::Paused)?.as_bool().unwrap_or(false),
        total_supply: view(VsbtQuery::TotalSupply)?.as_uint().unwrap_or(0),
        base_token_uri: text(view(VsbtQuery::BaseTokenUri)?),
        balance: info.balance,
        deployed_at_block: info.created_at_block,
    })
}

pub fn handle(
    config: &CollectionConfig,
    network: NetworkKind,
    state_path: &Path,
    address: &Address,
) -> Result<(), Box<dyn std::error::Error>> {
    if !state_path.exists() {
        return Err(format!("Chain state not found: {}", state_path.display()).into());
    }
    let chain = LocalChain::load_from_file(state_path)?;
    let summary = collect_summary(&chain, address)?;

    print_info(&format!("Contract {}", address));
    println!();
    println!("{} {}", "Name:".bold(), summary.name.cyan());
    println!("{} {}", "Symbol:".bold(), summary.symbol.cyan());
    println!("{} {}", "Owner:".bold(), summary.owner);
    println!(
        "{} {} USDT ({} {} at last mint)",
        "Mint cost:".bold(),
        summary.stable_cost.to_string().green(),
        format_ether(summary.bnb_cost),
        config.network(network).symbol
    );
    let paused = if summary.paused {
        "yes".red()
    } else {
        "no".green()
    };
    println!("{} {}", "Paused:".bold(), paused);
    println!("{} {}", "Minted:".bold(), summary.total_supply);
    if !summary.base_token_uri.is_empty() {
        println!("{} {}", "Base URI:".bold(), summary.base_token_uri);
    }
    println!(
        "{} {} {}",
        "Balance:".bold(),
        format_ether(summary.balance),
        config.network(network).symbol
    );
    println!("{} {}", "Deployed at block:".bold(), summary.deployed_at_block);
    println!(
        "{} {}",
        "Explorer:".bold(),
        config.network(network).contract_url(address)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::deploy::deploy_collection;
    use vsbt_core::{AddressExt, WEI_PER_ETHER};
    use vsbt_vm::{seed_stable_pool, Call, Transaction, VsbtAction};

    #[test]
    fn test_collect_summary_after_mint() {
        let chain = LocalChain::new();
        let owner = Address::from_label("owner");
        let alice = Address::from_label("alice");
        chain.fund(owner, 1_000 * WEI_PER_ETHER).unwrap();
        let pool =
            seed_stable_pool(&chain, owner, 1_000 * WEI_PER_ETHER, 300_000 * WEI_PER_ETHER)
                .unwrap();
        let mut config = CollectionConfig::default();
        config.bnb_token = pool.wrapped_native;
        config.usdt_bnb_lp_token = pool.pair;

        let address = deploy_collection(&chain, &config, owner).unwrap();
        chain.fund(alice, WEI_PER_ETHER).unwrap();
        chain
            .call(
                Transaction::new(
                    alice,
                    address,
                    Call::Vsbt(VsbtAction::MintNft {
                        inviter: Address::ZERO,
                    }),
                )
                .with_value(WEI_PER_ETHER),
            )
            .unwrap();

        let summary = collect_summary(&chain, &address).unwrap();
        assert_eq!(summary.name, "VODA SBT");
        assert_eq!(summary.owner, owner);
        assert_eq!(summary.total_supply, 1);
        assert_eq!(summary.balance, WEI_PER_ETHER);
        assert_eq!(summary.stable_cost, 10);
        // 10 USDT at 1 BNB = 300 USDT
        assert_eq!(summary.bnb_cost, 33_333_333_333_333_330);
        assert_eq!(summary.base_token_uri, "");
    }

    #[test]
    fn test_collect_summary_unknown_address() {
        let chain = LocalChain::new();
        assert!(collect_summary(&chain, &Address::from_label("missing")).is_err());
    }

    #[test]
    fn test_handle_missing_state_file() {
        let err = handle(
            &CollectionConfig::default(),
            NetworkKind::Testnet,
            Path::new("/nonexistent/chain.json"),
            &Address::from_label("x"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("Chain state not found"));
    }
}
