use crate::print_info;
use colored::*;
use vsbt_core::{CollectionConfig, ConstructorArgs};

const LABELS: [&str; 6] = [
    "Wrapped native",
    "Liquidity pool",
    "Creator",
    "Plan A",
    "Token name",
    "Token symbol",
];

pub fn handle(config: &CollectionConfig) {
    let args = ConstructorArgs::from_config(config);
    print_info(&format!("Constructor arguments for {}", config.contract_name));
    println!();
    for (i, (label, value)) in LABELS.iter().zip(args.to_strings()).enumerate() {
        println!("  {} {:<16} {}", format!("[{}]", i).dimmed(), label.bold(), value.cyan());
    }
    println!();
    println!("{}", "ABI-encoded:".bold());
    println!("{}", args.abi_encode());
}
