//! Example: Provision ninja onto this machine
//!
//! Run with: cargo run -p ninjakit --example provision_local -- <tool-id> [tools-dir]

use ninjakit::node::LocalNode;
use ninjakit::registry::ToolInstallation;
use ninjakit::{Client, platform};

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(tool_id) = args.next() else {
        eprintln!("usage: provision_local <tool-id> [tools-dir]");
        std::process::exit(2);
    };
    let tools_dir = args.next().unwrap_or_else(|| "tools".to_string());

    println!("Ninja Provisioner");
    println!("=================\n");

    let signature = platform::detect();
    println!("Platform: {signature}");

    let client = Client::new();
    let tools = client.installables();
    if tools.is_empty() {
        println!("The download service lists no installable versions.");
    } else {
        println!("Installable versions:");
        for tool in &tools {
            println!("  {:<12} {}", tool.id, tool.label());
        }
    }

    println!("\nProvisioning {tool_id} into {tools_dir}...");

    let node = LocalNode::new("local", tools_dir);
    let tool = ToolInstallation::new(&tool_id, None).with_installer(&tool_id);

    match client.translate(&tool, &node) {
        Ok(resolved) => {
            println!("\nProvisioning successful!");
            println!("  Installation: {}", resolved.name);
            println!("  Executable:   {}", resolved.home);
        }
        Err(e) => {
            eprintln!("\nProvisioning failed: {e}");
            eprintln!("  {}", e.category().advice());
            std::process::exit(1);
        }
    }
}
