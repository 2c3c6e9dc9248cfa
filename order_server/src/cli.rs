use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets are deliberately left off this list
    const DISPLAY_ENVS: [&str; 11] = [
        "RUST_LOG",
        "OMS_HOST",
        "OMS_PORT",
        "OMS_DATABASE_URL",
        "OMS_AUTO_MIGRATE",
        "OMS_STOREFRONT_URL",
        "OMS_TAX_RATE_BPS",
        "OMS_CURRENCY",
        "OMS_CHECKOUT_API_URL",
        "OMS_CHECKOUT_TIMEOUT_SECS",
        "OMS_CHECKOUT_WEBHOOK_TOLERANCE_SECS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<40} {val:<15}");
    })
}
