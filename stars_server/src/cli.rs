use std::{env, env::VarError};

/// There's no real CLI for the server, so any argument prints the help text and the current configuration.
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
    // Only variables that never hold secrets
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "STARS_ADMIN_IDS",
        "STARS_SUPPORT_USERNAME",
        "STARS_HOST",
        "STARS_PORT",
        "STARS_DATABASE_URL",
        "STARS_ASSETS_DIR",
        "STARS_WEBHOOK_URL",
        "STARS_TELEGRAM_API_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
