use clap::{
    Arg, ArgAction, ColorChoice, Command,
    builder::styling::{AnsiColor, Effects, Styles},
};

/// Pure clap command definitions with zero business logic
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new(env!("CARGO_PKG_NAME"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("auth")
                .default_value("sqlserver")
                .env("QUERYPULSE_AUTH")
                .help("Authentication method: windows, sqlserver")
                .long("auth")
                .long_help(
                    "Authentication method:\n\n\
                    - sqlserver: SQL Server login with --username/--password (default)\n\
                    - windows: NTLM login as <domain>\\<username>, requires --domain.\n\
                      Only available when querypulse runs on a Windows host, elsewhere\n\
                      the check reports CRITICAL with a connection error.\n\n\
                    'Windows Authentication' and 'SQL Server Authentication' are accepted too."
                )
                .short('a')
                .value_name("METHOD"),
        )
        .arg(
            Arg::new("host")
                .env("QUERYPULSE_HOST")
                .help("SQL Server hostname or IP address")
                .long("host")
                .short('H')
                .required(true),
        )
        .arg(
            Arg::new("port")
                .default_value("1433")
                .env("QUERYPULSE_PORT")
                .help("SQL Server port")
                .long("port")
                .short('p')
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("domain")
                .env("QUERYPULSE_DOMAIN")
                .help("Windows domain, only valid with --auth windows")
                .long("domain"),
        )
        .arg(
            Arg::new("username")
                .env("QUERYPULSE_USERNAME")
                .help("Login name")
                .long("username")
                .short('u')
                .required(true),
        )
        .arg(
            Arg::new("password")
                .env("QUERYPULSE_PASSWORD")
                .help("Login password")
                .long("password")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("instance")
                .env("QUERYPULSE_INSTANCE")
                .help("Named instance, resolved through SQL Browser")
                .long("instance"),
        )
        .arg(
            Arg::new("database")
                .env("QUERYPULSE_DATABASE")
                .help("Database to connect to")
                .long("database")
                .short('d'),
        )
        .arg(
            Arg::new("query")
                .env("QUERYPULSE_QUERY")
                .help("SQL query to run, the last row is reported")
                .long("query")
                .short('q')
                .required(true),
        )
        .arg(
            Arg::new("tls-mode")
                .default_value("disable")
                .env("QUERYPULSE_TLS_MODE")
                .help("TLS mode: disable, require, verify-ca, verify-full")
                .long("tls-mode")
                .long_help(
                    "TLS connection mode:\n\n\
                    - disable: No TLS (default)\n\
                    - require: TLS required, server certificate trusted as-is\n\
                    - verify-ca: Verify server certificate against CA\n\
                    - verify-full: Verify certificate and hostname"
                )
                .value_name("MODE")
                .value_parser(["disable", "require", "verify-ca", "verify-full"]),
        )
        .arg(
            Arg::new("tls-ca")
                .env("QUERYPULSE_TLS_CA")
                .help("Path to CA certificate file for TLS verification")
                .long("tls-ca")
                .value_name("PATH"),
        )
        .arg(
            Arg::new("format")
                .default_value("text")
                .env("QUERYPULSE_FORMAT")
                .help("Report format: text, json, prometheus")
                .long("format")
                .short('f')
                .value_parser(["text", "json", "prometheus"]),
        )
        .arg(
            Arg::new("timeout")
                .default_value("30")
                .env("QUERYPULSE_TIMEOUT")
                .help("Seconds before the check is reported CRITICAL, 0 disables")
                .long("timeout")
                .short('t')
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("verbose")
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count),
        )
}
