// Copyright © 2025 rustmailer.com
// Licensed under RustMailer License Agreement v1.0
// Unauthorized copying, modification, or distribution is prohibited.

use clap::{builder::ValueParser, Parser};
use std::{collections::HashSet, path::PathBuf, sync::LazyLock};
use url::Url;

#[cfg(not(test))]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::parse);

#[cfg(test)]
pub static SETTINGS: LazyLock<Settings> = LazyLock::new(Settings::new_for_test);

fn parse_url(s: &str) -> Result<String, String> {
    Url::parse(s).map_err(|_| format!("Invalid URL: {}", s))?;
    Ok(s.trim_end_matches('/').to_string())
}

fn parse_domain_set(s: &str) -> Result<HashSet<String>, String> {
    Ok(s.split(',')
        .map(|domain| domain.trim().to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
        .collect())
}

#[derive(Debug, Parser)]
#[clap(
    name = "rustcampaign",
    about = "A service that sends personalized email campaigns through the Gmail API,
    with per-user daily quotas and live progress tracking.",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Settings {
    /// rustcampaign log level (default: "info")
    #[clap(
        long,
        default_value = "info",
        env,
        help = "Set the log level for rustcampaign"
    )]
    pub rustcampaign_log_level: String,

    /// rustcampaign HTTP port (default: 15830)
    #[clap(
        long,
        default_value = "15830",
        env,
        help = "Set the HTTP port for rustcampaign"
    )]
    pub rustcampaign_http_port: u16,

    /// The IP address that the server binds to, in IPv4 format (e.g., 192.168.1.1).
    #[clap(
        long,
        env,
        default_value = "0.0.0.0",
        help = "The IPv4 address that the HTTP server binds to",
        value_parser = ValueParser::new(|s: &str| {
            if s.parse::<std::net::Ipv4Addr>().is_err() {
                return Err("The bind IP address must be a valid IPv4 address.".to_string());
            }
            Ok(s.to_string())
        })
    )]
    pub rustcampaign_bind_ip: String,

    #[clap(
        long,
        default_value = "*",
        env,
        help = "Set the allowed CORS origins (comma-separated list, e.g., \"https://example.com, https://another.com\")",
        value_parser = ValueParser::new(|s: &str| -> Result<HashSet<String>, String> {
            let set: HashSet<String> = s.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect();
            Ok(set)
        })
    )]
    pub rustcampaign_cors_origins: HashSet<String>,

    /// CORS max age in seconds (default: 86400)
    #[clap(
        long,
        default_value = "86400",
        env,
        help = "Set the CORS max age in seconds"
    )]
    pub rustcampaign_cors_max_age: i32,

    #[clap(
        long,
        default_value = "true",
        env,
        help = "Enable compression for the open api server"
    )]
    pub rustcampaign_http_compression_enabled: bool,

    /// Enable ANSI logs (default: true)
    #[clap(long, default_value = "true", env, help = "Enable ANSI formatted logs")]
    pub rustcampaign_ansi_logs: bool,

    /// Enable JSON logs (default: false)
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable JSON formatted logs"
    )]
    pub rustcampaign_json_logs: bool,

    /// If false, logs will be printed to stdout
    #[clap(
        long,
        default_value = "false",
        env,
        help = "Enable log file output (otherwise logs go to stdout)"
    )]
    pub rustcampaign_log_to_file: bool,

    #[clap(
        long,
        env,
        default_value = "./logs",
        help = "Directory for rolling server log files (used when log-to-file is enabled)"
    )]
    pub rustcampaign_log_dir: PathBuf,

    /// Maximum number of log files (default: 5)
    #[clap(
        long,
        default_value = "5",
        env,
        help = "Set the maximum number of server log files"
    )]
    pub rustcampaign_max_server_log_files: usize,

    #[clap(
        long,
        env,
        default_value = "https://gmail.googleapis.com",
        help = "Base URL of the Gmail REST API",
        value_parser = ValueParser::new(parse_url)
    )]
    pub rustcampaign_gmail_api_url: String,

    #[clap(
        long,
        env,
        default_value = "https://www.googleapis.com/oauth2/v1/tokeninfo",
        help = "Token introspection endpoint used for credential pre-flight checks",
        value_parser = ValueParser::new(parse_url)
    )]
    pub rustcampaign_tokeninfo_url: String,

    #[clap(
        long,
        env,
        default_value = "https://oauth2.googleapis.com/token",
        help = "OAuth2 token endpoint used to refresh access tokens",
        value_parser = ValueParser::new(parse_url)
    )]
    pub rustcampaign_oauth2_token_url: String,

    #[clap(long, env, default_value = "", help = "Google OAuth2 client id")]
    pub rustcampaign_google_client_id: String,

    #[clap(long, env, default_value = "", help = "Google OAuth2 client secret")]
    pub rustcampaign_google_client_secret: String,

    #[clap(
        long,
        env,
        default_value = "30",
        help = "Timeout in seconds for every request made to the mail provider",
        value_parser = clap::value_parser!(u64).range(1..=300)
    )]
    pub rustcampaign_http_timeout_secs: u64,

    #[clap(
        long,
        env,
        default_value = "3",
        help = "Maximum number of retries for a rate-limited send",
        value_parser = clap::value_parser!(u32).range(0..=10)
    )]
    pub rustcampaign_send_max_retries: u32,

    #[clap(
        long,
        env,
        default_value = "1000",
        help = "Base backoff delay in milliseconds; doubles on every rate-limited attempt"
    )]
    pub rustcampaign_send_backoff_base_ms: u64,

    #[clap(
        long,
        env,
        default_value = "1000",
        help = "Minimum pause in milliseconds between two sends of a campaign"
    )]
    pub rustcampaign_send_delay_min_ms: u64,

    #[clap(
        long,
        env,
        default_value = "5000",
        help = "Maximum pause in milliseconds between two sends of a campaign"
    )]
    pub rustcampaign_send_delay_max_ms: u64,

    #[clap(
        long,
        env,
        default_value = "2",
        help = "Daily sending limit for free (consumer mailbox) accounts",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rustcampaign_free_daily_limit: u32,

    #[clap(
        long,
        env,
        default_value = "2000",
        help = "Daily sending limit for organization (custom domain) accounts",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub rustcampaign_organization_daily_limit: u32,

    #[clap(
        long,
        env,
        default_value = "gmail.com, googlemail.com",
        help = "Comma-separated mail domains classified as free consumer accounts",
        value_parser = ValueParser::new(parse_domain_set)
    )]
    pub rustcampaign_consumer_domains: HashSet<String>,

    #[clap(
        long,
        env,
        default_value = "300",
        help = "Seconds a campaign progress snapshot is retained after tracking starts",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rustcampaign_progress_retention_secs: u64,

    #[clap(
        long,
        env,
        default_value = "RustCampaign",
        help = "Brand name shown in the header of wrapped HTML emails"
    )]
    pub rustcampaign_brand_name: String,

    #[clap(
        long,
        env,
        default_value = "Intelligent Email Marketing",
        help = "Tagline shown under the brand name of wrapped HTML emails"
    )]
    pub rustcampaign_brand_tagline: String,
}

impl Settings {
    #[cfg(test)]
    fn new_for_test() -> Self {
        Self {
            rustcampaign_log_level: "info".to_string(),
            rustcampaign_http_port: 15830,
            rustcampaign_bind_ip: "127.0.0.1".to_string(),
            rustcampaign_cors_origins: Default::default(),
            rustcampaign_cors_max_age: 86400,
            rustcampaign_http_compression_enabled: false,
            rustcampaign_ansi_logs: false,
            rustcampaign_json_logs: false,
            rustcampaign_log_to_file: false,
            rustcampaign_log_dir: PathBuf::from("./logs"),
            rustcampaign_max_server_log_files: 5,
            rustcampaign_gmail_api_url: "https://gmail.googleapis.com".to_string(),
            rustcampaign_tokeninfo_url: "https://www.googleapis.com/oauth2/v1/tokeninfo"
                .to_string(),
            rustcampaign_oauth2_token_url: "https://oauth2.googleapis.com/token".to_string(),
            rustcampaign_google_client_id: "test-client".to_string(),
            rustcampaign_google_client_secret: "test-secret".to_string(),
            rustcampaign_http_timeout_secs: 5,
            rustcampaign_send_max_retries: 3,
            rustcampaign_send_backoff_base_ms: 1000,
            rustcampaign_send_delay_min_ms: 1000,
            rustcampaign_send_delay_max_ms: 5000,
            rustcampaign_free_daily_limit: 2,
            rustcampaign_organization_daily_limit: 2000,
            rustcampaign_consumer_domains: ["gmail.com", "googlemail.com"]
                .into_iter()
                .map(String::from)
                .collect(),
            rustcampaign_progress_retention_secs: 300,
            rustcampaign_brand_name: "RustCampaign".to_string(),
            rustcampaign_brand_tagline: "Intelligent Email Marketing".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_domain_set, parse_url};

    #[test]
    fn urls_are_normalized_without_trailing_slash() {
        assert_eq!(
            parse_url("http://127.0.0.1:8080/").unwrap(),
            "http://127.0.0.1:8080"
        );
        assert!(parse_url("not a url").is_err());
    }

    #[test]
    fn domain_sets_are_lowercased_and_trimmed() {
        let set = parse_domain_set(" Gmail.com, ,googlemail.com ").unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("gmail.com"));
        assert!(set.contains("googlemail.com"));
    }
}
