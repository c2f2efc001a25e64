pub mod server;

use secrecy::SecretString;

#[derive(Debug)]
pub enum Action {
    Server {
        port: u16,
        dsn: String,
        base_url: String,
        secret: SecretString,
        session_max_age: i64,
        sign_in_path: String,
        sign_out_path: String,
        error_path: String,
        rate_limit: u32,
        rate_limit_window: u64,
        exact_auth_errors: bool,
        allow_inactive: bool,
        no_audit_log: bool,
    },
}
