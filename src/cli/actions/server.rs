use crate::api;
use crate::api::handlers::auth::{AuthConfig, AuthorizerOptions, PagePaths, RateLimitSettings};
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::Result;
use std::time::Duration;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            base_url,
            secret,
            session_max_age,
            sign_in_path,
            sign_out_path,
            error_path,
            rate_limit,
            rate_limit_window,
            exact_auth_errors,
            allow_inactive,
            no_audit_log,
        } => {
            let globals = GlobalArgs::new(secret);

            let config = AuthConfig::new(base_url)
                .with_session_ttl_seconds(session_max_age)
                .with_pages(PagePaths {
                    sign_in: sign_in_path,
                    sign_out: sign_out_path,
                    error: error_path,
                });

            let options = AuthorizerOptions {
                generic_error_messages: !exact_auth_errors,
                enforce_active_flag: !allow_inactive,
            };

            // 0 attempts disables throttling entirely
            let limits = (rate_limit > 0).then(|| RateLimitSettings {
                max_attempts: rate_limit,
                window: Duration::from_secs(rate_limit_window),
            });

            api::new(port, dsn, &globals, config, options, limits, !no_audit_log).await?;
        }
    }

    Ok(())
}
