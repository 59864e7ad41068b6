use mysql_async::{Opts, OptsBuilder};

use crate::config::ConnectionOptions;

/// Driver options for one connection to `schema` (none when empty).
///
/// The charset is applied with `SET NAMES` as soon as the connection is up;
/// `wait_timeout` is only sent when configured.
#[must_use]
pub fn build_opts(options: &ConnectionOptions, schema: &str) -> Opts {
    let db_name = (!schema.is_empty()).then(|| schema.to_string());
    let pass = (!options.password.is_empty()).then(|| options.password.clone());
    let wait_timeout = match options.wait_timeout {
        0 => None,
        secs => usize::try_from(secs).ok(),
    };

    OptsBuilder::default()
        .ip_or_hostname(options.host.clone())
        .tcp_port(options.port)
        .user(Some(options.user.clone()))
        .pass(pass)
        .db_name(db_name)
        .max_allowed_packet(Some(options.max_allowed_packet))
        .wait_timeout(wait_timeout)
        .init(vec![format!("SET NAMES {}", options.default_charset)])
        .into()
}
