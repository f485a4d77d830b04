//! Logging setup utilities shared by the ShadowPad binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Both the ShadowPad library crates and the calling binary log at
/// `default_log_level`. The filter can be overridden with `RUST_LOG`.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "shadowpad_server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use shadowpad_shared::logger::setup_logger;
///
/// setup_logger("shadowpad_server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the default `EnvFilter` directive string.
///
/// Binary names use dashes (`shadowpad-server`) while tracing targets use the
/// crate path form (`shadowpad_server`), so both are normalized.
fn default_filter(binary_name: &str, level: &str) -> String {
    let binary_target = binary_name.replace('-', "_");
    let mut directives: Vec<String> = ["shadowpad_shared", "shadowpad_server", "shadowpad_client"]
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    if !directives.iter().any(|d| d.starts_with(&format!("{}=", binary_target))) {
        directives.push(format!("{}={}", binary_target, level));
    }
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_all_crates() {
        // テスト項目: デフォルトフィルタが全クレートのターゲットを含む
        // given (前提条件):
        let binary = "shadowpad-server";

        // when (操作):
        let filter = default_filter(binary, "debug");

        // then (期待する結果):
        assert!(filter.contains("shadowpad_shared=debug"));
        assert!(filter.contains("shadowpad_server=debug"));
        assert!(filter.contains("shadowpad_client=debug"));
        assert_eq!(filter.matches("shadowpad_server=").count(), 1);
    }

    #[test]
    fn test_default_filter_appends_unknown_binary() {
        // テスト項目: 未知のバイナリ名はターゲットとして追加される
        // given (前提条件):
        let binary = "pad-tool";

        // when (操作):
        let filter = default_filter(binary, "info");

        // then (期待する結果):
        assert!(filter.ends_with("pad_tool=info"));
    }
}
