//! Error reporting honoring strict mode

use apiseed_domain::{option_names, OptionsProvider, Result, SeedError};
use tracing::error;

/// Log `message` at error level, or fail with it when the `strict` option is
/// set.
pub fn report_error(options: &dyn OptionsProvider, message: impl Into<String>) -> Result<()> {
    let message = message.into();
    if options.flag(option_names::STRICT) {
        return Err(SeedError::Request(message));
    }
    error!("{message}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use apiseed_domain::SharedOptions;

    use super::*;

    #[test]
    fn logs_unless_strict() {
        let options = SharedOptions::new();
        assert!(report_error(&options, "request failed").is_ok());

        options.set(option_names::STRICT, true.into());
        assert_eq!(
            report_error(&options, "request failed"),
            Err(SeedError::Request("request failed".into()))
        );
    }
}
