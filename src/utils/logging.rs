/// Initialize the logger, defaulting to `info` unless `RUST_LOG` says otherwise
pub fn init() {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&filters)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice() {
        init();
        init();
    }
}
