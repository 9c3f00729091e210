fn main() {
    let mut target_platform: Option<String> = None;

    for (name, _) in std::env::vars() {
        let prefix = "CARGO_FEATURE_TARGET_PLATFORM_";
        if name.starts_with(prefix) {
            let suffix = name[prefix.len()..].to_string();
            if let Some(previous) = &target_platform {
                panic!(
                    "multiple target platform features defined (at least {} and {})",
                    show_feature(previous),
                    show_feature(&suffix)
                );
            }

            target_platform = Some(suffix);
        }
    }

    if target_platform.is_none() {
        panic!("missing target-platform-* feature");
    }
}

fn show_feature(envvar: &str) -> String {
    let mut name = "target-platform-".to_string();
    name.push_str(&envvar.to_ascii_lowercase().replace('_', "-"));
    name
}
