#![no_main]

use dataprovider::manifest::Manifest;
use dataprovider::runner::DataProviderRunner;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to UTF-8 string (ignore invalid UTF-8)
    if let Ok(s) = std::str::from_utf8(data) {
        // Fuzz manifest parsing
        if let Ok(manifest) = Manifest::from_json(s) {
            // If it loads, fuzz validation and expansion of every type
            if let Ok(registry) = manifest.into_registry() {
                for test_type in registry.type_names() {
                    if let Ok(mut runner) = DataProviderRunner::new(&registry, test_type) {
                        let _ = runner.validate_configuration();
                        let _ = runner.compute_scheduled_invocations();
                    }
                }
            }
        }
    }
});
