//! Property-based tests for template rendering

use portal_realtime::backend::notifications::LocaleCatalog;
use portal_realtime::shared::locale::SUPPORTED_LOCALES;
use portal_realtime::shared::TemplateKey;
use proptest::prelude::*;
use serde_json::json;
use std::path::Path;

fn catalog() -> LocaleCatalog {
    LocaleCatalog::load_dir(Path::new(env!("CARGO_MANIFEST_DIR")).join("locales")).unwrap()
}

proptest! {
    #[test]
    fn test_every_key_renders_non_empty(
        name in ".{0,20}",
        plan in ".{0,20}",
        amount in "[0-9]{0,6}",
    ) {
        let catalog = catalog();
        let data = json!({ "display_name": name, "plan": plan, "amount": amount });
        for key in TemplateKey::all() {
            let canonical = catalog.render_canonical(key, &data);
            prop_assert!(!canonical.title.trim().is_empty());
            prop_assert!(!canonical.body.trim().is_empty());
            for locale in SUPPORTED_LOCALES {
                let localized = catalog.render_localized(*locale, key, &canonical, &data);
                prop_assert!(!localized.title.trim().is_empty());
                prop_assert!(!localized.body.trim().is_empty());
            }
        }
    }

    #[test]
    fn test_unknown_kind_falls_back(kind in "[a-z]{3,12}", event in proptest::option::of("[a-z]{3,12}")) {
        let catalog = catalog();
        let key = TemplateKey::from_wire(&kind, event.as_deref());
        let rendered = catalog.render_canonical(key, &json!({}));
        prop_assert!(!rendered.title.trim().is_empty());
    }
}
