use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::settings::get_settings;

const EN_CATALOG: &str = include_str!("locales/en.json");

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
}

impl Language {
    pub const ALL: &'static [Language] = &[Language::English];

    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::English => "English",
        }
    }

    /// Region tags are ignored (`en-US` → English).
    pub fn from_code(code: &str) -> Option<Self> {
        let normalized = code.trim().to_lowercase();
        let lang = normalized.split(['-', '_']).next().unwrap_or("");
        Self::ALL.iter().copied().find(|l| l.code() == lang)
    }

    pub fn is_supported_code(code: &str) -> bool {
        Self::ALL.iter().any(|l| l.code() == code)
    }

    fn catalog_source(&self) -> &'static str {
        match self {
            Language::English => EN_CATALOG,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

pub fn current_language() -> Language {
    get_settings()
        .language
        .as_deref()
        .and_then(Language::from_code)
        .unwrap_or(Language::English)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum I18nError {
    #[error("missing translation key '{0}'")]
    MissingKey(String),
    #[error("translation key '{0}' names a group, not a string")]
    NotAString(String),
    #[error("cyclic translation reference: {}", .0.join(" -> "))]
    Cycle(Vec<String>),
    #[error("invalid translation catalog: {0}")]
    InvalidCatalog(String),
}

/// Interpolation values for `{{name}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(name.into(), value.to_string());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }
}

/// A reference or interpolation problem found by [`Catalog::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDefect {
    pub key: String,
    pub error: I18nError,
}

fn cached_regex(
    cell: &'static OnceLock<Result<Regex, regex::Error>>,
    pattern: &str,
) -> Result<&'static Regex, I18nError> {
    cell.get_or_init(|| Regex::new(pattern))
        .as_ref()
        .map_err(|e| I18nError::InvalidCatalog(format!("bad pattern {pattern}: {e}")))
}

fn nesting_re() -> Result<&'static Regex, I18nError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    cached_regex(&RE, r"\$t\(([^)]*)\)")
}

fn placeholder_re() -> Result<&'static Regex, I18nError> {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    cached_regex(&RE, r"\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}")
}

/// Immutable nested translation table.
#[derive(Debug, Clone)]
pub struct Catalog {
    root: Value,
}

impl Catalog {
    pub fn from_json(source: &str) -> Result<Self, I18nError> {
        let root: Value =
            serde_json::from_str(source).map_err(|e| I18nError::InvalidCatalog(e.to_string()))?;
        if !root.is_object() {
            return Err(I18nError::InvalidCatalog(
                "top level must be an object".to_string(),
            ));
        }
        Ok(Self { root })
    }

    pub fn empty() -> Self {
        Self {
            root: Value::Object(Default::default()),
        }
    }

    /// Raw template stored at a dotted key.
    pub fn lookup(&self, key: &str) -> Result<&str, I18nError> {
        let mut node = &self.root;
        for segment in key.split('.') {
            node = node
                .as_object()
                .and_then(|map| map.get(segment))
                .ok_or_else(|| I18nError::MissingKey(key.to_string()))?;
        }
        node.as_str()
            .ok_or_else(|| I18nError::NotAString(key.to_string()))
    }

    pub fn translate(&self, key: &str, params: &Params) -> Result<String, I18nError> {
        let mut chain = Vec::new();
        self.resolve(key, params, &mut chain)
    }

    fn resolve(
        &self,
        key: &str,
        params: &Params,
        chain: &mut Vec<String>,
    ) -> Result<String, I18nError> {
        if chain.iter().any(|k| k == key) {
            let mut cycle = chain.clone();
            cycle.push(key.to_string());
            return Err(I18nError::Cycle(cycle));
        }
        let template = self.lookup(key)?;

        chain.push(key.to_string());
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in nesting_re()?.captures_iter(template) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&interpolate(&template[last..whole.start()], params)?);
            // Options in `$t(key, {...})` are ignored.
            let reference = inner.as_str();
            let nested_key = reference
                .split_once(',')
                .map_or(reference, |(key, _)| key)
                .trim();
            let nested = self.resolve(nested_key, params, chain)?;
            out.push_str(&nested);
            last = whole.end();
        }
        out.push_str(&interpolate(&template[last..], params)?);
        chain.pop();

        Ok(out)
    }

    /// Every leaf must resolve: referenced keys exist and no reference cycles.
    pub fn validate(&self) -> Vec<CatalogDefect> {
        let mut keys = Vec::new();
        collect_leaf_keys(&self.root, String::new(), &mut keys);

        keys.into_iter()
            .filter_map(|key| match self.translate(&key, &Params::new()) {
                Ok(_) => None,
                Err(error) => Some(CatalogDefect { key, error }),
            })
            .collect()
    }

    /// Render-time lookup. Misconfigured keys come back as the key itself.
    pub fn t(&self, key: &str, params: &Params) -> String {
        match self.translate(key, params) {
            Ok(text) => text,
            Err(err) => {
                log::warn!("{err}");
                key.to_string()
            }
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        collect_leaf_keys(&self.root, String::new(), &mut keys);
        keys
    }
}

fn collect_leaf_keys(node: &Value, prefix: String, out: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            for (name, child) in map {
                let path = if prefix.is_empty() {
                    name.clone()
                } else {
                    format!("{prefix}.{name}")
                };
                collect_leaf_keys(child, path, out);
            }
        }
        _ => out.push(prefix),
    }
}

/// Unknown placeholders stay verbatim.
fn interpolate(text: &str, params: &Params) -> Result<String, I18nError> {
    let replaced = placeholder_re()?.replace_all(text, |caps: &regex::Captures<'_>| {
        match params.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });
    Ok(replaced.into_owned())
}

fn bundled_catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| {
        let lang = if cfg!(test) {
            Language::English
        } else {
            current_language()
        };
        match Catalog::from_json(lang.catalog_source()) {
            Ok(catalog) => catalog,
            Err(err) => {
                log::error!("bundled {} catalog is unusable: {err}", lang.code());
                Catalog::empty()
            }
        }
    })
}

pub fn catalog() -> &'static Catalog {
    bundled_catalog()
}

// ============================================================================
// Common UI Texts
// ============================================================================

pub mod texts {
    use super::{Catalog, Params};

    fn plain(cat: &Catalog, key: &str) -> String {
        cat.t(key, &Params::new())
    }

    pub fn device_settings_title(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.title")
    }

    pub fn manage_backups(cat: &Catalog) -> String {
        plain(cat, "device.manageBackups")
    }

    pub fn mobile_pairing(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.pairing.button")
    }

    pub fn device_lock(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.lock.button")
    }

    pub fn upgrade_firmware(cat: &Catalog, current_version: Option<&str>) -> String {
        match current_version {
            Some(version) => cat.t(
                "deviceSettings.upgradeFirmware.current",
                &Params::new().with("version", version),
            ),
            None => plain(cat, "deviceSettings.upgradeFirmware.button"),
        }
    }

    pub fn reset_device(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.reset.button")
    }

    pub fn firmware_version(cat: &Catalog, version: &str) -> String {
        cat.t(
            "deviceSettings.firmwareVersion",
            &Params::new().with("version", version),
        )
    }

    pub fn loading_device_info(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.loading")
    }

    pub fn device_info_failed(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.loadFailed")
    }

    pub fn device_locked_hint(cat: &Catalog) -> String {
        plain(cat, "deviceSettings.locked")
    }

    pub fn control_disabled(cat: &Catalog, label: &str) -> String {
        cat.t("deviceSettings.disabled", &Params::new().with("label", label))
    }

    pub fn control_opens(cat: &Catalog, label: &str, target: &str) -> String {
        cat.t(
            "deviceSettings.opens",
            &Params::new().with("label", label).with("target", target),
        )
    }

    pub fn control_delegated(cat: &Catalog, label: &str, device_id: &str) -> String {
        cat.t(
            "deviceSettings.delegated",
            &Params::new().with("label", label).with("deviceId", device_id),
        )
    }

    pub fn wrong_password(
        cat: &Catalog,
        remaining_attempts: u32,
        touch_required: bool,
    ) -> String {
        let key = if touch_required {
            "dbb.error.109_touch"
        } else {
            "dbb.error.109_normal"
        };
        cat.t(
            key,
            &Params::new().with("remainingAttempts", remaining_attempts),
        )
    }

    pub fn unlocking(cat: &Catalog) -> String {
        plain(cat, "dbb.unlocking")
    }

    pub fn sidebar_settings(cat: &Catalog) -> String {
        plain(cat, "sidebar.settings")
    }

    pub fn sidebar_leave(cat: &Catalog) -> String {
        plain(cat, "sidebar.leave")
    }

    pub fn key_move(cat: &Catalog) -> String {
        plain(cat, "tui.keys.move")
    }

    pub fn key_activate(cat: &Catalog) -> String {
        plain(cat, "tui.keys.activate")
    }

    pub fn key_help(cat: &Catalog) -> String {
        plain(cat, "tui.keys.help")
    }

    pub fn help_title(cat: &Catalog) -> String {
        plain(cat, "tui.help.title")
    }

    pub fn help_body(cat: &Catalog) -> String {
        plain(cat, "tui.help.body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundled() -> Catalog {
        Catalog::from_json(EN_CATALOG).expect("bundled catalog parses")
    }

    #[test]
    fn bundled_catalog_has_no_defects() {
        assert_eq!(bundled().validate(), Vec::new());
    }

    #[test]
    fn touch_error_nests_normal_error_with_params() {
        let text = bundled()
            .translate(
                "dbb.error.109_touch",
                &Params::new().with("remainingAttempts", 2),
            )
            .expect("translate");
        assert_eq!(
            text,
            "Wrong password. 2 attempts remain before the device is reset. \
             The next login requires holding the touch button."
        );
    }

    #[test]
    fn numeric_segments_resolve() {
        assert_eq!(
            bundled().lookup("dbb.error.102").expect("lookup"),
            "The password length must be at least 4 characters."
        );
    }

    #[test]
    fn missing_placeholder_is_left_verbatim() {
        let text = bundled()
            .translate("dbb.error.109_normal", &Params::new())
            .expect("translate");
        assert!(text.contains("{{remainingAttempts}}"));
    }

    #[test]
    fn group_key_is_not_a_string() {
        assert_eq!(
            bundled().translate("dbb.error", &Params::new()),
            Err(I18nError::NotAString("dbb.error".to_string()))
        );
    }

    #[test]
    fn missing_key_is_reported() {
        assert_eq!(
            bundled().translate("device.nope", &Params::new()),
            Err(I18nError::MissingKey("device.nope".to_string()))
        );
    }

    #[test]
    fn validate_reports_cycles_and_dangling_references() {
        let catalog = Catalog::from_json(
            r#"{"a": "$t(b)", "b": "x $t(a)", "c": "$t(gone)", "d": "fine {{x}}"}"#,
        )
        .expect("parse");
        let defects = catalog.validate();
        let keys: Vec<&str> = defects.iter().map(|d| d.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
        assert_eq!(
            defects[0].error,
            I18nError::Cycle(vec!["a".into(), "b".into(), "a".into()])
        );
        assert_eq!(defects[2].error, I18nError::MissingKey("gone".into()));
    }

    #[test]
    fn param_values_are_not_reinterpreted() {
        let catalog = Catalog::from_json(r#"{"greet": "hi {{name}}", "x": "boom"}"#)
            .expect("parse");
        let text = catalog
            .translate("greet", &Params::new().with("name", "$t(x) {{name}}"))
            .expect("translate");
        assert_eq!(text, "hi $t(x) {{name}}");
    }

    #[test]
    fn non_object_catalog_is_rejected() {
        assert!(matches!(
            Catalog::from_json("[]"),
            Err(I18nError::InvalidCatalog(_))
        ));
    }

    #[test]
    fn language_codes_accept_region_tags() {
        assert_eq!(Language::from_code("en-US"), Some(Language::English));
        assert_eq!(Language::from_code("EN"), Some(Language::English));
        assert_eq!(Language::from_code("zz"), None);
    }

    #[test]
    fn texts_render_firmware_footer() {
        let cat = bundled();
        assert_eq!(
            texts::firmware_version(&cat, "1.2.3"),
            "Firmware Version: 1.2.3"
        );
        assert_eq!(texts::manage_backups(&cat), "Manage Backups");
        assert_eq!(texts::device_settings_title(&cat), "Device Settings");
        assert_eq!(texts::reset_device(&cat), "Reset Device");
    }

    #[test]
    fn texts_follow_the_catalog_they_are_given() {
        let cat = Catalog::from_json(
            r#"{"deviceSettings": {"title": "Geräteeinstellungen", "firmwareVersion": "Firmware: {{version}}"}}"#,
        )
        .expect("parse");
        assert_eq!(texts::device_settings_title(&cat), "Geräteeinstellungen");
        assert_eq!(texts::firmware_version(&cat, "2.0"), "Firmware: 2.0");
        assert_eq!(texts::reset_device(&cat), "deviceSettings.reset.button");
    }

    #[test]
    fn unknown_key_falls_back_to_key() {
        assert_eq!(catalog().t("no.such.key", &Params::new()), "no.such.key");
        assert_eq!(Catalog::empty().t("a.b", &Params::new()), "a.b");
    }

    #[test]
    fn nesting_options_are_ignored() {
        let catalog = Catalog::from_json(
            r#"{"a": "$t(b, {\"count\": 2}) done", "b": "{{count}} items"}"#,
        )
        .expect("parse");
        assert!(catalog.validate().is_empty());
        assert_eq!(
            catalog
                .translate("a", &Params::new().with("count", 3))
                .expect("translate"),
            "3 items done"
        );
    }
}
