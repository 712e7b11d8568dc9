use clap::Args;

use crate::cli::i18n::{catalog, Params};
use crate::cli::ui::{error, highlight, success};
use crate::error::AppError;

#[derive(Args, Debug, Clone)]
pub struct TranslateCommand {
    /// Dotted localization key (example: dbb.error.109_touch)
    pub key: String,

    /// Interpolation value, repeatable (example: -p remainingAttempts=2)
    #[arg(short = 'p', long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("parameter name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn build_params(pairs: &[(String, String)]) -> Params {
    pairs
        .iter()
        .fold(Params::new(), |params, (name, value)| params.with(name.clone(), value))
}

pub fn execute_translate(cmd: TranslateCommand) -> Result<(), AppError> {
    let text = catalog().translate(cmd.key.trim(), &build_params(&cmd.params))?;
    println!("{text}");
    Ok(())
}

pub fn execute_check() -> Result<(), AppError> {
    let catalog = catalog();
    let defects = catalog.validate();
    let total = catalog.keys().len();

    if defects.is_empty() {
        println!(
            "{}",
            success(&format!("✓ {total} localization keys resolve cleanly"))
        );
        return Ok(());
    }

    println!("{}", highlight("Localization defects"));
    for defect in &defects {
        println!("{} {}: {}", error("✗"), defect.key, defect.error);
    }
    Err(AppError::Config(format!(
        "{} of {total} localization keys do not resolve",
        defects.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_param_splits_on_first_equals() {
        assert_eq!(
            parse_param("target=/a=b").expect("parse"),
            ("target".to_string(), "/a=b".to_string())
        );
        assert!(parse_param("novalue").is_err());
        assert!(parse_param(" =x").is_err());
    }

    #[test]
    fn translate_uses_params() {
        let params = build_params(&[("remainingAttempts".to_string(), "5".to_string())]);
        let text = catalog()
            .translate("dbb.error.109_normal", &params)
            .expect("translate");
        assert_eq!(
            text,
            "Wrong password. 5 attempts remain before the device is reset."
        );
    }

    #[test]
    fn translate_unknown_key_is_an_error() {
        let err = execute_translate(TranslateCommand {
            key: "nope.nothing".to_string(),
            params: Vec::new(),
        })
        .expect_err("unknown key");
        assert!(matches!(err, AppError::Localization(_)));
    }

    #[test]
    fn bundled_catalog_passes_check() {
        execute_check().expect("bundled catalog is clean");
    }
}
