use std::collections::BTreeMap;

use serde::Serialize;

use crate::cli::i18n::{catalog, texts};
use crate::cli::ui::{create_table, highlight, info, to_json, warning};
use crate::error::AppError;
use crate::services::device::DeviceApi;
use crate::settings::Connection;

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
struct InfoReport {
    device_id: String,
    firmware_version: Option<String>,
    locked: bool,
    sdcard: bool,
}

fn create_runtime() -> Result<tokio::runtime::Runtime, AppError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Message(format!("Failed to create runtime: {e}")))
}

/// An explicit ID wins; otherwise exactly one registered device is required.
fn pick_device(
    requested: Option<&str>,
    registered: &BTreeMap<String, String>,
) -> Result<String, AppError> {
    if let Some(id) = requested.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }

    let mut ids = registered.keys();
    match (ids.next(), ids.next()) {
        (None, _) => Err(AppError::Message(
            "No device connected. Plug in a device or pass a device ID.".to_string(),
        )),
        (Some(only), None) => Ok(only.clone()),
        (Some(_), Some(_)) => Err(AppError::InvalidInput(format!(
            "Several devices are connected ({}); pass a device ID.",
            registered.keys().cloned().collect::<Vec<_>>().join(", ")
        ))),
    }
}

async fn resolve_device_id(api: &DeviceApi, requested: Option<&str>) -> Result<String, AppError> {
    if requested.map(str::trim).is_some_and(|s| !s.is_empty()) {
        return pick_device(requested, &BTreeMap::new());
    }
    let registered = api.registered_devices().await?;
    pick_device(None, &registered)
}

pub fn execute_settings(connection: &Connection, device_id: Option<&str>) -> Result<(), AppError> {
    let api = DeviceApi::new(connection)?;
    let device_id = create_runtime()?.block_on(resolve_device_id(&api, device_id))?;
    log::debug!("opening settings for device {device_id}");
    crate::cli::tui::run(connection, &device_id)
}

pub fn execute_info(
    connection: &Connection,
    device_id: Option<&str>,
    json: bool,
) -> Result<(), AppError> {
    let api = DeviceApi::new(connection)?;
    let report = create_runtime()?.block_on(async {
        let device_id = resolve_device_id(&api, device_id).await?;
        let info = api.device_info(&device_id).await?;
        Ok::<_, AppError>(InfoReport {
            firmware_version: info.firmware_version(),
            locked: info.lock,
            sdcard: info.sdcard,
            device_id,
        })
    })?;

    if json {
        let text = to_json(&report).map_err(|e| AppError::JsonSerialize { source: e })?;
        println!("{text}");
        return Ok(());
    }

    println!("{}", highlight(&texts::device_settings_title(catalog())));
    let mut table = create_table();
    table.add_row(vec!["Device", report.device_id.as_str()]);
    table.add_row(vec![
        "Firmware version",
        report.firmware_version.as_deref().unwrap_or("-"),
    ]);
    table.add_row(vec!["Locked", if report.locked { "yes" } else { "no" }]);
    table.add_row(vec!["SD card", if report.sdcard { "inserted" } else { "none" }]);
    println!("{table}");

    if report.sdcard {
        println!(
            "{}",
            warning("Keep the SD card stored securely unless you want to manage backups.")
        );
    }
    Ok(())
}

pub fn execute_devices(connection: &Connection) -> Result<(), AppError> {
    let api = DeviceApi::new(connection)?;
    let devices = create_runtime()?.block_on(api.registered_devices())?;

    if devices.is_empty() {
        println!("{}", info("No device connected."));
        return Ok(());
    }

    let mut table = create_table();
    table.set_header(vec!["Device ID", "Product"]);
    for (id, product) in &devices {
        table.add_row(vec![id.as_str(), product.as_str()]);
    }
    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(ids: &[&str]) -> BTreeMap<String, String> {
        ids.iter()
            .map(|id| (id.to_string(), "bitbox".to_string()))
            .collect()
    }

    #[test]
    fn explicit_device_id_wins() {
        assert_eq!(
            pick_device(Some(" abc "), &registered(&["x", "y"])).expect("pick"),
            "abc"
        );
    }

    #[test]
    fn single_registered_device_is_picked() {
        assert_eq!(pick_device(None, &registered(&["only"])).expect("pick"), "only");
        assert_eq!(pick_device(Some(""), &registered(&["only"])).expect("pick"), "only");
    }

    #[test]
    fn no_or_many_devices_need_an_id() {
        assert!(matches!(
            pick_device(None, &registered(&[])),
            Err(AppError::Message(_))
        ));
        let err = pick_device(None, &registered(&["a", "b"])).expect_err("ambiguous");
        assert!(err.to_string().contains("a, b"));
    }

    #[test]
    fn info_report_serializes_camel_case() {
        let report = InfoReport {
            device_id: "abc".to_string(),
            firmware_version: Some("1.2.3".to_string()),
            locked: false,
            sdcard: true,
        };
        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "deviceId": "abc",
                "firmwareVersion": "1.2.3",
                "locked": false,
                "sdcard": true
            })
        );
    }
}
