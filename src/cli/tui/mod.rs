mod app;
mod terminal;
mod theme;
mod ui;

use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{self, KeyEventKind};

use crate::cli::i18n::catalog;
use crate::device_settings::{InfoRequest, InfoResponse, SettingsView};
use crate::error::AppError;
use crate::services::device::{DeviceApi, DeviceInfoFetcher};
use crate::settings::Connection;

use app::{Action, App, ToastKind};
use terminal::{PanicRestoreHookGuard, TuiTerminal};

struct InfoSystem {
    req_tx: mpsc::Sender<InfoRequest>,
    result_rx: mpsc::Receiver<InfoResponse>,
    _handle: std::thread::JoinHandle<()>,
}

pub fn run(connection: &Connection, device_id: &str) -> Result<(), AppError> {
    let api = DeviceApi::new(connection)?;
    let _panic_hook = PanicRestoreHookGuard::install();
    let mut terminal = TuiTerminal::new()?;
    let mut app = App::new(SettingsView::new(device_id), catalog());

    let info = match start_info_system(api) {
        Ok(system) => Some(system),
        Err(err) => {
            app.push_toast(err.to_string(), ToastKind::Error);
            None
        }
    };

    if let Some(request) = app.view.mount() {
        let request_id = request.request_id;
        let sent = info
            .as_ref()
            .map(|system| system.req_tx.send(request).is_ok())
            .unwrap_or(false);
        if !sent {
            app.on_info_response(InfoResponse {
                request_id,
                result: Err("device info worker unavailable".to_string()),
            });
        }
    }

    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::render(f, &app))?;

        // Handle async device info results (non-blocking).
        if let Some(info) = info.as_ref() {
            while let Ok(response) = info.result_rx.try_recv() {
                app.on_info_response(response);
            }
        }

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout).map_err(|e| AppError::Message(e.to_string()))? {
            match event::read().map_err(|e| AppError::Message(e.to_string()))? {
                event::Event::Key(key) if key.kind == KeyEventKind::Press => {
                    match app.on_key(key) {
                        Action::Activate(index) => app.activate(index),
                        Action::Quit | Action::None => {}
                    }
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }

    app.view.unmount();
    Ok(())
}

fn start_info_system<F>(fetcher: F) -> Result<InfoSystem, AppError>
where
    F: DeviceInfoFetcher + Send + 'static,
{
    let (result_tx, result_rx) = mpsc::channel::<InfoResponse>();
    let (req_tx, req_rx) = mpsc::channel::<InfoRequest>();

    let handle = std::thread::Builder::new()
        .name("dbb-settings-device-info".to_string())
        .spawn(move || info_worker_loop(fetcher, req_rx, result_tx))
        .map_err(|e| AppError::IoContext {
            context: "failed to spawn device info worker thread".to_string(),
            source: e,
        })?;

    Ok(InfoSystem {
        req_tx,
        result_rx,
        _handle: handle,
    })
}

fn info_worker_loop<F>(fetcher: F, rx: mpsc::Receiver<InfoRequest>, tx: mpsc::Sender<InfoResponse>)
where
    F: DeviceInfoFetcher,
{
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let err = e.to_string();
            while let Ok(request) = rx.recv() {
                let _ = tx.send(InfoResponse {
                    request_id: request.request_id,
                    result: Err(err.clone()),
                });
            }
            return;
        }
    };

    while let Ok(request) = rx.recv() {
        let result = rt
            .block_on(fetcher.fetch_info(&request.device_id))
            .map_err(|e| e.to_string());

        // The view may be gone by now; nobody to tell.
        let _ = tx.send(InfoResponse {
            request_id: request.request_id,
            result,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::device::DeviceInfo;
    use std::time::Duration;

    struct FakeFetcher {
        lock: bool,
    }

    impl DeviceInfoFetcher for FakeFetcher {
        async fn fetch_info(&self, device_id: &str) -> Result<DeviceInfo, AppError> {
            if device_id == "missing" {
                return Err(AppError::http("devices/missing/info", "HTTP 404"));
            }
            Ok(DeviceInfo {
                version: "v4.0.1".to_string(),
                sdcard: false,
                lock: self.lock,
            })
        }
    }

    fn round_trip(view: &mut SettingsView, system: &InfoSystem) -> InfoResponse {
        let request = view.mount().expect("mount");
        system.req_tx.send(request).expect("send request");
        system
            .result_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker response")
    }

    #[test]
    fn worker_fetches_and_view_applies() {
        let system = start_info_system(FakeFetcher { lock: false }).expect("start worker");
        let mut view = SettingsView::new("dev-1");

        let response = round_trip(&mut view, &system);
        assert!(view.apply(response));
        assert!(!view.state().locked);
        assert_eq!(view.state().firmware_version.as_deref(), Some("4.0.1"));
    }

    #[test]
    fn worker_reports_errors_as_strings() {
        let system = start_info_system(FakeFetcher { lock: false }).expect("start worker");
        let mut view = SettingsView::new("missing");

        let response = round_trip(&mut view, &system);
        let err = response.result.clone().expect_err("fetch must fail");
        assert!(err.contains("HTTP 404"));
        assert!(view.apply(response));
        assert!(view.state().locked);
    }

    #[test]
    fn worker_result_after_unmount_is_dropped() {
        let system = start_info_system(FakeFetcher { lock: false }).expect("start worker");
        let mut view = SettingsView::new("dev-1");
        let request = view.mount().expect("mount");
        system.req_tx.send(request).expect("send request");
        view.unmount();

        let response = system
            .result_rx
            .recv_timeout(Duration::from_secs(5))
            .expect("worker response");
        assert!(!view.apply(response));
        assert!(view.state().locked);
    }
}
