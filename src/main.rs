//! ThingsBoard demo firmware.
//!
//! ```text
//! ┌──────────────┐  telemetry / attributes  ┌──────────────────┐
//! │  main loop   │─────────────────────────▶│  ThingsBoard     │
//! │              │◀─────────────────────────│  (MQTT, 1883)    │
//! │ getTemp      │     RPC request/reply    └──────────────────┘
//! │ setLed       │
//! │              │  boot attribute (once)   ┌──────────────────┐
//! │              │─────────────────────────▶│  ThingsBoard     │
//! └──────────────┘                          │  (HTTP, 80)      │
//!                                           └──────────────────┘
//! ```
//!
//! Wi-Fi and server settings come from the build environment
//! (`WIFI_SSID`, `WIFI_PASS`, `TB_HOST`, `TB_TOKEN`).
#![deny(unused_must_use)]

use std::cell::Cell;
use std::time::Duration;

use anyhow::{Result, anyhow};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi};

use tbclient::adapters::{HttpAdapter, MqttAdapter};
use tbclient::config::ClientConfig;
use tbclient::{RpcCallback, RpcData, RpcResponse, Telemetry, ThingsBoard, ThingsBoardHttp};

const WIFI_SSID: &str = match option_env!("WIFI_SSID") {
    Some(s) => s,
    None => "thingsboard-demo",
};
const WIFI_PASS: &str = match option_env!("WIFI_PASS") {
    Some(s) => s,
    None => "",
};
const TB_HOST: &str = match option_env!("TB_HOST") {
    Some(s) => s,
    None => "demo.thingsboard.io",
};
const TB_TOKEN: &str = match option_env!("TB_TOKEN") {
    Some(s) => s,
    None => "A1_TEST_TOKEN",
};

const LOOP_PERIOD_MS: u64 = 100;
/// Telemetry every 5 s.
const TELEMETRY_EVERY_TICKS: u32 = 50;
const RECONNECT_DELAY_MS: u64 = 2_000;

// ── Device state shared with the RPC handlers ─────────────────

struct Device {
    led: Cell<bool>,
    temperature: Cell<f32>,
}

impl Device {
    /// Slow synthetic drift between 20 °C and 26 °C.
    fn sample(&self, tick: u32) {
        let phase = (tick / TELEMETRY_EVERY_TICKS) % 12;
        let offset = if phase < 6 { phase } else { 12 - phase };
        self.temperature.set(20.0 + offset as f32);
    }
}

fn rpc_handlers(device: &Device) -> [RpcCallback<'_>; 2] {
    [
        RpcCallback::new("getTemp", move |_: &RpcData| {
            RpcResponse::new("temperature", device.temperature.get())
        }),
        RpcCallback::new("setLed", move |params: &RpcData| {
            let on = params
                .get("state")
                .and_then(RpcData::as_bool)
                .unwrap_or(false);
            device.led.set(on);
            info!("LED {}", if on { "on" } else { "off" });
            RpcResponse::new("state", on)
        }),
    ]
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("tbclient v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Wi-Fi (station) ────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let esp_wifi = EspWifi::new(peripherals.modem, sysloop.clone(), Some(nvs))?;
    let mut wifi = BlockingWifi::wrap(esp_wifi, sysloop)?;
    wifi.set_configuration(&Configuration::Client(ClientConfiguration {
        ssid: WIFI_SSID.try_into().map_err(|()| anyhow!("SSID too long"))?,
        password: WIFI_PASS
            .try_into()
            .map_err(|()| anyhow!("Wi-Fi password too long"))?,
        auth_method: if WIFI_PASS.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        },
        ..Default::default()
    }))?;
    wifi.start()?;
    wifi.connect()?;
    wifi.wait_netif_up()?;
    info!("Wi-Fi up: {:?}", wifi.wifi().sta_netif().get_ip_info()?.ip);

    // ── 3. Clients ────────────────────────────────────────────
    let config = ClientConfig::new(TB_HOST, TB_TOKEN)?;
    let device = Device {
        led: Cell::new(false),
        temperature: Cell::new(20.0),
    };

    let mut http: ThingsBoardHttp<HttpAdapter> =
        ThingsBoardHttp::from_config(HttpAdapter::new(), &config)?;
    if let Err(e) = http.send_attribute("firmware", env!("CARGO_PKG_VERSION")) {
        warn!("boot attribute not sent: {}", e);
    }

    let mut tb: ThingsBoard<'_, MqttAdapter> = ThingsBoard::new(MqttAdapter::new());

    // ── 4. Main loop ──────────────────────────────────────────
    let mut tick: u32 = 0;
    loop {
        if !tb.is_connected() {
            if let Err(e) = tb.connect_with(&config) {
                warn!("connect failed: {}, retrying", e);
                std::thread::sleep(Duration::from_millis(RECONNECT_DELAY_MS));
                continue;
            }
            if let Err(e) = tb.subscribe_rpc(rpc_handlers(&device)) {
                warn!("RPC subscribe failed: {}", e);
            }
        }

        if tick % TELEMETRY_EVERY_TICKS == 0 {
            device.sample(tick);
            let data = [
                Telemetry::new("temperature", device.temperature.get()),
                Telemetry::new("led", device.led.get()),
            ];
            if let Err(e) = tb.send_telemetry(&data) {
                warn!("telemetry not sent: {}", e);
            }
        }

        if let Err(e) = tb.process_events() {
            warn!("event processing: {}", e);
        }

        tick = tick.wrapping_add(1);
        std::thread::sleep(Duration::from_millis(LOOP_PERIOD_MS));
    }
}
