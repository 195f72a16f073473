#![no_std]
#![no_main]

use static_cell::StaticCell;

use embassy_executor::Spawner;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, mutex::Mutex};
use embassy_time::{Duration, Timer};

use esp_alloc as _;
use esp_backtrace as _;
use esp_hal::{self as hal};
use esp_println::logger::init_logger;
use esp_wifi::EspWifiController;

use hal::{gpio::Flex, rng::Rng, timer::timg::TimerGroup};

use heapless::String;
use log::{info, warn};

pub mod config;
pub mod constants;
mod dht;
mod httpd;
mod mqtt;
mod wifi;

use node_core::config::{ConfigDefaults, RuntimeConfig};
use node_core::coordinator::{Clock, TelemetryCoordinator, TIMESTAMP_MAX};
use node_core::link::LinkManager;
use node_core::sampler::SensorSampler;
use node_core::session::{Credentials, SessionManager};
use node_core::topics::Topics;

use config::CONFIG;
use constants::*;
use dht::DhtProbe;
use mqtt::SessionHandle;
use wifi::{Wifi, WifiLink};

static WIFI_INIT: StaticCell<EspWifiController<'static>> = StaticCell::new();
static RUNTIME_CONFIG: StaticCell<Mutex<CriticalSectionRawMutex, RuntimeConfig>> =
    StaticCell::new();

/// Monotonic time from the embassy time driver. The node has no wall-clock
/// source, so record timestamps stay empty.
struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_ms(&self) -> u64 {
        embassy_time::Instant::now().as_millis()
    }

    fn timestamp(&self) -> Option<String<TIMESTAMP_MAX>> {
        None
    }
}

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    init_logger(log::LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());

    let rng = Rng::new(peripherals.RNG);

    esp_alloc::heap_allocator!(size: HEAP_SIZE);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let timg1 = TimerGroup::new(peripherals.TIMG1);

    esp_hal_embassy::init(timg0.timer0);

    // possibly high transient required at init
    // https://github.com/esp-rs/esp-hal/issues/1626
    Timer::after(Duration::from_millis(1000)).await;

    info!("Sensor node {} starting", VERSION);

    let wifi_init = WIFI_INIT.init(
        esp_wifi::init(timg1.timer0, rng.clone()).expect("Failed to initialize WiFi controller"),
    );
    let wifi = Wifi::new(wifi_init, peripherals.WIFI, rng.clone(), spawner)
        .await
        .expect("Failed to bring up WiFi");

    let probe = DhtProbe::new(Flex::new(peripherals.GPIO14));

    let runtime_config = RUNTIME_CONFIG.init(Mutex::new(RuntimeConfig::new(&ConfigDefaults {
        status: CONFIG.default_status,
        send_interval_ms: CONFIG.default_send_interval_ms,
        publish_temperature: CONFIG.default_publish_temperature,
        publish_humidity: CONFIG.default_publish_humidity,
        temp_sensor_id: CONFIG.temp_sensor_id,
        hum_sensor_id: CONFIG.hum_sensor_id,
    })));

    spawner
        .spawn(mqtt::session_task(wifi.stack))
        .expect("Failed to spawn MQTT session task");
    spawner
        .spawn(httpd::httpd_task(wifi.stack, runtime_config))
        .expect("Failed to spawn HTTP config task");
    spawner
        .spawn(telemetry_task(wifi.link(), probe, runtime_config))
        .expect("Failed to spawn telemetry task");
}

#[embassy_executor::task]
async fn telemetry_task(
    link: WifiLink,
    probe: DhtProbe,
    runtime_config: &'static Mutex<CriticalSectionRawMutex, RuntimeConfig>,
) {
    let topics = Topics::new(CONFIG.mqtt_base_topic, CONFIG.mqtt_state_prefix)
        .expect("Topic roots exceed the topic capacity");

    let credentials: Option<Credentials<'static>> = if CONFIG.mqtt_username.is_empty() {
        None
    } else {
        Some((CONFIG.mqtt_username, CONFIG.mqtt_password))
    };

    let mut session = SessionManager::new(SessionHandle);
    session.configure(CONFIG.mqtt_hostname, CONFIG.mqtt_port);

    let mut coordinator = TelemetryCoordinator::new(
        LinkManager::new(link),
        session,
        SensorSampler::new(probe),
        EmbassyClock,
        topics,
        CONFIG.device_id,
        credentials,
    );

    let mut on_command = |topic: &str, payload: &[u8]| match core::str::from_utf8(payload) {
        Ok(text) => info!("command on {}: {}", topic, text),
        Err(_) => warn!("command on {}: {} raw bytes", topic, payload.len()),
    };

    loop {
        let mut cfg = runtime_config.lock().await;
        coordinator.tick(&mut cfg, &mut on_command).await;
        drop(cfg);
        Timer::after(Duration::from_millis(TICK_INTERVAL_MS)).await;
    }
}
