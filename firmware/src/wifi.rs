use embassy_executor::Spawner;
use embassy_net::{Runner, Stack, StackResources};
use embassy_time::{with_timeout, Duration, Timer};

use esp_hal::rng::Rng;
use esp_wifi::{
    wifi::{ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiState},
    EspWifiController,
};

use core::str::FromStr;
use heapless::String;
use log::{error, info};
use static_cell::StaticCell;

use node_core::link::{LinkError, NetworkLink};

use crate::config::CONFIG;
use crate::constants::{WIFI_CONNECT_TIMEOUT_SECS, WIFI_RECONNECT_DELAY_MS};

static RESOURCES: StaticCell<StackResources<5>> = StaticCell::new();

pub struct Wifi {
    pub stack: Stack<'static>,
}

#[derive(Debug)]
pub enum Error {
    WifiInitFailed,
    HostnameTooLong,
}

impl Wifi {
    pub async fn new(
        init: &'static EspWifiController<'static>,
        wifi: esp_hal::peripherals::WIFI<'static>,
        mut rng: Rng,
        spawner: Spawner,
    ) -> Result<Self, Error> {
        let (controller, interfaces) =
            esp_wifi::wifi::new(init, wifi).map_err(|_| Error::WifiInitFailed)?;

        let mut dhcp_config = embassy_net::DhcpConfig::default();
        dhcp_config.hostname =
            Some(String::<32>::from_str(CONFIG.device_id).map_err(|_| Error::HostnameTooLong)?);

        let seed = (rng.random() as u64) << 32 | rng.random() as u64;
        let config = embassy_net::Config::dhcpv4(dhcp_config);

        let resources = RESOURCES.init(StackResources::new());
        let (stack, runner) = embassy_net::new(interfaces.sta, config, resources, seed);

        spawner
            .spawn(connection(controller))
            .expect("Failed to spawn WiFi connection task");
        spawner
            .spawn(net_task(runner))
            .expect("Failed to spawn network task");

        Ok(Self { stack })
    }

    /// Link handle handed to the telemetry coordinator.
    pub fn link(&self) -> WifiLink {
        WifiLink { stack: self.stack }
    }
}

/// Coordinator-facing view of the Wi-Fi link: up means associated with a
/// v4 address. One `connect` call covers association plus DHCP, bounded by
/// the connect timeout; the association itself is driven by the supervisor
/// task below.
pub struct WifiLink {
    stack: Stack<'static>,
}

impl NetworkLink for WifiLink {
    fn is_up(&self) -> bool {
        self.stack.is_link_up() && self.stack.config_v4().is_some()
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        info!("Waiting for network to come up...");
        with_timeout(Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS), async {
            loop {
                if self.stack.is_link_up() {
                    if let Some(config) = self.stack.config_v4() {
                        info!("Got IP: {}", config.address);
                        break;
                    }
                }
                Timer::after(Duration::from_millis(500)).await;
            }
        })
        .await
        .map_err(|_| LinkError::Timeout)
    }
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    info!(
        "Start connection task, device capabilities: {:?}",
        controller.capabilities()
    );
    loop {
        if esp_wifi::wifi::wifi_state() == WifiState::StaConnected {
            // wait until we're no longer connected
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
        }

        if !matches!(controller.is_started(), Ok(true)) {
            info!("Connecting to wifi with SSID: {:?}", CONFIG.wifi_ssid);
            let client_config = Configuration::Client(ClientConfiguration {
                ssid: CONFIG.wifi_ssid.try_into().unwrap(),
                password: CONFIG.wifi_psk.try_into().unwrap(),
                ..Default::default()
            });
            if let Err(e) = controller.set_configuration(&client_config) {
                error!("Failed to set WiFi config: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Starting wifi");
            if let Err(e) = controller.start_async().await {
                error!("Failed to start WiFi: {:?}. Retrying...", e);
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await;
                continue;
            }
            info!("Wifi started!");
        }

        info!("About to connect to {:?}...", CONFIG.wifi_ssid);
        match with_timeout(
            Duration::from_secs(WIFI_CONNECT_TIMEOUT_SECS),
            controller.connect_async(),
        )
        .await
        {
            Ok(Ok(_)) => info!("Wifi connected!"),
            Ok(Err(e)) => {
                info!("Failed to connect to wifi: {e:?}");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
            Err(_) => {
                info!("Wifi connection timed out");
                Timer::after(Duration::from_millis(WIFI_RECONNECT_DELAY_MS)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, WifiDevice<'static>>) {
    runner.run().await
}
