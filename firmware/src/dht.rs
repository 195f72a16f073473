//! DHT11 temperature/humidity probe on a single-wire GPIO.

use embedded_dht_rs::dht11::Dht11;
use esp_hal::delay::Delay;
use esp_hal::gpio::{DriveMode, Flex, InputConfig, OutputConfig, Pull};
use log::warn;

use node_core::sampler::{Reading, SensorProbe, SensorReadError};

pub struct DhtProbe {
    driver: Dht11<Flex<'static>, Delay>,
}

impl DhtProbe {
    /// Takes the raw data pin and configures it for the open-drain
    /// single-wire protocol the sensor speaks.
    pub fn new(mut pin: Flex<'static>) -> Self {
        pin.apply_output_config(&OutputConfig::default().with_drive_mode(DriveMode::OpenDrain));
        pin.apply_input_config(&InputConfig::default().with_pull(Pull::Up));
        pin.set_input_enable(true);
        pin.set_output_enable(true);
        pin.set_high();
        Self {
            driver: Dht11::new(pin, Delay::new()),
        }
    }
}

impl SensorProbe for DhtProbe {
    async fn read(&mut self) -> Result<Reading, SensorReadError> {
        match self.driver.read() {
            Ok(reading) => Ok(Reading {
                temperature_c: reading.temperature() as f32,
                humidity_pct: reading.humidity() as f32,
            }),
            Err(e) => {
                warn!("dht: read failed: {:?}", e);
                Err(SensorReadError::ReadFailed)
            }
        }
    }
}
