use log::warn;

/// Minimum spacing between physical reads, the DHT11 refresh period.
pub const MIN_READ_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, PartialEq, Eq)]
pub enum SensorReadError {
    /// Transient hardware failure (timing/parity error, sensor absent).
    ReadFailed,
}

/// One complete reading. Never partially filled: a failed read yields an
/// error, not a half-populated value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Degrees Celsius, one-decimal precision.
    pub temperature_c: f32,
    /// Relative humidity in percent, integer precision.
    pub humidity_pct: f32,
}

/// Physical sensor behind the sampler.
pub trait SensorProbe {
    async fn read(&mut self) -> Result<Reading, SensorReadError>;
}

/// Wraps a single physical sensor and owns its minimum-read-interval
/// constraint: polling faster than the refresh period returns the previous
/// (stale) reading instead of touching the hardware, matching what the
/// sensor itself would do.
pub struct SensorSampler<P> {
    probe: P,
    last_read_ms: u64,
    last_reading: Option<Reading>,
}

impl<P: SensorProbe> SensorSampler<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            last_read_ms: 0,
            last_reading: None,
        }
    }

    pub async fn read(&mut self, now_ms: u64) -> Result<Reading, SensorReadError> {
        if let Some(last) = self.last_reading {
            if now_ms.wrapping_sub(self.last_read_ms) < MIN_READ_INTERVAL_MS {
                return Ok(last);
            }
        }
        match self.probe.read().await {
            Ok(reading) => {
                self.last_read_ms = now_ms;
                self.last_reading = Some(reading);
                Ok(reading)
            }
            Err(e) => {
                warn!("sampler: sensor read failed: {:?}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    struct CountingProbe {
        reads: u32,
        fail: bool,
    }

    impl SensorProbe for CountingProbe {
        async fn read(&mut self) -> Result<Reading, SensorReadError> {
            self.reads += 1;
            if self.fail {
                Err(SensorReadError::ReadFailed)
            } else {
                Ok(Reading {
                    temperature_c: 20.0 + self.reads as f32,
                    humidity_pct: 40.0,
                })
            }
        }
    }

    #[test]
    fn fast_polling_returns_the_stale_reading() {
        let mut sampler = SensorSampler::new(CountingProbe {
            reads: 0,
            fail: false,
        });
        let first = block_on(sampler.read(1_000)).unwrap();
        let again = block_on(sampler.read(1_500)).unwrap();
        assert_eq!(first, again);
        assert_eq!(sampler.probe.reads, 1);

        let fresh = block_on(sampler.read(2_000)).unwrap();
        assert_ne!(first, fresh);
        assert_eq!(sampler.probe.reads, 2);
    }

    #[test]
    fn failures_are_reported_not_cached() {
        let mut sampler = SensorSampler::new(CountingProbe {
            reads: 0,
            fail: true,
        });
        assert!(block_on(sampler.read(1_000)).is_err());
        // No cached value yet, so even a fast retry hits the hardware.
        assert!(block_on(sampler.read(1_100)).is_err());
        assert_eq!(sampler.probe.reads, 2);
    }
}
