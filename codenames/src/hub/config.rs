//! Hub configuration.

use std::time::Duration;

/// Queue sizes and heartbeat timing for the broadcast hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Outbound payloads buffered per client before it counts as a slow
    /// consumer and gets disconnected
    pub queue_capacity: usize,

    /// Register/unregister messages buffered for the control loop
    pub control_capacity: usize,

    /// Time allowed for a single write to the peer
    pub write_wait: Duration,

    /// Time allowed between heartbeat acknowledgements
    pub pong_wait: Duration,

    /// Interval between heartbeat probes (must be below `pong_wait`)
    pub ping_period: Duration,
}

impl HubConfig {
    /// Ping period derived from a pong window, leaving a tenth of the
    /// window for the acknowledgement to arrive.
    pub fn ping_period_for(pong_wait: Duration) -> Duration {
        pong_wait * 9 / 10
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.queue_capacity == 0 {
            return Err("Outbound queue capacity must be greater than 0".to_string());
        }

        if self.control_capacity == 0 {
            return Err("Control queue capacity must be greater than 0".to_string());
        }

        if self.write_wait.is_zero() {
            return Err("Write wait must be greater than 0".to_string());
        }

        if self.ping_period.is_zero() || self.ping_period >= self.pong_wait {
            return Err(format!(
                "Ping period ({:?}) must be non-zero and shorter than pong wait ({:?})",
                self.ping_period, self.pong_wait
            ));
        }

        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            queue_capacity: 256,
            control_capacity: 256,
            write_wait: Duration::from_secs(10),
            pong_wait,
            ping_period: Self::ping_period_for(pong_wait),
        }
    }
}
