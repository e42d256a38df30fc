//! Task Watchdog Timer (TWDT) driver.
//!
//! Wraps the ESP-IDF TWDT API to reset the device if a link task stalls
//! for longer than the configured timeout.
//!
//! [`Watchdog::configure`] runs once at boot; each task thread then calls
//! [`Watchdog::subscribe`] from inside the thread and feeds the returned
//! handle every loop iteration.  Dropping the handle unsubscribes.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::WatchdogPort;

/// Per-task TWDT subscription.
pub struct Watchdog {
    task: &'static str,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Watchdog {
    /// Set the TWDT timeout (panic on trigger).  Call once at boot.
    pub fn configure(timeout_ms: u32) {
        #[cfg(target_os = "espidf")]
        {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret == ESP_OK {
                info!("Watchdog: {} ms timeout, panic on trigger", timeout_ms);
            } else {
                warn!(
                    "TWDT reconfigure returned {} (may already be configured)",
                    ret
                );
            }
        }

        #[cfg(not(target_os = "espidf"))]
        info!("Watchdog(sim): {} ms timeout (no-op)", timeout_ms);
    }

    /// Subscribe the calling thread's task to the TWDT.
    pub fn subscribe(task: &'static str) -> Self {
        #[cfg(target_os = "espidf")]
        {
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            let subscribed = ret == ESP_OK;
            if subscribed {
                info!("Watchdog: '{}' subscribed", task);
            } else {
                warn!("Watchdog: '{}' failed to subscribe ({})", task, ret);
            }
            Self { task, subscribed }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("Watchdog(sim): '{}' subscribed (no-op)", task);
            Self { task }
        }
    }

    pub fn task(&self) -> &'static str {
        self.task
    }

    /// Feed the watchdog.  Must be called more often than the timeout.
    pub fn feed(&self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                unsafe {
                    esp_task_wdt_reset();
                }
            }
        }
    }
}

impl WatchdogPort for Watchdog {
    fn feed(&self) {
        Watchdog::feed(self);
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        #[cfg(target_os = "espidf")]
        {
            if self.subscribed {
                let ret = unsafe { esp_task_wdt_delete(core::ptr::null_mut()) };
                if ret != ESP_OK {
                    warn!("Watchdog: '{}' unsubscribe failed ({})", self.task, ret);
                }
            }
        }
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn sim_watchdog_is_inert() {
        Watchdog::configure(10_000);
        let wd = Watchdog::subscribe("test");
        wd.feed();
        WatchdogPort::feed(&wd);
        assert_eq!(wd.task(), "test");
    }
}
