//! Wall-clock adapter.
//!
//! - **`target_os = "espidf"`** — backed by the ESP-IDF system clock
//!   (`gettimeofday` / `settimeofday`) with a POSIX TZ rule, so local
//!   time follows DST transitions without firmware involvement.
//! - **`not(target_os = "espidf")`** — an epoch offset captured against
//!   `std::time::Instant`, enough for host-side tests. Local time on the
//!   host path is UTC.
//!
//! The clock starts unsynchronized after power-on and stays that way
//! until the first time-sync message arrives; `minutes_since_midnight`
//! reports `None` until then and the schedule tick degrades gracefully.

use log::info;

use crate::app::ports::{ClockError, ClockPort};

/// POSIX TZ rule applied to the system clock (NZST/NZDT with automatic
/// transitions). Time-sync payloads carry UTC; conversion to local time
/// happens in libc.
#[cfg(target_os = "espidf")]
const TZ_POSIX: &str = "NZST-12NZDT,M9.5.0,M4.1.0\0";

/// Readings before this are treated as an unsynchronized clock.
const EPOCH_2020_SECS: i64 = 1_577_836_800;

/// Wall clock with monotonic uptime on the side.
pub struct LocalClock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    epoch_ms_at_start: Option<i64>,
}

impl Default for LocalClock {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalClock {
    #[cfg(target_os = "espidf")]
    pub fn new() -> Self {
        // Install the TZ rule once; localtime_r picks it up from then on.
        unsafe {
            esp_idf_svc::sys::setenv(
                c"TZ".as_ptr(),
                TZ_POSIX.as_ptr().cast(),
                1,
            );
            esp_idf_svc::sys::tzset();
        }
        Self {}
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
            epoch_ms_at_start: None,
        }
    }

    /// Milliseconds since boot (monotonic). Drives gesture timing and the
    /// schedule tick gate; unrelated to wall-clock synchronization.
    #[cfg(target_os = "espidf")]
    pub fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1000
    }

    /// Milliseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

impl ClockPort for LocalClock {
    #[cfg(target_os = "espidf")]
    fn minutes_since_midnight(&self) -> Option<u16> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if (tv.tv_sec as i64) < EPOCH_2020_SECS {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        if !(0..24).contains(&tm.tm_hour) || !(0..60).contains(&tm.tm_min) {
            return None;
        }
        Some((tm.tm_hour * 60 + tm.tm_min) as u16)
    }

    #[cfg(not(target_os = "espidf"))]
    fn minutes_since_midnight(&self) -> Option<u16> {
        let epoch_ms = self.epoch_ms_at_start? + self.start.elapsed().as_millis() as i64;
        let minute_of_day = (epoch_ms / 60_000).rem_euclid(24 * 60);
        Some(minute_of_day as u16)
    }

    #[cfg(target_os = "espidf")]
    fn set_epoch_ms(&mut self, epoch_ms: i64) -> Result<(), ClockError> {
        let secs = epoch_ms / 1000;
        if secs < EPOCH_2020_SECS {
            return Err(ClockError::InvalidTimestamp);
        }
        let tv = esp_idf_svc::sys::timeval {
            tv_sec: secs as esp_idf_svc::sys::time_t,
            tv_usec: ((epoch_ms % 1000) * 1000) as esp_idf_svc::sys::suseconds_t,
        };
        if unsafe { esp_idf_svc::sys::settimeofday(&tv, core::ptr::null()) } != 0 {
            return Err(ClockError::SetFailed);
        }
        info!("system clock set from epoch {} s", secs);
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_epoch_ms(&mut self, epoch_ms: i64) -> Result<(), ClockError> {
        if epoch_ms / 1000 < EPOCH_2020_SECS {
            return Err(ClockError::InvalidTimestamp);
        }
        self.epoch_ms_at_start = Some(epoch_ms - self.start.elapsed().as_millis() as i64);
        Ok(())
    }
}
