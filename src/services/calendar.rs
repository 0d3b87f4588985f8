//! Meeting availability suggestions
//!
//! Proposes fixed windows on the following day. There is no calendar
//! backend: slots are computed from the clock and `[calendar]` settings.

use super::AvailabilityProvider;
use crate::types::{AppError, AvailabilitySlot, Result};
use crate::utils::toml_config::CalendarConfig;
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

pub struct CalendarAvailability {
    slot_hours: Vec<u32>,
    slot_minutes: i64,
    timezone: String,
}

impl CalendarAvailability {
    pub fn new(config: &CalendarConfig) -> Self {
        Self {
            slot_hours: config.slot_hours.clone(),
            slot_minutes: config.slot_minutes,
            timezone: config.timezone.clone(),
        }
    }

    /// Slots on the day after `now`, one per configured hour.
    pub fn slots_from(&self, now: DateTime<Utc>) -> Result<Vec<AvailabilitySlot>> {
        let tomorrow = now
            .date_naive()
            .succ_opt()
            .ok_or_else(|| AppError::Internal("date out of range".to_string()))?;
        let slot_length = Duration::try_minutes(self.slot_minutes).ok_or_else(|| {
            AppError::Configuration(format!("slot length of {} minutes", self.slot_minutes))
        })?;

        self.slot_hours
            .iter()
            .map(|&hour| {
                let naive = tomorrow.and_hms_opt(hour, 0, 0).ok_or_else(|| {
                    AppError::Configuration(format!("invalid slot hour {}", hour))
                })?;
                let start = Utc.from_utc_datetime(&naive);
                let end = start.checked_add_signed(slot_length).ok_or_else(|| {
                    AppError::Configuration(format!(
                        "slot of {} minutes ends out of range",
                        self.slot_minutes
                    ))
                })?;
                Ok(AvailabilitySlot {
                    start,
                    end,
                    timezone: Some(self.timezone.clone()),
                })
            })
            .collect()
    }
}

#[async_trait]
impl AvailabilityProvider for CalendarAvailability {
    async fn suggest(&self) -> Result<Vec<AvailabilitySlot>> {
        self.slots_from(Utc::now())
    }
}
