//! Demo test case: a UTC day formatter that must round-trip to the start of
//! the day.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use gauntlet_harness::{template, ConsumerResult, ParameterMap, TestCase, VerifyContext};
use gauntlet_probe::AssertionProbe;

/// Formats instants as `dd-Mon-yyyy` in UTC and parses them back.
#[derive(Debug, Clone)]
pub struct DayFormatter {
    pattern: &'static str,
}

impl DayFormatter {
    pub const PATTERN: &'static str = "%d-%b-%Y";

    pub fn new() -> Self {
        Self {
            pattern: Self::PATTERN,
        }
    }

    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant.format(self.pattern).to_string()
    }

    /// Parse a formatted day back to its first instant.
    pub fn parse(&self, day: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        let date = NaiveDate::parse_from_str(day, self.pattern)?;
        Ok(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
    }
}

impl Default for DayFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that formatting then parsing the current instant lands on the
/// start of the same day.
pub struct DateFormatCase {
    probe: AssertionProbe,
}

impl DateFormatCase {
    pub fn new(probe: AssertionProbe) -> Self {
        Self { probe }
    }
}

impl TestCase for DateFormatCase {
    type Component = DayFormatter;
    type Data = DateTime<Utc>;

    fn name(&self) -> String {
        "date format".to_string()
    }

    fn perf_result_message(&self) -> String {
        template::performance_message("parsed", "dates")
    }

    fn thread_safety_result_message(&self) -> String {
        template::thread_safety_message("parsed", "dates")
    }

    fn generate_test_data(&self, _params: &ParameterMap) -> ConsumerResult<DateTime<Utc>> {
        Ok(Utc::now())
    }

    fn component_under_test(&self) -> ConsumerResult<DayFormatter> {
        Ok(DayFormatter::new())
    }

    fn verify(
        &self,
        _params: &ParameterMap,
        day: &DayFormatter,
        now: &DateTime<Utc>,
        ctx: &VerifyContext<'_>,
    ) -> ConsumerResult<()> {
        let formatted = day.format(*now);
        let today = day.parse(&formatted)?;
        self.probe.probe_named("date.roundtrip", today <= *now);

        ctx.check_ne(
            "the value that corresponds to now and today should not be the same",
            now.timestamp_millis(),
            today.timestamp_millis(),
        )?;
        ctx.check(*now > today, "now should be later than today, which is at start of day")?;

        ctx.add_items(1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gauntlet_harness::AssertionTracker;
    use gauntlet_probe::ProbeConfig;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn formatter_round_trips_to_start_of_day() {
        let day = DayFormatter::new();
        let instant = Utc.with_ymd_and_hms(2024, 3, 9, 17, 45, 12).unwrap();

        let formatted = day.format(instant);
        assert_eq!(formatted, "09-Mar-2024");

        let parsed = day.parse(&formatted).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap());
    }

    #[test]
    fn formatter_rejects_garbage() {
        assert!(DayFormatter::new().parse("yesterday").is_err());
    }

    #[test]
    fn verify_counts_one_item_and_two_checks() {
        let probe = AssertionProbe::new(ProbeConfig::default()).unwrap();
        let case = DateFormatCase::new(probe.clone());
        let items = AtomicU64::new(0);
        let tracker = AssertionTracker::new();
        let ctx = VerifyContext::new(&items, &tracker);

        let now = Utc.with_ymd_and_hms(2024, 3, 9, 17, 45, 12).unwrap();
        case.verify(&ParameterMap::new(), &DayFormatter::new(), &now, &ctx)
            .unwrap();

        assert_eq!(ctx.items(), 1);
        assert_eq!(tracker.count(), 2);
        probe.flush_blocking().unwrap();
        assert_eq!(probe.named_count("date.roundtrip"), 1);
    }

    #[test]
    fn midnight_fails_the_inequality_check() {
        let case = DateFormatCase::new(AssertionProbe::new(ProbeConfig::default()).unwrap());
        let items = AtomicU64::new(0);
        let tracker = AssertionTracker::new();
        let ctx = VerifyContext::new(&items, &tracker);

        let midnight = Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap();
        let err = case
            .verify(&ParameterMap::new(), &DayFormatter::new(), &midnight, &ctx)
            .unwrap_err();

        assert!(err.to_string().contains("should not be the same"));
        assert_eq!(ctx.items(), 0);
    }
}
