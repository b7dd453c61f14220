//! Configurable test case shared by the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use gauntlet_harness::{
    template, ConsumerResult, HarnessConfig, ParameterMap, Phase, PhaseOrchestrator, TestCase,
    VerifyContext,
};
use gauntlet_probe::{AssertionProbe, ProbeConfig};
use serde_json::Value;

/// Key a parameter override can set to make `verify` fail.
pub const FAIL_VERIFY: &str = "test.fail.verify";
/// Key a parameter override can set to make `verify` panic.
pub const PANIC_VERIFY: &str = "test.panic.verify";

/// Counts calls and misbehaves on request.
pub struct CountingCase {
    pub calls: AtomicU64,
    pub resets: AtomicU64,
    items_per_call: u64,
    fail_data_for: Option<String>,
    panic_for: Option<String>,
    hang_for: Option<(String, Duration)>,
    fail_reset: bool,
    overrides: Vec<(Phase, String, Value)>,
    probe: Option<AssertionProbe>,
}

impl CountingCase {
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            items_per_call: 1,
            fail_data_for: None,
            panic_for: None,
            hang_for: None,
            fail_reset: false,
            overrides: Vec::new(),
            probe: None,
        }
    }

    pub fn items_per_call(mut self, n: u64) -> Self {
        self.items_per_call = n;
        self
    }

    /// `generate_test_data` fails for this user id.
    pub fn fail_data_for(mut self, user: &str) -> Self {
        self.fail_data_for = Some(user.to_string());
        self
    }

    /// `verify` panics for this user id.
    pub fn panic_for(mut self, user: &str) -> Self {
        self.panic_for = Some(user.to_string());
        self
    }

    /// `verify` sleeps this long for this user id.
    pub fn hang_for(mut self, user: &str, sleep: Duration) -> Self {
        self.hang_for = Some((user.to_string(), sleep));
        self
    }

    pub fn fail_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    /// Set `key` in the parameter map of `phase` after derivation.
    pub fn with_override(mut self, phase: Phase, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((phase, key.to_string(), value.into()));
        self
    }

    /// Record one probe per `verify` call.
    pub fn with_probe(mut self, probe: AssertionProbe) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TestCase for CountingCase {
    type Component = ();
    type Data = String;

    fn name(&self) -> String {
        "counting".to_string()
    }

    fn perf_result_message(&self) -> String {
        template::performance_message("counted", "items")
    }

    fn thread_safety_result_message(&self) -> String {
        template::thread_safety_message("counted", "items")
    }

    fn generate_test_data(&self, params: &ParameterMap) -> ConsumerResult<String> {
        let user = params.user_id().unwrap_or_default().to_string();
        if self.fail_data_for.as_deref() == Some(user.as_str()) {
            return Err(format!("no data for {user}").into());
        }
        Ok(user)
    }

    fn component_under_test(&self) -> ConsumerResult<()> {
        Ok(())
    }

    fn verify(
        &self,
        params: &ParameterMap,
        _component: &(),
        data: &String,
        ctx: &VerifyContext<'_>,
    ) -> ConsumerResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(probe) = &self.probe {
            probe.probe_named("counting.verify", true);
        }

        if self.panic_for.as_deref() == Some(data.as_str()) || params.flag(PANIC_VERIFY) {
            panic!("verify blew up for {data}");
        }
        if let Some((user, sleep)) = &self.hang_for {
            if user == data {
                std::thread::sleep(*sleep);
            }
        }

        ctx.check(!params.flag(FAIL_VERIFY), "verification was told to fail")?;
        ctx.add_items(self.items_per_call);
        Ok(())
    }

    fn customize_parameters(&self, phase: Phase, params: &mut ParameterMap) {
        for (target, key, value) in &self.overrides {
            if *target == phase {
                params.insert(key.clone(), value.clone());
            }
        }
    }

    fn reset(&self) -> ConsumerResult<()> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reset {
            return Err("reset refused".into());
        }
        Ok(())
    }
}

pub fn quiet_probe() -> AssertionProbe {
    AssertionProbe::new(ProbeConfig {
        checks_enabled: false,
    })
    .unwrap()
}

/// Config with exact iteration counts and a fixed user count.
pub fn fixed_config(users: u64, items: u64) -> HarnessConfig {
    HarnessConfig {
        performance_items: items,
        min_users: users,
        max_users: users,
        fixed_iterations: true,
        seed: Some(42),
        ..Default::default()
    }
}

pub fn orchestrator(case: CountingCase, config: HarnessConfig) -> PhaseOrchestrator<CountingCase> {
    PhaseOrchestrator::new(case, quiet_probe(), config).unwrap()
}

/// Digits after the decimal point of the `<secs> seconds.` suffix.
pub fn seconds_precision(message: &str) -> Option<usize> {
    let secs = message.strip_suffix(" seconds.")?.rsplit(' ').next()?;
    let (_, fraction) = secs.split_once('.')?;
    Some(fraction.len())
}
