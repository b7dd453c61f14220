//! Phase parameter maps, their derivation and validation.
//!
//! Each phase builds on the previous one:
//!
//! ```text
//!   functional      { user.id, number.items = 20 }
//!        │
//!        ▼
//!   performance     + disable.performance.test = false
//!                   + result.message = <performance template>
//!                   ~ number.items = 50
//!        │
//!        ▼
//!   thread safety   + number.of.simultaneous.users = rand[2, 11]
//!                   + disable.thread.safety.test = false
//!                   ~ result.message = <thread-safety template>
//! ```

use std::collections::HashMap;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::case::TestCase;
use crate::config::HarnessConfig;
use crate::error::{ContractViolation, HarnessResult};
use crate::phase::Phase;
use crate::template::ResultTemplate;

/// Recognised parameter keys.
pub mod keys {
    /// Identity of the (simulated) user running the phase.
    pub const USER_ID: &str = "user.id";
    /// Upper bound on verification calls in a performance run.
    pub const NUM_ITEMS: &str = "number.items";
    /// How many users the thread-safety phase simulates.
    pub const NUMBER_OF_SIMULTANEOUS_USERS: &str = "number.of.simultaneous.users";
    pub const DISABLE_PERFORMANCE_TEST: &str = "disable.performance.test";
    pub const DISABLE_THREAD_SAFETY_TEST: &str = "disable.thread.safety.test";
    /// Result-message template for the performance or thread-safety phase.
    pub const RESULT_MESSAGE: &str = "result.message";
    /// Items counted by the last performance run using this map.
    pub const COUNT_FOR_THIS_USER: &str = "count.for.this.user";
}

/// String-keyed map of dynamically typed phase parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap(HashMap<String, Value>);

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning the one it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.0.get(key).and_then(Value::as_u64)
    }

    /// Interpret a disable-style flag. Absent means `false`; strings are
    /// parsed case-insensitively.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get_str(keys::USER_ID)
    }

    pub fn items(&self) -> Option<u64> {
        self.get_u64(keys::NUM_ITEMS)
    }

    pub fn simultaneous_users(&self) -> Option<u64> {
        self.get_u64(keys::NUMBER_OF_SIMULTANEOUS_USERS)
    }

    /// Whether this map drives a simulated user of the thread-safety phase.
    pub fn is_thread_safety(&self) -> bool {
        self.contains(keys::NUMBER_OF_SIMULTANEOUS_USERS)
    }
}

impl FromIterator<(String, Value)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Builds the cascading parameter maps for each phase.
pub struct ParameterDerivation {
    default_user: String,
    functional_items: u64,
    performance_items: u64,
    min_users: u64,
    max_users: u64,
    fixed_iterations: bool,
    rng: Mutex<StdRng>,
}

impl ParameterDerivation {
    /// Fails if `config` does not validate, so the user range is never empty.
    pub fn new(config: &HarnessConfig) -> HarnessResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            default_user: config.default_user.clone(),
            functional_items: config.functional_items,
            performance_items: config.performance_items,
            min_users: config.min_users,
            max_users: config.max_users,
            fixed_iterations: config.fixed_iterations,
            rng: Mutex::new(rng),
        })
    }

    /// Base map: user identity and item count.
    pub fn functional<T: TestCase>(&self, case: &T) -> ParameterMap {
        let mut params = ParameterMap::new();
        let user = if self.default_user.trim().is_empty() {
            "user"
        } else {
            self.default_user.as_str()
        };
        params.insert(keys::USER_ID, user);
        params.insert(keys::NUM_ITEMS, self.functional_items);
        case.customize_parameters(Phase::Functional, &mut params);
        params
    }

    /// Functional map plus the performance flag, template and item count.
    pub fn performance<T: TestCase>(&self, case: &T) -> ParameterMap {
        let mut params = self.functional(case);
        params.insert(keys::DISABLE_PERFORMANCE_TEST, false);
        params.insert(keys::RESULT_MESSAGE, case.perf_result_message());
        params.insert(keys::NUM_ITEMS, self.performance_items);
        case.customize_parameters(Phase::Performance, &mut params);
        params
    }

    /// Performance map plus a random user count, the thread-safety flag and
    /// the thread-safety template.
    pub fn thread_safety<T: TestCase>(&self, case: &T) -> ParameterMap {
        let users = self.rng.lock().gen_range(self.min_users..=self.max_users);
        let mut params = self.performance(case);
        params.insert(keys::NUMBER_OF_SIMULTANEOUS_USERS, users);
        params.insert(keys::DISABLE_THREAD_SAFETY_TEST, false);
        params.insert(keys::RESULT_MESSAGE, case.thread_safety_result_message());
        case.customize_parameters(Phase::ThreadSafety, &mut params);
        params
    }

    /// Derive the map for `phase`.
    pub fn for_phase<T: TestCase>(&self, phase: Phase, case: &T) -> ParameterMap {
        match phase {
            Phase::Functional => self.functional(case),
            Phase::Performance => self.performance(case),
            Phase::ThreadSafety => self.thread_safety(case),
        }
    }

    /// Number of verification calls for a performance run bounded by `items`.
    pub fn iterations(&self, items: u64) -> u64 {
        if self.fixed_iterations {
            items
        } else if items == 0 {
            0
        } else {
            self.rng.lock().gen_range(0..items)
        }
    }
}

/// Check the result-message template for `phase` and parse it.
pub fn validate_result_message(
    params: &ParameterMap,
    phase: Phase,
) -> Result<ResultTemplate, ContractViolation> {
    let value = params
        .get(keys::RESULT_MESSAGE)
        .filter(|v| !v.is_null())
        .ok_or(ContractViolation::Missing {
            phase,
            field: keys::RESULT_MESSAGE,
        })?;

    let text = value.as_str().ok_or(ContractViolation::WrongType {
        field: keys::RESULT_MESSAGE,
        expected: "String",
    })?;

    if text.trim().is_empty() {
        return Err(ContractViolation::Empty {
            field: keys::RESULT_MESSAGE,
        });
    }

    let template = ResultTemplate::parse(text);
    if !template.has_float_slot() {
        return Err(ContractViolation::MissingPlaceholder {
            field: keys::RESULT_MESSAGE,
            placeholder: "%f",
        });
    }
    if phase == Phase::ThreadSafety && !template.has_int_slot() {
        return Err(ContractViolation::MissingPlaceholder {
            field: keys::RESULT_MESSAGE,
            placeholder: "%d",
        });
    }

    Ok(template)
}

/// Largest simultaneous-user count a thread-safety run accepts.
pub const MAX_SIMULTANEOUS_USERS: u64 = 100_000;

/// Check the simultaneous-user count: present, numeric, positive, bounded.
pub fn validate_user_count(params: &ParameterMap) -> Result<u64, ContractViolation> {
    let value = params
        .get(keys::NUMBER_OF_SIMULTANEOUS_USERS)
        .filter(|v| !v.is_null())
        .ok_or(ContractViolation::Missing {
            phase: Phase::ThreadSafety,
            field: keys::NUMBER_OF_SIMULTANEOUS_USERS,
        })?;

    let number = value.as_f64().ok_or(ContractViolation::WrongType {
        field: keys::NUMBER_OF_SIMULTANEOUS_USERS,
        expected: "Integer",
    })?;

    // Fractional counts truncate, as an integer conversion would.
    let users = number.trunc();
    if users < 1.0 {
        return Err(ContractViolation::NotPositive {
            field: keys::NUMBER_OF_SIMULTANEOUS_USERS,
        });
    }
    if users > MAX_SIMULTANEOUS_USERS as f64 {
        return Err(ContractViolation::TooLarge {
            field: keys::NUMBER_OF_SIMULTANEOUS_USERS,
            max: MAX_SIMULTANEOUS_USERS,
        });
    }
    Ok(users as u64)
}

/// Check the item count a performance run is bounded by.
pub fn validate_items(params: &ParameterMap, phase: Phase) -> Result<u64, ContractViolation> {
    let value = params
        .get(keys::NUM_ITEMS)
        .filter(|v| !v.is_null())
        .ok_or(ContractViolation::Missing {
            phase,
            field: keys::NUM_ITEMS,
        })?;
    value.as_u64().ok_or(ContractViolation::WrongType {
        field: keys::NUM_ITEMS,
        expected: "Integer",
    })
}
