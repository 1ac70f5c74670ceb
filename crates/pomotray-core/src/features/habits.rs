//! Habit-tracker check-ins (TickTick-style API).
//!
//! Credits worked hours to one configured habit. The token comes from
//! the secret store (`HABITS_API_TOKEN`); habit metadata is fetched
//! once at construction. A check-in for a date that already exists is
//! updated in place rather than duplicated.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use super::traits::{FeatureCall, FeatureHandler, FeatureResult};
use crate::config::HabitsConfig;
use crate::secret::secret;

const DATE_STAMP_FORMAT: &str = "%Y%m%d";

#[derive(Deserialize)]
struct HabitMeta {
    id: String,
    name: String,
    #[serde(default)]
    goal: f64,
}

pub struct HabitHandler {
    client: reqwest::blocking::Client,
    base: String,
    token: String,
    /// habit name -> id
    ids: HashMap<String, String>,
    /// habit id -> daily goal
    goals: HashMap<String, f64>,
}

impl HabitHandler {
    pub fn new(config: &HabitsConfig) -> FeatureResult<Self> {
        let token = secret("HABITS_API_TOKEN").ok_or("HABITS_API_TOKEN is not available")?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let habits: Vec<HabitMeta> = client
            .get(format!("{}/api/v2/habits", config.base_url))
            .bearer_auth(&token)
            .send()?
            .error_for_status()?
            .json()?;
        let ids = habits
            .iter()
            .map(|h| (h.name.clone(), h.id.clone()))
            .collect();
        let goals = habits.into_iter().map(|h| (h.id, h.goal)).collect();
        Ok(Self {
            client,
            base: config.base_url.trim_end_matches('/').to_string(),
            token,
            ids,
            goals,
        })
    }

    /// Find the existing check-in entry for `date_stamp`, if any.
    fn query_single_checkin(&self, habit_id: &str, date_stamp: &str) -> FeatureResult<Option<Value>> {
        let date = NaiveDate::parse_from_str(date_stamp, DATE_STAMP_FORMAT)?;
        let after_stamp = (date - ChronoDuration::days(1))
            .format(DATE_STAMP_FORMAT)
            .to_string();
        let response: Value = self
            .client
            .post(format!("{}/api/v2/habitCheckins/query", self.base))
            .bearer_auth(&self.token)
            .json(&json!({ "habitIds": [habit_id], "afterStamp": after_stamp }))
            .send()?
            .error_for_status()?
            .json()?;
        let wanted: i64 = date_stamp.parse()?;
        let entry = response["checkins"][habit_id]
            .as_array()
            .into_iter()
            .flatten()
            .find(|entry| entry["checkinStamp"].as_i64() == Some(wanted))
            .cloned();
        Ok(entry)
    }

    fn post_checkin(&self, habit: &str, date_stamp: &str, value: u32) -> FeatureResult {
        let habit_id = self
            .ids
            .get(habit)
            .ok_or_else(|| format!("habit '{habit}' not found"))?;
        let goal = self.goals.get(habit_id).copied().unwrap_or(0.0);
        let status = if f64::from(value) >= goal { 2 } else { 0 };
        let now = Utc::now().format("%Y-%m-%dT%H:%M:%S.000+0000").to_string();
        tracing::info!(habit, date_stamp, value, status, "posting habit check-in");

        let mut checkin = json!({
            "checkinStamp": date_stamp,
            "checkinTime": now,
            "goal": goal,
            "habitId": habit_id,
            "opTime": now,
            "status": status,
            "value": value,
        });
        let payload = match self.query_single_checkin(habit_id, date_stamp)? {
            Some(existing) => {
                checkin["id"] = existing["id"].clone();
                json!({ "add": [], "update": [checkin], "delete": [] })
            }
            None => json!({ "add": [checkin], "update": [], "delete": [] }),
        };
        self.client
            .post(format!("{}/api/v2/habitCheckins/batch", self.base))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

impl FeatureHandler for HabitHandler {
    fn handle(&mut self, call: FeatureCall) -> FeatureResult {
        match call {
            FeatureCall::PostCheckin {
                habit,
                date_stamp,
                value,
            } => self.post_checkin(&habit, &date_stamp, value),
            other => {
                tracing::debug!(?other, "call outside habit tracking capability");
                Ok(())
            }
        }
    }
}
