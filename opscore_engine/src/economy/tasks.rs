//! Withdrawal tasks a user completes before cashing out

use serde::{Deserialize, Serialize};

/// A withdrawal precondition. Unset fields are not part of the requirement.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalTask {
    pub id: String,
    pub name: String,
    /// Required number of completions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
    /// Required number of consecutive days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl WithdrawalTask {
    /// Sets the task name.
    pub fn name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }

    /// Sets or clears the completion count.
    pub fn count(&mut self, count: Option<u32>) -> &mut Self {
        self.count = count;
        self
    }

    /// Sets or clears the consecutive day requirement.
    pub fn days(&mut self, days: Option<u32>) -> &mut Self {
        self.days = days;
        self
    }

    /// Sets or clears the reward.
    pub fn reward(&mut self, reward: Option<f64>) -> &mut Self {
        self.reward = reward;
        self
    }

    /// Sets or clears the free-text condition.
    pub fn condition(&mut self, condition: Option<String>) -> &mut Self {
        self.condition = condition;
        self
    }

    /// Sets or clears the status flag.
    pub fn status(&mut self, status: Option<bool>) -> &mut Self {
        self.status = status;
        self
    }
}
