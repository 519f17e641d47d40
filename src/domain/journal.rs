//! Journal entries: structured reflections on a position or one of its fills.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp::flexible_datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEntryType {
    PositionPlan,
    TradeExecution,
}

impl JournalEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JournalEntryType::PositionPlan => "position_plan",
            JournalEntryType::TradeExecution => "trade_execution",
        }
    }
}

impl fmt::Display for JournalEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A prompt in an entry type's fixed set: `(name, prompt)`.
pub type Prompt = (&'static str, &'static str);

const POSITION_PLAN_PROMPTS: &[Prompt] = &[
    ("thesis", "Why are you planning this position?"),
    (
        "market_context",
        "What market conditions support this trade?",
    ),
    ("risk_assessment", "What could go wrong, and how bad would it be?"),
    ("exit_plan", "How and when will you exit, in profit or at a loss?"),
];

const TRADE_EXECUTION_PROMPTS: &[Prompt] = &[
    ("execution_notes", "How did the execution go?"),
    ("emotional_state", "How were you feeling when you placed the trade?"),
    (
        "market_conditions",
        "What were market conditions at the time of execution?",
    ),
    (
        "plan_adherence",
        "Did this execution follow the plan? If not, why?",
    ),
];

pub fn prompts_for(entry_type: JournalEntryType) -> &'static [Prompt] {
    match entry_type {
        JournalEntryType::PositionPlan => POSITION_PLAN_PROMPTS,
        JournalEntryType::TradeExecution => TRADE_EXECUTION_PROMPTS,
    }
}

pub fn prompt_text(entry_type: JournalEntryType, name: &str) -> Option<&'static str> {
    prompts_for(entry_type)
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, p)| *p)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalField {
    pub name: String,
    pub prompt: String,
    pub response: String,
}

impl JournalField {
    /// A field for a known prompt, with the canonical prompt text filled in.
    pub fn answer(entry_type: JournalEntryType, name: &str, response: &str) -> Option<Self> {
        prompt_text(entry_type, name).map(|prompt| JournalField {
            name: name.to_string(),
            prompt: prompt.to_string(),
            response: response.to_string(),
        })
    }
}

/// The full prompt set for an entry type with empty responses.
pub fn blank_fields(entry_type: JournalEntryType) -> Vec<JournalField> {
    prompts_for(entry_type)
        .iter()
        .map(|(name, prompt)| JournalField {
            name: name.to_string(),
            prompt: prompt.to_string(),
            response: String::new(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub position_id: String,
    #[serde(default)]
    pub trade_id: Option<String>,
    pub entry_type: JournalEntryType,
    pub fields: Vec<JournalField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: String,
    pub position_id: String,
    #[serde(default)]
    pub trade_id: Option<String>,
    pub entry_type: JournalEntryType,
    #[serde(default)]
    pub fields: Vec<JournalField>,
    #[serde(with = "flexible_datetime")]
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn assemble(new: NewJournalEntry, id: String, created_at: DateTime<Utc>) -> Self {
        JournalEntry {
            id,
            position_id: new.position_id,
            trade_id: new.trade_id,
            entry_type: new.entry_type,
            fields: new.fields,
            created_at,
        }
    }

    pub fn response(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.response.as_str())
    }
}
