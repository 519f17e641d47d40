//! Upgrades stored JSON documents written by older builds to the current shape.
//!
//! Older builds stored option fields flat on the record and omitted fields
//! added later (`journal_entry_ids`, the basis pair). Upgrading is idempotent
//! and runs both during migration and on every read.

use serde_json::{Map, Value};

const POSITION_OPTION_KEYS: [&str; 4] = [
    "option_type",
    "strike_price",
    "expiration_date",
    "premium_per_contract",
];

const TRADE_OPTION_KEYS: [&str; 9] = [
    "action",
    "occ_symbol",
    "option_type",
    "strike_price",
    "expiration_date",
    "contract_quantity",
    "underlying_price_at_trade",
    "created_stock_position_id",
    "cost_basis_adjustment",
];

fn is_missing(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).is_none_or(Value::is_null)
}

fn default_if_missing(obj: &mut Map<String, Value>, key: &str, value: Value) -> bool {
    if is_missing(obj, key) {
        obj.insert(key.to_string(), value);
        true
    } else {
        false
    }
}

/// Move flat keys into a nested `option` object, merging into one already present.
///
/// Null flat values are dropped. Non-null values are always kept, so an
/// incomplete legacy object fails to decode rather than disappearing.
fn nest_option_keys(obj: &mut Map<String, Value>, keys: &[&str]) -> bool {
    let present: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|k| obj.contains_key(*k))
        .collect();
    if present.is_empty() {
        return false;
    }
    let mut flat = Map::new();
    for key in present {
        if let Some(v) = obj.remove(key) {
            if !v.is_null() {
                flat.insert(key.to_string(), v);
            }
        }
    }
    if flat.is_empty() {
        return true;
    }
    match obj.get_mut("option") {
        Some(Value::Object(nested)) => {
            for (key, value) in flat {
                nested.entry(key).or_insert(value);
            }
        }
        _ => {
            obj.insert("option".to_string(), Value::Object(flat));
        }
    }
    true
}

pub fn upgrade_position_document(doc: &mut Value) -> bool {
    let Some(obj) = doc.as_object_mut() else {
        return false;
    };
    let mut changed = false;
    changed |= default_if_missing(obj, "journal_entry_ids", Value::Array(Vec::new()));
    changed |= default_if_missing(obj, "trades", Value::Array(Vec::new()));
    changed |= default_if_missing(obj, "profit_target_basis", "stock_price".into());
    changed |= default_if_missing(obj, "stop_loss_basis", "stock_price".into());
    changed |= nest_option_keys(obj, &POSITION_OPTION_KEYS);

    if let Some(Value::Array(trades)) = obj.get_mut("trades") {
        for trade in trades.iter_mut().filter_map(Value::as_object_mut) {
            changed |= nest_option_keys(trade, &TRADE_OPTION_KEYS);
        }
    }
    changed
}

pub fn upgrade_journal_document(doc: &mut Value) -> bool {
    match doc.as_object_mut() {
        Some(obj) => default_if_missing(obj, "fields", Value::Array(Vec::new())),
        None => false,
    }
}
