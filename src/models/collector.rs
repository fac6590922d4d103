//! Result collectors: fold-with-early-exit reduction over per-executor results.
//!
//! A collector turns the open list of contributed result values into one
//! external result: start from `supply()`, fold contributions through
//! `accumulate`, short-circuit once `finishable` holds, and `finish` to
//! produce the published value. Collector failures surface as error Results
//! through the normal collection path.

use std::sync::Arc;

use serde_json::{json, Value};

/// Reduction seam over contributed result values.
///
/// Implementations must be deterministic over the contribution sequence:
/// the fold is re-run from scratch on every evaluation, and an unchanged
/// outcome must compare equal so redundant publications are suppressed.
pub trait ResultCollector: Send + Sync {
    /// Fresh accumulator.
    fn supply(&self) -> Value;

    /// Folds one contributed value into the accumulator.
    fn accumulate(&self, acc: &mut Value, contribution: &Value) -> anyhow::Result<()>;

    /// True once accumulation can stop early; remaining contributions are
    /// ignored for this fold.
    fn finishable(&self, _acc: &Value) -> bool {
        false
    }

    /// Produces the external result from the accumulator.
    fn finish(&self, acc: &Value) -> anyhow::Result<Value>;
}

/// Collects contributed values into a list in contribution order.
pub fn list_of() -> Arc<dyn ResultCollector> {
    Arc::new(ListOf)
}

/// Collects distinct contributed values, first-seen order preserved.
pub fn set_of() -> Arc<dyn ResultCollector> {
    Arc::new(SetOf)
}

/// Counts contributed values.
pub fn count() -> Arc<dyn ResultCollector> {
    Arc::new(Count)
}

/// Keeps the first non-null contributed value and finishes early.
pub fn first_of() -> Arc<dyn ResultCollector> {
    Arc::new(FirstOf)
}

/// Keeps the most recent contributed value.
pub fn last_of() -> Arc<dyn ResultCollector> {
    Arc::new(LastOf)
}

struct ListOf;

impl ResultCollector for ListOf {
    fn supply(&self) -> Value {
        json!([])
    }

    fn accumulate(&self, acc: &mut Value, contribution: &Value) -> anyhow::Result<()> {
        acc.as_array_mut()
            .ok_or_else(|| anyhow::anyhow!("list accumulator is not an array"))?
            .push(contribution.clone());
        Ok(())
    }

    fn finish(&self, acc: &Value) -> anyhow::Result<Value> {
        Ok(acc.clone())
    }
}

struct SetOf;

impl ResultCollector for SetOf {
    fn supply(&self) -> Value {
        json!([])
    }

    fn accumulate(&self, acc: &mut Value, contribution: &Value) -> anyhow::Result<()> {
        let items = acc
            .as_array_mut()
            .ok_or_else(|| anyhow::anyhow!("set accumulator is not an array"))?;
        if !items.contains(contribution) {
            items.push(contribution.clone());
        }
        Ok(())
    }

    fn finish(&self, acc: &Value) -> anyhow::Result<Value> {
        Ok(acc.clone())
    }
}

struct Count;

impl ResultCollector for Count {
    fn supply(&self) -> Value {
        json!(0)
    }

    fn accumulate(&self, acc: &mut Value, _contribution: &Value) -> anyhow::Result<()> {
        let current = acc
            .as_u64()
            .ok_or_else(|| anyhow::anyhow!("count accumulator is not an unsigned integer"))?;
        *acc = json!(current + 1);
        Ok(())
    }

    fn finish(&self, acc: &Value) -> anyhow::Result<Value> {
        Ok(acc.clone())
    }
}

struct FirstOf;

impl ResultCollector for FirstOf {
    fn supply(&self) -> Value {
        Value::Null
    }

    fn accumulate(&self, acc: &mut Value, contribution: &Value) -> anyhow::Result<()> {
        if acc.is_null() {
            *acc = contribution.clone();
        }
        Ok(())
    }

    fn finishable(&self, acc: &Value) -> bool {
        !acc.is_null()
    }

    fn finish(&self, acc: &Value) -> anyhow::Result<Value> {
        Ok(acc.clone())
    }
}

struct LastOf;

impl ResultCollector for LastOf {
    fn supply(&self) -> Value {
        Value::Null
    }

    fn accumulate(&self, acc: &mut Value, contribution: &Value) -> anyhow::Result<()> {
        *acc = contribution.clone();
        Ok(())
    }

    fn finish(&self, acc: &Value) -> anyhow::Result<Value> {
        Ok(acc.clone())
    }
}
