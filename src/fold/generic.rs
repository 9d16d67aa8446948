//! Generic element folding.
//!
//! Deterministic merge rules, applied to any subtree:
//! 1. attributes become `"@name"` string keys;
//! 2. children are grouped by tag name in first-occurrence order: one
//!    occurrence contributes its value bare, two or more become an
//!    array in document order;
//! 3. trimmed direct text becomes `"#text"` next to other keys, or the
//!    whole result collapses to a bare string when the element holds
//!    nothing else; an element with no content folds to an empty
//!    object;
//! 4. at the record root the element wrapper is unwrapped and a `_tag`
//!    discriminator is added, which wins over any `_tag` key coming
//!    from content.
//!
//! The fold walks an explicit work stack instead of recursing, so
//! pathologically deep nesting cannot overflow the call stack.

use serde_json::{Map, Value};

use crate::parse::Element;

use super::Record;

enum Task<'a> {
    Enter(&'a Element),
    Exit(&'a Element),
}

/// Folds an element subtree into its inner value (no tag wrapper).
pub fn fold_value(root: &Element) -> Value {
    let mut work = vec![Task::Enter(root)];
    let mut values: Vec<Value> = Vec::new();

    while let Some(task) = work.pop() {
        match task {
            Task::Enter(element) => {
                work.push(Task::Exit(element));
                // Reversed push so children fold in document order.
                for child in element.children.iter().rev() {
                    work.push(Task::Enter(child));
                }
            }
            Task::Exit(element) => {
                let split = values.len() - element.children.len();
                let child_values = values.split_off(split);
                values.push(assemble(element, child_values));
            }
        }
    }

    values.pop().unwrap_or_else(|| Value::Object(Map::new()))
}

/// Folds a record root: unwraps the element wrapper and adds the
/// `_tag` discriminator (first key, wins over content).
pub fn fold_record(root: &Element) -> Record {
    let mut body = Map::new();
    body.insert("_tag".to_string(), Value::String(root.name.clone()));
    match fold_value(root) {
        Value::Object(inner) => {
            for (key, value) in inner {
                if key != "_tag" {
                    body.insert(key, value);
                }
            }
        }
        // Leaf record roots collapse to a bare string; keep the record
        // an object by storing it under _text.
        other => {
            body.insert("_text".to_string(), other);
        }
    }
    Record {
        tag: root.name.clone(),
        body: Value::Object(body),
    }
}

fn assemble(element: &Element, child_values: Vec<Value>) -> Value {
    let mut object = Map::new();

    for (name, value) in &element.attributes {
        object.insert(format!("@{name}"), Value::String(value.clone()));
    }

    for (child, value) in element.children.iter().zip(child_values) {
        match object.get_mut(&child.name) {
            None => {
                object.insert(child.name.clone(), value);
            }
            // A folded element is never an array itself, so an array
            // here is always a group we started.
            Some(Value::Array(group)) => group.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        }
    }

    let text = element.trimmed_text();
    if !text.is_empty() {
        if object.is_empty() {
            return Value::String(text.to_string());
        }
        object.insert("#text".to_string(), Value::String(text.to_string()));
    }

    Value::Object(object)
}
