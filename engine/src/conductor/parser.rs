//! Lenient parsing of assignment replies
//!
//! Models rarely answer in exactly the requested shape. The parser accepts,
//! in order of preference:
//!
//! 1. Raw JSON: `[{"task_id": 1, "worker_name": "Alice"}]`
//! 2. The same wrapped as `{"assignments": [...]}`
//! 3. Either of the above inside a markdown code fence, with prose around it
//! 4. The first balanced JSON array (or `assignments` object) in prose
//! 5. The line format `ASSIGNMENTS:\nAlice: Task 1, Task 2`
//!
//! Malformed entries are dropped with a warning instead of failing the reply.

use sdk::errors::ConductorError;
use sdk::task::TaskId;
use serde::Serialize;
use serde_json::Value;

/// One proposed (task, worker) pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposedAssignment {
    pub task_id: TaskId,
    pub worker_name: String,
}

/// Usable pairs plus notes about entries that were dropped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedAssignments {
    pub assignments: Vec<ProposedAssignment>,
    pub warnings: Vec<String>,
}

/// The reply had no recognizable assignment structure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("reply is empty")]
    Empty,

    #[error("no assignment list found in reply")]
    NoStructure,
}

impl From<ParseError> for ConductorError {
    fn from(err: ParseError) -> Self {
        ConductorError::Parse(err.to_string())
    }
}

const LINE_FORMAT_MARKER: &str = "ASSIGNMENTS:";

/// Parse a model reply into proposed assignments
pub fn parse_assignments(reply: &str) -> Result<ParsedAssignments, ParseError> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    // Pattern 1 and 2: the entire reply is JSON
    if let Some(entries) = entries_from_json(trimmed) {
        return Ok(from_entries(entries));
    }

    // Pattern 3: inside a code fence
    if let Some(entries) =
        extract_fenced_block(trimmed).and_then(|body| entries_from_json(body.trim()))
    {
        return Ok(from_entries(entries));
    }

    // Pattern 4: first balanced array or wrapper object in prose
    if let Some(entries) = first_embedded_entries(trimmed) {
        return Ok(from_entries(entries));
    }

    // Pattern 5: ASSIGNMENTS: section
    if let Some(parsed) = parse_line_format(trimmed) {
        return Ok(parsed);
    }

    Err(ParseError::NoStructure)
}

/// Accept a JSON array of entries, or an object wrapping one under `assignments`
fn entries_from_json(s: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(s).ok()? {
        Value::Array(entries) => Some(entries),
        Value::Object(mut map) => match map.remove("assignments")? {
            Value::Array(entries) => Some(entries),
            _ => None,
        },
        _ => None,
    }
}

fn from_entries(entries: Vec<Value>) -> ParsedAssignments {
    let mut parsed = ParsedAssignments::default();

    for entry in entries {
        let Some(object) = entry.as_object() else {
            parsed
                .warnings
                .push(format!("Ignoring non-object assignment entry: {}", entry));
            continue;
        };

        let task_id = object
            .get("task_id")
            .or_else(|| object.get("task"))
            .and_then(task_id_from_value);
        let worker_name = object
            .get("worker_name")
            .or_else(|| object.get("worker"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty());

        match (task_id, worker_name) {
            (Some(task_id), Some(worker_name)) => parsed.assignments.push(ProposedAssignment {
                task_id,
                worker_name: worker_name.to_string(),
            }),
            (None, _) => parsed
                .warnings
                .push(format!("Assignment entry has no usable task_id: {}", entry)),
            (_, None) => parsed
                .warnings
                .push(format!("Assignment entry has no worker_name: {}", entry)),
        }
    }

    parsed
}

fn task_id_from_value(value: &Value) -> Option<TaskId> {
    match value {
        Value::Number(n) => n.as_u64().map(TaskId),
        Value::String(s) => parse_task_ref(s),
        _ => None,
    }
}

/// Read a task reference such as `3`, `"T3"`, `"Task 3"` or `"task #3"`
pub fn parse_task_ref(s: &str) -> Option<TaskId> {
    let lowered = s.trim().to_lowercase();
    let rest = lowered
        .strip_prefix("task")
        .or_else(|| lowered.strip_prefix('t'))
        .unwrap_or(lowered.as_str());
    let digits = rest
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_end_matches(|c: char| matches!(c, '.' | ')' | ']' | '*'));

    digits.parse::<u64>().ok().map(TaskId)
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
fn extract_fenced_block(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start = fence_start + 3 + after_opening.find('\n')? + 1;
    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Scan prose for the first balanced `[...]` or `{...}` that holds entries
fn first_embedded_entries(content: &str) -> Option<Vec<Value>> {
    for (pos, ch) in content.char_indices() {
        let close = match ch {
            '[' => ']',
            '{' => '}',
            _ => continue,
        };
        if let Some(candidate) = extract_balanced(&content[pos..], ch, close) {
            if let Some(entries) = entries_from_json(candidate) {
                if entries.iter().all(Value::is_object) {
                    return Some(entries);
                }
            }
        }
    }
    None
}

/// Extract a balanced block starting at position 0 of `s`.
///
/// Counts `open` / `close` depth, respecting string literals.
fn extract_balanced(s: &str, open: char, close: char) -> Option<&str> {
    if !s.starts_with(open) {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// `ASSIGNMENTS:` followed by `Worker: Task 1, Task 2` lines
fn parse_line_format(content: &str) -> Option<ParsedAssignments> {
    let start = content.find(LINE_FORMAT_MARKER)? + LINE_FORMAT_MARKER.len();
    let mut parsed = ParsedAssignments::default();

    for line in content[start..].lines() {
        let line = line
            .trim()
            .trim_start_matches(|c: char| matches!(c, '-' | '*' | '•'))
            .trim();
        let Some((worker, refs)) = line.split_once(':') else {
            continue;
        };
        let worker = worker
            .trim()
            .trim_matches(|c: char| matches!(c, '[' | ']' | '*'))
            .trim();
        if worker.is_empty() {
            continue;
        }

        for task_ref in refs.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            match parse_task_ref(task_ref) {
                Some(task_id) => parsed.assignments.push(ProposedAssignment {
                    task_id,
                    worker_name: worker.to_string(),
                }),
                None => parsed.warnings.push(format!(
                    "Could not read task reference '{}' for {}",
                    task_ref, worker
                )),
            }
        }
    }

    Some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(task_id: u64, worker_name: &str) -> ProposedAssignment {
        ProposedAssignment {
            task_id: TaskId(task_id),
            worker_name: worker_name.to_string(),
        }
    }

    #[test]
    fn test_raw_json_array() {
        let parsed = parse_assignments(r#"[{"task_id": 1, "worker_name": "Alice"}]"#).unwrap();
        assert_eq!(parsed.assignments, vec![pair(1, "Alice")]);
        assert!(parsed.warnings.is_empty());
    }

    #[test]
    fn test_wrapped_object() {
        let reply = r#"{"assignments": [{"task_id": "2", "worker_name": "Bob"}]}"#;
        assert_eq!(parse_assignments(reply).unwrap().assignments, vec![pair(2, "Bob")]);
    }

    #[test]
    fn test_fenced_json_with_prose() {
        let reply = "Here is my plan:\n```json\n[{\"task_id\": \"T3\", \"worker_name\": \"Emma\"}]\n```\nLet me know!";
        assert_eq!(parse_assignments(reply).unwrap().assignments, vec![pair(3, "Emma")]);
    }

    #[test]
    fn test_embedded_array_in_prose() {
        let reply = "Emma has the database skills [see profile]. Final answer: \
                     [{\"task_id\": 1, \"worker_name\": \"Emma\"}, {\"task_id\": \"Task 4\", \"worker_name\": \"Alex\"}] done.";
        let parsed = parse_assignments(reply).unwrap();
        assert_eq!(parsed.assignments, vec![pair(1, "Emma"), pair(4, "Alex")]);
    }

    #[test]
    fn test_embedded_wrapper_object_in_prose() {
        let reply = "Sure. {\"assignments\": [{\"task_id\": 5, \"worker_name\": \"Sophia\"}]}";
        assert_eq!(parse_assignments(reply).unwrap().assignments, vec![pair(5, "Sophia")]);
    }

    #[test]
    fn test_line_format() {
        let reply = "REASONING:\nEmma knows databases.\n\nASSIGNMENTS:\nEmma: Task 1, Task #2\n- AI Assistant: task 7\nMichael: Task x";
        let parsed = parse_assignments(reply).unwrap();
        assert_eq!(
            parsed.assignments,
            vec![pair(1, "Emma"), pair(2, "Emma"), pair(7, "AI Assistant")]
        );
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].contains("Task x"));
    }

    #[test]
    fn test_bad_entries_become_warnings() {
        let reply = r#"[
            {"task_id": 1, "worker_name": "Alice"},
            {"task_id": 2},
            {"worker_name": "Bob"},
            {"task_id": "soon", "worker_name": "Bob"},
            "Alice"
        ]"#;
        let parsed = parse_assignments(reply).unwrap();
        assert_eq!(parsed.assignments, vec![pair(1, "Alice")]);
        assert_eq!(parsed.warnings.len(), 4);
    }

    #[test]
    fn test_empty_array_is_valid() {
        let parsed = parse_assignments("[]").unwrap();
        assert!(parsed.assignments.is_empty());
    }

    #[test]
    fn test_unusable_replies() {
        assert_eq!(parse_assignments("   "), Err(ParseError::Empty));
        assert_eq!(
            parse_assignments("I cannot decide, sorry."),
            Err(ParseError::NoStructure)
        );
        assert_eq!(
            parse_assignments("[1, 2, 3] are the numbers"),
            Err(ParseError::NoStructure)
        );
    }

    #[test]
    fn test_task_refs() {
        assert_eq!(parse_task_ref("12"), Some(TaskId(12)));
        assert_eq!(parse_task_ref("T1"), Some(TaskId(1)));
        assert_eq!(parse_task_ref("Task 1"), Some(TaskId(1)));
        assert_eq!(parse_task_ref("task #1"), Some(TaskId(1)));
        assert_eq!(parse_task_ref("Task 3."), Some(TaskId(3)));
        assert_eq!(parse_task_ref("Tomorrow"), None);
        assert_eq!(parse_task_ref(""), None);
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_scanner() {
        let reply = r#"Note: [{"task_id": 1, "worker_name": "Alice ]["}]"#;
        assert_eq!(parse_assignments(reply).unwrap().assignments, vec![pair(1, "Alice ][")]);
    }
}
