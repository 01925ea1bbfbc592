//! JSON Repair Mechanism
//!
//! JSON extraction and repair for model completions.
//!
//! Handles common model output issues:
//! - Markdown code fence wrapping (```json ... ```)
//! - Byte order mark and surrounding whitespace
//! - Missing closing braces/brackets (closed in nesting order)
//! - Trailing commas
//! - Truncated strings
//! - Control characters in strings
//! - JSON embedded in explanatory text

use serde_json::Value;
use tracing::{debug, warn};

use crate::types::{HubError, Result};

/// Remove code fences, BOM and surrounding whitespace.
pub fn strip_fences(raw: &str) -> String {
    let s = raw.trim().trim_start_matches('\u{feff}').trim();

    let mut body = s;
    if body.starts_with("```") {
        body = match body.find('\n') {
            Some(newline) => &body[newline + 1..],
            // Single line: ```json {...}```
            None => body.trim_start_matches('`').trim_start_matches("json"),
        };
    }
    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    body.trim().to_string()
}

// =============================================================================
// JsonRepairer
// =============================================================================

/// JSON repair strategies
pub struct JsonRepairer {
    max_repair_attempts: usize,
    enabled: bool,
}

impl Default for JsonRepairer {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonRepairer {
    pub fn new() -> Self {
        Self {
            max_repair_attempts: 3,
            enabled: true,
        }
    }

    /// Parser that only strips fences; any defect is an error
    pub fn strict() -> Self {
        Self {
            max_repair_attempts: 0,
            enabled: false,
        }
    }

    /// Parse JSON, attempting repair if initial parse fails
    ///
    /// Returns (Value, was_repaired)
    pub fn parse_or_repair(&self, raw: &str) -> Result<(Value, bool)> {
        let cleaned = strip_fences(raw);

        if let Ok(value) = serde_json::from_str::<Value>(&cleaned) {
            return Ok((value, false));
        }

        if !self.enabled {
            return Err(Self::failure(&cleaned, 0));
        }

        debug!("Initial JSON parse failed, attempting repair");

        // Prose before the payload defeats every repair, so also try from the first bracket
        let mut candidates = vec![cleaned.as_str()];
        if let Some(start) = cleaned.find(['{', '['])
            && start > 0
        {
            candidates.push(&cleaned[start..]);
        }

        for candidate in &candidates {
            if let Some(extracted) = self.extract_json_from_mixed(candidate)
                && let Ok(value) = serde_json::from_str::<Value>(&extracted)
            {
                warn!("JSON extracted from mixed content");
                return Ok((value, true));
            }

            for attempt in 1..=self.max_repair_attempts {
                let repaired = self.repair_attempt(candidate, attempt);
                if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
                    warn!("JSON repaired on attempt {}", attempt);
                    return Ok((value, true));
                }
            }
        }

        Err(Self::failure(&cleaned, self.max_repair_attempts))
    }

    fn failure(cleaned: &str, attempts: usize) -> HubError {
        HubError::MalformedResponse(format!(
            "Failed to parse or repair JSON after {} attempts. Content preview: {}...",
            attempts,
            cleaned.chars().take(200).collect::<String>()
        ))
    }

    /// Attempt repair with increasing aggressiveness
    fn repair_attempt(&self, s: &str, level: usize) -> String {
        match level {
            1 => self.balance_brackets(&self.fix_trailing_commas(s)),
            2 => {
                let fixed = self.fix_truncated_strings(&self.fix_trailing_commas(s));
                self.balance_brackets(&fixed)
            }
            _ => {
                let cleaned = self.remove_control_chars(&self.fix_trailing_commas(s));
                let closed = self.balance_brackets(&self.fix_truncated_strings(&cleaned));
                // Closing may have left a dangling comma before the new closer
                let closed = self.fix_trailing_commas(&closed);
                self.truncate_to_valid(&closed)
            }
        }
    }

    /// Fix trailing commas before ] or }
    fn fix_trailing_commas(&self, s: &str) -> String {
        let chars: Vec<char> = s.chars().collect();
        let mut result = String::with_capacity(s.len());
        let mut in_string = false;
        let mut escape = false;

        for (i, &ch) in chars.iter().enumerate() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                ',' if !in_string => {
                    let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                    if matches!(next, Some(']') | Some('}')) {
                        continue;
                    }
                }
                _ => {}
            }
            result.push(ch);
        }

        result
    }

    /// Close unterminated strings and open containers, innermost first
    fn balance_brackets(&self, s: &str) -> String {
        let mut stack = Vec::new();
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' if !in_string => stack.push('}'),
                '[' if !in_string => stack.push(']'),
                '}' | ']' if !in_string => {
                    if stack.last() == Some(&ch) {
                        stack.pop();
                    }
                }
                _ => {}
            }
        }

        let mut result = s.trim_end().to_string();
        if in_string {
            result.push('"');
        }
        while let Some(closer) = stack.pop() {
            result.push(closer);
        }
        result
    }

    /// Fix truncated strings by closing them at the line break
    fn fix_truncated_strings(&self, s: &str) -> String {
        let mut result = String::with_capacity(s.len() + 10);
        let mut in_string = false;
        let mut escape = false;

        for ch in s.chars() {
            if escape {
                escape = false;
                result.push(ch);
                continue;
            }

            match ch {
                '\\' if in_string => {
                    escape = true;
                    result.push(ch);
                }
                '"' => {
                    in_string = !in_string;
                    result.push(ch);
                }
                '\n' | '\r' if in_string => {
                    result.push('"');
                    in_string = false;
                    result.push(ch);
                }
                _ => result.push(ch),
            }
        }

        if in_string {
            result.push('"');
        }

        result
    }

    /// Remove control characters that break JSON parsing
    fn remove_control_chars(&self, s: &str) -> String {
        s.chars()
            .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    }

    /// Truncate to the end of the first complete top-level value
    fn truncate_to_valid(&self, s: &str) -> String {
        let mut depth: i32 = 0;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s.char_indices() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' | '[' if !in_string => depth += 1,
                '}' | ']' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        return s[..i + 1].to_string();
                    }
                }
                _ => {}
            }
        }

        s.to_string()
    }

    /// Extract the first balanced JSON value from mixed content
    fn extract_json_from_mixed(&self, s: &str) -> Option<String> {
        let start = s.find(['{', '['])?;
        let mut depth: i32 = 0;
        let mut in_string = false;
        let mut escape = false;

        for (i, ch) in s[start..].char_indices() {
            if escape {
                escape = false;
                continue;
            }
            match ch {
                '\\' if in_string => escape = true,
                '"' => in_string = !in_string,
                '{' | '[' if !in_string => depth += 1,
                '}' | ']' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        let end = start + i + 1;
                        return (end < s.len() || start > 0).then(|| s[start..end].to_string());
                    }
                }
                _ => {}
            }
        }

        None
    }
}
